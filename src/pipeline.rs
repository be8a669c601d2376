//! Question-answering pipeline.
//!
//! Orchestrates one question end to end: validate, delegate to the language
//! analyzer, load the classified template, run both substitution passes,
//! execute the synthesized SPARQL and format the rows. Every stage failure
//! becomes a short, stable user-facing message in the answer; nothing past
//! this boundary propagates an error, and no internal detail (paths, stack
//! traces, SPARQL engine messages) leaks into the answer text.

use std::sync::Arc;

use serde::Serialize;

use crate::format::{self, FormatMode};
use crate::graph::store::KnowledgeStore;
use crate::nlp::QuestionAnalyzer;
use crate::query::dictionary::SymbolDictionary;
use crate::query::subst::Substituter;
use crate::query::template::TemplateRegistry;

pub const MSG_EMPTY_QUESTION: &str =
    "Pergunta vazia. Escreva uma pergunta sobre o mercado de ações.";
pub const MSG_ANALYZER_UNAVAILABLE: &str =
    "O analisador de linguagem natural está indisponível no momento.";
pub const MSG_UNCLASSIFIED: &str = "Não foi possível entender a pergunta.";
pub const MSG_TEMPLATE_MISSING: &str =
    "A pergunta foi entendida, mas não há um modelo de consulta para ela.";

/// One answered question, with the intermediate artifacts that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub template_id: Option<String>,
    pub sparql_query: Option<String>,
    /// The text shown to the user: the formatted result or a failure message.
    pub result: String,
    /// Stable failure kind, absent on success.
    pub error: Option<String>,
}

pub struct Pipeline {
    analyzer: Box<dyn QuestionAnalyzer>,
    templates: TemplateRegistry,
    dictionary: SymbolDictionary,
    store: Arc<KnowledgeStore>,
    mode: FormatMode,
}

impl Pipeline {
    pub fn new(
        analyzer: Box<dyn QuestionAnalyzer>,
        templates: TemplateRegistry,
        dictionary: SymbolDictionary,
        store: Arc<KnowledgeStore>,
        mode: FormatMode,
    ) -> Self {
        Self {
            analyzer,
            templates,
            dictionary,
            store,
            mode,
        }
    }

    /// Answer one question. Total: always returns an [`Answer`].
    pub fn answer(&self, question: &str) -> Answer {
        let question = question.trim();
        if question.is_empty() {
            return Answer::failure(question, None, "empty_question", MSG_EMPTY_QUESTION);
        }

        let outcome = match self.analyzer.analyze(question) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("language analyzer failed: {e}");
                return Answer::failure(question, None, "analyzer_unavailable", MSG_ANALYZER_UNAVAILABLE);
            }
        };
        // An explicit analyzer error means the question was not understood,
        // even when a template identifier is also present.
        if let Some(detail) = &outcome.error {
            tracing::warn!(detail = %detail, "analyzer reported a problem with the question");
            return Answer::failure(question, None, "unclassified", MSG_UNCLASSIFIED);
        }
        if outcome.is_unclassified() {
            return Answer::failure(question, None, "unclassified", MSG_UNCLASSIFIED);
        }
        let template_id = outcome
            .template_id
            .clone()
            .unwrap_or_default();

        let template = match self.templates.fetch(&template_id) {
            Ok(template) => template,
            Err(e) => {
                tracing::error!(template_id = %template_id, "template lookup failed: {e}");
                return Answer::failure(
                    question,
                    Some(template_id),
                    "template_missing",
                    MSG_TEMPLATE_MISSING,
                );
            }
        };

        let sparql = Substituter::new(&self.dictionary).synthesize(&template, &outcome.entities);
        tracing::debug!(template_id = %template_id, query = %sparql, "synthesized SPARQL");

        let rows = self.store.execute(&sparql);
        let result = format::format_rows(&rows, self.mode);

        Answer {
            question: question.to_string(),
            template_id: Some(template_id),
            sparql_query: Some(sparql),
            result,
            error: None,
        }
    }
}

impl Answer {
    fn failure(question: &str, template_id: Option<String>, kind: &str, message: &str) -> Self {
        Answer {
            question: question.to_string(),
            template_id,
            sparql_query: None,
            result: message.to_string(),
            error: Some(kind.to_string()),
        }
    }
}
