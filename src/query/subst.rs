//! Placeholder substitution: template + entities + dictionary -> SPARQL.
//!
//! Two ordered passes. Pass 1 fills the `#KEY#` entity placeholders with
//! typed literal forms; pass 2 rewrites the dictionary symbols and prepends
//! the `PREFIX` header. Both passes are total: a missing entity degrades to
//! a sentinel literal that makes the query match nothing, never to a panic
//! or a syntactically broken query.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::query::dictionary::SymbolDictionary;

static TICKER_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}\d{1,2}$").expect("valid regex"));

static RESIDUAL_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[A-Z_]+#").expect("valid regex"));

/// Entity placeholder carrying a free-form SPARQL fragment, inserted
/// verbatim when supplied and deleted (whole line) when absent.
const PATTERN_KEY: &str = "PADRAO";
const PATTERN_PLACEHOLDER: &str = "#PADRAO#";

pub struct Substituter<'d> {
    dictionary: &'d SymbolDictionary,
}

impl<'d> Substituter<'d> {
    pub fn new(dictionary: &'d SymbolDictionary) -> Self {
        Self { dictionary }
    }

    /// Both passes in order: the synthesized, executable query text.
    pub fn synthesize(&self, template: &str, entities: &BTreeMap<String, String>) -> String {
        self.apply_symbols(&self.apply_entities(template, entities))
    }

    /// Pass 1: fill `#KEY#` placeholders from the extracted entities.
    pub fn apply_entities(&self, template: &str, entities: &BTreeMap<String, String>) -> String {
        let mut out = template.to_string();

        for (key, value) in entities {
            let placeholder = format!("#{key}#");
            if !out.contains(&placeholder) {
                tracing::warn!(key = %key, "entity has no placeholder in the template");
                continue;
            }
            // The pattern key is optional: an empty value counts as absent,
            // leaving the placeholder for whole-line deletion below.
            if key == PATTERN_KEY && value.trim().is_empty() {
                continue;
            }
            out = out.replace(&placeholder, &self.entity_form(key, value));
        }

        // A pattern placeholder left unfilled removes its whole line.
        if out.contains(PATTERN_PLACEHOLDER) {
            out = delete_pattern_lines(&out);
        }

        for residual in RESIDUAL_PLACEHOLDER.find_iter(&out) {
            tracing::warn!(placeholder = residual.as_str(), "unfilled placeholder left in query");
        }

        out
    }

    /// The SPARQL fragment an entity value becomes.
    fn entity_form(&self, key: &str, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            return format!("\"ERRO_ENTIDADE_AUSENTE_{key}\"");
        }
        match key {
            "ENTIDADE_NOME" => {
                if TICKER_SHAPE.is_match(value) {
                    format!("\"{}\"", escape_literal(value))
                } else {
                    format!("\"{}\"@pt", escape_literal(value))
                }
            }
            "DATA" => format!("\"{}\"^^xsd:date", escape_literal(value)),
            "VALOR_DESEJADO" => match self.dictionary.metric(value) {
                Some(predicate) => predicate.to_string(),
                None => {
                    tracing::warn!(metric = %value, "unknown metric name");
                    format!("\"ERRO_METRICA_DESCONHECIDA_{value}\"")
                }
            },
            PATTERN_KEY => value.to_string(),
            _ => format!("\"{}\"", escape_literal(value)),
        }
    }

    /// Pass 2: dictionary symbols plus the `PREFIX` header.
    pub fn apply_symbols(&self, text: &str) -> String {
        format!(
            "{}{}",
            self.dictionary.prefix_header(),
            self.dictionary.substitute(text)
        )
    }
}

fn delete_pattern_lines(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.contains(PATTERN_PLACEHOLDER))
        .collect()
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> SymbolDictionary {
        SymbolDictionary::load(None).unwrap()
    }

    fn entities(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn company_name_becomes_a_language_tagged_literal() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_entities("?x P6 #ENTIDADE_NOME# .", &entities(&[("ENTIDADE_NOME", "Petrobras")]));
        assert_eq!(out, "?x P6 \"Petrobras\"@pt .");
    }

    #[test]
    fn ticker_shaped_name_stays_untagged() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_entities("?x P5 #ENTIDADE_NOME# .", &entities(&[("ENTIDADE_NOME", "PETR4")]));
        assert_eq!(out, "?x P5 \"PETR4\" .");
    }

    #[test]
    fn date_is_typed() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_entities("#DATA#", &entities(&[("DATA", "2023-01-05")]));
        assert_eq!(out, "\"2023-01-05\"^^xsd:date");
    }

    #[test]
    fn metric_resolves_through_the_dictionary() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_entities(
            "?r #VALOR_DESEJADO# ?ans .",
            &entities(&[("VALOR_DESEJADO", "metrica.preco_fechamento")]),
        );
        assert_eq!(out, "?r b3:precoFechamento ?ans .");
    }

    #[test]
    fn empty_entity_yields_sentinel_naming_the_key() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_entities("#ENTIDADE_NOME#", &entities(&[("ENTIDADE_NOME", "  ")]));
        assert_eq!(out, "\"ERRO_ENTIDADE_AUSENTE_ENTIDADE_NOME\"");
    }

    #[test]
    fn quotes_in_values_are_escaped() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_entities("#ENTIDADE_NOME#", &entities(&[("ENTIDADE_NOME", "Lojas \"X\"")]));
        assert_eq!(out, "\"Lojas \\\"X\\\"\"@pt");
    }

    #[test]
    fn absent_pattern_deletes_its_line_only() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let template = "SELECT ?ANS\nWHERE {\n    #PADRAO#\n    ?a ?b ?ANS .\n}\n";
        let out = s.apply_entities(template, &BTreeMap::new());
        assert_eq!(out, "SELECT ?ANS\nWHERE {\n    ?a ?b ?ANS .\n}\n");
    }

    #[test]
    fn empty_pattern_counts_as_absent() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let template = "WHERE {\n    ?a ?b ?ANS .\n    #PADRAO#\n}\n";
        let out = s.apply_entities(template, &entities(&[("PADRAO", "  ")]));
        assert_eq!(out, "WHERE {\n    ?a ?b ?ANS .\n}\n");
    }

    #[test]
    fn supplied_pattern_is_inserted_verbatim() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_entities(
            "#PADRAO#\n",
            &entities(&[("PADRAO", "FILTER (?ANS > 10)")]),
        );
        assert_eq!(out, "FILTER (?ANS > 10)\n");
    }

    #[test]
    fn unfilled_placeholder_is_left_in_place() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_entities("?x ?y #DATA# .", &BTreeMap::new());
        assert_eq!(out, "?x ?y #DATA# .");
    }

    #[test]
    fn symbol_pass_prepends_prefix_header() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let out = s.apply_symbols("SELECT ?ANS WHERE { ?S1 P1 ?S2 . }");
        assert!(out.starts_with("PREFIX "));
        assert!(out.contains("SELECT ?resposta WHERE { ?empresa b3:temValorMobiliarioNegociado ?valorMobiliario . }"));
    }

    #[test]
    fn full_synthesis_leaves_no_placeholders_or_symbols() {
        let d = dictionary();
        let s = Substituter::new(&d);
        let template = "SELECT ?ANS\nWHERE {\n    ?S1 P6 #ENTIDADE_NOME# .\n    ?S1 P1 ?S2 .\n    #PADRAO#\n}\n";
        let query = s.synthesize(
            template,
            &entities(&[("ENTIDADE_NOME", "Vale")]),
        );
        assert!(!RESIDUAL_PLACEHOLDER.is_match(&query));
        assert!(query.contains("\"Vale\"@pt"));
        assert!(query.contains("?empresa rdfs:label"));
    }
}
