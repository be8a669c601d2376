//! Symbol dictionary: the second substitution pass.
//!
//! A flat TOML table of string keys to string values, partitioned by key
//! shape into four classes:
//!
//! * `prefix.<name>` declares a namespace, emitted as the `PREFIX` header of
//!   every synthesized query;
//! * `metrica.<name>` maps a metric name to its ontology predicate, resolved
//!   only through the `#VALOR_DESEJADO#` entity and never substituted as a
//!   token;
//! * `S…`/`O…`/`SO…`/`ANS…` keys name SPARQL variables, matched together
//!   with their `?` sigil;
//! * every other key is a bare token replaced by its ontology term.
//!
//! Token substitution is longest-key-first so that `S10` is never clobbered
//! by a prior `S1` rewrite, and every match is word-bounded so that `P1`
//! leaves `P12` alone.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::DictionaryError;

static VARIABLE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:SO|S|O|ANS)\d*$").expect("valid regex"));

const BUNDLED: &str = include_str!("../../data/dictionary.toml");

struct TokenRule {
    key: String,
    pattern: Regex,
    replacement: String,
}

pub struct SymbolDictionary {
    /// Namespace name (the part after `prefix.`) to IRI.
    prefixes: BTreeMap<String, String>,
    /// Full `metrica.*` key to ontology predicate.
    metrics: HashMap<String, String>,
    /// Precompiled substitution rules, longest key first.
    tokens: Vec<TokenRule>,
}

impl SymbolDictionary {
    /// Load the dictionary from `path`, or the bundled one when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, DictionaryError> {
        let text = match path {
            Some(p) => {
                std::fs::read_to_string(p).map_err(|source| DictionaryError::Io {
                    path: p.display().to_string(),
                    source,
                })?
            }
            None => BUNDLED.to_string(),
        };
        Self::parse(&text)
    }

    fn parse(text: &str) -> Result<Self, DictionaryError> {
        let table: BTreeMap<String, String> =
            toml::from_str(text).map_err(|e| DictionaryError::Parse {
                message: e.to_string(),
            })?;

        let mut prefixes = BTreeMap::new();
        let mut metrics = HashMap::new();
        let mut plain = Vec::new();
        for (key, value) in table {
            if let Some(name) = key.strip_prefix("prefix.") {
                prefixes.insert(name.to_string(), value);
            } else if key.starts_with("metrica.") {
                metrics.insert(key, value);
            } else {
                plain.push((key, value));
            }
        }

        // Longest key first; ties broken lexicographically for determinism.
        plain.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let mut tokens = Vec::with_capacity(plain.len());
        for (key, value) in plain {
            let escaped = regex::escape(&key);
            let (pattern, replacement) = if VARIABLE_KEY.is_match(&key) {
                (format!(r"\?{escaped}\b"), format!("?{value}"))
            } else {
                (format!(r"\b{escaped}\b"), value)
            };
            let pattern = Regex::new(&pattern).map_err(|e| DictionaryError::Parse {
                message: format!("key {key:?} yields an invalid pattern: {e}"),
            })?;
            tokens.push(TokenRule {
                key,
                pattern,
                replacement,
            });
        }

        Ok(Self {
            prefixes,
            metrics,
            tokens,
        })
    }

    /// Resolve a `metrica.*` key to its ontology predicate.
    pub fn metric(&self, key: &str) -> Option<&str> {
        self.metrics.get(key).map(String::as_str)
    }

    /// Rewrite every dictionary token in `query` to its ontology term.
    pub fn substitute(&self, query: &str) -> String {
        let mut out = query.to_string();
        for rule in &self.tokens {
            if rule.pattern.is_match(&out) {
                tracing::trace!(key = %rule.key, "substituting dictionary token");
                // NoExpand: replacement values are literal text, a `$` in
                // them is not a capture-group reference.
                out = rule
                    .pattern
                    .replace_all(&out, regex::NoExpand(&rule.replacement))
                    .into_owned();
            }
        }
        out
    }

    /// The `PREFIX` declarations, one per line, followed by a blank line.
    pub fn prefix_header(&self) -> String {
        let mut header = String::new();
        for (name, iri) in &self.prefixes {
            header.push_str(&format!("PREFIX {name}: <{iri}>\n"));
        }
        if !header.is_empty() {
            header.push('\n');
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(text: &str) -> SymbolDictionary {
        SymbolDictionary::parse(text).unwrap()
    }

    #[test]
    fn bundled_dictionary_parses() {
        let d = SymbolDictionary::load(None).unwrap();
        assert_eq!(d.metric("metrica.preco_fechamento"), Some("b3:precoFechamento"));
        assert!(d.prefix_header().contains("PREFIX b3:"));
    }

    #[test]
    fn longer_variable_key_wins_over_its_prefix() {
        let d = dict("S1 = \"empresa\"\nS10 = \"pregao\"\n");
        assert_eq!(d.substitute("?S10 ?S1"), "?pregao ?empresa");
    }

    #[test]
    fn bare_tokens_are_word_bounded() {
        let d = dict("P1 = \"b3:negociado\"\n");
        assert_eq!(d.substitute("?x P1 ?y . ?x P12 ?z"), "?x b3:negociado ?y . ?x P12 ?z");
    }

    #[test]
    fn variable_keys_require_the_sigil() {
        let d = dict("ANS = \"resposta\"\n");
        // Bare ANS without `?` is not a variable occurrence.
        assert_eq!(d.substitute("SELECT ?ANS # ANS"), "SELECT ?resposta # ANS");
    }

    #[test]
    fn dollar_signs_in_values_are_literal() {
        let d = dict("P1 = \"ex:price$usd\"\nS1 = \"total$brl\"\n");
        assert_eq!(d.substitute("?x P1 ?y"), "?x ex:price$usd ?y");
        assert_eq!(d.substitute("?S1"), "?total$brl");
    }

    #[test]
    fn metric_keys_are_never_token_substituted() {
        let d = dict("\"metrica.volume\" = \"b3:volumeNegociacao\"\n");
        assert_eq!(d.substitute("metrica.volume"), "metrica.volume");
        assert_eq!(d.metric("metrica.volume"), Some("b3:volumeNegociacao"));
    }

    #[test]
    fn prefix_header_is_sorted_and_spaced() {
        let d = dict(
            "\"prefix.xsd\" = \"http://www.w3.org/2001/XMLSchema#\"\n\
             \"prefix.b3\" = \"https://example.org/b3#\"\n",
        );
        assert_eq!(
            d.prefix_header(),
            "PREFIX b3: <https://example.org/b3#>\n\
             PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>\n\n"
        );
    }

    #[test]
    fn non_table_document_is_a_parse_error() {
        assert!(matches!(
            SymbolDictionary::parse("[section]\nkey = 1\n"),
            Err(DictionaryError::Parse { .. })
        ));
    }
}
