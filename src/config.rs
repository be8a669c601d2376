//! Application configuration.
//!
//! Everything the process entry point needs to wire the pipeline together:
//! tabular source paths, snapshot location, template/dictionary overrides and
//! the NLP collaborator binding. Loadable from a TOML file with every field
//! optional; CLI flags override file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Default floor below which the post-ingestion triple count is reported as
/// suspicious. Diagnostic only; it guards against silent partial loads, not
/// correctness.
pub const DEFAULT_MIN_TRIPLES: usize = 1000;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Company/security registry CSV (read first).
    pub registry: PathBuf,
    /// Trading-record CSVs (read after the registry, possibly covering
    /// disjoint date ranges).
    pub trading: Vec<PathBuf>,
    /// Persisted derived-graph snapshot. Loaded on startup when present;
    /// written after a from-scratch build.
    pub snapshot: PathBuf,
    /// Directory of query templates. Bundled templates are used as fallback.
    pub templates_dir: Option<PathBuf>,
    /// Symbol dictionary file. The bundled dictionary is used when absent.
    pub dictionary: Option<PathBuf>,
    /// Diagnostic floor for the post-ingestion triple count.
    pub min_triples: usize,
    pub nlp: NlpConfig,
}

/// Binding for the external NLP collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NlpConfig {
    /// Subprocess binding: executable invoked with the question as argv.
    pub command: Option<String>,
    /// HTTP binding: endpoint receiving `{"question": ...}` as JSON POST.
    pub url: Option<String>,
    /// Deadline for a single collaborator call.
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("datasets/informacoes_empresas.csv"),
            trading: vec![
                PathBuf::from("datasets/dados_novos_anterior.csv"),
                PathBuf::from("datasets/dados_novos_atual.csv"),
            ],
            snapshot: PathBuf::from("datasets/graph_snapshot.json"),
            templates_dir: None,
            dictionary: None,
            min_triples: DEFAULT_MIN_TRIPLES,
            nlp: NlpConfig::default(),
        }
    }
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            command: None,
            url: None,
            timeout_secs: 15,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.min_triples, DEFAULT_MIN_TRIPLES);
        assert_eq!(cfg.trading.len(), 2);
        assert_eq!(cfg.nlp.timeout_secs, 15);
        assert!(cfg.nlp.command.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            registry = "data/empresas.csv"
            min_triples = 50

            [nlp]
            command = "python3 nlp_controller.py"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.registry, PathBuf::from("data/empresas.csv"));
        assert_eq!(cfg.min_triples, 50);
        assert_eq!(cfg.nlp.command.as_deref(), Some("python3 nlp_controller.py"));
        assert_eq!(cfg.nlp.timeout_secs, 15);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: Result<AppConfig, _> = toml::from_str("bogus_field = true");
        assert!(parsed.is_err());
    }
}
