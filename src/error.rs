//! Diagnostic error types for bolsa-qa.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. The taxonomy follows the
//! failure policy of the pipeline: ingestion and store-loading errors are fatal
//! at startup, template and collaborator errors are fatal to a single request,
//! and query-execution faults are absorbed inside the store.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for bolsa-qa.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum BolsaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Nlp(#[from] NlpError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Ingestion errors (fatal at startup only)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("cannot read tabular source: {path}")]
    #[diagnostic(
        code(bolsa::ingest::source_unreadable),
        help(
            "Ingestion aborts when a configured source file is missing or unreadable. \
             Check the `registry` and `trading` paths in the configuration."
        )
    )]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {message}")]
    #[diagnostic(
        code(bolsa::ingest::csv),
        help("The file could not be parsed as CSV. Verify the delimiter and encoding.")
    )]
    Csv { path: String, message: String },

    #[error("invalid IRI derived from source key: {value}")]
    #[diagnostic(
        code(bolsa::ingest::bad_iri),
        help(
            "A normalized label still produced an invalid IRI. This indicates a bug \
             in the URI normalizer rather than bad data."
        )
    )]
    BadIri { value: String },
}

// ---------------------------------------------------------------------------
// Knowledge store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("SPARQL store error: {message}")]
    #[diagnostic(
        code(bolsa::store::backend),
        help("The embedded oxigraph store reported an internal error.")
    )]
    Backend { message: String },

    #[error("snapshot I/O error: {path}")]
    #[diagnostic(
        code(bolsa::store::snapshot_io),
        help(
            "The snapshot file could not be read or written. Check directory \
             permissions, or delete the snapshot to force a from-scratch rebuild."
        )
    )]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot decode error: {message}")]
    #[diagnostic(
        code(bolsa::store::snapshot_decode),
        help(
            "The snapshot artifact is corrupt or from an incompatible version. \
             Delete it and rebuild the graph from the tabular sources."
        )
    )]
    SnapshotDecode { message: String },

    #[error("knowledge store is not ready: {state}")]
    #[diagnostic(
        code(bolsa::store::unavailable),
        help(
            "The store must complete its loading phase before serving queries. \
             If loading failed, the process cannot serve any request."
        )
    )]
    Unavailable { state: String },
}

// ---------------------------------------------------------------------------
// Template registry errors (fatal to the request, never the process)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("query template not found: \"{id}\"")]
    #[diagnostic(
        code(bolsa::template::not_found),
        help(
            "No template file matches this identifier. Templates resolve to \
             `<id>.txt` (spaces replaced by underscores) under the templates \
             directory, falling back to the bundled set."
        )
    )]
    NotFound { id: String },

    #[error("failed to read template \"{id}\" from {path}")]
    #[diagnostic(
        code(bolsa::template::io),
        help("The template file exists but could not be read.")
    )]
    Io {
        id: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Symbol dictionary errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DictionaryError {
    #[error("cannot read symbol dictionary: {path}")]
    #[diagnostic(
        code(bolsa::dictionary::io),
        help("The configured dictionary file is missing or unreadable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("symbol dictionary parse error: {message}")]
    #[diagnostic(
        code(bolsa::dictionary::parse),
        help(
            "The dictionary must be a flat TOML table of string keys to string \
             values. Keys beginning with `prefix.` declare namespaces and keys \
             beginning with `metrica.` declare metric predicates."
        )
    )]
    Parse { message: String },
}

// ---------------------------------------------------------------------------
// NLP collaborator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum NlpError {
    #[error("NLP collaborator call failed: {message}")]
    #[diagnostic(
        code(bolsa::nlp::call),
        help(
            "The external analyzer could not be reached or exited abnormally. \
             Check the configured command or URL."
        )
    )]
    Call { message: String },

    #[error("NLP collaborator timed out after {seconds}s")]
    #[diagnostic(
        code(bolsa::nlp::timeout),
        help("Increase `nlp.timeout_secs` or investigate the analyzer process.")
    )]
    Timeout { seconds: u64 },

    #[error("NLP collaborator returned an invalid payload: {message}")]
    #[diagnostic(
        code(bolsa::nlp::payload),
        help(
            "The analyzer must produce a single JSON document with `templateId`, \
             `entities` and optional `error` fields."
        )
    )]
    Payload { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read configuration file: {path}")]
    #[diagnostic(
        code(bolsa::config::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration parse error: {message}")]
    #[diagnostic(
        code(bolsa::config::parse),
        help("The configuration must be valid TOML. {message}")
    )]
    Parse { message: String },
}

/// Convenience alias for functions returning bolsa-qa results.
pub type BolsaResult<T> = std::result::Result<T, BolsaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_error_converts_to_bolsa_error() {
        let err = TemplateError::NotFound {
            id: "Template_9".into(),
        };
        let top: BolsaError = err.into();
        assert!(matches!(
            top,
            BolsaError::Template(TemplateError::NotFound { .. })
        ));
    }

    #[test]
    fn nlp_timeout_message_names_the_deadline() {
        let err = NlpError::Timeout { seconds: 15 };
        assert!(format!("{err}").contains("15"));
    }

    #[test]
    fn store_unavailable_reports_state() {
        let err = StoreError::Unavailable {
            state: "failed".into(),
        };
        assert!(format!("{err}").contains("failed"));
    }
}
