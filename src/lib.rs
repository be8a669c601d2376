//! # bolsa-qa
//!
//! Natural-language question answering over a B3 stock-market knowledge
//! graph.
//!
//! ## Architecture
//!
//! - **Ingestion** (`ingest`): column-positional CSV sources (company
//!   registry + daily trading tables) into a base triple set
//! - **Knowledge graph** (`graph`): RDFS materialization, JSON snapshot
//!   persistence, and a resident oxigraph SPARQL store
//! - **Query synthesis** (`query`): templates with `#KEY#` placeholders,
//!   a symbol dictionary, and the two-pass substitution engine
//! - **Language analysis** (`nlp`): external collaborator behind a trait,
//!   bound as a subprocess or an HTTP endpoint
//! - **Pipeline** (`pipeline`): question in, formatted answer out, with
//!   every failure contained behind a stable user-facing message
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use bolsa_qa::config::AppConfig;
//! use bolsa_qa::graph::store::KnowledgeStore;
//!
//! let config = AppConfig::default();
//! let store = Arc::new(KnowledgeStore::new());
//! store.initialize(&config).unwrap();
//! let rows = store.execute("SELECT ?s WHERE { ?s ?p ?o } LIMIT 10");
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod graph;
pub mod ingest;
pub mod nlp;
pub mod pipeline;
pub mod query;
pub mod uri;
