//! Resident knowledge-graph store.
//!
//! Owns the derived (materialized) graph for the process lifetime and serves
//! SPARQL execution against it. Lifecycle is a one-way state machine:
//!
//! ```text
//! Uninitialized -> Loading -> Ready     (terminal, serves queries)
//!                          -> Failed    (terminal, process cannot serve)
//! ```
//!
//! Loading holds the exclusive lock: it either restores the persisted
//! snapshot (fast path) or runs ingestion + materialization and writes the
//! snapshot for the next startup. After Ready the graph is never mutated;
//! `execute` takes the shared lock, so reads run concurrently without limit.

use std::sync::RwLock;

use oxigraph::model::{GraphNameRef, Quad, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use crate::config::AppConfig;
use crate::error::{BolsaError, StoreError};
use crate::graph::{reason, snapshot, vocab::BaseTriple};
use crate::ingest;

/// One result row: (variable name, rendered value) pairs in the order the
/// query declares its result variables.
pub type Row = Vec<(String, String)>;

/// Sentinel rendered for a variable left unbound in a row.
pub const UNBOUND: &str = "N/A";

enum StoreState {
    Uninitialized,
    Ready(Store),
    Failed,
}

impl StoreState {
    fn name(&self) -> &'static str {
        match self {
            StoreState::Uninitialized => "uninitialized",
            StoreState::Ready(_) => "ready",
            StoreState::Failed => "failed",
        }
    }
}

/// The process-wide knowledge-graph store.
pub struct KnowledgeStore {
    state: RwLock<StoreState>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::Uninitialized),
        }
    }

    /// Enter the Loading phase: snapshot fast path, or build from sources.
    ///
    /// Any failure is terminal: the store transitions to Failed and the error
    /// propagates to the process entry point. No query is ever served against
    /// a partially loaded graph.
    pub fn initialize(&self, config: &AppConfig) -> Result<(), BolsaError> {
        self.load_with(config, false)
    }

    /// Force a from-scratch build, ignoring any existing snapshot.
    pub fn rebuild(&self, config: &AppConfig) -> Result<(), BolsaError> {
        self.load_with(config, true)
    }

    fn load_with(&self, config: &AppConfig, force_rebuild: bool) -> Result<(), BolsaError> {
        let mut state = self.state.write().expect("store lock poisoned");
        if let StoreState::Ready(_) = *state
            && !force_rebuild
        {
            return Ok(());
        }

        match Self::load_graph(config, force_rebuild) {
            Ok(store) => {
                *state = StoreState::Ready(store);
                Ok(())
            }
            Err(e) => {
                *state = StoreState::Failed;
                tracing::error!("knowledge store loading failed: {e}");
                Err(e)
            }
        }
    }

    fn load_graph(config: &AppConfig, force_rebuild: bool) -> Result<Store, BolsaError> {
        if !force_rebuild
            && let Some(triples) = snapshot::load(&config.snapshot)?
        {
            return Ok(Self::freeze(&triples)?);
        }

        let report = ingest::build_base_graph(&config.registry, &config.trading)?;
        let derived = reason::materialize(&report.triples);
        if derived.len() < config.min_triples {
            tracing::warn!(
                triples = derived.len(),
                floor = config.min_triples,
                "derived graph is suspiciously small; sources may have loaded partially"
            );
        }
        snapshot::save(&config.snapshot, &derived)?;
        Ok(Self::freeze(&derived)?)
    }

    /// Insert the derived triples into a fresh SPARQL store.
    fn freeze(triples: &[BaseTriple]) -> Result<Store, StoreError> {
        let backend = |e: oxigraph::store::StorageError| StoreError::Backend {
            message: e.to_string(),
        };
        let store = Store::new().map_err(backend)?;
        for t in triples {
            let quad = Quad::new(
                t.subject.clone(),
                t.predicate.clone(),
                t.object.clone(),
                GraphNameRef::DefaultGraph,
            );
            store.insert(&quad).map_err(backend)?;
        }
        Ok(store)
    }

    /// Execute a SPARQL SELECT (or ASK) query.
    ///
    /// Rows preserve the declared result-variable order; literals render as
    /// their lexical form, nodes as their full IRI, unbound variables as
    /// [`UNBOUND`]. A syntactically invalid query or an engine fault degrades
    /// to an empty result (logged), never to a process failure.
    pub fn execute(&self, sparql: &str) -> Vec<Row> {
        let state = self.state.read().expect("store lock poisoned");
        let StoreState::Ready(store) = &*state else {
            tracing::warn!(state = state.name(), "query attempted before store is ready");
            return Vec::new();
        };

        let results = match store.query(sparql) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("SPARQL execution failed: {e}");
                return Vec::new();
            }
        };

        match results {
            QueryResults::Solutions(solutions) => {
                let variables: Vec<_> = solutions.variables().to_vec();
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = match solution {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::error!("SPARQL solution error: {e}");
                            return Vec::new();
                        }
                    };
                    let row = variables
                        .iter()
                        .map(|var| {
                            let value = solution
                                .get(var)
                                .map(render_term)
                                .unwrap_or_else(|| UNBOUND.to_string());
                            (var.as_str().to_string(), value)
                        })
                        .collect();
                    rows.push(row);
                }
                rows
            }
            QueryResults::Boolean(b) => vec![vec![("result".to_string(), b.to_string())]],
            QueryResults::Graph(_) => {
                tracing::warn!("CONSTRUCT/DESCRIBE queries are not supported");
                Vec::new()
            }
        }
    }

    /// Number of triples in the resident graph, if Ready.
    pub fn triple_count(&self) -> Option<usize> {
        let state = self.state.read().expect("store lock poisoned");
        match &*state {
            StoreState::Ready(store) => store.len().ok(),
            _ => None,
        }
    }

    /// Current lifecycle state, for diagnostics.
    pub fn state_name(&self) -> &'static str {
        self.state.read().expect("store lock poisoned").name()
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("state", &self.state_name())
            .finish()
    }
}

/// Literal -> lexical form, node -> full identifier.
fn render_term(term: &Term) -> String {
    match term {
        Term::Literal(l) => l.value().to_string(),
        Term::NamedNode(n) => n.as_str().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::vocab::{self, B3_NS};
    use oxigraph::model::vocab::rdf;
    use oxigraph::model::{Literal, NamedNode};
    use std::io::Write;

    fn ready_store() -> KnowledgeStore {
        let petr4 = NamedNode::new(format!("{B3_NS}PETR4")).unwrap();
        let rec = NamedNode::new(format!("{B3_NS}Negociado_PETR4_2023-01-05")).unwrap();
        let triples = vec![
            BaseTriple::new(petr4.clone(), rdf::TYPE, vocab::VALOR_MOBILIARIO),
            BaseTriple::new(petr4.clone(), vocab::TICKER, Literal::new_simple_literal("PETR4")),
            BaseTriple::new(petr4, vocab::NEGOCIADO, rec.clone()),
            BaseTriple::new(rec, vocab::PRECO_FECHAMENTO, Literal::from(25.5)),
        ];
        let store = KnowledgeStore::new();
        *store.state.write().unwrap() = StoreState::Ready(KnowledgeStore::freeze(&triples).unwrap());
        store
    }

    #[test]
    fn execute_before_ready_returns_empty() {
        let store = KnowledgeStore::new();
        assert!(store.execute("SELECT ?s WHERE { ?s ?p ?o }").is_empty());
        assert_eq!(store.state_name(), "uninitialized");
    }

    #[test]
    fn literal_renders_lexical_form_and_node_renders_iri() {
        let store = ready_store();
        let rows = store.execute(&format!(
            "SELECT ?rec ?valor WHERE {{ ?rec <{}> ?valor }}",
            vocab::PRECO_FECHAMENTO.as_str()
        ));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0].0, "rec");
        assert!(rows[0][0].1.starts_with(B3_NS));
        assert_eq!(rows[0][1].0, "valor");
        assert_eq!(rows[0][1].1, "25.5");
    }

    #[test]
    fn unbound_variable_renders_sentinel() {
        let store = ready_store();
        let rows = store.execute(&format!(
            "SELECT ?s ?faltando WHERE {{ ?s <{}> ?t . OPTIONAL {{ ?s <{}> ?faltando }} }}",
            vocab::TICKER.as_str(),
            vocab::OCORRE_EM_DATA.as_str()
        ));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], ("faltando".to_string(), UNBOUND.to_string()));
    }

    #[test]
    fn invalid_query_degrades_to_empty() {
        let store = ready_store();
        assert!(store.execute("SELECT WHERE THIS IS NOT SPARQL").is_empty());
    }

    #[test]
    fn ask_query_yields_boolean_row() {
        let store = ready_store();
        let rows = store.execute(&format!("ASK {{ <{B3_NS}PETR4> ?p ?o }}"));
        assert_eq!(rows, vec![vec![("result".to_string(), "true".to_string())]]);
    }

    #[test]
    fn loading_failure_is_terminal() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig {
            registry: dir.path().join("missing.csv"),
            trading: vec![],
            snapshot: dir.path().join("snap.json"),
            ..Default::default()
        };
        let store = KnowledgeStore::new();
        assert!(store.initialize(&config).is_err());
        assert_eq!(store.state_name(), "failed");
    }

    #[test]
    fn snapshot_fast_path_skips_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        // Snapshot exists; the (missing) CSV sources must never be touched.
        let s = NamedNode::new(format!("{B3_NS}VALE3")).unwrap();
        let triples = vec![BaseTriple::new(s, rdf::TYPE, vocab::VALOR_MOBILIARIO)];
        let snap = dir.path().join("snap.json");
        snapshot::save(&snap, &triples).unwrap();

        let config = AppConfig {
            registry: dir.path().join("missing.csv"),
            trading: vec![],
            snapshot: snap,
            min_triples: 0,
            ..Default::default()
        };
        let store = KnowledgeStore::new();
        store.initialize(&config).unwrap();
        assert_eq!(store.triple_count(), Some(1));
    }

    #[test]
    fn from_scratch_build_writes_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = dir.path().join("empresas.csv");
        let mut f = std::fs::File::create(&registry).unwrap();
        writeln!(f, "nome,ticker,setor").unwrap();
        writeln!(f, "Vale,VALE3,Mineração").unwrap();

        let config = AppConfig {
            registry,
            trading: vec![],
            snapshot: dir.path().join("snap.json"),
            min_triples: 0,
            ..Default::default()
        };
        let store = KnowledgeStore::new();
        store.initialize(&config).unwrap();
        assert!(config.snapshot.is_file());
        assert!(store.triple_count().unwrap() > 0);

        // A second store restores from the snapshot alone.
        let restored = KnowledgeStore::new();
        restored.initialize(&config).unwrap();
        assert_eq!(restored.triple_count(), store.triple_count());
    }
}
