//! Knowledge graph: vocabulary, RDFS materialization, snapshot persistence
//! and the resident SPARQL store.

pub mod reason;
pub mod snapshot;
pub mod store;
pub mod vocab;
