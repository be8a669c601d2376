//! Persisted snapshot of the derived graph.
//!
//! A self-describing JSON serialization of the full triple set (IRIs plus
//! typed/tagged literals), written once after a from-scratch build and read
//! back on the next startup to skip ingestion and materialization.

use std::path::Path;

use oxigraph::model::{Literal, NamedNode, Term};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

use super::vocab::BaseTriple;

/// Current snapshot schema version. Bumped whenever the encoding changes.
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDoc {
    version: u32,
    triples: Vec<TripleRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TripleRecord {
    s: String,
    p: String,
    o: ObjectRecord,
}

/// Tagged object encoding: an IRI, or a literal with optional datatype/lang.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ObjectRecord {
    Iri {
        value: String,
    },
    Literal {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
    },
}

/// Write the derived graph to `path`, atomically (tmp file + rename).
pub fn save(path: &Path, triples: &[BaseTriple]) -> Result<(), StoreError> {
    let doc = SnapshotDoc {
        version: FORMAT_VERSION,
        triples: triples.iter().map(encode).collect(),
    };
    let json = serde_json::to_string(&doc).map_err(|e| StoreError::SnapshotDecode {
        message: e.to_string(),
    })?;

    let io_err = |e: std::io::Error| StoreError::SnapshotIo {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;

    tracing::info!(path = %path.display(), triples = triples.len(), "snapshot written");
    Ok(())
}

/// Read a snapshot back. Returns `Ok(None)` when the file is absent or holds
/// an empty graph, so the caller falls through to a from-scratch build.
pub fn load(path: &Path) -> Result<Option<Vec<BaseTriple>>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::SnapshotIo {
                path: path.display().to_string(),
                source: e,
            });
        }
    };

    let doc: SnapshotDoc =
        serde_json::from_str(&content).map_err(|e| StoreError::SnapshotDecode {
            message: e.to_string(),
        })?;
    if doc.version != FORMAT_VERSION {
        return Err(StoreError::SnapshotDecode {
            message: format!(
                "unsupported snapshot version {} (expected {FORMAT_VERSION})",
                doc.version
            ),
        });
    }
    if doc.triples.is_empty() {
        tracing::warn!(path = %path.display(), "snapshot exists but is empty, rebuilding");
        return Ok(None);
    }

    let triples = doc
        .triples
        .into_iter()
        .map(decode)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(path = %path.display(), triples = triples.len(), "snapshot loaded");
    Ok(Some(triples))
}

fn encode(triple: &BaseTriple) -> TripleRecord {
    let o = match &triple.object {
        Term::NamedNode(n) => ObjectRecord::Iri {
            value: n.as_str().to_string(),
        },
        Term::Literal(l) => {
            // xsd:string and rdf:langString are implied by the value/lang pair.
            let datatype = match l.language() {
                Some(_) => None,
                None if l.datatype() == oxigraph::model::vocab::xsd::STRING => None,
                None => Some(l.datatype().as_str().to_string()),
            };
            ObjectRecord::Literal {
                value: l.value().to_string(),
                datatype,
                lang: l.language().map(str::to_string),
            }
        }
        other => ObjectRecord::Literal {
            value: other.to_string(),
            datatype: None,
            lang: None,
        },
    };
    TripleRecord {
        s: triple.subject.as_str().to_string(),
        p: triple.predicate.as_str().to_string(),
        o,
    }
}

fn decode(record: TripleRecord) -> Result<BaseTriple, StoreError> {
    let bad_iri = |iri: &str| StoreError::SnapshotDecode {
        message: format!("invalid IRI in snapshot: {iri}"),
    };
    let subject = NamedNode::new(&record.s).map_err(|_| bad_iri(&record.s))?;
    let predicate = NamedNode::new(&record.p).map_err(|_| bad_iri(&record.p))?;
    let object: Term = match record.o {
        ObjectRecord::Iri { value } => NamedNode::new(&value).map_err(|_| bad_iri(&value))?.into(),
        ObjectRecord::Literal { value, datatype, lang } => match (lang, datatype) {
            (Some(tag), _) => Literal::new_language_tagged_literal(value, tag)
                .map_err(|e| StoreError::SnapshotDecode {
                    message: format!("invalid language tag: {e}"),
                })?
                .into(),
            (None, Some(dt)) => {
                let dt = NamedNode::new(&dt).map_err(|_| bad_iri(&dt))?;
                Literal::new_typed_literal(value, dt).into()
            }
            (None, None) => Literal::new_simple_literal(value).into(),
        },
    };
    Ok(BaseTriple {
        subject,
        predicate,
        object,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::vocab::xsd;
    use std::collections::HashSet;

    fn sample() -> Vec<BaseTriple> {
        let s = NamedNode::new("http://example.org/PETR4").unwrap();
        let p = NamedNode::new("http://example.org/precoFechamento").unwrap();
        vec![
            BaseTriple::new(s.clone(), p.clone(), Literal::from(25.5)),
            BaseTriple::new(
                s.clone(),
                NamedNode::new("http://example.org/rotulo").unwrap(),
                Literal::new_language_tagged_literal_unchecked("Petrobras PN", "pt"),
            ),
            BaseTriple::new(
                s.clone(),
                NamedNode::new("http://example.org/data").unwrap(),
                Literal::new_typed_literal("2023-01-05", xsd::DATE),
            ),
            BaseTriple::new(s, p, NamedNode::new("http://example.org/outro").unwrap()),
        ]
    }

    #[test]
    fn round_trip_is_set_equal() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        let original = sample();

        save(&path, &original).unwrap();
        let restored = load(&path).unwrap().unwrap();

        let a: HashSet<_> = original.iter().collect();
        let b: HashSet<_> = restored.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn empty_snapshot_falls_back_to_rebuild() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        save(&path, &[]).unwrap();
        assert!(load(&path).unwrap().is_none());
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load(&path),
            Err(StoreError::SnapshotDecode { .. })
        ));
    }
}
