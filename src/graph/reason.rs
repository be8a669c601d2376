//! Schema-entailment materialization over the base graph.
//!
//! A small RDFS-style forward closure, iterated to fixpoint before the graph
//! is frozen for query serving. Covered entailment rules:
//!
//! - rdfs2/rdfs3: `rdfs:domain` / `rdfs:range` type propagation
//! - rdfs5/rdfs11: `rdfs:subPropertyOf` / `rdfs:subClassOf` transitivity
//! - rdfs7: predicate propagation through `rdfs:subPropertyOf`
//! - rdfs9: instance type propagation through `rdfs:subClassOf`
//!
//! The pass runs once per from-scratch build; its output is what the snapshot
//! persists, so restarts skip the closure cost entirely.

use std::collections::{HashMap, HashSet};

use oxigraph::model::vocab::{rdf, rdfs};
use oxigraph::model::{NamedNode, Term};

use super::vocab::BaseTriple;

/// Compute the derived graph: base triples plus all entailed facts.
pub fn materialize(base: &[BaseTriple]) -> Vec<BaseTriple> {
    let mut closed: HashSet<BaseTriple> = base.iter().cloned().collect();

    loop {
        let sub_class = relation_map(&closed, rdfs::SUB_CLASS_OF.as_str());
        let sub_prop = relation_map(&closed, rdfs::SUB_PROPERTY_OF.as_str());
        let domains = relation_map(&closed, rdfs::DOMAIN.as_str());
        let ranges = relation_map(&closed, rdfs::RANGE.as_str());

        let mut inferred = Vec::new();
        for triple in &closed {
            // rdfs7: p subPropertyOf q, (s p o) => (s q o)
            if let Some(supers) = sub_prop.get(triple.predicate.as_str()) {
                for sup in supers {
                    inferred.push(BaseTriple::new(
                        triple.subject.clone(),
                        sup.clone(),
                        triple.object.clone(),
                    ));
                }
            }

            // rdfs9: (s type c), c subClassOf d => (s type d)
            if triple.predicate.as_str() == rdf::TYPE.as_str()
                && let Term::NamedNode(class) = &triple.object
                && let Some(supers) = sub_class.get(class.as_str())
            {
                for sup in supers {
                    inferred.push(BaseTriple::new(
                        triple.subject.clone(),
                        rdf::TYPE,
                        sup.clone(),
                    ));
                }
            }

            // rdfs2: p domain c, (s p o) => (s type c)
            if let Some(classes) = domains.get(triple.predicate.as_str()) {
                for class in classes {
                    inferred.push(BaseTriple::new(
                        triple.subject.clone(),
                        rdf::TYPE,
                        class.clone(),
                    ));
                }
            }

            // rdfs3: p range c, (s p o) => (o type c), for IRI objects
            if let Term::NamedNode(object) = &triple.object
                && let Some(classes) = ranges.get(triple.predicate.as_str())
            {
                for class in classes {
                    inferred.push(BaseTriple::new(object.clone(), rdf::TYPE, class.clone()));
                }
            }

            // rdfs5/rdfs11: transitivity of the two hierarchy relations
            for hierarchy in [rdfs::SUB_CLASS_OF, rdfs::SUB_PROPERTY_OF] {
                if triple.predicate.as_str() == hierarchy.as_str()
                    && let Term::NamedNode(mid) = &triple.object
                {
                    let map = if hierarchy == rdfs::SUB_CLASS_OF {
                        &sub_class
                    } else {
                        &sub_prop
                    };
                    if let Some(uppers) = map.get(mid.as_str()) {
                        for upper in uppers {
                            inferred.push(BaseTriple::new(
                                triple.subject.clone(),
                                hierarchy,
                                upper.clone(),
                            ));
                        }
                    }
                }
            }
        }

        let before = closed.len();
        closed.extend(inferred);
        if closed.len() == before {
            break;
        }
    }

    let derived = closed.len() - base.iter().collect::<HashSet<_>>().len();
    tracing::info!(base = base.len(), derived, total = closed.len(), "materialization complete");

    let mut out: Vec<BaseTriple> = closed.into_iter().collect();
    // Deterministic order keeps snapshot writes reproducible.
    out.sort_by(|a, b| {
        (a.subject.as_str(), a.predicate.as_str(), a.object.to_string()).cmp(&(
            b.subject.as_str(),
            b.predicate.as_str(),
            b.object.to_string(),
        ))
    });
    out
}

/// Index one schema relation: subject IRI -> all IRI objects.
fn relation_map<'a>(
    triples: &'a HashSet<BaseTriple>,
    predicate: &str,
) -> HashMap<&'a str, Vec<NamedNode>> {
    let mut map: HashMap<&str, Vec<NamedNode>> = HashMap::new();
    for t in triples {
        if t.predicate.as_str() == predicate
            && let Term::NamedNode(object) = &t.object
        {
            map.entry(t.subject.as_str()).or_default().push(object.clone());
        }
    }
    map
}
