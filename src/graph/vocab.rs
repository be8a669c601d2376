//! RDF vocabulary of the stock-market ontology.
//!
//! All graph nodes live under the `B3_NS` namespace. The constants mirror the
//! class and predicate names used by the query templates, so a generated query
//! resolves against the ingested graph without any mapping layer.

use oxigraph::model::vocab::rdfs;
use oxigraph::model::{NamedNode, NamedNodeRef, Term};

/// Base namespace for every entity, class and predicate in the graph.
pub const B3_NS: &str = "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#";

// ── Classes ─────────────────────────────────────────────────────────────

pub const EMPRESA: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#Empresa");
pub const VALOR_MOBILIARIO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#Valor_Mobiliario",
);
pub const SETOR_ATUACAO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#Setor_Atuacao",
);
pub const NEGOCIADO_EM_PREGAO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#Negociado_Em_Pregao",
);
pub const PREGAO: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#Pregao");
pub const INSTRUMENTO_FINANCEIRO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#Instrumento_Financeiro",
);
pub const EVENTO_MERCADO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#Evento_Mercado",
);

// ── Predicates ──────────────────────────────────────────────────────────

pub const TICKER: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#ticker");
pub const TEM_VALOR_MOBILIARIO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#temValorMobiliarioNegociado",
);
pub const ATUA_EM: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#atuaEm");
pub const NEGOCIADO: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#negociado");
pub const NEGOCIADO_DURANTE: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#negociadoDurante",
);
pub const OCORRE_EM_DATA: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#ocorreEmData",
);
pub const PRECO_ABERTURA: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#precoAbertura",
);
pub const PRECO_FECHAMENTO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#precoFechamento",
);
pub const PRECO_MAXIMO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#precoMaximo",
);
pub const PRECO_MINIMO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#precoMinimo",
);
pub const PRECO_MEDIO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#precoMedio",
);
pub const VOLUME_NEGOCIACAO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#volumeNegociacao",
);
/// Abstract parent of the per-record numeric predicates.
pub const VALOR_NEGOCIACAO: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
    "https://dcm.ffclrp.usp.br/lssb/stock-market-ontology#valorNegociacao",
);

/// A base-graph triple before insertion into the SPARQL store.
///
/// Subjects and predicates are always IRIs in this graph; only objects may
/// be literals, so a dedicated struct is simpler than the full RDF quad
/// model during ingestion and reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseTriple {
    pub subject: NamedNode,
    pub predicate: NamedNode,
    pub object: Term,
}

impl BaseTriple {
    pub fn new(
        subject: impl Into<NamedNode>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Static RDFS schema seeding the materialization pass: class hierarchy and
/// the grouping of per-record numeric predicates under `valorNegociacao`.
pub fn schema_triples() -> Vec<BaseTriple> {
    let mut out = Vec::new();
    for class in [VALOR_MOBILIARIO] {
        out.push(BaseTriple::new(class, rdfs::SUB_CLASS_OF, INSTRUMENTO_FINANCEIRO));
    }
    for class in [PREGAO, NEGOCIADO_EM_PREGAO] {
        out.push(BaseTriple::new(class, rdfs::SUB_CLASS_OF, EVENTO_MERCADO));
    }
    for pred in [
        PRECO_ABERTURA,
        PRECO_FECHAMENTO,
        PRECO_MAXIMO,
        PRECO_MINIMO,
        PRECO_MEDIO,
        VOLUME_NEGOCIACAO,
    ] {
        out.push(BaseTriple::new(pred, rdfs::SUB_PROPERTY_OF, VALOR_NEGOCIACAO));
    }
    out.push(BaseTriple::new(NEGOCIADO, rdfs::DOMAIN, VALOR_MOBILIARIO));
    out.push(BaseTriple::new(NEGOCIADO, rdfs::RANGE, NEGOCIADO_EM_PREGAO));
    out.push(BaseTriple::new(NEGOCIADO_DURANTE, rdfs::DOMAIN, NEGOCIADO_EM_PREGAO));
    out.push(BaseTriple::new(NEGOCIADO_DURANTE, rdfs::RANGE, PREGAO));
    out.push(BaseTriple::new(TEM_VALOR_MOBILIARIO, rdfs::DOMAIN, EMPRESA));
    out.push(BaseTriple::new(TEM_VALOR_MOBILIARIO, rdfs::RANGE, VALOR_MOBILIARIO));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_live_under_the_namespace() {
        assert!(PRECO_FECHAMENTO.as_str().starts_with(B3_NS));
        assert!(EMPRESA.as_str().starts_with(B3_NS));
    }

    #[test]
    fn schema_block_covers_price_predicates() {
        let schema = schema_triples();
        let sub_props = schema
            .iter()
            .filter(|t| t.predicate.as_str() == rdfs::SUB_PROPERTY_OF.as_str())
            .count();
        assert_eq!(sub_props, 6);
    }
}
