//! Base-graph construction from the tabular sources.
//!
//! Two ordered passes over column-positional CSV files: the company/security
//! registry first, then one or more trading-record tables. Node identifiers
//! are deterministic functions of the source keys, so re-ingesting identical
//! sources reproduces the same triples (idempotent up to set semantics).
//!
//! A missing source file is fatal; a malformed individual row is skipped.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use oxigraph::model::vocab::{rdf, xsd};
use oxigraph::model::{Literal, NamedNode, NamedNodeRef};
use regex::Regex;

use crate::error::IngestError;
use crate::graph::vocab::{self, BaseTriple, B3_NS};
use crate::uri;

static TICKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}\d{1,2}$").expect("valid regex"));

// Column positions in the trading-record tables (fixed source layout).
const COL_DATE: usize = 1;
const COL_TICKER: usize = 3;

/// (column, predicate) pairs for the numeric trading attributes. Absent or
/// unparseable cells are omitted, never coerced to zero.
const NUMERIC_COLUMNS: [(usize, NamedNodeRef<'static>); 6] = [
    (5, vocab::PRECO_ABERTURA),
    (6, vocab::PRECO_MAXIMO),
    (7, vocab::PRECO_MINIMO),
    (8, vocab::PRECO_MEDIO),
    (11, vocab::PRECO_FECHAMENTO),
    (14, vocab::VOLUME_NEGOCIACAO),
];

/// Outcome of the full ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    pub triples: Vec<BaseTriple>,
    pub companies: usize,
    pub records: usize,
    pub skipped_rows: usize,
}

/// Build the base triple set from the registry and the trading tables.
///
/// The registry pass must run first: trading rows referencing a ticker that
/// was never registered are dropped (logged, non-fatal).
pub fn build_base_graph(
    registry: &Path,
    trading: &[impl AsRef<Path>],
) -> Result<IngestReport, IngestError> {
    let mut triples = Vec::new();
    let mut known_securities = HashMap::new();

    let companies = load_registry(registry, &mut triples, &mut known_securities)?;

    let mut records = 0;
    let mut skipped_rows = 0;
    let mut seen_sessions = HashSet::new();
    for path in trading {
        let (r, s) = load_trading_table(
            path.as_ref(),
            &known_securities,
            &mut seen_sessions,
            &mut triples,
        )?;
        records += r;
        skipped_rows += s;
    }

    triples.extend(vocab::schema_triples());

    tracing::info!(
        companies,
        records,
        skipped_rows,
        triples = triples.len(),
        "base graph built from tabular sources"
    );

    Ok(IngestReport {
        triples,
        companies,
        records,
        skipped_rows,
    })
}

/// Registry pass: one row per security, columns [company name, ticker, sector].
fn load_registry(
    path: &Path,
    triples: &mut Vec<BaseTriple>,
    known_securities: &mut HashMap<String, NamedNode>,
) -> Result<usize, IngestError> {
    let mut reader = open_csv(path)?;
    let mut companies = 0;

    for row in reader.records() {
        let row = row.map_err(|e| IngestError::Csv {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let name = row.get(0).unwrap_or("").trim();
        let ticker = row.get(1).unwrap_or("").trim();
        let sector = row.get(2).unwrap_or("").trim();
        if name.is_empty() || ticker.is_empty() {
            continue;
        }

        let company = node(&uri::normalize(name))?;
        triples.push(BaseTriple::new(company.clone(), rdf::TYPE, vocab::EMPRESA));
        triples.push(BaseTriple::new(
            company.clone(),
            oxigraph::model::vocab::rdfs::LABEL,
            Literal::new_language_tagged_literal_unchecked(name, "pt"),
        ));

        let security = node(ticker)?;
        triples.push(BaseTriple::new(
            security.clone(),
            rdf::TYPE,
            vocab::VALOR_MOBILIARIO,
        ));
        triples.push(BaseTriple::new(
            security.clone(),
            vocab::TICKER,
            Literal::new_simple_literal(ticker),
        ));
        triples.push(BaseTriple::new(
            company.clone(),
            vocab::TEM_VALOR_MOBILIARIO,
            security.clone(),
        ));

        if !sector.is_empty() {
            let sector_node = node(&uri::normalize(sector))?;
            triples.push(BaseTriple::new(
                sector_node.clone(),
                rdf::TYPE,
                vocab::SETOR_ATUACAO,
            ));
            triples.push(BaseTriple::new(
                sector_node.clone(),
                oxigraph::model::vocab::rdfs::LABEL,
                Literal::new_language_tagged_literal_unchecked(sector, "pt"),
            ));
            triples.push(BaseTriple::new(company, vocab::ATUA_EM, sector_node));
        }

        known_securities.insert(ticker.to_string(), security);
        companies += 1;
    }

    tracing::info!(path = %path.display(), companies, "registry pass complete");
    Ok(companies)
}

/// Trading pass: one row per (security, session) trading record.
fn load_trading_table(
    path: &Path,
    known_securities: &HashMap<String, NamedNode>,
    seen_sessions: &mut HashSet<String>,
    triples: &mut Vec<BaseTriple>,
) -> Result<(usize, usize), IngestError> {
    let mut reader = open_csv(path)?;
    let mut records = 0;
    let mut skipped = 0;

    for row in reader.records() {
        let row = row.map_err(|e| IngestError::Csv {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let ticker = row.get(COL_TICKER).unwrap_or("").trim();
        let Some(date) = row.get(COL_DATE).and_then(|c| parse_date(c.trim())) else {
            skipped += 1;
            continue;
        };
        if !TICKER_RE.is_match(ticker) {
            skipped += 1;
            continue;
        }

        // Referential integrity: the security must come from the registry pass.
        let Some(security) = known_securities.get(ticker) else {
            tracing::warn!(ticker, %date, "trading row references unregistered ticker, skipping");
            skipped += 1;
            continue;
        };

        let record = node(&format!("Negociado_{ticker}_{date}"))?;
        triples.push(BaseTriple::new(
            record.clone(),
            rdf::TYPE,
            vocab::NEGOCIADO_EM_PREGAO,
        ));
        triples.push(BaseTriple::new(
            security.clone(),
            vocab::NEGOCIADO,
            record.clone(),
        ));

        // Sessions are deduplicated by formatted date, not by source row.
        let session = node(&format!("Pregao_{date}"))?;
        if seen_sessions.insert(date.clone()) {
            triples.push(BaseTriple::new(session.clone(), rdf::TYPE, vocab::PREGAO));
            triples.push(BaseTriple::new(
                session.clone(),
                vocab::OCORRE_EM_DATA,
                Literal::new_typed_literal(&date, xsd::DATE),
            ));
        }
        triples.push(BaseTriple::new(
            record.clone(),
            vocab::NEGOCIADO_DURANTE,
            session,
        ));

        for (col, predicate) in NUMERIC_COLUMNS {
            if let Some(value) = row.get(col).and_then(parse_numeric) {
                triples.push(BaseTriple::new(
                    record.clone(),
                    predicate,
                    Literal::from(value),
                ));
            }
        }
        records += 1;
    }

    tracing::info!(path = %path.display(), records, skipped, "trading pass complete");
    Ok((records, skipped))
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::SourceUnreadable {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

fn node(local: &str) -> Result<NamedNode, IngestError> {
    NamedNode::new(format!("{B3_NS}{local}")).map_err(|_| IngestError::BadIri {
        value: local.to_string(),
    })
}

/// Accepts `YYYY-MM-DD` or `DD/MM/YYYY`; returns the ISO form.
fn parse_date(raw: &str) -> Option<String> {
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

    if let [y, m, d] = raw.split('-').collect::<Vec<_>>()[..]
        && y.len() == 4
        && m.len() == 2
        && d.len() == 2
        && digits(y)
        && digits(m)
        && digits(d)
    {
        return Some(format!("{y}-{m}-{d}"));
    }
    if let [d, m, y] = raw.split('/').collect::<Vec<_>>()[..]
        && y.len() == 4
        && digits(y)
        && digits(m)
        && digits(d)
        && (1..=2).contains(&m.len())
        && (1..=2).contains(&d.len())
    {
        return Some(format!("{y}-{m:0>2}-{d:0>2}"));
    }
    None
}

/// Numeric cells tolerate a decimal comma; anything unparseable is omitted.
fn parse_numeric(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
