//! Rendering of query results into user-facing answer text.

use crate::graph::vocab::B3_NS;
use crate::graph::store::{Row, UNBOUND};

/// How a multi-row result is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    /// First column across rows, joined with `", "`.
    #[default]
    List,
    /// All columns, pipe-separated, with a header and rule line.
    Table,
}

pub const NO_RESULTS: &str = "Nenhum resultado encontrado para a sua pergunta.";

/// Render result rows as answer text.
pub fn format_rows(rows: &[Row], mode: FormatMode) -> String {
    if rows.is_empty() {
        return NO_RESULTS.to_string();
    }
    if rows.len() == 1 && rows[0].len() == 1 {
        return clean_value(&rows[0][0].1);
    }
    match mode {
        FormatMode::List => {
            let values: Vec<String> = rows
                .iter()
                .filter_map(|row| row.first())
                .map(|(_, value)| clean_value(value))
                .filter(|value| !value.is_empty() && value != UNBOUND)
                .collect();
            if values.is_empty() {
                return NO_RESULTS.to_string();
            }
            values.join(", ")
        }
        FormatMode::Table => {
            let header: Vec<&str> = rows[0].iter().map(|(name, _)| name.as_str()).collect();
            let mut out = header.join(" | ");
            out.push('\n');
            out.push_str(&"-".repeat(out.len() - 1));
            for row in rows {
                out.push('\n');
                let cells: Vec<String> = row.iter().map(|(_, value)| clean_value(value)).collect();
                out.push_str(&cells.join(" | "));
            }
            out
        }
    }
}

/// Strip internal representation artifacts from a single value: the ontology
/// namespace on IRIs and any XML Schema datatype tag.
pub fn clean_value(value: &str) -> String {
    let value = value.strip_prefix(B3_NS).unwrap_or(value);
    let value = match value.find("^^<") {
        Some(pos) if value[pos..].contains("XMLSchema#") => &value[..pos],
        _ => value,
    };
    value.trim_matches('"').to_string()
}
