//! Label-to-identifier normalization for graph node IRIs.
//!
//! Free-text labels from the tabular sources (company names, sector names)
//! become the local part of a node IRI. The mapping must be deterministic
//! across process runs so that re-ingesting the same sources yields the same
//! node identifiers.

use unicode_normalization::UnicodeNormalization;

/// Normalize a free-text label into an identifier-safe local name.
///
/// NFD-decomposes the input, drops combining marks (so "São Paulo" and
/// "Sao Paulo" coincide), drops everything outside `[A-Za-z0-9_ -]`, and
/// collapses runs of whitespace and hyphens into a single underscore.
///
/// Pure and total: never fails, same input always yields the same output.
/// Two distinct labels can normalize to the same identifier; this collision
/// is a known limitation and is not defended against.
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '-'))
        .collect();

    let mut out = String::with_capacity(stripped.len());
    let mut pending_separator = false;
    for c in stripped.chars() {
        if c == ' ' || c == '-' {
            if !out.is_empty() {
                pending_separator = true;
            }
        } else {
            if pending_separator {
                out.push('_');
                pending_separator = false;
            }
            out.push(c);
        }
    }
    out
}

/// Unicode combining diacritical marks (the blocks stripped after NFD).
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' | '\u{20D0}'..='\u{20FF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize("Petróleo Brasileiro"), "Petroleo_Brasileiro");
        assert_eq!(normalize("Usinas Siderúrgicas"), "Usinas_Siderurgicas");
    }

    #[test]
    fn collapses_whitespace_and_hyphens() {
        assert_eq!(normalize("  Companhia   Vale - do Rio  "), "Companhia_Vale_do_Rio");
    }

    #[test]
    fn drops_unsafe_characters() {
        assert_eq!(normalize("Gerdau S.A."), "Gerdau_SA");
        assert_eq!(normalize("B3 (Bolsa)"), "B3_Bolsa");
    }

    #[test]
    fn stable_across_calls() {
        let a = normalize("Itaú Unibanco");
        let b = normalize("Itaú Unibanco");
        assert_eq!(a, b);
        assert_eq!(a, "Itau_Unibanco");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn distinct_labels_may_collide() {
        // Documented limitation: accent-only differences collapse.
        assert_eq!(normalize("Sao Paulo"), normalize("São Paulo"));
    }
}
