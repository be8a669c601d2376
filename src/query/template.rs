//! Query-template registry.
//!
//! A template is a SPARQL skeleton with `#KEY#` placeholders and dictionary
//! tokens. Identifiers map to files by replacing spaces with underscores and
//! appending `.txt`. A configured directory overrides the bundled set.

use std::path::{Path, PathBuf};

use crate::error::TemplateError;

/// Templates compiled into the binary, used when no directory is configured
/// or when the directory has no file for the identifier.
const BUNDLED: &[(&str, &str)] = &[
    ("Template_1", include_str!("../../data/templates/Template_1.txt")),
    ("Template_2A", include_str!("../../data/templates/Template_2A.txt")),
    ("Template_3", include_str!("../../data/templates/Template_3.txt")),
    ("Template_4A", include_str!("../../data/templates/Template_4A.txt")),
];

pub struct TemplateRegistry {
    dir: Option<PathBuf>,
}

impl TemplateRegistry {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// File name for a template identifier.
    fn file_name(id: &str) -> String {
        format!("{}.txt", id.replace(' ', "_"))
    }

    /// Fetch the template body for `id`.
    pub fn fetch(&self, id: &str) -> Result<String, TemplateError> {
        let name = Self::file_name(id);

        if let Some(dir) = &self.dir {
            let path = dir.join(&name);
            match std::fs::read_to_string(&path) {
                Ok(body) => return Ok(body),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(TemplateError::Io {
                        id: id.to_string(),
                        path: path.display().to_string(),
                        source,
                    });
                }
            }
        }

        BUNDLED
            .iter()
            .find(|(bundled_id, _)| Self::file_name(bundled_id) == name)
            .map(|(_, body)| body.to_string())
            .ok_or_else(|| TemplateError::NotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bundled_template_resolves() {
        let registry = TemplateRegistry::new(None);
        let body = registry.fetch("Template_1").unwrap();
        assert!(body.contains("#ENTIDADE_NOME#"));
    }

    #[test]
    fn spaces_in_identifier_map_to_underscores() {
        let registry = TemplateRegistry::new(None);
        assert_eq!(
            registry.fetch("Template 1").unwrap(),
            registry.fetch("Template_1").unwrap()
        );
    }

    #[test]
    fn unknown_identifier_is_not_found() {
        let registry = TemplateRegistry::new(None);
        assert!(matches!(
            registry.fetch("Template_99"),
            Err(TemplateError::NotFound { .. })
        ));
    }

    #[test]
    fn directory_overrides_bundled_set() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut f = std::fs::File::create(dir.path().join("Template_1.txt")).unwrap();
        writeln!(f, "SELECT ?x WHERE {{ ?x ?y ?z }}").unwrap();

        let registry = TemplateRegistry::new(Some(dir.path().to_path_buf()));
        assert!(registry.fetch("Template_1").unwrap().starts_with("SELECT ?x"));
        // Identifiers absent from the directory still hit the bundled set.
        assert!(registry.fetch("Template_3").unwrap().contains("#ENTIDADE_NOME#"));
    }
}
