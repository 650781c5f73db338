use std::path::Path;

use crate::error::Result;
use crate::template::catalog::{failure_reason, read_template_dir};
use crate::template::{referenced_placeholders, DECLARED_KEYS};

/// Result of validating a template directory.
pub struct CheckResult {
    pub template_count: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CheckResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every template in `dir`.
///
/// Unreadable files and broken headers are errors. References to
/// placeholders the engine does not define are warnings, since they are
/// rendered verbatim rather than failing generation.
pub fn check_templates(dir: &Path) -> Result<CheckResult> {
    let files = read_template_dir(dir)?;
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    for file in &files {
        let template = match &file.result {
            Ok(t) => t,
            Err(e) => {
                errors.push(format!("{}: {}", file.id, failure_reason(e)));
                continue;
            }
        };

        if template.model.is_none() {
            warnings.push(format!(
                "{}: no model declared, the configured default will be used",
                file.id
            ));
        }

        let text = format!("{}\n{}", template.description, template.body);
        for name in referenced_placeholders(&text) {
            if !DECLARED_KEYS.contains(&name.as_str()) {
                warnings.push(format!("{}: unknown placeholder {{{{{name}}}}}", file.id));
            }
        }
    }

    Ok(CheckResult {
        template_count: files.len(),
        warnings,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn clean_directory_passes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("helper.md"),
            "---\nmodel: sonnet\n---\nHelp {{project_name}} with {{test_command}}\n",
        )
        .unwrap();
        let result = check_templates(dir.path()).unwrap();
        assert_eq!(result.template_count, 1);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn reports_errors_and_warnings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.md"), "---\nmodel: [x\n---\n").unwrap();
        fs::write(dir.path().join("loose.md"), "Uses {{project_nmae}}\n").unwrap();
        let result = check_templates(dir.path()).unwrap();
        assert_eq!(result.template_count, 2);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("broken:"));
        assert_eq!(
            result.warnings,
            vec![
                "loose: no model declared, the configured default will be used".to_string(),
                "loose: unknown placeholder {{project_nmae}}".to_string(),
            ]
        );
    }

    #[test]
    fn bundled_templates_pass() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        let result = check_templates(&dir).unwrap();
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(
            result.warnings.iter().all(|w| !w.contains("unknown placeholder")),
            "{:?}",
            result.warnings
        );
    }
}
