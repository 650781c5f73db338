use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{AgentcutError, Result};

use super::parse::parse_template;
use super::{Template, TemplateOrigin};

macro_rules! builtin {
    ($id:literal) => {
        ($id, include_str!(concat!("../../templates/", $id, ".md")))
    };
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    builtin!("api-designer"),
    builtin!("ci-engineer"),
    builtin!("code-quality"),
    builtin!("code-reviewer"),
    builtin!("container-specialist"),
    builtin!("data-engineer"),
    builtin!("debugger"),
    builtin!("deployment-engineer"),
    builtin!("documentation-writer"),
    builtin!("frontend-developer"),
    builtin!("library-maintainer"),
    builtin!("ml-engineer"),
    builtin!("mobile-developer"),
    builtin!("test-writer"),
    builtin!("type-checker"),
];

/// A template that could not be loaded. Other templates are unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub id: String,
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// All templates available to a run, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: BTreeMap<String, Template>,
    failures: Vec<LoadFailure>,
}

impl Catalog {
    /// The templates compiled into the binary.
    pub fn builtin() -> Self {
        let mut catalog = Catalog::default();
        for (id, text) in BUILTIN_TEMPLATES {
            match parse_template(id, text, TemplateOrigin::Builtin) {
                Ok(template) => {
                    catalog.templates.insert(id.to_string(), template);
                }
                Err(e) => catalog.failures.push(LoadFailure {
                    id: id.to_string(),
                    path: None,
                    reason: e.to_string(),
                }),
            }
        }
        catalog
    }

    /// Built-in templates, overridden by every `*.md` file in `templates_dir`.
    ///
    /// A file that cannot be used is recorded as a [`LoadFailure`] and its id
    /// is withdrawn from the catalog, so a broken override never silently
    /// falls back to the built-in.
    pub fn load(templates_dir: Option<&Path>) -> Result<Self> {
        let mut catalog = Self::builtin();
        let Some(dir) = templates_dir else {
            return Ok(catalog);
        };

        for loaded in read_template_dir(dir)? {
            match loaded.result {
                Ok(template) => {
                    debug!(id = %loaded.id, path = %loaded.path.display(), "loaded template override");
                    catalog.templates.insert(loaded.id, template);
                }
                Err(e) => {
                    warn!(id = %loaded.id, error = %e, "skipping template");
                    catalog.templates.remove(&loaded.id);
                    catalog.failures.push(LoadFailure {
                        id: loaded.id,
                        path: Some(loaded.path),
                        reason: failure_reason(&e),
                    });
                }
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Templates sorted by id.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn failure(&self, id: &str) -> Option<&LoadFailure> {
        self.failures.iter().rev().find(|f| f.id == id)
    }
}

/// One `*.md` file from a template directory, parsed or not.
pub struct LoadedFile {
    pub id: String,
    pub path: PathBuf,
    pub result: Result<Template>,
}

/// Parse every `*.md` file directly inside `dir`, in file-name order.
pub fn read_template_dir(dir: &Path) -> Result<Vec<LoadedFile>> {
    if !dir.is_dir() {
        return Err(AgentcutError::TemplatesDirMissing {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("md")
        {
            continue;
        }
        let Some(id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let result = load_file(&id, path);
        files.push(LoadedFile {
            id,
            path: path.to_path_buf(),
            result,
        });
    }
    Ok(files)
}

fn load_file(id: &str, path: &Path) -> Result<Template> {
    let bytes = std::fs::read(path).map_err(|e| AgentcutError::TemplateUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if content_inspector::inspect(&bytes).is_binary() {
        return Err(AgentcutError::TemplateUnreadable {
            path: path.to_path_buf(),
            reason: "binary content".to_string(),
        });
    }
    let text = String::from_utf8(bytes).map_err(|_| AgentcutError::TemplateUnreadable {
        path: path.to_path_buf(),
        reason: "not valid UTF-8".to_string(),
    })?;
    parse_template(id, &text, TemplateOrigin::File(path.to_path_buf()))
}

/// The error message with its YAML cause, if any.
pub fn failure_reason(error: &AgentcutError) -> String {
    match error {
        AgentcutError::TemplateHeader { source, .. } => format!("{error}: {source}"),
        other => other.to_string(),
    }
}

/// The templates a host UI can offer, sorted by id, plus load failures.
pub fn list_available_templates(templates_dir: Option<&Path>) -> Result<Catalog> {
    Catalog::load(templates_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn builtin_catalog_loads_cleanly() {
        let catalog = Catalog::builtin();
        assert!(catalog.failures().is_empty(), "{:?}", catalog.failures());
        assert_eq!(catalog.templates().count(), BUILTIN_TEMPLATES.len());
    }

    #[test]
    fn builtin_templates_use_only_declared_placeholders() {
        for template in Catalog::builtin().templates() {
            for name in super::super::referenced_placeholders(&template.body) {
                assert!(
                    super::super::DECLARED_KEYS.contains(&name.as_str()),
                    "{} references undeclared {{{{{name}}}}}",
                    template.id
                );
            }
        }
    }

    #[test]
    fn templates_are_sorted_by_id() {
        let catalog = Catalog::builtin();
        let ids: Vec<&str> = catalog.templates().map(|t| t.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn directory_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("debugger.md"),
            "---\nmodel: opus\n---\nCustom debugger for {{project_name}}\n",
        )
        .unwrap();
        fs::write(dir.path().join("release-notes.md"), "Notes\n").unwrap();
        fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let catalog = Catalog::load(Some(dir.path())).unwrap();
        let debugger = catalog.get("debugger").unwrap();
        assert_eq!(debugger.model.as_deref(), Some("opus"));
        assert!(matches!(debugger.origin, TemplateOrigin::File(_)));
        assert!(catalog.contains("release-notes"));
        assert!(!catalog.contains("README"));
    }

    #[test]
    fn broken_files_are_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("debugger.md"), "---\nmodel: [oops\n---\n").unwrap();
        fs::write(dir.path().join("blob.md"), [0u8, 159, 146, 150, 0, 1]).unwrap();

        let catalog = Catalog::load(Some(dir.path())).unwrap();
        assert!(!catalog.contains("debugger"));
        assert!(!catalog.contains("blob"));
        assert!(catalog.contains("code-reviewer"));
        let ids: Vec<&str> = catalog.failures().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["blob", "debugger"]);
        assert!(catalog.failure("debugger").unwrap().reason.contains("front matter"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(Some(&dir.path().join("absent"))).unwrap_err();
        assert!(matches!(err, AgentcutError::TemplatesDirMissing { .. }));
    }
}
