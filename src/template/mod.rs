pub mod catalog;
pub mod parse;
pub mod placeholders;
pub mod substitute;

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{AgentcutError, Result};

pub use catalog::{list_available_templates, Catalog, LoadFailure};
pub use parse::parse_template;
pub use placeholders::{PlaceholderMap, DECLARED_KEYS, NOT_APPLICABLE};
pub use substitute::{referenced_placeholders, substitute, Rendered};

pub const DEFAULT_MODEL: &str = "sonnet";

/// Where a template came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    Builtin,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Model declared in the header, if any.
    pub model: Option<String>,
    pub triggers: Option<Vec<String>>,
    pub body: String,
    pub origin: TemplateOrigin,
}

impl Template {
    /// The declared model, else `default`, else [`DEFAULT_MODEL`]. Blank values are skipped.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        [self.model.as_deref(), Some(default)]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|model| !model.is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }
}

/// A rendered agent document, ready for the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub template_id: String,
    /// Path relative to the output root.
    pub relative_path: PathBuf,
    pub content: String,
    /// Placeholder names left unresolved in `content`.
    pub unresolved: BTreeSet<String>,
}

#[derive(Serialize)]
struct OutputHeader<'a> {
    name: &'a str,
    description: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    triggers: Option<&'a [String]>,
}

/// Output file name for a template id.
pub fn output_file_name(template_id: &str) -> String {
    format!("{template_id}.md")
}

/// Substitute `map` into a template and attach the resolved header.
///
/// The header always carries a non-blank model (see [`Template::model_or`]).
pub fn render(
    template: &Template,
    map: &PlaceholderMap,
    default_model: &str,
) -> Result<GeneratedDocument> {
    let description = substitute(&template.description, map);
    let body = substitute(&template.body, map);

    let header = OutputHeader {
        name: &template.name,
        description: &description.text,
        model: template.model_or(default_model),
        triggers: template.triggers.as_deref(),
    };
    let header = serde_yaml::to_string(&header).map_err(|source| AgentcutError::TemplateHeader {
        id: template.id.clone(),
        source,
    })?;

    let body_text = body.text.strip_prefix('\n').unwrap_or(&body.text);
    let content = format!("---\n{header}---\n\n{body_text}");

    let mut unresolved = description.unresolved;
    unresolved.extend(body.unresolved);

    Ok(GeneratedDocument {
        template_id: template.id.clone(),
        relative_path: PathBuf::from(output_file_name(&template.id)),
        content,
        unresolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{DetectedCommands, DirectoryStructure, ProjectContext, ProjectType, TechProfile};
    use pretty_assertions::assert_eq;

    fn map() -> PlaceholderMap {
        PlaceholderMap::from_context(&ProjectContext {
            project_name: "demo".to_string(),
            tech_stack: TechProfile::default(),
            commands: DetectedCommands::default(),
            directories: DirectoryStructure::default(),
            project_type: ProjectType::Library,
            has_ci: false,
            has_container: false,
        })
    }

    #[test]
    fn rendered_header_carries_resolved_model() {
        let t = parse_template(
            "helper",
            "---\ndescription: Helps {{project_name}}\n---\nHello {{project_type}}\n",
            TemplateOrigin::Builtin,
        )
        .unwrap();
        let doc = render(&t, &map(), "sonnet").unwrap();
        assert_eq!(
            doc.content,
            "---\nname: helper\ndescription: Helps demo\nmodel: sonnet\n---\n\nHello library\n"
        );
        assert_eq!(doc.relative_path, PathBuf::from("helper.md"));
        assert!(doc.unresolved.is_empty());
    }

    #[test]
    fn declared_model_and_triggers_are_kept() {
        let t = parse_template(
            "helper",
            "---\nmodel: opus\ntriggers: [review]\n---\n{{missing}}\n",
            TemplateOrigin::Builtin,
        )
        .unwrap();
        let doc = render(&t, &map(), "sonnet").unwrap();
        assert!(doc.content.contains("model: opus\n"));
        assert!(doc.content.contains("triggers:\n- review\n"));
        assert!(doc.content.ends_with("{{missing}}\n"));
        assert_eq!(doc.unresolved.iter().collect::<Vec<_>>(), vec!["missing"]);
    }

    #[test]
    fn blank_models_fall_back_to_default() {
        let t = parse_template("x", "---
description: d
---
body
", TemplateOrigin::Builtin)
            .unwrap();
        let doc = render(&t, &map(), "").unwrap();
        assert_eq!(
            doc.content,
            "---\nname: x\ndescription: d\nmodel: sonnet\n---\n\nbody\n"
        );

        let blank = Template {
            model: Some("  ".to_string()),
            ..t
        };
        assert_eq!(blank.model_or("haiku"), "haiku");
        assert_eq!(blank.model_or(" "), DEFAULT_MODEL);
    }
}
