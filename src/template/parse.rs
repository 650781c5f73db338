use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{AgentcutError, Result};

use super::{Template, TemplateOrigin};

/// The YAML front matter of a template. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct Header {
    name: Option<String>,
    description: Option<String>,
    model: Option<String>,
    triggers: Option<Triggers>,
}

/// `triggers` may be a YAML list or a single comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Triggers {
    List(Vec<String>),
    Inline(String),
}

impl Triggers {
    fn into_vec(self) -> Vec<String> {
        let raw = match self {
            Triggers::List(items) => items,
            Triggers::Inline(s) => s.split(',').map(String::from).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Split `text` into its front matter and body.
///
/// Front matter is only recognised when the very first line is `---`.
fn split_front_matter(text: &str) -> std::result::Result<(Option<&str>, &str), &'static str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return Ok((None, text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(header), body));
        }
        offset += line.len();
    }
    Err("front matter opened with '---' is never closed")
}

/// Parse raw template text. Missing header keys fall back to defaults;
/// a header that is present but not valid YAML rejects the template.
pub fn parse_template(id: &str, text: &str, origin: TemplateOrigin) -> Result<Template> {
    let (header_text, body) =
        split_front_matter(text).map_err(|reason| AgentcutError::TemplateUnreadable {
            path: origin_path(id, &origin),
            reason: reason.to_string(),
        })?;

    let header = match header_text {
        Some(h) if !h.trim().is_empty() => serde_yaml::from_str::<Option<Header>>(h)
            .map_err(|source| AgentcutError::TemplateHeader {
                id: id.to_string(),
                source,
            })?
            .unwrap_or_default(),
        _ => Header::default(),
    };

    Ok(Template {
        id: id.to_string(),
        name: header
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| id.to_string()),
        description: header
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{id} agent")),
        model: header.model.filter(|m| !m.trim().is_empty()),
        triggers: header.triggers.map(Triggers::into_vec),
        body: body.to_string(),
        origin,
    })
}

fn origin_path(id: &str, origin: &TemplateOrigin) -> PathBuf {
    match origin {
        TemplateOrigin::File(path) => path.clone(),
        TemplateOrigin::Builtin => PathBuf::from(format!("<builtin>/{id}.md")),
    }
}
