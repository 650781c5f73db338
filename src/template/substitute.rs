use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex_lite::{Captures, Regex};

use super::placeholders::PlaceholderMap;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("placeholder pattern is valid")
    })
}

/// Text after substitution, plus the placeholder names that had no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub unresolved: BTreeSet<String>,
}

/// Replace every `{{name}}` token with its value from `map`, in one pass.
///
/// Substituted values are never rescanned. Tokens naming an unknown
/// placeholder stay in the output verbatim and are listed in `unresolved`.
pub fn substitute(text: &str, map: &PlaceholderMap) -> Rendered {
    let mut unresolved = BTreeSet::new();
    let text = token_pattern()
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            match map.get(name) {
                Some(value) => value.to_string(),
                None => {
                    unresolved.insert(name.to_string());
                    caps[0].to_string()
                }
            }
        })
        .into_owned();
    Rendered { text, unresolved }
}

/// Placeholder names referenced by `text`, in first-seen order without repeats.
pub fn referenced_placeholders(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    token_pattern()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
