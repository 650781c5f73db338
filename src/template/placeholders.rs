//! Placeholder values derived from a [`ProjectContext`].
//!
//! The map is built once per scan and shared by every template in a run.
//! Every declared key is always present; values that do not apply to the
//! project are rendered as [`NOT_APPLICABLE`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::scan::tables::tables;
use crate::scan::{CommandRole, DirectoryRole, ProjectContext};

pub const NOT_APPLICABLE: &str = "N/A";

/// Every placeholder name the map defines, in a stable order.
pub const DECLARED_KEYS: &[&str] = &[
    "project_name",
    "project_type",
    "languages",
    "frameworks",
    "tools",
    "tech_stack",
    "primary_language",
    "package_manager",
    "build_system",
    "build_command",
    "test_command",
    "lint_command",
    "dev_command",
    "type_check_command",
    "format_command",
    "deploy_command",
    "train_command",
    "source_dir",
    "test_dir",
    "docs_dir",
    "config_dir",
    "api_dir",
    "models_dir",
    "data_dir",
    "naming_convention",
    "test_framework",
    "has_ci",
    "has_container",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderMap {
    values: BTreeMap<String, String>,
}

impl PlaceholderMap {
    pub fn from_context(context: &ProjectContext) -> Self {
        let tech = &context.tech_stack;
        let mut values = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| {
            let value = value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| NOT_APPLICABLE.to_string());
            values.insert(key.to_string(), value);
        };

        put("project_name", Some(context.project_name.clone()));
        put("project_type", Some(context.project_type.to_string()));
        put("languages", join(tech.languages.iter()));
        put("frameworks", join(tech.frameworks.iter()));
        put("tools", join(tech.tools.iter()));
        put(
            "tech_stack",
            join(tech.languages.iter().chain(tech.frameworks.iter())),
        );
        put("primary_language", tech.primary_language.clone());
        put("package_manager", tech.package_manager.clone());
        put("build_system", tech.build_system.clone());

        for (role, command) in context.commands.iter() {
            put(&command_key(role), command.map(String::from));
        }
        for (role, dir) in context.directories.iter() {
            put(&dir_key(role), dir.map(String::from));
        }

        put("naming_convention", naming_convention(context));
        put("test_framework", test_framework(context));
        put("has_ci", Some(yes_no(context.has_ci)));
        put("has_container", Some(yes_no(context.has_container)));

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn command_key(role: CommandRole) -> String {
    format!("{}_command", role.key())
}

pub fn dir_key(role: DirectoryRole) -> String {
    format!("{}_dir", role.key())
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> Option<String> {
    let joined = items.map(String::as_str).collect::<Vec<_>>().join(", ");
    (!joined.is_empty()).then_some(joined)
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

/// Naming convention of the primary language.
fn naming_convention(context: &ProjectContext) -> Option<String> {
    let language = context.tech_stack.primary_language.as_deref()?;
    tables().language(language).map(|rule| rule.naming.clone())
}

/// First known test framework among the detected tools and frameworks,
/// falling back to the primary language's built-in runner.
fn test_framework(context: &ProjectContext) -> Option<String> {
    let tech = &context.tech_stack;
    let t = tables();
    t.test_frameworks
        .iter()
        .find(|name| tech.tools.contains(*name) || tech.frameworks.contains(*name))
        .cloned()
        .or_else(|| {
            let language = tech.primary_language.as_deref()?;
            t.language(language)?.test_framework.clone()
        })
}
