//! Template selection.
//!
//! Automatic selection is the baseline set followed by every rule in
//! [`RULES`] whose predicate holds, in table order. A non-empty manual
//! selection replaces it entirely.

use tracing::debug;

use crate::scan::tables::{tables, FrameworkKind};
use crate::scan::{CommandRole, DirectoryRole, ProjectContext, ProjectType};
use crate::template::Catalog;

/// Always selected, whatever the project looks like.
pub const BASELINE: &[&str] = &["code-reviewer", "debugger", "documentation-writer"];

pub struct Rule {
    pub template_id: &'static str,
    pub reason: &'static str,
    pub applies: fn(&ProjectContext) -> bool,
}

pub const RULES: &[Rule] = &[
    Rule {
        template_id: "test-writer",
        reason: "a test command, test directory or test framework was found",
        applies: |ctx| {
            ctx.commands.get(CommandRole::Test).is_some()
                || ctx.directories.get(DirectoryRole::Test).is_some()
                || has_test_framework(ctx)
        },
    },
    Rule {
        template_id: "api-designer",
        reason: "the project serves an API",
        applies: |ctx| {
            ctx.project_type == ProjectType::Api || has_framework_kind(ctx, FrameworkKind::Api)
        },
    },
    Rule {
        template_id: "ml-engineer",
        reason: "machine learning frameworks or a training command were found",
        applies: |ctx| ctx.project_type == ProjectType::Ml,
    },
    Rule {
        template_id: "mobile-developer",
        reason: "a mobile framework was found",
        applies: |ctx| {
            ctx.project_type == ProjectType::Mobile || has_framework_kind(ctx, FrameworkKind::Mobile)
        },
    },
    Rule {
        template_id: "frontend-developer",
        reason: "a frontend framework was found",
        applies: |ctx| {
            ctx.project_type == ProjectType::Frontend
                || has_framework_kind(ctx, FrameworkKind::Frontend)
        },
    },
    Rule {
        template_id: "library-maintainer",
        reason: "the project is a library",
        applies: |ctx| ctx.project_type == ProjectType::Library,
    },
    Rule {
        template_id: "ci-engineer",
        reason: "CI configuration is present",
        applies: |ctx| ctx.has_ci,
    },
    Rule {
        template_id: "container-specialist",
        reason: "container configuration is present",
        applies: |ctx| ctx.has_container,
    },
    Rule {
        template_id: "code-quality",
        reason: "a lint or format command was found",
        applies: |ctx| {
            ctx.commands.get(CommandRole::Lint).is_some()
                || ctx.commands.get(CommandRole::Format).is_some()
        },
    },
    Rule {
        template_id: "type-checker",
        reason: "a type-check command was found",
        applies: |ctx| ctx.commands.get(CommandRole::TypeCheck).is_some(),
    },
    Rule {
        template_id: "data-engineer",
        reason: "a data directory is present",
        applies: |ctx| ctx.directories.get(DirectoryRole::Data).is_some(),
    },
    Rule {
        template_id: "deployment-engineer",
        reason: "a deploy command was found",
        applies: |ctx| ctx.commands.get(CommandRole::Deploy).is_some(),
    },
];

fn has_framework_kind(ctx: &ProjectContext, kind: FrameworkKind) -> bool {
    let t = tables();
    ctx.tech_stack
        .frameworks
        .iter()
        .any(|label| t.framework_kind(label) == Some(kind))
}

fn has_test_framework(ctx: &ProjectContext) -> bool {
    let tech = &ctx.tech_stack;
    tables()
        .test_frameworks
        .iter()
        .any(|name| tech.tools.contains(name) || tech.frameworks.contains(name))
}

/// Rules whose predicate holds for `context`, in table order.
pub fn matching_rules(context: &ProjectContext) -> impl Iterator<Item = &'static Rule> + '_ {
    RULES.iter().filter(move |rule| (rule.applies)(context))
}

/// Template ids chosen for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Ids present in the catalog, in selection order.
    pub ids: Vec<String>,
    /// Ids that were selected but are not in the catalog.
    pub missing: Vec<String>,
}

/// Automatic selection without consulting a catalog.
pub fn automatic(context: &ProjectContext) -> Vec<String> {
    let mut ids: Vec<String> = BASELINE.iter().map(|id| id.to_string()).collect();
    for rule in matching_rules(context) {
        if !ids.iter().any(|id| id == rule.template_id) {
            ids.push(rule.template_id.to_string());
        }
    }
    ids
}

/// Choose templates for `context`.
///
/// A non-empty `manual` list is authoritative: it is used as given (trimmed,
/// duplicates dropped) and no automatic id is added back.
pub fn select(context: &ProjectContext, manual: Option<&[String]>, catalog: &Catalog) -> Selection {
    let requested = match manual.map(normalize).filter(|ids| !ids.is_empty()) {
        Some(ids) => {
            debug!(?ids, "using manual selection");
            ids
        }
        None => automatic(context),
    };

    let (ids, missing): (Vec<String>, Vec<String>) =
        requested.into_iter().partition(|id| catalog.contains(id));
    Selection { ids, missing }
}

fn normalize(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !out.iter().any(|seen| seen == id) {
            out.push(id.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{DetectedCommands, DirectoryStructure, TechProfile};
    use pretty_assertions::assert_eq;

    fn context() -> ProjectContext {
        ProjectContext {
            project_name: "demo".to_string(),
            tech_stack: TechProfile::default(),
            commands: DetectedCommands::default(),
            directories: DirectoryStructure::default(),
            project_type: ProjectType::General,
            has_ci: false,
            has_container: false,
        }
    }

    fn ids(selection: &Selection) -> Vec<&str> {
        selection.ids.iter().map(String::as_str).collect()
    }

    #[test]
    fn rule_ids_are_unique_and_exist() {
        let catalog = Catalog::builtin();
        let mut seen = Vec::new();
        for id in BASELINE.iter().chain(RULES.iter().map(|r| &r.template_id)) {
            assert!(catalog.contains(id), "{id} is not a built-in template");
            assert!(!seen.contains(id), "{id} listed twice");
            seen.push(*id);
        }
    }

    #[test]
    fn general_project_gets_baseline_only() {
        let selection = select(&context(), None, &Catalog::builtin());
        assert_eq!(ids(&selection), BASELINE.to_vec());
        assert!(selection.missing.is_empty());
    }

    #[test]
    fn test_script_and_directory_add_test_writer() {
        let mut ctx = context();
        ctx.commands.offer(CommandRole::Test, "pytest -v");
        ctx.directories.set_if_absent(DirectoryRole::Test, "tests");
        let selection = select(&ctx, None, &Catalog::builtin());
        assert_eq!(
            ids(&selection),
            vec!["code-reviewer", "debugger", "documentation-writer", "test-writer"]
        );
    }

    #[test]
    fn rules_follow_table_order() {
        let mut ctx = context();
        ctx.has_container = true;
        ctx.has_ci = true;
        ctx.project_type = ProjectType::Library;
        ctx.commands.offer(CommandRole::Lint, "ruff check .");
        let auto = automatic(&ctx);
        assert_eq!(
            &auto[BASELINE.len()..],
            &["library-maintainer", "ci-engineer", "container-specialist", "code-quality"]
        );
    }

    #[test]
    fn manual_selection_replaces_automatic() {
        let mut ctx = context();
        ctx.has_ci = true;
        let manual = vec!["debugger".to_string()];
        let selection = select(&ctx, Some(&manual), &Catalog::builtin());
        assert_eq!(ids(&selection), vec!["debugger"]);
    }

    #[test]
    fn manual_selection_is_deduplicated_and_reports_unknown_ids() {
        let manual = vec![
            " test-writer ".to_string(),
            "nope".to_string(),
            "test-writer".to_string(),
        ];
        let selection = select(&context(), Some(&manual), &Catalog::builtin());
        assert_eq!(ids(&selection), vec!["test-writer"]);
        assert_eq!(selection.missing, vec!["nope".to_string()]);
    }

    #[test]
    fn empty_manual_selection_falls_back_to_automatic() {
        let manual = vec!["  ".to_string()];
        let selection = select(&context(), Some(&manual), &Catalog::builtin());
        assert_eq!(ids(&selection), BASELINE.to_vec());
    }

    #[test]
    fn ml_project_selects_ml_engineer() {
        let mut ctx = context();
        ctx.project_type = ProjectType::Ml;
        ctx.tech_stack.frameworks.insert("PyTorch".to_string());
        assert!(automatic(&ctx).contains(&"ml-engineer".to_string()));
    }

    #[test]
    fn frontend_api_directory_does_not_add_api_designer() {
        let mut ctx = context();
        ctx.project_type = ProjectType::Frontend;
        ctx.tech_stack.frameworks.insert("React".to_string());
        ctx.directories.set_if_absent(DirectoryRole::Api, "src/api");
        let auto = automatic(&ctx);
        assert!(!auto.contains(&"api-designer".to_string()));
        assert!(auto.contains(&"frontend-developer".to_string()));
    }

    #[test]
    fn selection_is_stable() {
        let mut ctx = context();
        ctx.has_ci = true;
        ctx.directories.set_if_absent(DirectoryRole::Data, "data");
        assert_eq!(automatic(&ctx), automatic(&ctx));
    }
}
