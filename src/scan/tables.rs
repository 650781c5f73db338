//! Classification tables, loaded from the embedded `tables.toml`.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::context::CommandRole;

const TABLES_TOML: &str = include_str!("tables.toml");

#[derive(Debug, Deserialize)]
pub struct Tables {
    pub test_frameworks: Vec<String>,
    pub default_excludes: Vec<String>,
    #[serde(rename = "extension")]
    pub extensions: Vec<ExtensionRule>,
    #[serde(rename = "manifest")]
    pub manifests: Vec<ManifestRule>,
    #[serde(rename = "dependency")]
    pub dependencies: Vec<DependencyRule>,
    #[serde(rename = "config_file")]
    pub config_files: Vec<ConfigFileRule>,
    #[serde(rename = "pyproject_tool")]
    pub pyproject_tools: Vec<PyprojectToolRule>,
    #[serde(rename = "package_manager")]
    pub package_managers: Vec<FileNameRule>,
    #[serde(rename = "build_system")]
    pub build_systems: Vec<FileNameRule>,
    #[serde(rename = "language")]
    pub languages: Vec<LanguageRule>,
    pub command_aliases: CommandAliases,
}

#[derive(Debug, Deserialize)]
pub struct ExtensionRule {
    pub ext: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct ManifestRule {
    pub file: String,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Framework,
    Tool,
}

/// Which project type a framework points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkKind {
    Ml,
    Api,
    Mobile,
    Frontend,
}

#[derive(Debug, Deserialize)]
pub struct DependencyRule {
    pub name: String,
    pub label: String,
    pub category: Category,
    pub kind: Option<FrameworkKind>,
    /// Only match the dependency name exactly, never as a substring.
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConfigFileRule {
    pub file: String,
    pub tool: String,
}

#[derive(Debug, Deserialize)]
pub struct PyprojectToolRule {
    pub section: String,
    pub tool: String,
}

#[derive(Debug, Deserialize)]
pub struct FileNameRule {
    pub file: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRule {
    pub name: String,
    pub naming: String,
    pub test_framework: Option<String>,
}

/// Script, task and target names recognised for each command role, in preference order.
#[derive(Debug, Deserialize)]
pub struct CommandAliases {
    pub build: Vec<String>,
    pub test: Vec<String>,
    pub lint: Vec<String>,
    pub dev: Vec<String>,
    pub type_check: Vec<String>,
    pub format: Vec<String>,
    pub deploy: Vec<String>,
    pub train: Vec<String>,
}

impl CommandAliases {
    pub fn for_role(&self, role: CommandRole) -> &[String] {
        match role {
            CommandRole::Build => &self.build,
            CommandRole::Test => &self.test,
            CommandRole::Lint => &self.lint,
            CommandRole::Dev => &self.dev,
            CommandRole::TypeCheck => &self.type_check,
            CommandRole::Format => &self.format,
            CommandRole::Deploy => &self.deploy,
            CommandRole::Train => &self.train,
        }
    }
}

/// The parsed tables. The TOML is compiled in, so a parse failure is a build defect.
pub fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| toml::from_str(TABLES_TOML).expect("embedded tables.toml must parse"))
}

impl Tables {
    /// Classify a declared dependency name.
    ///
    /// An exact name match wins outright. Otherwise the longest table name
    /// contained in the dependency is used, with ties going to the earlier row.
    pub fn classify_dependency(&self, dependency: &str) -> Option<&DependencyRule> {
        let name = dependency.trim().to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }

        if let Some(rule) = self.dependencies.iter().find(|r| r.name == name) {
            return Some(rule);
        }

        let mut best: Option<&DependencyRule> = None;
        for rule in self.dependencies.iter().filter(|r| !r.exact) {
            if !name.contains(rule.name.as_str()) {
                continue;
            }
            match best {
                Some(current) if current.name.len() >= rule.name.len() => {}
                _ => best = Some(rule),
            }
        }
        best
    }

    pub fn language_for_extension(&self, ext: &str) -> Option<&str> {
        self.extensions
            .iter()
            .find(|r| r.ext.eq_ignore_ascii_case(ext))
            .map(|r| r.language.as_str())
    }

    pub fn known_extensions(&self) -> Vec<&str> {
        self.extensions.iter().map(|r| r.ext.as_str()).collect()
    }

    pub fn framework_kind(&self, label: &str) -> Option<FrameworkKind> {
        self.dependencies
            .iter()
            .filter(|r| r.category == Category::Framework && r.label == label)
            .find_map(|r| r.kind)
    }

    pub fn language(&self, name: &str) -> Option<&LanguageRule> {
        self.languages.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn embedded_tables_parse() {
        let t = tables();
        assert!(!t.extensions.is_empty());
        assert!(!t.dependencies.is_empty());
        assert!(!t.test_frameworks.is_empty());
    }

    #[test]
    fn each_dependency_name_appears_once() {
        let t = tables();
        let mut names: Vec<&str> = t.dependencies.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len(), "duplicate dependency rows");
    }

    #[rstest]
    #[case("react", Some("React"))]
    #[case("react-dom", Some("React"))]
    #[case("react-native", Some("React Native"))]
    #[case("@remix-run/react", Some("Remix"))]
    #[case("preact", Some("Preact"))]
    #[case("@typescript-eslint/parser", Some("ESLint"))]
    #[case("typescript", Some("TypeScript"))]
    #[case("ts-jest", Some("Jest"))]
    #[case("pytest-cov", Some("pytest"))]
    #[case("Django", Some("Django"))]
    #[case("torchvision", Some("PyTorch"))]
    #[case("next", Some("Next.js"))]
    #[case("next-auth", None)]
    #[case("github.com/gin-gonic/gin", Some("Gin"))]
    #[case("flutter_test", Some("Flutter Test"))]
    #[case("spring-boot-starter-web", Some("Spring Boot"))]
    #[case("junit-jupiter", Some("JUnit"))]
    #[case("jest-junit", Some("Jest"))]
    #[case("micronaut-http-server-netty", Some("Micronaut"))]
    #[case("left-pad", None)]
    #[case("", None)]
    fn classify_dependency_picks_most_specific(
        #[case] dependency: &str,
        #[case] expected: Option<&str>,
    ) {
        let label = tables()
            .classify_dependency(dependency)
            .map(|r| r.label.as_str());
        assert_eq!(label, expected);
    }

    #[test]
    fn typescript_is_a_tool_not_a_framework() {
        let rule = tables().classify_dependency("typescript").unwrap();
        assert_eq!(rule.category, Category::Tool);
    }

    #[test]
    fn framework_kind_lookup() {
        assert_eq!(tables().framework_kind("FastAPI"), Some(FrameworkKind::Api));
        assert_eq!(tables().framework_kind("PyTorch"), Some(FrameworkKind::Ml));
        assert_eq!(tables().framework_kind("Tokio"), None);
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(tables().language_for_extension("RS"), Some("Rust"));
        assert_eq!(tables().language_for_extension("txt"), None);
    }
}
