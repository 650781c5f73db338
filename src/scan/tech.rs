use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::context::TechProfile;
use super::manifests::{declared_dependencies, Manifests};
use super::signals::SignalReader;
use super::tables::{tables, Category};
use super::ScanOptions;

/// Detect languages, frameworks, tools, package manager and build system.
pub fn detect_tech_stack(reader: &SignalReader, options: &ScanOptions) -> TechProfile {
    let t = tables();
    let manifests = Manifests::read(reader);
    let dependencies = declared_dependencies(reader, &manifests);

    let histogram = reader.extension_histogram(
        &t.known_extensions(),
        &options.exclude_set(),
        options.file_limit,
    );
    let mut file_counts: BTreeMap<String, usize> = BTreeMap::new();
    for (ext, count) in &histogram {
        if let Some(language) = t.language_for_extension(ext) {
            *file_counts.entry(language.to_string()).or_insert(0) += count;
        }
    }

    let mut languages: BTreeSet<String> = file_counts.keys().cloned().collect();
    let mut manifest_languages = Vec::new();
    for rule in &t.manifests {
        if reader.is_file(&rule.file) {
            languages.insert(rule.language.clone());
            manifest_languages.push(rule.language.as_str());
        }
    }

    let mut frameworks = BTreeSet::new();
    let mut tools = tool_labels(reader, &manifests, &dependencies);
    for dep in &dependencies {
        if let Some(rule) = t.classify_dependency(dep) {
            if rule.category == Category::Framework {
                frameworks.insert(rule.label.clone());
            }
        }
    }
    if tools.contains("TypeScript") {
        languages.insert("TypeScript".to_string());
    }
    // A label belongs to exactly one category.
    tools.retain(|tool| !frameworks.contains(tool));

    let primary_language = file_counts
        .iter()
        .fold(None::<(&String, usize)>, |best, (lang, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((lang, count)),
        })
        .map(|(lang, _)| lang.clone())
        .or_else(|| manifest_languages.first().map(|l| l.to_string()));

    let package_manager = detect_package_manager(reader, &manifests);
    let build_system = t
        .build_systems
        .iter()
        .find(|rule| reader.is_file(&rule.file))
        .map(|rule| rule.name.clone());

    debug!(
        languages = ?languages,
        frameworks = ?frameworks,
        tools = ?tools,
        "tech stack detected"
    );

    TechProfile {
        languages,
        frameworks,
        tools,
        primary_language,
        package_manager,
        build_system,
    }
}

/// Tool labels implied by dependencies, config files and `[tool.*]` sections.
pub(super) fn tool_labels(
    reader: &SignalReader,
    manifests: &Manifests,
    dependencies: &[String],
) -> BTreeSet<String> {
    let t = tables();
    let mut tools = BTreeSet::new();

    for dep in dependencies {
        if let Some(rule) = t.classify_dependency(dep) {
            if rule.category == Category::Tool {
                tools.insert(rule.label.clone());
            }
        }
    }

    for rule in &t.config_files {
        if reader.is_file(&rule.file) {
            tools.insert(rule.tool.clone());
        }
    }

    if let Some(py) = &manifests.pyproject {
        for rule in &t.pyproject_tools {
            if !py["tool"][rule.section.as_str()].is_null() {
                tools.insert(rule.tool.clone());
            }
        }
    }

    tools
}

fn detect_package_manager(reader: &SignalReader, manifests: &Manifests) -> Option<String> {
    let found = tables()
        .package_managers
        .iter()
        .find(|rule| reader.is_file(&rule.file))
        .map(|rule| rule.name.clone())?;

    // A bare pyproject.toml defaults to pip unless it declares another frontend.
    if found == "pip" {
        if let Some(py) = &manifests.pyproject {
            for frontend in ["poetry", "pdm", "hatch"] {
                if !py["tool"][frontend].is_null() {
                    return Some(frontend.to_string());
                }
            }
        }
    }
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &std::path::Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn detect(dir: &std::path::Path) -> TechProfile {
        detect_tech_stack(&SignalReader::new(dir), &ScanOptions::default())
    }

    #[test]
    fn empty_repository_has_empty_profile() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect(dir.path()), TechProfile::default());
    }

    #[test]
    fn node_frontend_profile() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{
                "name": "shop",
                "dependencies": {"react": "^18", "react-dom": "^18"},
                "devDependencies": {"typescript": "^5", "vitest": "^1", "eslint": "^9"}
            }"#,
        );
        write(dir.path(), "pnpm-lock.yaml", "");
        write(dir.path(), "src/App.tsx", "");
        write(dir.path(), "src/main.tsx", "");
        write(dir.path(), "vite.config.ts", "");

        let profile = detect(dir.path());
        assert!(profile.languages.contains("TypeScript"));
        assert!(profile.languages.contains("JavaScript"));
        assert_eq!(profile.frameworks.iter().collect::<Vec<_>>(), vec!["React"]);
        assert!(profile.tools.contains("Vitest"));
        assert!(profile.tools.contains("ESLint"));
        assert!(profile.tools.contains("Vite"));
        assert_eq!(profile.package_manager.as_deref(), Some("pnpm"));
        assert_eq!(profile.build_system.as_deref(), Some("Vite"));
        assert_eq!(profile.primary_language.as_deref(), Some("TypeScript"));
    }

    #[test]
    fn python_profile_from_pyproject_sections() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "pyproject.toml",
            "[project]\nname = \"svc\"\ndependencies = [\"fastapi\", \"torch>=2\"]\n\n[tool.ruff]\nline-length = 100\n\n[tool.poetry]\nname = \"svc\"\n",
        );
        write(dir.path(), "app/main.py", "");

        let profile = detect(dir.path());
        assert!(profile.languages.contains("Python"));
        assert!(profile.frameworks.contains("FastAPI"));
        assert!(profile.frameworks.contains("PyTorch"));
        assert!(profile.tools.contains("Ruff"));
        assert_eq!(profile.package_manager.as_deref(), Some("poetry"));
    }

    #[test]
    fn jvm_service_profile() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "pom.xml",
            "<project><dependencies>\n<dependency><groupId>org.springframework.boot</groupId><artifactId>spring-boot-starter-web</artifactId></dependency>\n</dependencies></project>\n",
        );
        write(
            dir.path(),
            "build.gradle",
            "dependencies {\n    testImplementation 'org.junit.jupiter:junit-jupiter:5.10.2'\n}\n",
        );
        write(dir.path(), "src/main/java/App.java", "");

        let profile = detect(dir.path());
        assert!(profile.languages.contains("Java"));
        assert!(profile.frameworks.contains("Spring Boot"));
        assert!(profile.tools.contains("JUnit"));
    }

    #[test]
    fn manifest_only_language_becomes_primary() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "go.mod", "module example.com/x\n");
        let profile = detect(dir.path());
        assert_eq!(profile.primary_language.as_deref(), Some("Go"));
        assert_eq!(profile.package_manager.as_deref(), Some("go modules"));
    }

    #[test]
    fn detection_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Cargo.toml", "[package]\nname = \"x\"\n\n[dependencies]\naxum = \"0.7\"\ntokio = \"1\"\n");
        write(dir.path(), "src/main.rs", "");
        write(dir.path(), "src/lib.rs", "");
        assert_eq!(detect(dir.path()), detect(dir.path()));
    }
}
