//! Parsed manifest files shared by the detectors.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::Value;

use super::signals::{Format, SignalReader};

const REQUIREMENTS_FILES: &[&str] = &[
    "requirements.txt",
    "requirements-dev.txt",
    "dev-requirements.txt",
];

const GRADLE_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];

/// Structured manifests of a repository, each `None` when absent or malformed.
#[derive(Debug, Default)]
pub struct Manifests {
    pub package_json: Option<Value>,
    pub pyproject: Option<Value>,
    pub pipfile: Option<Value>,
    pub cargo: Option<Value>,
    pub composer: Option<Value>,
    pub pubspec: Option<Value>,
    pub deno: Option<Value>,
}

impl Manifests {
    pub fn read(reader: &SignalReader) -> Self {
        Self {
            package_json: reader.read_structured("package.json", Format::Json),
            pyproject: reader.read_structured("pyproject.toml", Format::Toml),
            pipfile: reader.read_structured("Pipfile", Format::Toml),
            cargo: reader.read_structured("Cargo.toml", Format::Toml),
            composer: reader.read_structured("composer.json", Format::Json),
            pubspec: reader.read_structured("pubspec.yaml", Format::Yaml),
            deno: reader
                .read_structured("deno.json", Format::Json)
                .or_else(|| reader.read_structured("deno.jsonc", Format::Json)),
        }
    }
}

/// Every dependency name the repository declares, in manifest order.
pub fn declared_dependencies(reader: &SignalReader, manifests: &Manifests) -> Vec<String> {
    let mut deps = Vec::new();

    if let Some(pkg) = &manifests.package_json {
        for section in [
            "dependencies",
            "devDependencies",
            "peerDependencies",
            "optionalDependencies",
        ] {
            deps.extend(object_keys(&pkg[section]));
        }
    }

    if let Some(py) = &manifests.pyproject {
        deps.extend(requirement_names(&py["project"]["dependencies"]));
        if let Some(groups) = py["project"]["optional-dependencies"].as_object() {
            for group in groups.values() {
                deps.extend(requirement_names(group));
            }
        }
        if let Some(groups) = py["dependency-groups"].as_object() {
            for group in groups.values() {
                deps.extend(requirement_names(group));
            }
        }
        let poetry = &py["tool"]["poetry"];
        deps.extend(object_keys(&poetry["dependencies"]).filter(|k| k != "python"));
        deps.extend(object_keys(&poetry["dev-dependencies"]));
        if let Some(groups) = poetry["group"].as_object() {
            for group in groups.values() {
                deps.extend(object_keys(&group["dependencies"]));
            }
        }
    }

    for file in REQUIREMENTS_FILES {
        if let Some(content) = reader.read_text(file) {
            deps.extend(content.lines().filter_map(requirement_line_name));
        }
    }

    if let Some(pipfile) = &manifests.pipfile {
        deps.extend(object_keys(&pipfile["packages"]));
        deps.extend(object_keys(&pipfile["dev-packages"]));
    }

    if let Some(cargo) = &manifests.cargo {
        for section in ["dependencies", "dev-dependencies", "build-dependencies"] {
            deps.extend(object_keys(&cargo[section]));
        }
        deps.extend(object_keys(&cargo["workspace"]["dependencies"]));
    }

    if let Some(content) = reader.read_text("go.mod") {
        deps.extend(go_requirements(&content));
    }

    if let Some(content) = reader.read_text("Gemfile") {
        deps.extend(gem_names(&content));
    }

    if let Some(composer) = &manifests.composer {
        for section in ["require", "require-dev"] {
            deps.extend(
                object_keys(&composer[section]).filter(|k| k != "php" && !k.starts_with("ext-")),
            );
        }
    }

    if let Some(pubspec) = &manifests.pubspec {
        deps.extend(object_keys(&pubspec["dependencies"]));
        deps.extend(object_keys(&pubspec["dev_dependencies"]));
    }

    if let Some(content) = reader.read_text("setup.py") {
        deps.extend(setup_py_requirements(&content));
    }

    if let Some(content) = reader.read_text("pom.xml") {
        deps.extend(pom_artifacts(&content));
    }

    for file in GRADLE_FILES {
        if let Some(content) = reader.read_text(file) {
            deps.extend(gradle_artifacts(&content));
        }
    }

    deps
}

/// The project name declared by the first manifest that has one.
pub fn declared_name(manifests: &Manifests) -> Option<String> {
    [
        manifests.package_json.as_ref().map(|v| &v["name"]),
        manifests.cargo.as_ref().map(|v| &v["package"]["name"]),
        manifests.pyproject.as_ref().map(|v| &v["project"]["name"]),
        manifests
            .pyproject
            .as_ref()
            .map(|v| &v["tool"]["poetry"]["name"]),
        manifests.composer.as_ref().map(|v| &v["name"]),
        manifests.pubspec.as_ref().map(|v| &v["name"]),
    ]
    .into_iter()
    .flatten()
    .filter_map(|v| v.as_str())
    .map(str::trim)
    .find(|name| !name.is_empty())
    .map(String::from)
}

fn object_keys(value: &Value) -> impl Iterator<Item = String> + '_ {
    value
        .as_object()
        .into_iter()
        .flat_map(|map| map.keys().cloned())
}

fn requirement_names(value: &Value) -> impl Iterator<Item = String> + '_ {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(requirement_line_name)
}

/// Extract the distribution name from a PEP 508 requirement line.
fn requirement_line_name(line: &str) -> Option<String> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() || line.starts_with('-') {
        return None;
    }
    let end = line
        .find(|c: char| " <>=!~;[(@".contains(c))
        .unwrap_or(line.len());
    let name = line[..end].trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_ascii_lowercase().replace('_', "-"))
}

fn go_requirements(content: &str) -> Vec<String> {
    let mut modules = Vec::new();
    let mut in_block = false;
    for line in content.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        if in_block {
            if line == ")" {
                in_block = false;
            } else if let Some(module) = line.split_whitespace().next() {
                modules.push(module.to_string());
            }
        } else if line == "require (" {
            in_block = true;
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some(module) = rest.split_whitespace().next() {
                modules.push(module.to_string());
            }
        }
    }
    modules
}

fn gem_names(content: &str) -> Vec<String> {
    static GEM: OnceLock<Regex> = OnceLock::new();
    let re = GEM.get_or_init(|| {
        Regex::new(r#"^\s*gem\s+['"]([^'"]+)['"]"#).expect("gem pattern is valid")
    });
    content
        .lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Requirement names from the `install_requires`, `tests_require` and
/// `setup_requires` lists of a `setup.py`.
fn setup_py_requirements(content: &str) -> Vec<String> {
    static LIST: OnceLock<Regex> = OnceLock::new();
    static STRING: OnceLock<Regex> = OnceLock::new();
    let list = LIST.get_or_init(|| {
        Regex::new(r"(?s)(?:install_requires|tests_require|setup_requires)\s*=\s*\[(.*?)\]")
            .expect("setup.py list pattern is valid")
    });
    let string = STRING
        .get_or_init(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("string pattern is valid"));
    list.captures_iter(content)
        .flat_map(|caps| {
            string
                .captures_iter(caps.get(1).map_or("", |m| m.as_str()))
                .filter_map(|s| requirement_line_name(&s[1]))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `artifactId`s of every `<dependency>` in a Maven POM, managed ones included.
fn pom_artifacts(content: &str) -> Vec<String> {
    static DEPENDENCY: OnceLock<Regex> = OnceLock::new();
    static ARTIFACT: OnceLock<Regex> = OnceLock::new();
    let dependency = DEPENDENCY.get_or_init(|| {
        Regex::new(r"(?s)<dependency>(.*?)</dependency>").expect("pom dependency pattern is valid")
    });
    let artifact = ARTIFACT.get_or_init(|| {
        Regex::new(r"<artifactId>\s*([^<\s]+)\s*</artifactId>")
            .expect("pom artifact pattern is valid")
    });
    dependency
        .captures_iter(content)
        .filter_map(|caps| {
            let block = caps.get(1)?.as_str();
            artifact.captures(block).map(|a| a[1].to_string())
        })
        .collect()
}

/// Artifact names of `group:artifact[:version]` coordinates in a Gradle
/// build script, Groovy or Kotlin DSL.
fn gradle_artifacts(content: &str) -> Vec<String> {
    static COORDINATE: OnceLock<Regex> = OnceLock::new();
    let re = COORDINATE.get_or_init(|| {
        Regex::new(
            r#"^\s*(?:implementation|api|compileOnly|runtimeOnly|testImplementation|testCompileOnly|testRuntimeOnly|annotationProcessor|developmentOnly|kapt|ksp)\s*\(?\s*(?:platform\s*\(\s*)?['"]([^'":\s]+):([^'":\s]+)"#,
        )
        .expect("gradle coordinate pattern is valid")
    });
    content
        .lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| caps[2].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    #[rstest]
    #[case("requests>=2.0", Some("requests"))]
    #[case("Django_Extensions==3.2 ; python_version > '3.8'", Some("django-extensions"))]
    #[case("uvicorn[standard]", Some("uvicorn"))]
    #[case("  # just a comment", None)]
    #[case("-r base.txt", None)]
    #[case("torch @ https://example.com/torch.whl", Some("torch"))]
    fn parses_requirement_lines(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(requirement_line_name(line).as_deref(), expected);
    }

    #[test]
    fn go_mod_block_and_single_requires() {
        let go_mod = "module example.com/app\n\ngo 1.22\n\nrequire github.com/spf13/cobra v1.8.0\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1 // indirect\n\tgithub.com/stretchr/testify v1.8.4\n)\n";
        assert_eq!(
            go_requirements(go_mod),
            vec![
                "github.com/spf13/cobra",
                "github.com/gin-gonic/gin",
                "github.com/stretchr/testify"
            ]
        );
    }

    #[test]
    fn gemfile_names() {
        let gemfile = "source 'https://rubygems.org'\ngem 'rails', '~> 7.1'\n  gem \"rspec\"\n# gem 'commented'\n";
        assert_eq!(gem_names(gemfile), vec!["rails", "rspec"]);
    }

    #[test]
    fn collects_dependencies_across_manifests() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"react": "^18"}, "devDependencies": {"vitest": "^1"}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"svc\"\ndependencies = [\"fastapi>=0.110\"]\n\n[tool.poetry.dependencies]\npython = \"^3.11\"\nhttpx = \"*\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("requirements.txt"), "pytest==8.0\n").unwrap();

        let reader = SignalReader::new(dir.path());
        let manifests = Manifests::read(&reader);
        let deps = declared_dependencies(&reader, &manifests);

        assert_eq!(deps, vec!["react", "vitest", "fastapi", "httpx", "pytest"]);
    }

    #[test]
    fn setup_py_install_requires() {
        let setup = "from setuptools import setup\n\nsetup(\n    name='svc',\n    install_requires=[\n        'flask>=3.0',\n        \"SQLAlchemy==2.0\",\n    ],\n    tests_require=['pytest'],\n)\n";
        assert_eq!(
            setup_py_requirements(setup),
            vec!["flask", "sqlalchemy", "pytest"]
        );
    }

    #[test]
    fn pom_dependency_artifacts() {
        let pom = r#"<project>
  <artifactId>orders</artifactId>
  <dependencies>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-web</artifactId>
    </dependency>
    <dependency>
      <groupId>org.junit.jupiter</groupId>
      <artifactId>junit-jupiter</artifactId>
      <scope>test</scope>
    </dependency>
  </dependencies>
  <build><plugins><plugin><artifactId>maven-surefire-plugin</artifactId></plugin></plugins></build>
</project>"#;
        assert_eq!(
            pom_artifacts(pom),
            vec!["spring-boot-starter-web", "junit-jupiter"]
        );
    }

    #[rstest]
    #[case("    implementation 'org.springframework.boot:spring-boot-starter-web'", Some("spring-boot-starter-web"))]
    #[case("    testImplementation(\"org.junit.jupiter:junit-jupiter:5.10.2\")", Some("junit-jupiter"))]
    #[case("    implementation(platform(\"io.micronaut.platform:micronaut-platform:4.3.0\"))", Some("micronaut-platform"))]
    #[case("    implementation project(':core')", None)]
    #[case("// implementation 'a:b'", None)]
    fn gradle_coordinates(#[case] line: &str, #[case] expected: Option<&str>) {
        let found = gradle_artifacts(line);
        assert_eq!(found.first().map(String::as_str), expected);
    }

    #[test]
    fn collects_jvm_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pom.xml"),
            "<project><dependencies><dependency><artifactId>spring-boot-starter-web</artifactId></dependency></dependencies></project>",
        )
        .unwrap();
        fs::write(
            dir.path().join("build.gradle.kts"),
            "dependencies {\n    testImplementation(\"org.junit.jupiter:junit-jupiter:5.10.2\")\n}\n",
        )
        .unwrap();
        let reader = SignalReader::new(dir.path());
        let manifests = Manifests::read(&reader);
        assert_eq!(
            declared_dependencies(&reader, &manifests),
            vec!["spring-boot-starter-web", "junit-jupiter"]
        );
    }

    #[test]
    fn declared_name_prefers_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "web-app"}"#).unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"core\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        let reader = SignalReader::new(dir.path());
        let manifests = Manifests::read(&reader);
        assert_eq!(declared_name(&manifests).as_deref(), Some("web-app"));
    }
}
