use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::Value;
use tracing::debug;

use super::context::{CommandRole, DetectedCommands};
use super::manifests::{declared_dependencies, Manifests};
use super::signals::{Format, SignalReader};
use super::tables::tables;
use super::tech::tool_labels;

/// `npm init` writes this as the test script; it is not a real command.
const NPM_PLACEHOLDER_TEST: &str = "echo \"Error: no test specified\" && exit 1";

/// What has to be present in the repository for a heuristic to fire.
enum Evidence {
    File(&'static str),
    Tool(&'static str),
}

struct Heuristic {
    evidence: Evidence,
    role: CommandRole,
    command: &'static str,
}

const fn rule(evidence: Evidence, role: CommandRole, command: &'static str) -> Heuristic {
    Heuristic {
        evidence,
        role,
        command,
    }
}

/// Fallback commands inferred from files and tools. Earlier rows win per role.
const HEURISTICS: &[Heuristic] = &[
    // Rust
    rule(Evidence::File("Cargo.toml"), CommandRole::Build, "cargo build"),
    rule(Evidence::File("Cargo.toml"), CommandRole::Test, "cargo test"),
    rule(
        Evidence::File("Cargo.toml"),
        CommandRole::Lint,
        "cargo clippy --all-targets -- -D warnings",
    ),
    rule(Evidence::File("Cargo.toml"), CommandRole::TypeCheck, "cargo check"),
    rule(Evidence::File("Cargo.toml"), CommandRole::Format, "cargo fmt"),
    // Go
    rule(Evidence::File("go.mod"), CommandRole::Build, "go build ./..."),
    rule(Evidence::File("go.mod"), CommandRole::Test, "go test ./..."),
    rule(Evidence::Tool("golangci-lint"), CommandRole::Lint, "golangci-lint run"),
    rule(Evidence::File("go.mod"), CommandRole::Lint, "go vet ./..."),
    rule(Evidence::File("go.mod"), CommandRole::Format, "gofmt -w ."),
    // Python
    rule(Evidence::Tool("pytest"), CommandRole::Test, "pytest"),
    rule(Evidence::Tool("Ruff"), CommandRole::Lint, "ruff check ."),
    rule(Evidence::Tool("Flake8"), CommandRole::Lint, "flake8"),
    rule(Evidence::Tool("Pylint"), CommandRole::Lint, "pylint ."),
    rule(Evidence::Tool("Ruff"), CommandRole::Format, "ruff format ."),
    rule(Evidence::Tool("Black"), CommandRole::Format, "black ."),
    rule(Evidence::Tool("mypy"), CommandRole::TypeCheck, "mypy ."),
    // JavaScript / TypeScript
    rule(Evidence::Tool("Vitest"), CommandRole::Test, "npx vitest run"),
    rule(Evidence::Tool("Jest"), CommandRole::Test, "npx jest"),
    rule(Evidence::Tool("ESLint"), CommandRole::Lint, "npx eslint ."),
    rule(Evidence::Tool("Prettier"), CommandRole::Format, "npx prettier --write ."),
    rule(Evidence::Tool("TypeScript"), CommandRole::TypeCheck, "npx tsc --noEmit"),
    // JVM
    rule(Evidence::File("gradlew"), CommandRole::Build, "./gradlew build"),
    rule(Evidence::File("gradlew"), CommandRole::Test, "./gradlew test"),
    rule(Evidence::File("build.gradle"), CommandRole::Build, "gradle build"),
    rule(Evidence::File("build.gradle"), CommandRole::Test, "gradle test"),
    rule(Evidence::File("pom.xml"), CommandRole::Build, "mvn package"),
    rule(Evidence::File("pom.xml"), CommandRole::Test, "mvn test"),
    // Ruby
    rule(Evidence::Tool("RSpec"), CommandRole::Test, "bundle exec rspec"),
    rule(Evidence::Tool("RuboCop"), CommandRole::Lint, "bundle exec rubocop"),
    // Dart / Flutter
    rule(Evidence::File("pubspec.yaml"), CommandRole::Test, "flutter test"),
    rule(Evidence::File("pubspec.yaml"), CommandRole::Lint, "dart analyze"),
    rule(Evidence::File("pubspec.yaml"), CommandRole::Format, "dart format ."),
];

/// Mine build/test/lint/... commands from the repository.
///
/// Sources are visited in priority order: script manifests, then
/// `pyproject.toml` task tables, then build-file targets, then heuristics.
/// Each role keeps the first command any source offers for it.
pub fn extract_commands(reader: &SignalReader) -> DetectedCommands {
    let manifests = Manifests::read(reader);
    let mut commands = DetectedCommands::default();

    if let Some(pkg) = &manifests.package_json {
        offer_table(&mut commands, &pkg["scripts"], "package.json scripts");
    }
    if let Some(composer) = &manifests.composer {
        offer_table(&mut commands, &composer["scripts"], "composer.json scripts");
    }
    if let Some(deno) = &manifests.deno {
        offer_table(&mut commands, &deno["tasks"], "deno tasks");
    }

    if let Some(py) = &manifests.pyproject {
        let tool = &py["tool"];
        offer_table(&mut commands, &tool["pdm"]["scripts"], "tool.pdm.scripts");
        offer_table(&mut commands, &tool["poe"]["tasks"], "tool.poe.tasks");
        offer_table(&mut commands, &tool["taskipy"]["tasks"], "tool.taskipy.tasks");
        offer_table(
            &mut commands,
            &tool["hatch"]["envs"]["default"]["scripts"],
            "tool.hatch scripts",
        );
    }

    if let Some(makefile) = reader
        .read_text("Makefile")
        .or_else(|| reader.read_text("makefile"))
    {
        offer_targets(&mut commands, &recipe_names(&makefile), "make");
    }
    if let Some(justfile) = reader
        .read_text("justfile")
        .or_else(|| reader.read_text("Justfile"))
    {
        offer_targets(&mut commands, &recipe_names(&justfile), "just");
    }
    if let Some(taskfile) = reader
        .read_structured("Taskfile.yml", Format::Yaml)
        .or_else(|| reader.read_structured("Taskfile.yaml", Format::Yaml))
    {
        let names: Vec<String> = taskfile["tasks"]
            .as_object()
            .map(|tasks| tasks.keys().cloned().collect())
            .unwrap_or_default();
        offer_targets(&mut commands, &names, "task");
    }

    let dependencies = declared_dependencies(reader, &manifests);
    let tools = tool_labels(reader, &manifests, &dependencies);
    offer_heuristics(&mut commands, reader, &tools);

    commands
}

/// Offer entries of a name -> command table (scripts, tasks) for every role.
fn offer_table(commands: &mut DetectedCommands, table: &Value, source: &str) {
    let Some(entries) = table.as_object() else {
        return;
    };
    let aliases = &tables().command_aliases;
    for role in CommandRole::ALL {
        let command = aliases
            .for_role(role)
            .iter()
            .filter_map(|name| entries.get(name.as_str()))
            .filter_map(command_text)
            .find(|cmd| !cmd.is_empty() && cmd != NPM_PLACEHOLDER_TEST);
        if let Some(command) = command {
            if commands.offer(role, &command) {
                debug!(role = role.key(), command = %command, source, "command detected");
            }
        }
    }
}

/// Offer `<runner> <target>` for build-file targets named like a role.
fn offer_targets(commands: &mut DetectedCommands, targets: &[String], runner: &str) {
    let aliases = &tables().command_aliases;
    for role in CommandRole::ALL {
        let target = aliases
            .for_role(role)
            .iter()
            .find(|name| targets.iter().any(|t| t == *name));
        if let Some(target) = target {
            let command = format!("{runner} {target}");
            if commands.offer(role, &command) {
                debug!(role = role.key(), command = %command, source = runner, "command detected");
            }
        }
    }
}

fn offer_heuristics(
    commands: &mut DetectedCommands,
    reader: &SignalReader,
    tools: &BTreeSet<String>,
) {
    for heuristic in HEURISTICS {
        let present = match heuristic.evidence {
            Evidence::File(file) => reader.is_file(file),
            Evidence::Tool(tool) => tools.contains(tool),
        };
        if present && commands.offer(heuristic.role, heuristic.command) {
            debug!(
                role = heuristic.role.key(),
                command = heuristic.command,
                "command inferred"
            );
        }
    }
}

/// The shell text of a script/task entry.
///
/// Accepts a plain string, a list of strings (run in sequence), or a table
/// with a `cmd`/`shell`/`run` key as used by the Python task runners.
fn command_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(" && "))
        }
        Value::Object(map) => ["cmd", "shell", "run"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(command_text),
        _ => None,
    }
}

/// Target/recipe names declared at the start of a line in a Makefile or justfile.
fn recipe_names(content: &str) -> Vec<String> {
    static RECIPE: OnceLock<Regex> = OnceLock::new();
    let re = RECIPE.get_or_init(|| {
        Regex::new(r"^@?([A-Za-z0-9][A-Za-z0-9_.-]*)(?:\s+[^:=\n]*)?\s*:(?:[^=]|$)")
            .expect("recipe pattern is valid")
    });
    content
        .lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}
