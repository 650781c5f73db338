pub mod commands;
pub mod context;
pub mod directories;
pub mod manifests;
pub mod signals;
pub mod tables;
pub mod tech;

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::error::{AgentcutError, Result};

pub use commands::extract_commands;
pub use context::{
    CommandRole, DetectedCommands, DirectoryRole, DirectoryStructure, ProjectContext, ProjectType,
    TechProfile,
};
pub use directories::map_directories;
pub use signals::{Format, SignalReader};
pub use tech::detect_tech_stack;

use manifests::Manifests;
use tables::{tables, FrameworkKind};

pub const DEFAULT_FILE_LIMIT: usize = 10_000;

const CI_PATHS: &[&str] = &[
    ".github/workflows",
    ".gitlab-ci.yml",
    ".circleci",
    "Jenkinsfile",
    ".travis.yml",
    "azure-pipelines.yml",
    "bitbucket-pipelines.yml",
    ".buildkite",
    ".drone.yml",
];

const CONTAINER_PATHS: &[&str] = &[
    "Dockerfile",
    "Containerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
    ".devcontainer",
];

/// Knobs for the scanner.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum number of files visited for the extension histogram.
    pub file_limit: usize,
    /// Extra glob patterns excluded from the histogram walk.
    pub exclude: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            file_limit: DEFAULT_FILE_LIMIT,
            exclude: Vec::new(),
        }
    }
}

impl ScanOptions {
    /// Built-in excludes plus user patterns. Invalid user patterns are skipped.
    pub fn exclude_set(&self) -> GlobSet {
        let mut builder = GlobSetBuilder::new();
        for name in &tables().default_excludes {
            for pattern in [name.clone(), format!("**/{name}")] {
                if let Ok(glob) = Glob::new(&pattern) {
                    builder.add(glob);
                }
            }
        }
        for pattern in &self.exclude {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!(pattern, error = %e, "ignoring invalid exclude pattern"),
            }
        }
        builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "exclude patterns could not be combined; scanning everything");
            GlobSet::empty()
        })
    }
}

/// Scan a repository into a [`ProjectContext`].
///
/// The tech-stack, command and directory detectors run on separate threads;
/// their results are joined before the project type is classified. A missing
/// or empty repository never fails detection, only a nonexistent root does.
pub fn scan(repo_root: &Path, options: &ScanOptions) -> Result<ProjectContext> {
    if !repo_root.is_dir() {
        return Err(AgentcutError::RepositoryNotFound {
            path: repo_root.to_path_buf(),
        });
    }

    let reader = SignalReader::new(repo_root);

    let (tech_stack, commands, directories) = std::thread::scope(|s| {
        let tech = s.spawn(|| detect_tech_stack(&reader, options));
        let commands = s.spawn(|| extract_commands(&reader));
        let directories = s.spawn(|| map_directories(&reader));
        (
            tech.join().unwrap_or_else(|_| {
                warn!("tech stack detector panicked; continuing without it");
                TechProfile::default()
            }),
            commands.join().unwrap_or_else(|_| {
                warn!("command extractor panicked; continuing without it");
                DetectedCommands::default()
            }),
            directories.join().unwrap_or_else(|_| {
                warn!("directory mapper panicked; continuing without it");
                DirectoryStructure::default()
            }),
        )
    });

    let has_ci = CI_PATHS.iter().any(|p| reader.exists(p));
    let has_container = CONTAINER_PATHS.iter().any(|p| reader.exists(p));

    let manifests = Manifests::read(&reader);
    let signals = TypeSignals {
        tech: &tech_stack,
        commands: &commands,
        directories: &directories,
        is_library: looks_like_library(&reader, &manifests),
    };
    let project_type = classify(&signals);

    let project_name = manifests::declared_name(&manifests).unwrap_or_else(|| directory_name(repo_root));

    debug!(%project_type, has_ci, has_container, "scan complete");

    Ok(ProjectContext {
        project_name,
        tech_stack,
        commands,
        directories,
        project_type,
        has_ci,
        has_container,
    })
}

/// Inputs to project-type classification.
pub struct TypeSignals<'a> {
    pub tech: &'a TechProfile,
    pub commands: &'a DetectedCommands,
    pub directories: &'a DirectoryStructure,
    pub is_library: bool,
}

impl TypeSignals<'_> {
    fn has_framework_kind(&self, kind: FrameworkKind) -> bool {
        let t = tables();
        self.tech
            .frameworks
            .iter()
            .any(|label| t.framework_kind(label) == Some(kind))
    }
}

type TypeRule = (ProjectType, fn(&TypeSignals<'_>) -> bool);

/// Classification rules in precedence order; the first match wins.
const TYPE_RULES: &[TypeRule] = &[
    (ProjectType::Ml, |s| {
        s.has_framework_kind(FrameworkKind::Ml) || s.commands.get(CommandRole::Train).is_some()
    }),
    // An api directory only counts when no frontend framework is present.
    (ProjectType::Api, |s| {
        s.has_framework_kind(FrameworkKind::Api)
            || (s.directories.get(DirectoryRole::Api).is_some()
                && !s.has_framework_kind(FrameworkKind::Frontend))
    }),
    (ProjectType::Mobile, |s| s.has_framework_kind(FrameworkKind::Mobile)),
    (ProjectType::Frontend, |s| s.has_framework_kind(FrameworkKind::Frontend)),
    (ProjectType::Library, |s| s.is_library),
];

pub fn classify(signals: &TypeSignals<'_>) -> ProjectType {
    TYPE_RULES
        .iter()
        .find(|(_, matches)| matches(signals))
        .map(|(project_type, _)| *project_type)
        .unwrap_or(ProjectType::General)
}

/// Whether the repository publishes a library rather than an application.
fn looks_like_library(reader: &SignalReader, manifests: &Manifests) -> bool {
    if let Some(cargo) = &manifests.cargo {
        if !cargo["lib"].is_null() {
            return true;
        }
        if reader.is_file("src/lib.rs") && !reader.is_file("src/main.rs") {
            return true;
        }
    }
    if let Some(pkg) = &manifests.package_json {
        let publishes = ["main", "exports", "module", "types"]
            .iter()
            .any(|key| !pkg[*key].is_null());
        let private = pkg["private"].as_bool().unwrap_or(false);
        let has_dev_server = !pkg["scripts"]["dev"].is_null() || !pkg["scripts"]["start"].is_null();
        if publishes && !private && !has_dev_server {
            return true;
        }
    }
    if let Some(composer) = &manifests.composer {
        if composer["type"].as_str() == Some("library") {
            return true;
        }
    }
    if let Some(py) = &manifests.pyproject {
        if !py["build-system"].is_null() && py["project"]["scripts"].is_null() {
            return true;
        }
    }
    false
}

fn directory_name(root: &Path) -> String {
    std::fs::canonicalize(root)
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}
