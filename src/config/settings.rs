use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgentcutError, Result};
use crate::scan::{ScanOptions, DEFAULT_FILE_LIMIT};
use crate::template::DEFAULT_MODEL;
use crate::write::ConflictPolicy;

pub const DEFAULT_OUTPUT_DIR: &str = ".claude/agents";

/// Effective settings after every layer has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Output root; relative paths are taken from the repository root.
    pub output_dir: PathBuf,
    pub templates_dir: Option<PathBuf>,
    pub default_model: String,
    pub on_conflict: ConflictPolicy,
    pub scan: ScanSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSettings {
    pub file_limit: usize,
    pub exclude: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            templates_dir: None,
            default_model: DEFAULT_MODEL.to_string(),
            on_conflict: ConflictPolicy::default(),
            scan: ScanSettings {
                file_limit: DEFAULT_FILE_LIMIT,
                exclude: Vec::new(),
            },
        }
    }
}

/// One config file. Keys left out do not touch the layer below.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsLayer {
    pub output_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub default_model: Option<String>,
    pub on_conflict: Option<ConflictPolicy>,
    #[serde(default)]
    pub scan: ScanLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanLayer {
    pub file_limit: Option<usize>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SettingsLayer {
    /// Read a layer from `path`. A missing file is `Ok(None)`.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AgentcutError::Io {
                    context: format!("reading config {}", path.display()),
                    source: e,
                })
            }
        };
        let mut layer: SettingsLayer =
            toml::from_str(&text).map_err(|source| AgentcutError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        // templates_dir is relative to the file that names it.
        if let (Some(dir), Some(base)) = (&layer.templates_dir, path.parent()) {
            if dir.is_relative() {
                layer.templates_dir = Some(base.join(dir));
            }
        }
        debug!(path = %path.display(), "loaded config layer");
        Ok(Some(layer))
    }
}

impl Settings {
    /// Defaults, then the user config, then `agentcut.toml` in `repo_root`.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let mut settings = Settings::default();
        if let Some(path) = super::user_config_path() {
            if let Some(layer) = SettingsLayer::read(&path)? {
                settings.apply(layer);
            }
        }
        if let Some(layer) = SettingsLayer::read(&super::project_config_path(repo_root))? {
            settings.apply(layer);
        }
        Ok(settings)
    }

    pub fn apply(&mut self, layer: SettingsLayer) {
        if let Some(dir) = layer.output_dir {
            self.output_dir = dir;
        }
        if let Some(dir) = layer.templates_dir {
            self.templates_dir = Some(dir);
        }
        if let Some(model) = layer.default_model.filter(|m| !m.trim().is_empty()) {
            self.default_model = model;
        }
        if let Some(policy) = layer.on_conflict {
            self.on_conflict = policy;
        }
        if let Some(limit) = layer.scan.file_limit {
            self.scan.file_limit = limit;
        }
        for pattern in layer.scan.exclude {
            if !self.scan.exclude.contains(&pattern) {
                self.scan.exclude.push(pattern);
            }
        }
    }

    pub fn output_root(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.output_dir)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            file_limit: self.scan.file_limit,
            exclude: self.scan.exclude.clone(),
        }
    }
}
