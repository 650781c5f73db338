use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use globset::GlobSet;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Structured formats a signal file can be parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
    Yaml,
}

/// Read-only view of a repository root.
///
/// Every accessor degrades to "no signal" (`false`, `None`, or an empty
/// histogram) instead of failing, and paths that would leave the root are
/// treated as absent.
#[derive(Debug, Clone)]
pub struct SignalReader {
    root: PathBuf,
    /// `root` with symlinks resolved, `None` when it cannot be resolved.
    canonical_root: Option<PathBuf>,
}

impl SignalReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let canonical_root = root.canonicalize().ok();
        Self {
            root,
            canonical_root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel_path: &str) -> Option<PathBuf> {
        let rel = Path::new(rel_path);
        let contained = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            warn!(path = rel_path, "ignoring signal path outside the repository root");
            return None;
        }
        let path = self.root.join(rel);
        // A symlink may still point outside; only existing paths can be resolved.
        if let (Ok(real), Some(root)) = (path.canonicalize(), &self.canonical_root) {
            if !real.starts_with(root) {
                warn!(
                    path = rel_path,
                    "ignoring signal path that resolves outside the repository root"
                );
                return None;
            }
        }
        Some(path)
    }

    pub fn exists(&self, rel_path: &str) -> bool {
        self.resolve(rel_path).is_some_and(|p| p.exists())
    }

    pub fn is_dir(&self, rel_path: &str) -> bool {
        self.resolve(rel_path).is_some_and(|p| p.is_dir())
    }

    pub fn is_file(&self, rel_path: &str) -> bool {
        self.resolve(rel_path).is_some_and(|p| p.is_file())
    }

    pub fn read_text(&self, rel_path: &str) -> Option<String> {
        let path = self.resolve(rel_path)?;
        if !path.is_file() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable signal file");
                None
            }
        }
    }

    /// Parse a file into a JSON value regardless of its on-disk format.
    pub fn read_structured(&self, rel_path: &str, format: Format) -> Option<Value> {
        let content = self.read_text(rel_path)?;
        let parsed = match format {
            Format::Json => serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str::<Value>(&content).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string()),
        };
        match parsed {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = rel_path, error = %e, "malformed signal file");
                None
            }
        }
    }

    /// Count files per extension, walking the tree in file-name order.
    ///
    /// Only extensions in `extensions` are counted. Paths matching `exclude`
    /// (relative to the root, checked per entry so excluded directories are
    /// never entered) are skipped, and the walk stops after `limit` files
    /// have been visited.
    pub fn extension_histogram(
        &self,
        extensions: &[&str],
        exclude: &GlobSet,
        limit: usize,
    ) -> BTreeMap<String, usize> {
        let mut histogram = BTreeMap::new();
        if !self.root.is_dir() {
            return histogram;
        }

        let root = self.root.as_path();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
                !exclude.is_match(rel)
            });

        let mut visited = 0usize;
        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if visited >= limit {
                debug!(limit, "extension histogram hit the file limit");
                break;
            }
            visited += 1;

            let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            if extensions.iter().any(|known| known.eq_ignore_ascii_case(&ext)) {
                *histogram.entry(ext).or_insert(0) += 1;
            }
        }

        histogram
    }
}
