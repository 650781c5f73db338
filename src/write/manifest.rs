//! Record of what the last run wrote, used to tell generated files apart
//! from hand-edited ones.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{AgentcutError, Result};

pub const MANIFEST_FILE: &str = ".agentcut-manifest.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub documents: BTreeMap<String, ManifestEntry>,
}

pub fn content_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl Manifest {
    pub fn path(output_root: &Path) -> PathBuf {
        output_root.join(MANIFEST_FILE)
    }

    /// Load the manifest. A missing or unreadable manifest is treated as empty,
    /// which only means every existing file is considered hand-edited.
    pub fn load(output_root: &Path) -> Self {
        let path = Self::path(output_root);
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring corrupt generation manifest");
            Self::default()
        })
    }

    pub fn record(&mut self, template_id: &str, file: &str, content: &[u8]) {
        self.documents.insert(
            template_id.to_string(),
            ManifestEntry {
                file: file.to_string(),
                sha256: content_hash(content),
            },
        );
    }

    /// Whether `content` is exactly what the last run wrote for `template_id`.
    pub fn matches(&self, template_id: &str, content: &[u8]) -> bool {
        self.documents
            .get(template_id)
            .is_some_and(|entry| entry.sha256 == content_hash(content))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| AgentcutError::Io {
            context: "serializing generation manifest".into(),
            source: std::io::Error::other(e),
        })
    }
}
