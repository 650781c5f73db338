pub mod diff;
pub mod lock;
pub mod manifest;

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{AgentcutError, Result};
use crate::template::{output_file_name, GeneratedDocument};

pub use diff::{line_stats, unified_diff};
pub use lock::OutputLock;
pub use manifest::{Manifest, MANIFEST_FILE};

/// What to do when an output file exists, differs from the new content,
/// and was not written by the previous run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Keep the existing file.
    #[default]
    Skip,
    /// Replace the existing file.
    Overwrite,
    /// Report the document as failed.
    Fail,
    /// Show the diff and ask.
    Prompt,
}

/// Comparison of a document against what is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Nothing exists at the target path yet.
    New { content: String },
    /// The target already holds exactly this content.
    Unchanged,
    /// The target differs; `diff` is a unified diff from old to new and
    /// `stats` its inserted and deleted line counts.
    Changed {
        diff: String,
        stats: (usize, usize),
        managed: bool,
    },
}

/// Result of committing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    Unchanged(PathBuf),
    Skipped { path: PathBuf, reason: String },
}

/// Writes generated documents under an output root.
pub struct AgentWriter {
    output_root: PathBuf,
    manifest: Manifest,
    manifest_on_disk: Manifest,
}

impl AgentWriter {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        let output_root = output_root.into();
        let manifest = Manifest::load(&output_root);
        Self {
            output_root,
            manifest_on_disk: manifest.clone(),
            manifest,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn target_path(&self, document: &GeneratedDocument) -> PathBuf {
        self.output_root.join(&document.relative_path)
    }

    /// Whether an output file for `template_id` already exists.
    pub fn exists(&self, template_id: &str) -> bool {
        self.output_root.join(output_file_name(template_id)).is_file()
    }

    /// Compare `document` against the file it would replace.
    pub fn preview(&self, document: &GeneratedDocument) -> Result<Preview> {
        let path = self.target_path(document);
        let Some(existing) = read_existing(&path)? else {
            return Ok(Preview::New {
                content: document.content.clone(),
            });
        };
        if existing == document.content.as_bytes() {
            return Ok(Preview::Unchanged);
        }
        let managed = self.manifest.matches(&document.template_id, &existing);
        let old = String::from_utf8_lossy(&existing);
        Ok(Preview::Changed {
            diff: unified_diff(&old, &document.content, &document.relative_path),
            stats: line_stats(&old, &document.content),
            managed,
        })
    }

    /// Write `document`, applying `policy` to hand-edited files.
    ///
    /// `confirm` is consulted only for [`ConflictPolicy::Prompt`]; it receives
    /// the target path and the diff and returns whether to overwrite.
    pub fn commit(
        &mut self,
        document: GeneratedDocument,
        policy: ConflictPolicy,
        confirm: &mut dyn FnMut(&Path, &str) -> Result<bool>,
    ) -> Result<WriteOutcome> {
        let path = self.target_path(&document);
        let file = document.relative_path.to_string_lossy().into_owned();

        match self.preview(&document)? {
            Preview::Unchanged => {
                self.manifest
                    .record(&document.template_id, &file, document.content.as_bytes());
                return Ok(WriteOutcome::Unchanged(path));
            }
            Preview::New { .. } | Preview::Changed { managed: true, .. } => {}
            Preview::Changed { diff, .. } => match policy {
                ConflictPolicy::Overwrite => {}
                ConflictPolicy::Skip => {
                    return Ok(WriteOutcome::Skipped {
                        path,
                        reason: "existing file was edited by hand".to_string(),
                    });
                }
                ConflictPolicy::Fail => return Err(AgentcutError::OutputConflict { path }),
                ConflictPolicy::Prompt => {
                    if !confirm(&path, &diff)? {
                        return Ok(WriteOutcome::Skipped {
                            path,
                            reason: "overwrite declined".to_string(),
                        });
                    }
                }
            },
        }

        self.write(&document)?;
        self.manifest
            .record(&document.template_id, &file, document.content.as_bytes());
        Ok(WriteOutcome::Written(path))
    }

    /// Atomically write `document`, creating parent directories.
    pub fn write(&self, document: &GeneratedDocument) -> Result<PathBuf> {
        let path = self.target_path(document);
        write_atomic(&path, document.content.as_bytes())?;
        debug!(path = %path.display(), "wrote agent document");
        Ok(path)
    }

    /// Persist the manifest if this run changed it.
    pub fn finish(self) -> Result<()> {
        if self.manifest == self.manifest_on_disk {
            return Ok(());
        }
        let text = self.manifest.to_toml()?;
        write_atomic(&Manifest::path(&self.output_root), text.as_bytes())
    }
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AgentcutError::Io {
            context: format!("reading {}", path.display()),
            source: e,
        }),
    }
}

/// Write `content` to a temp file beside `path`, then rename it into place.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| AgentcutError::Io {
        context: format!("creating directory {}", parent.display()),
        source: e,
    })?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| AgentcutError::Io {
        context: format!("creating temp file in {}", parent.display()),
        source: e,
    })?;
    temp.write_all(content).map_err(|e| AgentcutError::Io {
        context: format!("writing {}", path.display()),
        source: e,
    })?;
    temp.persist(path).map_err(|e| AgentcutError::Io {
        context: format!("replacing {}", path.display()),
        source: e.error,
    })?;
    Ok(())
}

/// Ask on the terminal whether to overwrite. Without a terminal the answer is no.
pub fn prompt_overwrite(path: &Path, diff: &str) -> Result<bool> {
    eprintln!("{diff}");
    let answer = inquire::Confirm::new(&format!("Overwrite {}?", path.display()))
        .with_default(false)
        .prompt();
    match answer {
        Ok(yes) => Ok(yes),
        Err(inquire::InquireError::NotTTY) => Ok(false),
        Err(e) => Err(AgentcutError::Io {
            context: "reading confirmation".into(),
            source: std::io::Error::other(e),
        }),
    }
}
