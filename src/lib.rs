pub mod check;
pub mod config;
pub mod error;
pub mod scan;
pub mod select;
pub mod template;
pub mod write;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{AgentcutError, Result};
use crate::scan::{scan, ProjectContext};
use crate::select::select;
use crate::template::{render, Catalog, GeneratedDocument, PlaceholderMap};
use crate::write::{prompt_overwrite, AgentWriter, ConflictPolicy, OutputLock, Preview, WriteOutcome};

pub use crate::template::list_available_templates;

pub struct GenerateOptions {
    pub repo_root: PathBuf,
    /// Defaults to the configured output directory under `repo_root`.
    pub output_root: Option<PathBuf>,
    /// When non-empty, exactly these templates are generated.
    pub manual_selection: Option<Vec<String>>,
    pub settings: Settings,
}

impl GenerateOptions {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            output_root: None,
            manual_selection: None,
            settings: Settings::default(),
        }
    }

    pub fn output_root(&self) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| self.settings.output_root(&self.repo_root))
    }
}

/// A document that could not be produced or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub template_id: String,
    pub reason: String,
}

pub struct PlannedDocument {
    pub document: GeneratedDocument,
    pub preview: Preview,
}

/// Everything needed to write a generation that has been planned but not yet written.
pub struct GenerationPlan {
    pub context: ProjectContext,
    pub output_root: PathBuf,
    pub on_conflict: ConflictPolicy,
    pub documents: Vec<PlannedDocument>,
    pub failed: Vec<DocumentFailure>,
    /// Selected ids that are not in the catalog.
    pub missing: Vec<String>,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub output_root: PathBuf,
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub failed: Vec<DocumentFailure>,
    /// Unresolved placeholder names per template id.
    pub unresolved: BTreeMap<String, BTreeSet<String>>,
    pub missing: Vec<String>,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} unchanged, {} skipped, {} failed",
            self.written.len(),
            self.unchanged.len(),
            self.skipped.len(),
            self.failed.len(),
        )
    }
}

/// Scan, select and render, without touching the output root.
pub fn plan_generation(options: &GenerateOptions) -> Result<GenerationPlan> {
    let settings = &options.settings;
    let context = scan(&options.repo_root, &settings.scan_options())?;
    let catalog = Catalog::load(settings.templates_dir.as_deref())?;
    let selection = select(&context, options.manual_selection.as_deref(), &catalog);
    debug!(ids = ?selection.ids, missing = ?selection.missing, "templates selected");

    let output_root = options.output_root();
    let writer = AgentWriter::new(&output_root);
    let map = PlaceholderMap::from_context(&context);

    let mut documents = Vec::new();
    let mut failed = Vec::new();
    let mut missing = Vec::new();

    for id in &selection.missing {
        match catalog.failure(id) {
            Some(failure) => failed.push(DocumentFailure {
                template_id: id.clone(),
                reason: failure.reason.clone(),
            }),
            None => missing.push(id.clone()),
        }
    }

    for id in &selection.ids {
        let Some(template) = catalog.get(id) else {
            continue;
        };
        let planned = render(template, &map, &settings.default_model).and_then(|document| {
            let preview = writer.preview(&document)?;
            Ok(PlannedDocument { document, preview })
        });
        match planned {
            Ok(planned) => documents.push(planned),
            Err(e) => failed.push(DocumentFailure {
                template_id: id.clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(GenerationPlan {
        context,
        output_root,
        on_conflict: settings.on_conflict,
        documents,
        failed,
        missing,
    })
}

/// Write a planned generation. Per-document failures are collected, not returned.
pub fn execute_generation(plan: GenerationPlan) -> Result<GenerationReport> {
    let mut report = GenerationReport {
        output_root: plan.output_root.clone(),
        failed: plan.failed,
        missing: plan.missing,
        ..GenerationReport::default()
    };
    if plan.documents.is_empty() {
        return Ok(report);
    }

    let _lock = OutputLock::acquire(&plan.output_root)?;
    let mut writer = AgentWriter::new(&plan.output_root);

    for PlannedDocument { document, .. } in plan.documents {
        let template_id = document.template_id.clone();
        if !document.unresolved.is_empty() {
            warn!(template = %template_id, unresolved = ?document.unresolved, "unresolved placeholders");
            report
                .unresolved
                .insert(template_id.clone(), document.unresolved.clone());
        }

        match writer.commit(document, plan.on_conflict, &mut prompt_overwrite) {
            Ok(WriteOutcome::Written(path)) => report.written.push(path),
            Ok(WriteOutcome::Unchanged(path)) => report.unchanged.push(path),
            Ok(WriteOutcome::Skipped { path, reason }) => report.skipped.push((path, reason)),
            Err(e) => report.failed.push(DocumentFailure {
                template_id,
                reason: e.to_string(),
            }),
        }
    }

    if let Err(e) = writer.finish() {
        warn!(error = %e, "could not update generation manifest");
        report.failed.push(DocumentFailure {
            template_id: write::MANIFEST_FILE.to_string(),
            reason: e.to_string(),
        });
    }
    Ok(report)
}

/// Run the whole pipeline and report what happened to each document.
pub fn generate_with(options: &GenerateOptions) -> Result<GenerationReport> {
    execute_generation(plan_generation(options)?)
}

/// Generate agent documents for `repo_root` into `output_root` with default
/// settings. Returns the paths that were written.
pub fn generate(
    repo_root: &Path,
    output_root: &Path,
    manual_selection: Option<&[String]>,
) -> Result<Vec<PathBuf>> {
    let options = GenerateOptions {
        output_root: Some(output_root.to_path_buf()),
        manual_selection: manual_selection.map(<[String]>::to_vec),
        ..GenerateOptions::new(repo_root)
    };
    Ok(generate_with(&options)?.written)
}

/// Render one template for `options.repo_root` and compare it with the existing output.
pub fn preview_template(
    options: &GenerateOptions,
    template_id: &str,
) -> Result<(GeneratedDocument, Preview)> {
    let settings = &options.settings;
    let catalog = Catalog::load(settings.templates_dir.as_deref())?;
    let template = match catalog.get(template_id) {
        Some(t) => t,
        None => {
            if let Some(failure) = catalog.failure(template_id) {
                return Err(AgentcutError::TemplateUnreadable {
                    path: failure
                        .path
                        .clone()
                        .unwrap_or_else(|| PathBuf::from(template_id)),
                    reason: failure.reason.clone(),
                });
            }
            return Err(AgentcutError::UnknownTemplate {
                id: template_id.to_string(),
            });
        }
    };

    let context = scan(&options.repo_root, &settings.scan_options())?;
    let document = render(
        template,
        &PlaceholderMap::from_context(&context),
        &settings.default_model,
    )?;
    let preview = AgentWriter::new(options.output_root()).preview(&document)?;
    Ok((document, preview))
}
