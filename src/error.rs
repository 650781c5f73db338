#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AgentcutError {
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}")]
    #[diagnostic(help("Check the TOML syntax in your agentcut.toml / config.toml"))]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Template could not be read: {path}: {reason}")]
    #[diagnostic(help("Templates must be UTF-8 Markdown files"))]
    TemplateUnreadable { path: PathBuf, reason: String },

    #[error("Invalid front matter in template '{id}'")]
    #[diagnostic(help(
        "The header between the leading '---' lines must be YAML key: value pairs"
    ))]
    TemplateHeader {
        id: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unknown template: {id}")]
    #[diagnostic(help("Run `agentcut list` to see available templates"))]
    UnknownTemplate { id: String },

    #[error("Output already exists and differs: {path}")]
    #[diagnostic(help("Use --on-conflict overwrite to replace it, or preview the diff first"))]
    OutputConflict { path: PathBuf },

    #[error("Repository root not found: {path}")]
    #[diagnostic(help("Pass the path of an existing directory to scan"))]
    RepositoryNotFound { path: PathBuf },

    #[error("Templates directory not found: {path}")]
    #[diagnostic(help("Fix `templates_dir` in your config or create the directory"))]
    TemplatesDirMissing { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, AgentcutError>;
