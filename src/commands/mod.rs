pub mod check;
pub mod generate;
pub mod list;
pub mod preview;
pub mod scan;

use std::path::Path;

use agentcut::config::Settings;
use agentcut::write::Preview;
use console::style;

/// Settings for a run against `repo_root`: defaults, user config, project config.
pub fn load_settings(repo_root: &Path) -> miette::Result<Settings> {
    Ok(Settings::load(repo_root)?)
}

/// Print a unified diff with added and removed lines coloured.
pub fn print_diff(diff: &str) {
    for line in diff.lines() {
        let styled = if line.starts_with("+++") || line.starts_with("---") {
            style(line).bold()
        } else if line.starts_with('+') {
            style(line).green()
        } else if line.starts_with('-') {
            style(line).red()
        } else if line.starts_with("@@") {
            style(line).cyan()
        } else {
            style(line)
        };
        println!("  {styled}");
    }
}

/// Short label for a preview, padded for column alignment.
pub fn preview_label(preview: &Preview) -> console::StyledObject<&'static str> {
    match preview {
        Preview::New { .. } => style("create   ").green(),
        Preview::Unchanged => style("unchanged").dim(),
        Preview::Changed { managed: true, .. } => style("update   ").cyan(),
        Preview::Changed { managed: false, .. } => style("conflict ").yellow(),
    }
}

/// `+N -M` line counts for a changed preview, empty otherwise.
pub fn preview_stats(preview: &Preview) -> String {
    match preview {
        Preview::Changed {
            stats: (inserted, deleted),
            ..
        } => format!(
            " {} {}",
            style(format!("+{inserted}")).green(),
            style(format!("-{deleted}")).red()
        ),
        _ => String::new(),
    }
}
