use std::path::PathBuf;

use agentcut::write::Preview;
use agentcut::GenerateOptions;
use console::style;
use miette::Result;

use super::{load_settings, preview_label, preview_stats, print_diff};

pub fn run(id: String, path: String, output: Option<String>) -> Result<()> {
    let repo_root = PathBuf::from(&path);
    let settings = load_settings(&repo_root)?;
    let options = GenerateOptions {
        repo_root,
        output_root: output.map(PathBuf::from),
        manual_selection: None,
        settings,
    };

    let (document, preview) = agentcut::preview_template(&options, &id)?;
    let target = options.output_root().join(&document.relative_path);
    println!(
        "{} {}{}",
        preview_label(&preview),
        style(target.display()).cyan(),
        preview_stats(&preview)
    );

    match preview {
        Preview::New { content } => {
            println!("  {}", style("──────").dim());
            for line in content.lines() {
                println!("  {line}");
            }
            println!("  {}", style("──────").dim());
        }
        Preview::Unchanged => println!("  Output is up to date."),
        Preview::Changed { diff, .. } => print_diff(&diff),
    }

    if !document.unresolved.is_empty() {
        let names: Vec<&str> = document.unresolved.iter().map(String::as_str).collect();
        eprintln!(
            "{} unresolved placeholders: {}",
            style("warning:").yellow().bold(),
            names.join(", ")
        );
    }
    Ok(())
}
