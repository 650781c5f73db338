use std::path::PathBuf;

use agentcut::scan::{scan, ProjectContext};
use agentcut::select;
use console::style;
use miette::{IntoDiagnostic, Result};

use super::load_settings;

pub fn run(path: String, json: bool) -> Result<()> {
    let repo_root = PathBuf::from(&path);
    let settings = load_settings(&repo_root)?;
    let context = scan(&repo_root, &settings.scan_options())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context).into_diagnostic()?);
        return Ok(());
    }

    print_context(&context);
    Ok(())
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let items: Vec<&str> = items.map(String::as_str).collect();
    if items.is_empty() {
        style("none").dim().to_string()
    } else {
        items.join(", ")
    }
}

fn print_context(context: &ProjectContext) {
    let tech = &context.tech_stack;
    println!(
        "{} {} ({})",
        style("Project").bold(),
        style(&context.project_name).cyan(),
        context.project_type
    );
    println!("  {} {}", style("languages: ").dim(), join_or_none(tech.languages.iter()));
    println!("  {} {}", style("frameworks:").dim(), join_or_none(tech.frameworks.iter()));
    println!("  {} {}", style("tools:     ").dim(), join_or_none(tech.tools.iter()));
    for (label, value) in [
        ("primary:   ", &tech.primary_language),
        ("packages:  ", &tech.package_manager),
        ("build:     ", &tech.build_system),
    ] {
        if let Some(value) = value {
            println!("  {} {value}", style(label).dim());
        }
    }
    println!("  {} {}", style("ci:        ").dim(), context.has_ci);
    println!("  {} {}", style("container: ").dim(), context.has_container);

    if !context.commands.is_empty() {
        println!("\n{}", style("Commands").bold());
        for (role, command) in context.commands.iter() {
            if let Some(command) = command {
                println!("  {:<11} {command}", style(role.key()).dim());
            }
        }
    }

    let dirs: Vec<_> = context
        .directories
        .iter()
        .filter_map(|(role, dir)| dir.map(|d| (role, d)))
        .collect();
    if !dirs.is_empty() {
        println!("\n{}", style("Directories").bold());
        for (role, dir) in dirs {
            println!("  {:<11} {dir}", style(role.key()).dim());
        }
    }

    println!("\n{}", style("Selected agents").bold());
    for id in select::BASELINE {
        println!("  {} {}", style(id).green(), style("(baseline)").dim());
    }
    for rule in select::matching_rules(context) {
        println!("  {} {}", style(rule.template_id).green(), style(rule.reason).dim());
    }
}
