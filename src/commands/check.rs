use std::path::Path;

use console::style;
use miette::Result;

use agentcut::check::check_templates;

pub fn run(path: String) -> Result<()> {
    let dir = Path::new(&path);

    println!(
        "{} {}",
        style("Checking templates in").bold(),
        style(dir.display()).cyan()
    );

    let result = check_templates(dir)?;
    println!("  Templates: {}", result.template_count);

    if !result.warnings.is_empty() {
        println!("\n{}", style("Warnings:").yellow().bold());
        for w in &result.warnings {
            println!("  {} {}", style("⚠").yellow(), w);
        }
    }

    if !result.is_valid() {
        println!("\n{}", style("Errors:").red().bold());
        for e in &result.errors {
            println!("  {} {}", style("✗").red(), e);
        }
        println!(
            "\n{} {} error(s)",
            style("✗").red().bold(),
            result.errors.len()
        );
        std::process::exit(1);
    }

    println!("\n{} Templates are valid!", style("✓").green().bold());
    Ok(())
}
