use agentcut::template::{list_available_templates, TemplateOrigin};
use console::style;
use miette::{IntoDiagnostic, Result};

use super::load_settings;

pub fn run() -> Result<()> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let settings = load_settings(&cwd)?;
    let catalog = list_available_templates(settings.templates_dir.as_deref())?;

    let count = catalog.templates().count();
    println!(
        "{} ({} template{})\n",
        style("Available templates").bold(),
        count,
        if count == 1 { "" } else { "s" }
    );

    for template in catalog.templates() {
        let origin = match &template.origin {
            TemplateOrigin::Builtin => "built-in".to_string(),
            TemplateOrigin::File(path) => path.display().to_string(),
        };
        println!("  {}", style(&template.id).cyan().bold());
        println!("  {} {}", style("about:").dim(), template.description);
        println!(
            "  {} {}",
            style("model:").dim(),
            template.model_or(&settings.default_model)
        );
        if let Some(triggers) = &template.triggers {
            println!("  {} {}", style("on:   ").dim(), triggers.join(", "));
        }
        println!("  {} {}", style("from: ").dim(), origin);
        println!();
    }

    if !catalog.failures().is_empty() {
        println!("{}", style("Could not load:").red().bold());
        for failure in catalog.failures() {
            println!("  {} {}: {}", style("\u{2717}").red(), failure.id, failure.reason);
        }
    }

    Ok(())
}
