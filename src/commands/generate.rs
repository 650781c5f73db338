use std::path::PathBuf;

use agentcut::write::{ConflictPolicy, Preview};
use agentcut::{GenerateOptions, GenerationPlan, GenerationReport};
use console::style;
use miette::Result;

use super::{load_settings, preview_label, preview_stats, print_diff};

pub fn run(
    path: String,
    output: Option<String>,
    agents: Vec<String>,
    on_conflict: Option<ConflictPolicy>,
    model: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let repo_root = PathBuf::from(&path);
    let mut settings = load_settings(&repo_root)?;
    if let Some(policy) = on_conflict {
        settings.on_conflict = policy;
    }
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        settings.default_model = model;
    }

    let options = GenerateOptions {
        repo_root,
        output_root: output.map(PathBuf::from),
        manual_selection: (!agents.is_empty()).then_some(agents),
        settings,
    };

    if dry_run {
        let plan = agentcut::plan_generation(&options)?;
        print_plan(&plan);
        return Ok(());
    }

    let report = agentcut::generate_with(&options)?;
    print_report(&report);
    if !report.failed.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_plan(plan: &GenerationPlan) {
    println!(
        "\n{} Dry run: {} project, documents that would be written to {}:",
        style("==>").cyan().bold(),
        style(plan.context.project_type).bold(),
        style(plan.output_root.display()).cyan()
    );

    for planned in &plan.documents {
        println!(
            "  {} {}{}",
            preview_label(&planned.preview),
            planned.document.relative_path.display(),
            preview_stats(&planned.preview)
        );
        if let Preview::Changed { diff, .. } = &planned.preview {
            print_diff(diff);
        }
    }
    for failure in &plan.failed {
        println!(
            "  {} {}: {}",
            style("failed   ").red(),
            failure.template_id,
            failure.reason
        );
    }
    for id in &plan.missing {
        println!("  {} unknown template '{id}'", style("warning:").yellow().bold());
    }

    println!(
        "\n{} Dry run, no files written.",
        style("\u{2139}").blue().bold()
    );
}

fn print_report(report: &GenerationReport) {
    for path in &report.written {
        println!("  {} {}", style("wrote").green(), path.display());
    }
    for path in &report.unchanged {
        println!("  {} {}", style("same ").dim(), path.display());
    }
    for (path, reason) in &report.skipped {
        println!(
            "  {} {} ({reason})",
            style("skip ").yellow(),
            path.display()
        );
    }
    for failure in &report.failed {
        println!(
            "  {} {}: {}",
            style("fail ").red(),
            failure.template_id,
            failure.reason
        );
    }
    for (id, names) in &report.unresolved {
        let names: Vec<String> = names.iter().map(|n| format!("{{{{{n}}}}}")).collect();
        eprintln!(
            "{} {id}: unresolved placeholders {}",
            style("warning:").yellow().bold(),
            names.join(", ")
        );
    }
    for id in &report.missing {
        eprintln!(
            "{} unknown template '{id}' (see `agentcut list`)",
            style("warning:").yellow().bold()
        );
    }

    let mark = if report.failed.is_empty() {
        style("\u{2713}").green().bold()
    } else {
        style("\u{2717}").red().bold()
    };
    println!(
        "\n{mark} Agents in {}: {report}",
        style(report.output_root.display()).cyan()
    );
}
