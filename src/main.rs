mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "agentcut=debug" } else { "agentcut=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            path,
            output,
            agents,
            on_conflict,
            model,
            dry_run,
        } => commands::generate::run(path, output, agents, on_conflict, model, dry_run),
        Commands::Scan { path, json } => commands::scan::run(path, json),
        Commands::List => commands::list::run(),
        Commands::Preview { id, path, output } => commands::preview::run(id, path, output),
        Commands::Check { path } => commands::check::run(path),
    }
}
