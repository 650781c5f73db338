use clap::{Parser, Subcommand};

use agentcut::write::ConflictPolicy;

#[derive(Parser)]
#[command(
    name = "agentcut",
    about = "Scan a repository and generate tailored AI agent configurations from templates",
    version
)]
pub struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a repository and write agent documents for it
    Generate {
        /// Repository to scan (default: current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Output directory (default: <path>/.claude/agents, or `output_dir` from config)
        #[arg(short, long)]
        output: Option<String>,

        /// Generate exactly these templates instead of the automatic selection (repeatable)
        #[arg(short, long = "agent", value_name = "ID")]
        agents: Vec<String>,

        /// What to do with output files that were edited by hand
        #[arg(long, value_enum)]
        on_conflict: Option<ConflictPolicy>,

        /// Model for templates that do not declare one
        #[arg(long)]
        model: Option<String>,

        /// Show what would be written without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print what the scanner detects in a repository
    Scan {
        /// Repository to scan (default: current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Print the project context as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available templates
    List,

    /// Render one template and diff it against the existing output
    Preview {
        /// Template id
        id: String,

        /// Repository to scan (default: current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Output directory to compare against
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a directory of templates
    Check {
        /// Template directory (default: current directory)
        #[arg(default_value = ".")]
        path: String,
    },
}
