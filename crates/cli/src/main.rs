use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use torte_core::manager::PipelineManager;

mod commands;

/// Torte - a dependency-ordered build task runner
#[derive(Parser)]
#[command(name = "torte")]
#[command(about = "Run build task graphs with dependencies, criteria, and failure isolation")]
#[command(version)]
struct Cli {
    /// Path to the pipeline file
    #[arg(short, long, default_value = "torte.yml")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a target task and its transitive dependencies
    Run {
        /// Target task name (defaults to the pipeline's defaultTarget)
        target: Option<String>,
    },
    /// Show the resolved execution order for a target without running it
    Plan {
        /// Target task name
        target: String,
    },
    /// List tasks in the pipeline
    List,
    /// Show the task dependency graph
    Graph,
    /// Print the JSON Schema for pipeline files
    Schema,
}

fn load_pipeline(path: &Path) -> Result<PipelineManager> {
    PipelineManager::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load pipeline: {}", e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Execute command (CLI layer only handles presentation)
    match cli.command {
        Commands::Run { target } => {
            let manager = load_pipeline(&cli.file)?;
            commands::run::execute(&manager, target.as_deref())
        }
        Commands::Plan { target } => {
            let manager = load_pipeline(&cli.file)?;
            commands::plan::execute(&manager, &target)
        }
        Commands::List => {
            let manager = load_pipeline(&cli.file)?;
            commands::list::execute(&manager)
        }
        Commands::Graph => {
            let manager = load_pipeline(&cli.file)?;
            commands::graph::execute(&manager)
        }
        Commands::Schema => commands::schema::execute(),
    }
}
