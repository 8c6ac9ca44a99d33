//! aodkit CLI

use aodkit::{build_workflow, data::io::WriteOptions, run_directory, Workflow, TASK_TYPES};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "aodkit")]
#[command(about = "aodkit - analysis workflows over columnar collision data")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a directory of tables, run a workflow, and write its outputs
    Run {
        /// Input directory holding one Parquet file per table
        #[arg(short, long)]
        input: PathBuf,

        /// Workflow file (JSON) listing tasks and their settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Extra task to run with default settings, by type name (repeatable)
        #[arg(short, long = "task")]
        tasks: Vec<String>,

        /// Output directory for histograms.json and derived tables
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rows per record batch when writing derived tables
        #[arg(long, default_value = "10000")]
        batch_size: usize,
    },

    /// List the settings and processing modes of each task in a workflow
    Describe {
        /// Workflow file (JSON) listing tasks and their settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Extra task to describe, by type name (repeatable)
        #[arg(short, long = "task")]
        tasks: Vec<String>,
    },

    /// List the available task types
    Tasks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            input,
            config,
            tasks,
            output,
            batch_size,
        } => cmd_run(
            &input,
            config.as_deref(),
            &tasks,
            output.as_deref(),
            batch_size,
        ),
        Commands::Describe { config, tasks } => cmd_describe(config.as_deref(), &tasks),
        Commands::Tasks => {
            for type_name in TASK_TYPES {
                println!("{type_name}");
            }
            Ok(())
        }
    }
}

fn load_workflow(config: Option<&Path>, tasks: &[String]) -> Result<Workflow> {
    let config = config.map(|path| path.to_string_lossy().to_string());
    let workflow = build_workflow(config.as_deref(), tasks).context("failed to build workflow")?;
    if workflow.is_empty() {
        bail!("no tasks given, pass --config and/or --task (see `aodkit tasks`)");
    }
    Ok(workflow)
}

fn cmd_run(
    input: &Path,
    config: Option<&Path>,
    tasks: &[String],
    output: Option<&Path>,
    batch_size: usize,
) -> Result<()> {
    let mut workflow = load_workflow(config, tasks)?;
    let input = input.to_string_lossy();
    let output = output.map(|path| path.to_string_lossy().to_string());
    let result = run_directory(
        &mut workflow,
        &input,
        output.as_deref(),
        &WriteOptions::default().batch_size(batch_size),
    )
    .with_context(|| format!("failed to run workflow on \"{input}\""))?;
    print!("{result}");
    Ok(())
}

fn cmd_describe(config: Option<&Path>, tasks: &[String]) -> Result<()> {
    let workflow = load_workflow(config, tasks)?;
    for task in workflow.tasks() {
        println!("{}:", task.name());
        for configurable in task.configurables() {
            println!("  {configurable}");
        }
        for switch in task.process_switches() {
            println!("  {switch}");
        }
    }
    Ok(())
}
