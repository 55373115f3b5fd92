//! Command-line argument types.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Olvidar: sensitivity-guided pruning for machine unlearning
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "olvidar")]
#[command(version)]
#[command(about = "Prune what a model should forget, keep what it must retain")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate a run configuration
    Validate(ValidateArgs),

    /// Print the sparsity schedule a configuration produces
    Schedule(ScheduleArgs),

    /// Run unlearning on a seeded synthetic model
    Simulate(SimulateArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show the resolved configuration
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the schedule command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ScheduleArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Number of evenly spaced steps to print
    #[arg(short, long, default_value_t = 11)]
    pub points: usize,

    /// Override the step budget
    #[arg(long)]
    pub max_steps: Option<usize>,
}

/// Arguments for the simulate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SimulateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override the model seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Write the final engine state here
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Warm-start from this checkpoint's sensitivities and masks. The run
    /// itself starts again at step 0.
    #[arg(long, value_name = "CHECKPOINT")]
    pub warm_start: Option<PathBuf>,
}
