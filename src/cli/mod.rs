//! CLI module for olvidar
//!
//! Argument types, command handlers and output helpers for the `olvidar`
//! binary.

mod args;
mod commands;
mod logging;

pub use args::{Cli, Command, ScheduleArgs, SimulateArgs, ValidateArgs};
pub use commands::run_command;
pub use logging::{init_tracing, LogLevel};
