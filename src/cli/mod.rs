//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the extractor using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Toast Extractor - Toast POS to CSV extraction tool
#[derive(Parser, Debug)]
#[command(name = "toast-extractor")]
#[command(version, about, long_about = None)]
#[command(author = "Toast Extractor Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "toast.toml", env = "TOAST_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TOAST_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract orders and restaurant configuration into CSV tables
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show the watermark and the next resume window
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
