//! Command-line interface for carpool.
//!
//! This module provides the CLI structure, the mapping from subcommands to
//! [`Request`](crate::Request)s, and plain-text rendering of results.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ApplyCommand, ConfigCommand, FormatArg, RideCommand, UserCommand};
pub use output::render_plain;

use crate::config::{Config, OutputFormat};
use crate::logging::Verbosity;

/// carpool - Share car rides
///
/// Drivers publish rides, riders ask to join, and everyone's track record
/// is kept for the next trip.
#[derive(Debug, Parser)]
#[command(name = "carpool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format (overrides the configured default)
    #[arg(long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register and inspect users
    #[command(subcommand)]
    User(UserCommand),

    /// Publish rides and manage their riders
    #[command(subcommand)]
    Ride(RideCommand),

    /// Run one JSON request read from a file or stdin
    Apply(ApplyCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// The output format: `--format` if given, else the configured one.
    #[must_use]
    pub fn output_format(&self, config: &Config) -> OutputFormat {
        self.format.map_or(config.output.format, OutputFormat::from)
    }
}
