//! `carpool` - CLI for shared car rides
//!
//! Each invocation opens the configured store, runs one operation and prints
//! its result. Domain failures exit with status 2, system faults with 1.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use carpool::cli::{render_plain, Cli, Command, ConfigCommand};
use carpool::config::OutputFormat;
use carpool::{init_logging, Config, Request, RideService, Storage};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validation reports a broken file instead of failing to start
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        let path = file
            .clone()
            .or_else(|| cli.config.clone())
            .unwrap_or_else(Config::default_config_path);
        return Ok(validate_config(&path));
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    let format = cli.output_format(&config);

    match cli.command {
        Command::User(cmd) => execute(&config, cmd.into_request(), format),
        Command::Ride(cmd) => execute(&config, cmd.into_request(), format),
        Command::Apply(cmd) => match read_request(cmd.file.as_deref()) {
            Ok(request) => execute(&config, request, format),
            Err(err) if err.is_domain() => report_refusal(&err, format),
            Err(err) => Err(err.into()),
        },
        Command::Config(cmd) => {
            handle_config(&config, &cmd, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn execute(config: &Config, request: Request, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let path = config.database_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("opening ride store at {}", path.display()))?;
    storage.set_busy_timeout(config.busy_timeout())?;

    let service = RideService::new(storage);
    match service.handle(request) {
        Ok(response) => {
            match format {
                OutputFormat::Plain => println!("{}", render_plain(&response)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_domain() => report_refusal(&err, format),
        Err(err) => Err(err.into()),
    }
}

/// Print a domain error and exit with status 2.
fn report_refusal(err: &carpool::Error, format: OutputFormat) -> anyhow::Result<ExitCode> {
    debug!(kind = ?err.kind(), "request refused");
    match format {
        OutputFormat::Plain => eprintln!("error: {err}"),
        OutputFormat::Json => {
            let body = serde_json::json!({
                "error": { "kind": err.kind(), "message": err.to_string() }
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    Ok(ExitCode::from(2))
}

fn read_request(file: Option<&Path>) -> carpool::Result<Request> {
    match file {
        Some(path) => Request::from_reader(File::open(path)?),
        None => Request::from_reader(std::io::stdin().lock()),
    }
}

fn validate_config(path: &Path) -> ExitCode {
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path.to_path_buf())) {
        Ok(_) => {
            println!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Configuration error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn handle_config(config: &Config, cmd: &ConfigCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Plain => {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Busy timeout (ms):  {}", config.storage.busy_timeout_ms);
                println!();
                println!("[Output]");
                println!("  Format:             {:?}", config.output.format);
            }
        },
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { .. } => {}
    }
    Ok(())
}
