//! Diagnostics for the ride service.
//!
//! Every ride mutation is logged at info with `ride_id` and the aliases
//! involved; refused requests and roll-call details are logged at debug.
//! All of it goes to stderr, since stdout carries the command's result
//! (plain text or JSON) and must stay machine-readable.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much of the service's activity reaches stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Storage and configuration faults only.
    Quiet,
    /// Store opening plus one line per committed ride or user change.
    #[default]
    Normal,
    /// Adds refusals, ignored roll-call aliases and individual row inserts.
    Verbose,
    /// Trace level for the `carpool` target.
    Trace,
}

impl Verbosity {
    /// Resolve `-q` and repeated `-v` flags. `-q` wins over any `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset. Only the `carpool`
    /// target is enabled, so dependency chatter stays out of the output.
    #[must_use]
    pub fn default_directive(&self) -> String {
        format!("carpool={}", self.to_level_filter())
    }
}

/// Install the stderr subscriber for the `carpool` binary.
///
/// `RUST_LOG` replaces the directive derived from `verbosity` entirely.
/// Calling this again after a subscriber is installed does nothing.
///
/// # Examples
///
/// ```no_run
/// use carpool::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    let _ = subscriber.try_init();
}

/// Route warnings from service tests through the test harness's capture.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("carpool=warn")
        .with_test_writer()
        .try_init();
}
