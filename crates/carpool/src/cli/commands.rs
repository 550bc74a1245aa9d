//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and how each one
//! becomes a [`Request`].

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::OutputFormat;
use crate::model::RideId;
use crate::request::Request;

/// User commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a user (a plate makes them a driver)
    Add {
        /// Unique alias
        alias: String,
        /// Display name
        name: String,
        /// Vehicle plate
        #[arg(short, long)]
        plate: Option<String>,
    },

    /// Show one user
    Show {
        /// User alias
        alias: String,
    },

    /// List all users
    List,

    /// Show a rider's participation history
    Stats {
        /// User alias
        alias: String,
    },
}

impl UserCommand {
    /// The request this command runs.
    #[must_use]
    pub fn into_request(self) -> Request {
        match self {
            Self::Add { alias, name, plate } => Request::RegisterUser { alias, name, plate },
            Self::Show { alias } => Request::GetUser { alias },
            Self::List => Request::ListUsers,
            Self::Stats { alias } => Request::Stats { alias },
        }
    }
}

/// Ride commands.
#[derive(Debug, Subcommand)]
pub enum RideCommand {
    /// Publish a ride
    Create {
        /// Driver alias
        #[arg(short, long)]
        driver: String,
        /// Departure as "YYYY/MM/DD HH:MM"
        #[arg(long, value_name = "DATE_TIME")]
        at: String,
        /// Final address
        #[arg(long, value_name = "ADDRESS")]
        to: String,
        /// Seats offered
        #[arg(short, long)]
        seats: i64,
    },

    /// List rides (all unfinished rides, or one driver's rides)
    List {
        /// Only rides driven by this alias
        #[arg(short, long)]
        driver: Option<String>,
    },

    /// Show a ride with its riders and their history
    Show {
        /// Ride identifier
        ride_id: RideId,
        /// Driver alias
        #[arg(short, long)]
        driver: String,
    },

    /// Ask for seats on a ride
    Join {
        /// Ride identifier
        ride_id: RideId,
        /// Driver alias
        #[arg(short, long)]
        driver: String,
        /// Rider alias
        #[arg(short, long)]
        rider: String,
        /// Drop-off address
        #[arg(long, value_name = "ADDRESS")]
        destination: String,
        /// Seats requested
        #[arg(short, long, default_value = "1")]
        seats: i64,
    },

    /// Accept a waiting request
    Accept {
        /// Ride identifier
        ride_id: RideId,
        /// Driver alias
        #[arg(short, long)]
        driver: String,
        /// Rider alias
        #[arg(short, long)]
        rider: String,
    },

    /// Reject a waiting request
    Reject {
        /// Ride identifier
        ride_id: RideId,
        /// Driver alias
        #[arg(short, long)]
        driver: String,
        /// Rider alias
        #[arg(short, long)]
        rider: String,
    },

    /// Start a ride; confirmed riders not listed as present are marked missing
    Start {
        /// Ride identifier
        ride_id: RideId,
        /// Driver alias
        #[arg(short, long)]
        driver: String,
        /// Riders who showed up (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',')]
        present: Vec<String>,
    },

    /// Finish a ride
    End {
        /// Ride identifier
        ride_id: RideId,
        /// Driver alias
        #[arg(short, long)]
        driver: String,
    },

    /// Get off a ride in progress
    Unload {
        /// Ride identifier
        ride_id: RideId,
        /// Rider alias
        #[arg(short, long)]
        rider: String,
    },
}

impl RideCommand {
    /// The request this command runs.
    #[must_use]
    pub fn into_request(self) -> Request {
        match self {
            Self::Create {
                driver,
                at,
                to,
                seats,
            } => Request::CreateRide {
                driver,
                ride_date_and_time: at,
                final_address: to,
                allowed_spaces: seats,
            },
            Self::List { driver: Some(alias) } => Request::RidesOf { alias },
            Self::List { driver: None } => Request::ActiveRides,
            Self::Show { ride_id, driver } => Request::RideDetail { driver, ride_id },
            Self::Join {
                ride_id,
                driver,
                rider,
                destination,
                seats,
            } => Request::RequestToJoin {
                driver,
                ride_id,
                participant: rider,
                destination,
                occupied_spaces: seats,
            },
            Self::Accept {
                ride_id,
                driver,
                rider,
            } => Request::Accept {
                driver,
                ride_id,
                participant: rider,
            },
            Self::Reject {
                ride_id,
                driver,
                rider,
            } => Request::Reject {
                driver,
                ride_id,
                participant: rider,
            },
            Self::Start {
                ride_id,
                driver,
                present,
            } => Request::Start {
                driver,
                ride_id,
                present,
            },
            Self::End { ride_id, driver } => Request::End { driver, ride_id },
            Self::Unload { ride_id, rider } => Request::Unload {
                participant: rider,
                ride_id,
            },
        }
    }
}

/// Apply command arguments.
#[derive(Debug, Args)]
pub struct ApplyCommand {
    /// JSON request file (reads stdin when omitted)
    pub file: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Plain text output
    Plain,
    /// JSON output
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Plain => Self::Plain,
            FormatArg::Json => Self::Json,
        }
    }
}
