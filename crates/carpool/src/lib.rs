//! `carpool` - Shared car rides between registered users
//!
//! Drivers publish rides with a fixed number of seats, riders ask to join,
//! and the driver accepts or rejects each request. Starting a ride is a
//! single roll-call that boards present riders and marks the rest missing;
//! ending it flags anyone never dropped off. Every rider carries a history
//! of how their past participations turned out.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod capacity;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod request;
pub mod service;
pub mod stats;
pub mod storage;
pub mod view;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use logging::init_logging;
pub use model::{Participation, ParticipationStatus, Ride, RideStatus, User};
pub use request::{Request, Response};
pub use service::RideService;
pub use stats::RideStats;
pub use storage::{EntityStore, Storage};
pub use view::{RideDetail, RideSummary};
