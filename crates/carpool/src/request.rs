//! Request records and their results.
//!
//! Every operation has a [`Request`] variant carrying its typed arguments.
//! [`RideService::handle`] dispatches one request and wraps the outcome in a
//! [`Response`]. Requests travel as JSON objects tagged by `"op"`:
//!
//! ```json
//! {"op": "request_to_join", "driver": "jperez", "rideId": 1,
//!  "participant": "lgomez", "destination": "Surquillo", "occupiedSpaces": 1}
//! ```

use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Participation, RideId, User};
use crate::service::RideService;
use crate::stats::RideStats;
use crate::storage::EntityStore;
use crate::view::{RideDetail, RideSummary};

/// One operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Register a user; a plate makes them a driver.
    RegisterUser {
        /// Unique alias.
        alias: String,
        /// Display name.
        name: String,
        /// Vehicle plate.
        #[serde(default)]
        plate: Option<String>,
    },
    /// Look up one user.
    GetUser {
        /// User alias.
        alias: String,
    },
    /// List every user.
    ListUsers,
    /// Publish a ride.
    #[serde(rename_all = "camelCase")]
    CreateRide {
        /// Driver alias.
        driver: String,
        /// Departure in `YYYY/MM/DD HH:MM`.
        ride_date_and_time: String,
        /// Final address.
        final_address: String,
        /// Seats offered.
        allowed_spaces: i64,
    },
    /// Rides driven by a user.
    RidesOf {
        /// Driver alias.
        alias: String,
    },
    /// Rides that have not finished.
    ActiveRides,
    /// A ride with its participants and their history.
    #[serde(rename_all = "camelCase")]
    RideDetail {
        /// Driver alias.
        driver: String,
        /// Ride identifier.
        ride_id: RideId,
    },
    /// Ask for seats on a ride.
    #[serde(rename_all = "camelCase")]
    RequestToJoin {
        /// Driver alias.
        driver: String,
        /// Ride identifier.
        ride_id: RideId,
        /// Rider alias.
        participant: String,
        /// Drop-off address.
        destination: String,
        /// Seats requested.
        occupied_spaces: i64,
    },
    /// Accept a waiting request.
    #[serde(rename_all = "camelCase")]
    Accept {
        /// Driver alias.
        driver: String,
        /// Ride identifier.
        ride_id: RideId,
        /// Rider alias.
        participant: String,
    },
    /// Reject a waiting request.
    #[serde(rename_all = "camelCase")]
    Reject {
        /// Driver alias.
        driver: String,
        /// Ride identifier.
        ride_id: RideId,
        /// Rider alias.
        participant: String,
    },
    /// Start a ride with a roll-call of present riders.
    #[serde(rename_all = "camelCase")]
    Start {
        /// Driver alias.
        driver: String,
        /// Ride identifier.
        ride_id: RideId,
        /// Aliases of riders who showed up.
        #[serde(default)]
        present: Vec<String>,
    },
    /// Finish a ride.
    #[serde(rename_all = "camelCase")]
    End {
        /// Driver alias.
        driver: String,
        /// Ride identifier.
        ride_id: RideId,
    },
    /// A rider gets off.
    #[serde(rename_all = "camelCase")]
    Unload {
        /// Rider alias.
        participant: String,
        /// Ride identifier.
        ride_id: RideId,
    },
    /// A rider's history.
    Stats {
        /// Rider alias.
        alias: String,
    },
}

impl Request {
    /// Parse one request from its JSON form.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for malformed JSON, an unknown `op`, or missing or
    /// mistyped fields.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::invalid_input(format!("malformed request: {e}")))
    }

    /// Read `reader` to the end and parse it as one request.
    ///
    /// # Errors
    ///
    /// `Io` if reading fails, otherwise as [`Request::from_json`].
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_json(&text)
    }

    /// The `op` tag of this request.
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::RegisterUser { .. } => "register_user",
            Self::GetUser { .. } => "get_user",
            Self::ListUsers => "list_users",
            Self::CreateRide { .. } => "create_ride",
            Self::RidesOf { .. } => "rides_of",
            Self::ActiveRides => "active_rides",
            Self::RideDetail { .. } => "ride_detail",
            Self::RequestToJoin { .. } => "request_to_join",
            Self::Accept { .. } => "accept",
            Self::Reject { .. } => "reject",
            Self::Start { .. } => "start",
            Self::End { .. } => "end",
            Self::Unload { .. } => "unload",
            Self::Stats { .. } => "stats",
        }
    }
}

/// The result of a successful request.
///
/// Serializes as the bare payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// One user.
    User(User),
    /// Several users.
    Users(Vec<User>),
    /// One ride, list view.
    Ride(RideSummary),
    /// Several rides, list view.
    Rides(Vec<RideSummary>),
    /// One ride with participants.
    RideDetail(RideDetail),
    /// One participation after a transition.
    Participation(Participation),
    /// Rider history.
    Stats(RideStats),
}

impl<S: EntityStore> RideService<S> {
    /// Run one request.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation fails with.
    pub fn handle(&self, request: Request) -> Result<Response> {
        debug!(op = request.op(), "handling request");
        let response = match request {
            Request::RegisterUser { alias, name, plate } => {
                Response::User(self.register_user(&alias, &name, plate.as_deref())?)
            }
            Request::GetUser { alias } => Response::User(self.user(&alias)?),
            Request::ListUsers => Response::Users(self.users()?),
            Request::CreateRide {
                driver,
                ride_date_and_time,
                final_address,
                allowed_spaces,
            } => Response::Ride(self.create_ride(
                &driver,
                &ride_date_and_time,
                &final_address,
                allowed_spaces,
            )?),
            Request::RidesOf { alias } => Response::Rides(self.rides_of(&alias)?),
            Request::ActiveRides => Response::Rides(self.active_rides()?),
            Request::RideDetail { driver, ride_id } => {
                Response::RideDetail(self.ride_detail(&driver, ride_id)?)
            }
            Request::RequestToJoin {
                driver,
                ride_id,
                participant,
                destination,
                occupied_spaces,
            } => Response::Participation(self.request_to_join(
                &driver,
                ride_id,
                &participant,
                &destination,
                occupied_spaces,
            )?),
            Request::Accept {
                driver,
                ride_id,
                participant,
            } => Response::Participation(self.accept(&driver, ride_id, &participant)?),
            Request::Reject {
                driver,
                ride_id,
                participant,
            } => Response::Participation(self.reject(&driver, ride_id, &participant)?),
            Request::Start {
                driver,
                ride_id,
                present,
            } => Response::Ride(self.start_ride(&driver, ride_id, &present)?),
            Request::End { driver, ride_id } => Response::Ride(self.end_ride(&driver, ride_id)?),
            Request::Unload {
                participant,
                ride_id,
            } => Response::Participation(self.unload(&participant, ride_id)?),
            Request::Stats { alias } => Response::Stats(self.stats(&alias)?),
        };
        Ok(response)
    }
}
