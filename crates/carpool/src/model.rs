//! Core entity types for carpool.
//!
//! Users, rides and participations as they are stored and exchanged, plus
//! the lifecycle status vocabularies for rides and participations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};

/// Ride identifier, assigned by the store in creation order starting at 1.
pub type RideId = i64;

/// Participation identifier, assigned by the store in creation order starting at 1.
pub type ParticipationId = i64;

/// Canonical pattern for ride date-times exchanged with callers.
pub const RIDE_DATE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Parse a ride date-time in the canonical `YYYY/MM/DD HH:MM` pattern.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the string does not match the pattern.
pub fn parse_ride_date_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), RIDE_DATE_TIME_FORMAT).map_err(|_| {
        Error::invalid_input(format!(
            "ride date-time '{value}' does not match YYYY/MM/DD HH:MM"
        ))
    })
}

/// Render a ride date-time in the canonical pattern.
#[must_use]
pub fn format_ride_date_time(value: &NaiveDateTime) -> String {
    value.format(RIDE_DATE_TIME_FORMAT).to_string()
}

/// A status string that matches no known lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

/// Lifecycle of a ride. Linear: `Ready -> InProgress -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    /// Published and accepting join requests.
    Ready,
    /// Started; passengers are aboard.
    InProgress,
    /// Ended.
    Finished,
}

impl RideStatus {
    /// Wire and storage name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::InProgress => "inprogress",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ready" => Ok(Self::Ready),
            "inprogress" => Ok(Self::InProgress),
            "finished" => Ok(Self::Finished),
            _ => Err(ParseStatusError {
                kind: "ride",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of one rider's request to join a ride.
///
/// `Waiting` resolves to `Confirmed` or `Rejected`. `Confirmed` only moves
/// when the ride starts, to `InProgress` (present) or `Missing` (absent).
/// `InProgress` ends as `Completed` (unloaded) or `NotMarked` (ride ended
/// first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    /// Requested, awaiting the driver's decision.
    Waiting,
    /// Turned down by the driver.
    Rejected,
    /// Accepted by the driver; seats are held.
    Confirmed,
    /// Aboard a started ride; seats are held.
    InProgress,
    /// Dropped off.
    Completed,
    /// Confirmed but absent when the ride started.
    Missing,
    /// Boarded, but the ride ended before a drop-off was recorded.
    NotMarked,
}

impl ParticipationStatus {
    /// Wire and storage name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Rejected => "rejected",
            Self::Confirmed => "confirmed",
            Self::InProgress => "inprogress",
            Self::Completed => "completed",
            Self::Missing => "missing",
            Self::NotMarked => "notmarked",
        }
    }

    /// Whether a participation in this status holds seats on its ride.
    #[must_use]
    pub fn occupies_seats(self) -> bool {
        matches!(self, Self::Confirmed | Self::InProgress)
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ParticipationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "rejected" => Ok(Self::Rejected),
            "confirmed" => Ok(Self::Confirmed),
            "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "missing" => Ok(Self::Missing),
            "notmarked" => Ok(Self::NotMarked),
            _ => Err(ParseStatusError {
                kind: "participation",
                value: s.to_string(),
            }),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned identifier.
    pub id: i64,
    /// Unique, stable external key.
    pub alias: String,
    /// Display name.
    pub name: String,
    /// Vehicle plate; set only for drivers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
}

impl User {
    /// A user is a driver iff a plate is on file.
    #[must_use]
    pub fn is_driver(&self) -> bool {
        self.plate.is_some()
    }
}

/// A scheduled shared trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    /// Store-assigned identifier.
    pub id: RideId,
    /// When the ride leaves.
    pub date_time: NaiveDateTime,
    /// Where the ride ends.
    pub final_address: String,
    /// Total seats offered.
    pub allowed_spaces: u32,
    /// Alias of the owning driver.
    pub driver: String,
    /// Lifecycle status.
    pub status: RideStatus,
}

impl Ride {
    /// Whether `alias` is this ride's driver.
    #[must_use]
    pub fn is_driven_by(&self, alias: &str) -> bool {
        self.driver == alias
    }
}

/// One rider's request to join, and membership in, a ride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participation {
    /// Store-assigned identifier.
    pub id: ParticipationId,
    /// The ride this participation belongs to.
    pub ride_id: RideId,
    /// Alias of the rider.
    pub participant: String,
    /// Where the rider gets off; may precede the ride's final address.
    pub destination: String,
    /// Seats requested.
    pub occupied_spaces: u32,
    /// Lifecycle status.
    pub status: ParticipationStatus,
    /// When the driver accepted; absent until then.
    pub confirmation: Option<DateTime<Utc>>,
}
