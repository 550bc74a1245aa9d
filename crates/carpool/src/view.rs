//! Read models returned to callers.
//!
//! List views carry ride headers only. The detail view adds every
//! participation, each decorated with the rider's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capacity::available_spaces;
use crate::model::{
    format_ride_date_time, Participation, ParticipationStatus, Ride, RideId, RideStatus,
};
use crate::stats::RideStats;

/// A ride as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideSummary {
    /// Ride identifier.
    pub id: RideId,
    /// Departure in `YYYY/MM/DD HH:MM`.
    pub ride_date_and_time: String,
    /// Final address.
    pub final_address: String,
    /// Driver alias.
    pub driver: String,
    /// Lifecycle status.
    pub status: RideStatus,
    /// Seats offered.
    pub allowed_spaces: u32,
    /// Seats still free.
    pub available_spaces: u32,
}

impl RideSummary {
    /// Build the listing view of `ride`.
    #[must_use]
    pub fn new(ride: &Ride, participations: &[Participation]) -> Self {
        Self {
            id: ride.id,
            ride_date_and_time: format_ride_date_time(&ride.date_time),
            final_address: ride.final_address.clone(),
            driver: ride.driver.clone(),
            status: ride.status,
            allowed_spaces: ride.allowed_spaces,
            available_spaces: available_spaces(ride, participations),
        }
    }
}

/// A rider and their track record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    /// Rider alias.
    pub alias: String,
    /// All participations ever.
    pub previous_rides_total: u32,
    /// Completed drop-offs.
    pub previous_rides_completed: u32,
    /// No-shows.
    pub previous_rides_missing: u32,
    /// Rides that ended without a drop-off mark.
    pub previous_rides_not_marked: u32,
    /// Rejected requests.
    pub previous_rides_rejected: u32,
}

impl ParticipantInfo {
    /// Attach `stats` to `alias`.
    #[must_use]
    pub fn new(alias: &str, stats: RideStats) -> Self {
        Self {
            alias: alias.to_string(),
            previous_rides_total: stats.total,
            previous_rides_completed: stats.completed,
            previous_rides_missing: stats.missing,
            previous_rides_not_marked: stats.not_marked,
            previous_rides_rejected: stats.rejected,
        }
    }
}

/// One participation inside a ride detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEntry {
    /// When the driver accepted, if they did.
    pub confirmation: Option<DateTime<Utc>>,
    /// The rider with their history.
    pub participant: ParticipantInfo,
    /// Drop-off address.
    pub destination: String,
    /// Seats requested.
    pub occupied_spaces: u32,
    /// Lifecycle status.
    pub status: ParticipationStatus,
}

/// A ride with all of its participations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideDetail {
    /// Ride header.
    #[serde(flatten)]
    pub ride: RideSummary,
    /// Participations in request order.
    pub participants: Vec<ParticipantEntry>,
}

impl RideDetail {
    /// Build the detail view. `stats_of` supplies each rider's history.
    pub fn new<F>(ride: &Ride, participations: &[Participation], mut stats_of: F) -> Self
    where
        F: FnMut(&str) -> RideStats,
    {
        let participants = participations
            .iter()
            .map(|p| ParticipantEntry {
                confirmation: p.confirmation,
                participant: ParticipantInfo::new(&p.participant, stats_of(&p.participant)),
                destination: p.destination.clone(),
                occupied_spaces: p.occupied_spaces,
                status: p.status,
            })
            .collect();

        Self {
            ride: RideSummary::new(ride, participations),
            participants,
        }
    }
}
