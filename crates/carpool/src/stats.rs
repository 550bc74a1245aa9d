//! Historical ride statistics for a rider.
//!
//! Counts are derived from every participation the rider has ever had,
//! across all rides. They decorate participant entries in the ride detail
//! view so a driver can judge a requester's track record.

use serde::{Deserialize, Serialize};

use crate::model::{Participation, ParticipationStatus};

/// A rider's participation history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideStats {
    /// Every participation found, whatever its status.
    pub total: u32,
    /// Dropped off normally.
    pub completed: u32,
    /// Confirmed but absent at start.
    pub missing: u32,
    /// Boarded but never marked as dropped off.
    pub not_marked: u32,
    /// Turned down by the driver.
    pub rejected: u32,
}

impl RideStats {
    /// Fold a sequence of statuses into counts.
    #[must_use]
    pub fn from_statuses(statuses: impl IntoIterator<Item = ParticipationStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut stats, status| {
            stats.record(status);
            stats
        })
    }

    fn record(&mut self, status: ParticipationStatus) {
        self.total += 1;
        match status {
            ParticipationStatus::Completed => self.completed += 1,
            ParticipationStatus::Missing => self.missing += 1,
            ParticipationStatus::NotMarked => self.not_marked += 1,
            ParticipationStatus::Rejected => self.rejected += 1,
            ParticipationStatus::Waiting
            | ParticipationStatus::Confirmed
            | ParticipationStatus::InProgress => {}
        }
    }
}

/// Statistics for `alias` over any collection of participations.
///
/// Participations belonging to other riders are ignored.
#[must_use]
pub fn stats_for<'a>(
    alias: &str,
    participations: impl IntoIterator<Item = &'a Participation>,
) -> RideStats {
    RideStats::from_statuses(
        participations
            .into_iter()
            .filter(|p| p.participant == alias)
            .map(|p| p.status),
    )
}
