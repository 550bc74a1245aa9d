//! Seat accounting for rides.

use crate::model::{Participation, Ride};

/// Seats held by participations that are confirmed or aboard.
#[must_use]
pub fn occupied_spaces(participations: &[Participation]) -> u32 {
    participations
        .iter()
        .filter(|p| p.status.occupies_seats())
        .map(|p| p.occupied_spaces)
        .sum()
}

/// Seats still free on `ride` given its current participations.
///
/// Always recomputed from the participation statuses; every mutator checks
/// against this before confirming more seats, so the result never needs to
/// go below zero.
#[must_use]
pub fn available_spaces(ride: &Ride, participations: &[Participation]) -> u32 {
    ride.allowed_spaces
        .saturating_sub(occupied_spaces(participations))
}
