//! Ride and participation lifecycles.
//!
//! [`RideService`] owns the entity store and runs every operation as one
//! atomic unit: it takes an exclusive lock on the store, opens a store
//! transaction, validates fully, and only then writes. A failed validation
//! therefore never leaves a partial update behind.
//!
//! The ride-side transitions live in `ride`, the rider-side ones in
//! `participation`; read-only queries are here.

mod participation;
mod ride;

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Participation, ParticipationStatus, Ride, RideId, RideStatus, User};
use crate::stats::{stats_for, RideStats};
use crate::storage::{EntityStore, NewUser};
use crate::view::{RideDetail, RideSummary};

/// Entry point for every ride-sharing operation.
#[derive(Debug)]
pub struct RideService<S> {
    store: Mutex<S>,
}

impl<S: EntityStore> RideService<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Run `op` with exclusive access to the store, inside one transaction.
    fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&S) -> Result<T>,
    {
        let store = self
            .store
            .lock()
            .map_err(|_| Error::internal("entity store lock poisoned"))?;
        store.atomically(op)
    }

    /// Register a new user. A blank plate means the user does not drive.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank alias or name, `Conflict` if the alias is taken.
    pub fn register_user(&self, alias: &str, name: &str, plate: Option<&str>) -> Result<User> {
        self.run(|store| {
            let alias = required(alias, "alias")?;
            let name = required(name, "name")?;
            let plate = plate
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string);

            if store.find_user(&alias)?.is_some() {
                return Err(Error::conflict(format!("user '{alias}' already exists")));
            }

            let user = store.create_user(&NewUser { alias, name, plate })?;
            info!(alias = %user.alias, driver = user.is_driver(), "user registered");
            Ok(user)
        })
    }

    /// Look up one user.
    ///
    /// # Errors
    ///
    /// `NotFound` if no user has this alias.
    pub fn user(&self, alias: &str) -> Result<User> {
        self.run(|store| store.get_user(alias))
    }

    /// All registered users.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn users(&self) -> Result<Vec<User>> {
        self.run(|store| store.list_users())
    }

    /// Rides driven by `alias`, as list views.
    ///
    /// # Errors
    ///
    /// `NotFound` if no user has this alias.
    pub fn rides_of(&self, alias: &str) -> Result<Vec<RideSummary>> {
        self.run(|store| {
            store.get_user(alias)?;
            summarize(store, store.list_rides_by_driver(alias)?)
        })
    }

    /// Every ride that has not finished, as list views.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn active_rides(&self) -> Result<Vec<RideSummary>> {
        self.run(|store| {
            let rides = store
                .list_rides()?
                .into_iter()
                .filter(|r| r.status != RideStatus::Finished)
                .collect();
            summarize(store, rides)
        })
    }

    /// Full view of one of `driver`'s rides, each rider decorated with history.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown driver or ride, `Forbidden` if the ride
    /// belongs to someone else.
    pub fn ride_detail(&self, driver: &str, ride_id: RideId) -> Result<RideDetail> {
        self.run(|store| {
            let ride = owned_ride(store, driver, ride_id)?;
            let participations = store.list_participations(ride_id)?;

            let mut history = HashMap::with_capacity(participations.len());
            for p in &participations {
                let stats = stats_for(&p.participant, &store.participations_of(&p.participant)?);
                history.insert(p.participant.clone(), stats);
            }

            Ok(RideDetail::new(&ride, &participations, |alias| {
                history.get(alias).copied().unwrap_or_default()
            }))
        })
    }

    /// Historical counts over every participation `alias` has had.
    ///
    /// # Errors
    ///
    /// `NotFound` if no user has this alias.
    pub fn stats(&self, alias: &str) -> Result<RideStats> {
        self.run(|store| {
            store.get_user(alias)?;
            Ok(stats_for(alias, &store.participations_of(alias)?))
        })
    }
}

fn summarize<S: EntityStore>(store: &S, rides: Vec<Ride>) -> Result<Vec<RideSummary>> {
    rides
        .iter()
        .map(|ride| Ok(RideSummary::new(ride, &store.list_participations(ride.id)?)))
        .collect()
}

/// Load `ride_id` after checking `driver` exists and owns it.
fn owned_ride<S: EntityStore>(store: &S, driver: &str, ride_id: RideId) -> Result<Ride> {
    store.get_user(driver)?;
    let ride = store.get_ride(ride_id)?;
    if !ride.is_driven_by(driver) {
        return Err(Error::forbidden(format!(
            "ride {ride_id} does not belong to '{driver}'"
        )));
    }
    Ok(ride)
}

fn require_ride_status(ride: &Ride, expected: RideStatus, action: &str) -> Result<()> {
    if ride.status == expected {
        Ok(())
    } else {
        Err(Error::invalid_state(format!(
            "cannot {action}: ride {} is {}, expected {expected}",
            ride.id, ride.status
        )))
    }
}

fn require_participation_status(
    participation: &Participation,
    expected: ParticipationStatus,
) -> Result<()> {
    if participation.status == expected {
        Ok(())
    } else {
        Err(Error::invalid_state(format!(
            "participation of '{}' on ride {} is {}, expected {expected}",
            participation.participant, participation.ride_id, participation.status
        )))
    }
}

fn find_participation<'a>(
    participations: &'a [Participation],
    alias: &str,
    ride_id: RideId,
) -> Result<&'a Participation> {
    participations
        .iter()
        .find(|p| p.participant == alias)
        .ok_or_else(|| Error::not_found("participation", format!("{alias} on ride {ride_id}")))
}

/// Trimmed, non-empty text field.
fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid_input(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Strictly positive seat count.
fn positive_seats(value: i64, field: &str) -> Result<u32> {
    match u32::try_from(value) {
        Ok(seats) if seats > 0 => Ok(seats),
        _ => Err(Error::invalid_input(format!(
            "{field} must be a positive number, got {value}"
        ))),
    }
}
