//! The entity store seam.
//!
//! The lifecycle logic only talks to storage through [`EntityStore`], so it
//! can run against `SQLite` in production and an in-memory database in
//! tests without process-wide fixtures.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    Participation, ParticipationId, ParticipationStatus, Ride, RideId, RideStatus, User,
};

/// Fields for registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique alias.
    pub alias: String,
    /// Display name.
    pub name: String,
    /// Vehicle plate, if the user drives.
    pub plate: Option<String>,
}

/// Fields for publishing a ride. New rides start `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRide {
    /// Departure date-time.
    pub date_time: NaiveDateTime,
    /// Final address.
    pub final_address: String,
    /// Seats offered.
    pub allowed_spaces: u32,
    /// Alias of the driver.
    pub driver: String,
}

/// Fields for a join request. New participations start `Waiting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipation {
    /// Ride to join.
    pub ride_id: RideId,
    /// Alias of the rider.
    pub participant: String,
    /// Drop-off address.
    pub destination: String,
    /// Seats requested.
    pub occupied_spaces: u32,
}

/// Durable storage of users, rides and participations.
///
/// Lookups by key come in two flavours: `find_*` returns `Ok(None)` for a
/// missing entity, `get_*` turns that into [`Error::NotFound`]. Updates fail
/// with `NotFound` when no row is affected.
pub trait EntityStore {
    /// Register a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails, including a duplicate alias.
    fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Look up a user by alias.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn find_user(&self, alias: &str) -> Result<Option<User>>;

    /// All users in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_users(&self) -> Result<Vec<User>>;

    /// Publish a ride and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn create_ride(&self, ride: &NewRide) -> Result<RideId>;

    /// Look up a ride by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn find_ride(&self, id: RideId) -> Result<Option<Ride>>;

    /// All rides in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_rides(&self) -> Result<Vec<Ride>>;

    /// Rides driven by `alias`, in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_rides_by_driver(&self, alias: &str) -> Result<Vec<Ride>>;

    /// Record a join request and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn create_participation(&self, participation: &NewParticipation) -> Result<ParticipationId>;

    /// Participations of a ride, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the ride does not exist.
    fn list_participations(&self, ride_id: RideId) -> Result<Vec<Participation>>;

    /// Every participation `alias` has had, across all rides.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn participations_of(&self, alias: &str) -> Result<Vec<Participation>>;

    /// Move a ride to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the ride does not exist.
    fn update_ride_status(&self, id: RideId, status: RideStatus) -> Result<()>;

    /// Move a participation to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the participation does not exist.
    fn update_participation_status(
        &self,
        id: ParticipationId,
        status: ParticipationStatus,
    ) -> Result<()>;

    /// Mark a participation `Confirmed` and stamp its confirmation time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the participation does not exist.
    fn confirm_participation(&self, id: ParticipationId, at: DateTime<Utc>) -> Result<()>;

    /// Run `f` as one unit: either all of its writes land or none do.
    ///
    /// The default runs `f` directly, for stores without transactions.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a store error from commit.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T>,
    {
        f(self)
    }

    /// Look up a user by alias, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no user has this alias.
    fn get_user(&self, alias: &str) -> Result<User> {
        self.find_user(alias)?
            .ok_or_else(|| Error::not_found("user", alias))
    }

    /// Look up a ride by identifier, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no ride has this identifier.
    fn get_ride(&self, id: RideId) -> Result<Ride> {
        self.find_ride(id)?.ok_or_else(|| Error::not_found("ride", id))
    }
}
