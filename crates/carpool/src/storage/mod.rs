//! Storage layer for carpool.
//!
//! This module provides `SQLite`-based persistent storage for users, rides
//! and participations behind the [`EntityStore`] trait.

mod entity_store;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior,
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    format_ride_date_time, Participation, ParticipationId, ParticipationStatus, Ride, RideId,
    RideStatus, User, RIDE_DATE_TIME_FORMAT,
};

pub use entity_store::{EntityStore, NewParticipation, NewRide, NewUser};

const RIDE_COLUMNS: &str =
    "id, ride_date_time, final_address, allowed_spaces, driver_alias, status";

const PARTICIPATION_COLUMNS: &str =
    "id, ride_id, participant_alias, destination, occupied_spaces, status, confirmation";

/// `SQLite` entity store.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Wait up to `timeout` for a lock held by another connection.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` rejects the setting.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn query_rides(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Ride>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rides = stmt
            .query_map(params, Self::row_to_ride)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rides)
    }

    fn query_participations(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Participation>> {
        let mut stmt = self.conn.prepare(sql)?;
        let participations = stmt
            .query_map(params, Self::row_to_participation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(participations)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            alias: row.get(1)?,
            name: row.get(2)?,
            plate: row.get(3)?,
        })
    }

    fn row_to_ride(row: &rusqlite::Row) -> rusqlite::Result<Ride> {
        let date_time_str: String = row.get(1)?;
        let status_str: String = row.get(5)?;

        let date_time = NaiveDateTime::parse_from_str(&date_time_str, RIDE_DATE_TIME_FORMAT)
            .map_err(|e| conversion_error(1, e))?;
        let status = status_str
            .parse::<RideStatus>()
            .map_err(|e| conversion_error(5, e))?;

        Ok(Ride {
            id: row.get(0)?,
            date_time,
            final_address: row.get(2)?,
            allowed_spaces: row.get(3)?,
            driver: row.get(4)?,
            status,
        })
    }

    fn row_to_participation(row: &rusqlite::Row) -> rusqlite::Result<Participation> {
        let status_str: String = row.get(5)?;
        let confirmation_str: Option<String> = row.get(6)?;

        let status = status_str
            .parse::<ParticipationStatus>()
            .map_err(|e| conversion_error(5, e))?;
        let confirmation = confirmation_str
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| conversion_error(6, e))?;

        Ok(Participation {
            id: row.get(0)?,
            ride_id: row.get(1)?,
            participant: row.get(2)?,
            destination: row.get(3)?,
            occupied_spaces: row.get(4)?,
            status,
            confirmation,
        })
    }
}

impl EntityStore for Storage {
    fn create_user(&self, user: &NewUser) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (alias, name, plate) VALUES (?1, ?2, ?3)",
                params![user.alias, user.name, user.plate],
            )
            .map_err(|e| map_constraint(e, || format!("user '{}' already exists", user.alias)))?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted user {} with id {}", user.alias, id);
        Ok(User {
            id,
            alias: user.alias.clone(),
            name: user.name.clone(),
            plate: user.plate.clone(),
        })
    }

    fn find_user(&self, alias: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, alias, name, plate FROM users WHERE alias = ?1",
                [alias],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, alias, name, plate FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn create_ride(&self, ride: &NewRide) -> Result<RideId> {
        self.conn.execute(
            r"
            INSERT INTO rides (ride_date_time, final_address, allowed_spaces, driver_alias, status)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                format_ride_date_time(&ride.date_time),
                ride.final_address,
                ride.allowed_spaces,
                ride.driver,
                RideStatus::Ready.as_str(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted ride with id {}", id);
        Ok(id)
    }

    fn find_ride(&self, id: RideId) -> Result<Option<Ride>> {
        let ride = self
            .conn
            .query_row(
                &format!("SELECT {RIDE_COLUMNS} FROM rides WHERE id = ?1"),
                [id],
                Self::row_to_ride,
            )
            .optional()?;
        Ok(ride)
    }

    fn list_rides(&self) -> Result<Vec<Ride>> {
        self.query_rides(&format!("SELECT {RIDE_COLUMNS} FROM rides ORDER BY id"), [])
    }

    fn list_rides_by_driver(&self, alias: &str) -> Result<Vec<Ride>> {
        self.query_rides(
            &format!("SELECT {RIDE_COLUMNS} FROM rides WHERE driver_alias = ?1 ORDER BY id"),
            [alias],
        )
    }

    fn create_participation(&self, participation: &NewParticipation) -> Result<ParticipationId> {
        self.conn
            .execute(
                r"
                INSERT INTO participations
                    (ride_id, participant_alias, destination, occupied_spaces, status)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    participation.ride_id,
                    participation.participant,
                    participation.destination,
                    participation.occupied_spaces,
                    ParticipationStatus::Waiting.as_str(),
                ],
            )
            .map_err(|e| {
                map_constraint(e, || {
                    format!(
                        "user '{}' already requested to join ride {}",
                        participation.participant, participation.ride_id
                    )
                })
            })?;

        let id = self.conn.last_insert_rowid();
        debug!(
            "Inserted participation {} for {} on ride {}",
            id, participation.participant, participation.ride_id
        );
        Ok(id)
    }

    fn list_participations(&self, ride_id: RideId) -> Result<Vec<Participation>> {
        if self.find_ride(ride_id)?.is_none() {
            return Err(Error::not_found("ride", ride_id));
        }
        self.query_participations(
            &format!(
                "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE ride_id = ?1 ORDER BY id"
            ),
            [ride_id],
        )
    }

    fn participations_of(&self, alias: &str) -> Result<Vec<Participation>> {
        self.query_participations(
            &format!(
                "SELECT {PARTICIPATION_COLUMNS} FROM participations \
                 WHERE participant_alias = ?1 ORDER BY id"
            ),
            [alias],
        )
    }

    fn update_ride_status(&self, id: RideId, status: RideStatus) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE rides SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        if affected == 0 {
            return Err(Error::not_found("ride", id));
        }
        Ok(())
    }

    fn update_participation_status(
        &self,
        id: ParticipationId,
        status: ParticipationStatus,
    ) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE participations SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        if affected == 0 {
            return Err(Error::not_found("participation", id));
        }
        Ok(())
    }

    fn confirm_participation(&self, id: ParticipationId, at: DateTime<Utc>) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE participations SET status = ?2, confirmation = ?3 WHERE id = ?1",
            params![id, ParticipationStatus::Confirmed.as_str(), at.to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(Error::not_found("participation", id));
        }
        Ok(())
    }

    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T>,
    {
        // IMMEDIATE takes the write lock up front, so a second writer waits
        // on busy_timeout here instead of failing on its first write.
        // Dropping the transaction on the error path rolls it back.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Turn a uniqueness violation into a conflict; pass anything else through.
fn map_constraint(err: rusqlite::Error, message: impl FnOnce() -> String) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::Conflict(message())
        }
        other => other.into(),
    }
}
