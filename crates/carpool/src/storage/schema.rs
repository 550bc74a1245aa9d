//! `SQLite` schema definitions for carpool.

/// SQL statement to create the users table.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    alias TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    plate TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the rides table.
pub const CREATE_RIDES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS rides (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ride_date_time TEXT NOT NULL,
    final_address TEXT NOT NULL,
    allowed_spaces INTEGER NOT NULL CHECK (allowed_spaces > 0),
    driver_alias TEXT NOT NULL REFERENCES users(alias),
    status TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the participations table.
///
/// A rider holds at most one participation per ride.
pub const CREATE_PARTICIPATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS participations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ride_id INTEGER NOT NULL REFERENCES rides(id),
    participant_alias TEXT NOT NULL REFERENCES users(alias),
    destination TEXT NOT NULL,
    occupied_spaces INTEGER NOT NULL CHECK (occupied_spaces > 0),
    status TEXT NOT NULL,
    confirmation TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (ride_id, participant_alias)
)
";

/// SQL statement to create an index on `driver_alias` for per-driver listings.
pub const CREATE_RIDE_DRIVER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rides_driver ON rides(driver_alias)
";

/// SQL statement to create an index on ride `status` for active listings.
pub const CREATE_RIDE_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rides_status ON rides(status)
";

/// SQL statement to create the per-alias index used for rider statistics.
pub const CREATE_PARTICIPANT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_participations_participant ON participations(participant_alias)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_RIDES_TABLE,
    CREATE_PARTICIPATIONS_TABLE,
    CREATE_RIDE_DRIVER_INDEX,
    CREATE_RIDE_STATUS_INDEX,
    CREATE_PARTICIPANT_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_users_alias_is_unique() {
        assert!(CREATE_USERS_TABLE.contains("alias TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_one_participation_per_rider_and_ride() {
        assert!(CREATE_PARTICIPATIONS_TABLE.contains("UNIQUE (ride_id, participant_alias)"));
    }
}
