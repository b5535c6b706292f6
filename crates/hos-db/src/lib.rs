//! Storage layer for HOS planning.
//!
//! Persists drivers, trips, daily logs and violations using `rusqlite`.
//! The engine in `hos-core` never touches this crate; callers serialize
//! engine output into records here and read entries back before
//! re-evaluating them.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 format (e.g., `2024-01-15T10:30:00Z`)
//! and log dates as `YYYY-MM-DD`, so lexicographic ordering matches
//! chronological ordering.
//!
//! ## Log Payload Storage
//!
//! `eld_logs.time_entries` holds the day's entries as a JSON list of
//! `{"quarterHour", "status", "description"}` objects. `remarks` holds the
//! remark lines joined with `\n`.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use hos_core::{
    CycleHours, DailyLog, DutyTotals, Severity, TimeEntry, TripStatus, ValidationError, Violation,
    ViolationKind, day_remarks, is_compliant, schedule::REST_REMARK,
};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Another driver already holds this license number.
    #[error("a driver with license {0} already exists")]
    DuplicateLicense(String),
    /// No row with the given ID.
    #[error("{table} record not found: {id}")]
    NotFound { table: &'static str, id: String },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {table} {id}: {value}")]
    TimestampParse {
        table: &'static str,
        id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored value failed validation.
    #[error("invalid {table} record {id}: {message}")]
    InvalidRecord {
        table: &'static str,
        id: String,
        message: String,
    },
    /// Entries handed in for a log do not form a valid day.
    #[error("invalid log entries: {0}")]
    InvalidEntries(#[from] ValidationError),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A stored driver.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverRecord {
    pub id: String,
    pub name: String,
    pub license_number: String,
    pub current_cycle_hours: CycleHours,
    pub created_at: DateTime<Utc>,
}

/// A trip to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub driver_id: String,
    pub current_location: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    /// Pounds.
    pub estimated_weight: i64,
    /// Miles.
    pub total_distance: Option<f64>,
    /// Minutes.
    pub estimated_duration: Option<i64>,
    /// Route geometry and stops as returned by the routing client.
    pub route_data: Option<serde_json::Value>,
}

/// A stored trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub id: String,
    pub driver_id: String,
    pub current_location: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub estimated_weight: i64,
    pub total_distance: Option<f64>,
    pub estimated_duration: Option<i64>,
    pub route_data: Option<serde_json::Value>,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A daily log to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLog {
    pub driver_id: String,
    pub trip_id: Option<String>,
    pub log: DailyLog,
    pub total_miles: f64,
    pub remarks: Vec<String>,
    pub is_compliant: bool,
}

/// A stored daily log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub id: String,
    pub driver_id: String,
    pub trip_id: Option<String>,
    pub log_date: NaiveDate,
    pub total_miles: f64,
    pub totals: DutyTotals,
    pub time_entries: Vec<TimeEntry>,
    pub remarks: Vec<String>,
    pub is_compliant: bool,
    pub created_at: DateTime<Utc>,
}

impl LogRecord {
    /// Rebuilds the validated day from the stored entries.
    pub fn daily_log(&self) -> Result<DailyLog, ValidationError> {
        DailyLog::new(self.log_date, self.time_entries.clone())
    }
}

/// A stored violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationRecord {
    pub id: String,
    pub driver_id: String,
    pub trip_id: Option<String>,
    pub violation: Violation,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}

const DRIVER_COLUMNS: &str = "id, name, license_number, current_cycle_hours, created_at";
const TRIP_COLUMNS: &str = "id, driver_id, current_location, pickup_location, dropoff_location, estimated_weight, total_distance, estimated_duration, route_data, status, created_at, updated_at";
const LOG_COLUMNS: &str = "id, driver_id, trip_id, log_date, total_miles, driving_time, on_duty_time, off_duty_time, sleeper_berth_time, time_entries, remarks, is_compliant, created_at";
const VIOLATION_COLUMNS: &str =
    "id, driver_id, trip_id, violation_type, description, severity, timestamp, resolved";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS drivers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                license_number TEXT NOT NULL UNIQUE,
                current_cycle_hours REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS trips (
                id TEXT PRIMARY KEY,
                driver_id TEXT NOT NULL,
                current_location TEXT NOT NULL,
                pickup_location TEXT NOT NULL,
                dropoff_location TEXT NOT NULL,
                estimated_weight INTEGER NOT NULL DEFAULT 80000,
                total_distance REAL,
                estimated_duration INTEGER,
                route_data TEXT,
                status TEXT NOT NULL DEFAULT 'planned',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (driver_id) REFERENCES drivers(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_trips_driver ON trips(driver_id);

            -- One row per driver per day.
            -- log_date: 'YYYY-MM-DD'
            -- *_time columns: minutes; on_duty_time excludes driving
            -- time_entries: JSON list of 96 quarter-hour entries
            CREATE TABLE IF NOT EXISTS eld_logs (
                id TEXT PRIMARY KEY,
                driver_id TEXT NOT NULL,
                trip_id TEXT,
                log_date TEXT NOT NULL,
                total_miles REAL NOT NULL DEFAULT 0,
                driving_time INTEGER NOT NULL DEFAULT 0,
                on_duty_time INTEGER NOT NULL DEFAULT 0,
                off_duty_time INTEGER NOT NULL DEFAULT 0,
                sleeper_berth_time INTEGER NOT NULL DEFAULT 0,
                time_entries TEXT NOT NULL,
                remarks TEXT NOT NULL DEFAULT '',
                is_compliant INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                FOREIGN KEY (driver_id) REFERENCES drivers(id) ON DELETE CASCADE,
                FOREIGN KEY (trip_id) REFERENCES trips(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_eld_logs_driver_date ON eld_logs(driver_id, log_date);
            CREATE INDEX IF NOT EXISTS idx_eld_logs_trip ON eld_logs(trip_id);

            CREATE TABLE IF NOT EXISTS hos_violations (
                id TEXT PRIMARY KEY,
                driver_id TEXT NOT NULL,
                trip_id TEXT,
                violation_type TEXT NOT NULL,
                description TEXT NOT NULL,
                severity TEXT NOT NULL DEFAULT 'warning',
                timestamp TEXT NOT NULL,
                resolved INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (driver_id) REFERENCES drivers(id) ON DELETE CASCADE,
                FOREIGN KEY (trip_id) REFERENCES trips(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_hos_violations_driver ON hos_violations(driver_id, resolved);
            ",
        )?;
        Ok(())
    }

    // ========== Drivers ==========

    /// Creates a driver. License numbers are unique.
    pub fn insert_driver(
        &mut self,
        name: &str,
        license_number: &str,
        current_cycle_hours: CycleHours,
    ) -> Result<DriverRecord, DbError> {
        let record = DriverRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            license_number: license_number.to_string(),
            current_cycle_hours,
            created_at: now(),
        };
        let result = self.conn.execute(
            "
            INSERT INTO drivers (id, name, license_number, current_cycle_hours, created_at)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                record.id,
                record.name,
                record.license_number,
                record.current_cycle_hours.value(),
                format_timestamp(record.created_at),
            ],
        );
        match result {
            Ok(_) => {
                tracing::debug!(driver_id = %record.id, "driver created");
                Ok(record)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(DbError::DuplicateLicense(license_number.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Fetches a driver by ID.
    pub fn get_driver(&self, id: &str) -> Result<DriverRecord, DbError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = ?"),
                [id],
                RawDriver::from_row,
            )
            .optional()?;
        raw.ok_or_else(|| not_found("driver", id))?.try_into()
    }

    /// Fetches a driver by license number.
    pub fn get_driver_by_license(&self, license_number: &str) -> Result<DriverRecord, DbError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE license_number = ?"),
                [license_number],
                RawDriver::from_row,
            )
            .optional()?;
        raw.ok_or_else(|| not_found("driver", license_number))?
            .try_into()
    }

    /// Lists drivers ordered by name.
    pub fn list_drivers(&self) -> Result<Vec<DriverRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers ORDER BY name ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], RawDriver::from_row)?;
        let mut drivers = Vec::new();
        for row in rows {
            drivers.push(row?.try_into()?);
        }
        Ok(drivers)
    }

    /// Records the driver's cycle hours.
    pub fn update_cycle_hours(&mut self, id: &str, hours: CycleHours) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE drivers SET current_cycle_hours = ? WHERE id = ?",
            params![hours.value(), id],
        )?;
        if updated == 0 {
            return Err(not_found("driver", id));
        }
        Ok(())
    }

    // ========== Trips ==========

    /// Stores a new trip in the `planned` state.
    pub fn insert_trip(&mut self, trip: &NewTrip) -> Result<TripRecord, DbError> {
        let created_at = now();
        let record = TripRecord {
            id: Uuid::new_v4().to_string(),
            driver_id: trip.driver_id.clone(),
            current_location: trip.current_location.clone(),
            pickup_location: trip.pickup_location.clone(),
            dropoff_location: trip.dropoff_location.clone(),
            estimated_weight: trip.estimated_weight,
            total_distance: trip.total_distance,
            estimated_duration: trip.estimated_duration,
            route_data: trip.route_data.clone(),
            status: TripStatus::Planned,
            created_at,
            updated_at: created_at,
        };
        self.conn.execute(
            &format!(
                "INSERT INTO trips ({TRIP_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                record.id,
                record.driver_id,
                record.current_location,
                record.pickup_location,
                record.dropoff_location,
                record.estimated_weight,
                record.total_distance,
                record.estimated_duration,
                record.route_data.as_ref().map(ToString::to_string),
                record.status.as_str(),
                format_timestamp(record.created_at),
                format_timestamp(record.updated_at),
            ],
        )?;
        tracing::debug!(trip_id = %record.id, driver_id = %record.driver_id, "trip created");
        Ok(record)
    }

    /// Fetches a trip by ID.
    pub fn get_trip(&self, id: &str) -> Result<TripRecord, DbError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?"),
                [id],
                RawTrip::from_row,
            )
            .optional()?;
        raw.ok_or_else(|| not_found("trip", id))?.try_into()
    }

    /// Lists a driver's trips, newest first.
    pub fn list_trips_for_driver(&self, driver_id: &str) -> Result<Vec<TripRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE driver_id = ? ORDER BY created_at DESC, id ASC"
        ))?;
        let rows = stmt.query_map([driver_id], RawTrip::from_row)?;
        let mut trips = Vec::new();
        for row in rows {
            trips.push(row?.try_into()?);
        }
        Ok(trips)
    }

    /// Moves a trip to a new status.
    pub fn set_trip_status(&mut self, id: &str, status: TripStatus) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE trips SET status = ?, updated_at = ? WHERE id = ?",
            params![status.as_str(), format_timestamp(now()), id],
        )?;
        if updated == 0 {
            return Err(not_found("trip", id));
        }
        Ok(())
    }

    // ========== Daily logs ==========

    /// Stores a batch of logs in one transaction, returning their IDs in order.
    pub fn insert_logs(&mut self, logs: &[NewLog]) -> Result<Vec<String>, DbError> {
        let created_at = format_timestamp(now());
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(logs.len());
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO eld_logs ({LOG_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ))?;
            for log in logs {
                let id = Uuid::new_v4().to_string();
                let totals = log.log.totals();
                stmt.execute(params![
                    id,
                    log.driver_id,
                    log.trip_id,
                    format_date(log.log.date()),
                    log.total_miles,
                    totals.driving_minutes,
                    totals.on_duty_minutes,
                    totals.off_duty_minutes,
                    totals.sleeper_minutes,
                    encode_entries(log.log.entries()),
                    log.remarks.join("\n"),
                    log.is_compliant,
                    created_at,
                ])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        tracing::debug!(count = ids.len(), "logs stored");
        Ok(ids)
    }

    /// Fetches a log by ID.
    pub fn get_log(&self, id: &str) -> Result<LogRecord, DbError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {LOG_COLUMNS} FROM eld_logs WHERE id = ?"),
                [id],
                RawLog::from_row,
            )
            .optional()?;
        raw.ok_or_else(|| not_found("eld_log", id))?.try_into()
    }

    /// The driver's most recent log by date, if any.
    pub fn latest_log_for_driver(&self, driver_id: &str) -> Result<Option<LogRecord>, DbError> {
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {LOG_COLUMNS} FROM eld_logs WHERE driver_id = ?
                     ORDER BY log_date DESC, created_at DESC LIMIT 1"
                ),
                [driver_id],
                RawLog::from_row,
            )
            .optional()?;
        raw.map(TryInto::try_into).transpose()
    }

    /// Lists a driver's logs, newest first, optionally within inclusive dates.
    pub fn list_logs_for_driver(
        &self,
        driver_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<LogRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {LOG_COLUMNS} FROM eld_logs
            WHERE driver_id = ?1
              AND (?2 IS NULL OR log_date >= ?2)
              AND (?3 IS NULL OR log_date <= ?3)
            ORDER BY log_date DESC, created_at DESC
            "
        ))?;
        let rows = stmt.query_map(
            params![driver_id, start.map(format_date), end.map(format_date)],
            RawLog::from_row,
        )?;
        collect_logs(rows)
    }

    /// Lists a trip's logs, newest first.
    pub fn list_logs_for_trip(&self, trip_id: &str) -> Result<Vec<LogRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM eld_logs WHERE trip_id = ? ORDER BY log_date DESC"
        ))?;
        let rows = stmt.query_map([trip_id], RawLog::from_row)?;
        collect_logs(rows)
    }

    /// Replaces a log's entries after a manual edit.
    ///
    /// Totals and the compliance flag are re-derived using the driver's
    /// current cycle hours.
    pub fn replace_log_entries(
        &mut self,
        id: &str,
        entries: Vec<TimeEntry>,
    ) -> Result<LogRecord, DbError> {
        let existing = self.get_log(id)?;
        let driver = self.get_driver(&existing.driver_id)?;
        let log = DailyLog::new(existing.log_date, entries)?;
        let totals = log.totals();
        let compliant = is_compliant(log.entries(), driver.current_cycle_hours);

        // Remarks describe the entries; only the rest line is not derived from them.
        let mut remarks = day_remarks(log.entries());
        if existing.remarks.iter().any(|r| r == REST_REMARK) {
            remarks.push(REST_REMARK.to_string());
        }

        self.conn.execute(
            "
            UPDATE eld_logs
            SET driving_time = ?, on_duty_time = ?, off_duty_time = ?, sleeper_berth_time = ?,
                time_entries = ?, remarks = ?, is_compliant = ?
            WHERE id = ?
            ",
            params![
                totals.driving_minutes,
                totals.on_duty_minutes,
                totals.off_duty_minutes,
                totals.sleeper_minutes,
                encode_entries(log.entries()),
                remarks.join("\n"),
                compliant,
                id,
            ],
        )?;
        tracing::debug!(log_id = %id, compliant, "log entries replaced");
        self.get_log(id)
    }

    // ========== Violations ==========

    /// Stores violations found for a driver, returning their IDs in order.
    pub fn insert_violations(
        &mut self,
        driver_id: &str,
        trip_id: Option<&str>,
        violations: &[Violation],
    ) -> Result<Vec<String>, DbError> {
        let timestamp = format_timestamp(now());
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(violations.len());
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO hos_violations ({VIOLATION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, 0)"
            ))?;
            for violation in violations {
                let id = Uuid::new_v4().to_string();
                stmt.execute(params![
                    id,
                    driver_id,
                    trip_id,
                    violation.kind.as_str(),
                    violation.description,
                    violation.severity.as_str(),
                    timestamp,
                ])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    /// Lists a driver's unresolved violations, newest first.
    pub fn list_active_violations(
        &self,
        driver_id: &str,
    ) -> Result<Vec<ViolationRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {VIOLATION_COLUMNS} FROM hos_violations
            WHERE driver_id = ? AND resolved = 0
            ORDER BY timestamp DESC, rowid ASC
            "
        ))?;
        let rows = stmt.query_map([driver_id], RawViolation::from_row)?;
        let mut violations = Vec::new();
        for row in rows {
            violations.push(row?.try_into()?);
        }
        Ok(violations)
    }

    /// Marks a violation as resolved.
    pub fn resolve_violation(&mut self, id: &str) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE hos_violations SET resolved = 1 WHERE id = ?",
            [id],
        )?;
        if updated == 0 {
            return Err(not_found("hos_violation", id));
        }
        tracing::debug!(violation_id = %id, "violation resolved");
        Ok(())
    }
}

// ========== Row decoding ==========

struct RawDriver {
    id: String,
    name: String,
    license_number: String,
    current_cycle_hours: f64,
    created_at: String,
}

impl RawDriver {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            license_number: row.get(2)?,
            current_cycle_hours: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl TryFrom<RawDriver> for DriverRecord {
    type Error = DbError;

    fn try_from(raw: RawDriver) -> Result<Self, Self::Error> {
        let current_cycle_hours = CycleHours::new(raw.current_cycle_hours)
            .map_err(|err| invalid("driver", &raw.id, err))?;
        let created_at = parse_timestamp(&raw.created_at, "driver", &raw.id)?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            license_number: raw.license_number,
            current_cycle_hours,
            created_at,
        })
    }
}

struct RawTrip {
    id: String,
    driver_id: String,
    current_location: String,
    pickup_location: String,
    dropoff_location: String,
    estimated_weight: i64,
    total_distance: Option<f64>,
    estimated_duration: Option<i64>,
    route_data: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl RawTrip {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            driver_id: row.get(1)?,
            current_location: row.get(2)?,
            pickup_location: row.get(3)?,
            dropoff_location: row.get(4)?,
            estimated_weight: row.get(5)?,
            total_distance: row.get(6)?,
            estimated_duration: row.get(7)?,
            route_data: row.get(8)?,
            status: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

impl TryFrom<RawTrip> for TripRecord {
    type Error = DbError;

    fn try_from(raw: RawTrip) -> Result<Self, Self::Error> {
        let status = raw
            .status
            .parse::<TripStatus>()
            .map_err(|err| invalid("trip", &raw.id, err))?;
        let route_data = raw
            .route_data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|err| invalid("trip", &raw.id, err))?;
        let created_at = parse_timestamp(&raw.created_at, "trip", &raw.id)?;
        let updated_at = parse_timestamp(&raw.updated_at, "trip", &raw.id)?;
        Ok(Self {
            id: raw.id,
            driver_id: raw.driver_id,
            current_location: raw.current_location,
            pickup_location: raw.pickup_location,
            dropoff_location: raw.dropoff_location,
            estimated_weight: raw.estimated_weight,
            total_distance: raw.total_distance,
            estimated_duration: raw.estimated_duration,
            route_data,
            status,
            created_at,
            updated_at,
        })
    }
}

struct RawLog {
    id: String,
    driver_id: String,
    trip_id: Option<String>,
    log_date: String,
    total_miles: f64,
    totals: DutyTotals,
    time_entries: String,
    remarks: String,
    is_compliant: bool,
    created_at: String,
}

impl RawLog {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            driver_id: row.get(1)?,
            trip_id: row.get(2)?,
            log_date: row.get(3)?,
            total_miles: row.get(4)?,
            totals: DutyTotals {
                driving_minutes: row.get(5)?,
                on_duty_minutes: row.get(6)?,
                off_duty_minutes: row.get(7)?,
                sleeper_minutes: row.get(8)?,
            },
            time_entries: row.get(9)?,
            remarks: row.get(10)?,
            is_compliant: row.get(11)?,
            created_at: row.get(12)?,
        })
    }
}

impl TryFrom<RawLog> for LogRecord {
    type Error = DbError;

    fn try_from(raw: RawLog) -> Result<Self, Self::Error> {
        let log_date = NaiveDate::parse_from_str(&raw.log_date, "%Y-%m-%d").map_err(|source| {
            DbError::TimestampParse {
                table: "eld_log",
                id: raw.id.clone(),
                value: raw.log_date.clone(),
                source,
            }
        })?;
        let time_entries: Vec<TimeEntry> = serde_json::from_str(&raw.time_entries)
            .map_err(|err| invalid("eld_log", &raw.id, err))?;
        let remarks = if raw.remarks.is_empty() {
            Vec::new()
        } else {
            raw.remarks.split('\n').map(str::to_string).collect()
        };
        let created_at = parse_timestamp(&raw.created_at, "eld_log", &raw.id)?;
        Ok(Self {
            id: raw.id,
            driver_id: raw.driver_id,
            trip_id: raw.trip_id,
            log_date,
            total_miles: raw.total_miles,
            totals: raw.totals,
            time_entries,
            remarks,
            is_compliant: raw.is_compliant,
            created_at,
        })
    }
}

struct RawViolation {
    id: String,
    driver_id: String,
    trip_id: Option<String>,
    kind: String,
    description: String,
    severity: String,
    timestamp: String,
    resolved: bool,
}

impl RawViolation {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            driver_id: row.get(1)?,
            trip_id: row.get(2)?,
            kind: row.get(3)?,
            description: row.get(4)?,
            severity: row.get(5)?,
            timestamp: row.get(6)?,
            resolved: row.get(7)?,
        })
    }
}

impl TryFrom<RawViolation> for ViolationRecord {
    type Error = DbError;

    fn try_from(raw: RawViolation) -> Result<Self, Self::Error> {
        let kind = raw
            .kind
            .parse::<ViolationKind>()
            .map_err(|err| invalid("hos_violation", &raw.id, err))?;
        let severity = raw
            .severity
            .parse::<Severity>()
            .map_err(|err| invalid("hos_violation", &raw.id, err))?;
        let timestamp = parse_timestamp(&raw.timestamp, "hos_violation", &raw.id)?;
        Ok(Self {
            id: raw.id,
            driver_id: raw.driver_id,
            trip_id: raw.trip_id,
            violation: Violation {
                kind,
                description: raw.description,
                severity,
            },
            timestamp,
            resolved: raw.resolved,
        })
    }
}

fn collect_logs(
    rows: impl Iterator<Item = rusqlite::Result<RawLog>>,
) -> Result<Vec<LogRecord>, DbError> {
    let mut logs = Vec::new();
    for row in rows {
        logs.push(row?.try_into()?);
    }
    Ok(logs)
}

fn encode_entries(entries: &[TimeEntry]) -> String {
    // Plain data with string keys; serialization cannot fail.
    serde_json::to_string(entries).unwrap_or_else(|_| "[]".to_string())
}

fn not_found(table: &'static str, id: &str) -> DbError {
    DbError::NotFound {
        table,
        id: id.to_string(),
    }
}

fn invalid(table: &'static str, id: &str, err: impl std::fmt::Display) -> DbError {
    DbError::InvalidRecord {
        table,
        id: id.to_string(),
        message: err.to_string(),
    }
}

fn now() -> DateTime<Utc> {
    // Stored with second precision; trim so records compare equal after a round-trip.
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

fn parse_timestamp(value: &str, table: &'static str, id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            table,
            id: id.to_string(),
            value: value.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use hos_core::{DayTiming, DutyStatus, QuarterHour, compute_violations, generate_day};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn cycle(hours: f64) -> CycleHours {
        CycleHours::new(hours).unwrap()
    }

    fn planned_log(day: u32, driving_hours: f64) -> DailyLog {
        let start = date(day).and_hms_opt(6, 0, 0).unwrap();
        let entries = generate_day(&DayTiming::new(start, driving_hours)).unwrap();
        DailyLog::new(date(day), entries).unwrap()
    }

    fn new_log(driver_id: &str, trip_id: Option<&str>, log: DailyLog) -> NewLog {
        NewLog {
            driver_id: driver_id.to_string(),
            trip_id: trip_id.map(str::to_string),
            is_compliant: is_compliant(log.entries(), CycleHours::ZERO),
            log,
            total_miles: 412.5,
            remarks: vec!["06:00 - Pickup".to_string(), "07:00 - Driving".to_string()],
        }
    }

    fn sample_trip(driver_id: &str) -> NewTrip {
        NewTrip {
            driver_id: driver_id.to_string(),
            current_location: "Dallas, TX".to_string(),
            pickup_location: "Fort Worth, TX".to_string(),
            dropoff_location: "Houston, TX".to_string(),
            estimated_weight: 80_000,
            total_distance: Some(272.4),
            estimated_duration: Some(260),
            route_data: Some(serde_json::json!({"stops": []})),
        }
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "drivers"),
            vec![
                "id",
                "name",
                "license_number",
                "current_cycle_hours",
                "created_at"
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "eld_logs"),
            vec![
                "id",
                "driver_id",
                "trip_id",
                "log_date",
                "total_miles",
                "driving_time",
                "on_duty_time",
                "off_duty_time",
                "sleeper_berth_time",
                "time_entries",
                "remarks",
                "is_compliant",
                "created_at",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "hos_violations"),
            vec![
                "id",
                "driver_id",
                "trip_id",
                "violation_type",
                "description",
                "severity",
                "timestamp",
                "resolved",
            ]
        );
        assert_eq!(table_columns(&db.conn, "trips").len(), 12);

        assert!(index_names(&db.conn, "eld_logs").contains("idx_eld_logs_driver_date"));
        assert!(index_names(&db.conn, "hos_violations").contains("idx_hos_violations_driver"));
    }

    #[test]
    fn open_is_idempotent_on_disk() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("hos.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.insert_driver("Ray Koenig", "TX-1001", cycle(5.0)).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_drivers().unwrap().len(), 1);
    }

    #[test]
    fn drivers_roundtrip_and_lookup_by_license() {
        let mut db = Database::open_in_memory().unwrap();
        let created = db.insert_driver("Ray Koenig", "TX-1001", cycle(22.5)).unwrap();

        assert_eq!(db.get_driver(&created.id).unwrap(), created);
        assert_eq!(db.get_driver_by_license("TX-1001").unwrap(), created);
        assert!(matches!(
            db.get_driver_by_license("nope"),
            Err(DbError::NotFound { table: "driver", .. })
        ));
    }

    #[test]
    fn duplicate_license_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_driver("Ray Koenig", "TX-1001", cycle(0.0)).unwrap();
        let err = db
            .insert_driver("Someone Else", "TX-1001", cycle(0.0))
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateLicense(license) if license == "TX-1001"));
    }

    #[test]
    fn list_drivers_orders_by_name() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_driver("Zed", "L-2", cycle(0.0)).unwrap();
        db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        let names: Vec<String> = db
            .list_drivers()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
    }

    #[test]
    fn update_cycle_hours_persists() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        db.update_cycle_hours(&driver.id, cycle(61.25)).unwrap();
        assert_eq!(
            db.get_driver(&driver.id).unwrap().current_cycle_hours,
            cycle(61.25)
        );
        assert!(db.update_cycle_hours("missing", cycle(1.0)).is_err());
    }

    #[test]
    fn trips_roundtrip_with_route_data() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        let trip = db.insert_trip(&sample_trip(&driver.id)).unwrap();

        let stored = db.get_trip(&trip.id).unwrap();
        assert_eq!(stored, trip);
        assert_eq!(stored.status, TripStatus::Planned);
        assert_eq!(stored.route_data, Some(serde_json::json!({"stops": []})));

        db.set_trip_status(&trip.id, TripStatus::Active).unwrap();
        assert_eq!(db.get_trip(&trip.id).unwrap().status, TripStatus::Active);
        assert_eq!(db.list_trips_for_driver(&driver.id).unwrap().len(), 1);
    }

    #[test]
    fn log_entries_roundtrip_exactly() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        let trip = db.insert_trip(&sample_trip(&driver.id)).unwrap();
        let log = planned_log(7, 9.5);

        let ids = db
            .insert_logs(&[new_log(&driver.id, Some(&trip.id), log.clone())])
            .unwrap();
        let stored = db.get_log(&ids[0]).unwrap();

        assert_eq!(stored.time_entries, log.entries());
        assert_eq!(stored.daily_log().unwrap(), log);
        assert_eq!(stored.totals, log.totals());
        assert_eq!(stored.log_date, date(7));
        assert_eq!(stored.trip_id.as_deref(), Some(trip.id.as_str()));
        assert_eq!(stored.remarks, vec!["06:00 - Pickup", "07:00 - Driving"]);
        assert!((stored.total_miles - 412.5).abs() < f64::EPSILON);
    }

    #[test]
    fn latest_log_and_date_filters() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        assert!(db.latest_log_for_driver(&driver.id).unwrap().is_none());

        db.insert_logs(&[
            new_log(&driver.id, None, planned_log(1, 4.0)),
            new_log(&driver.id, None, planned_log(3, 6.0)),
            new_log(&driver.id, None, planned_log(2, 5.0)),
        ])
        .unwrap();

        let latest = db.latest_log_for_driver(&driver.id).unwrap().unwrap();
        assert_eq!(latest.log_date, date(3));

        let all = db.list_logs_for_driver(&driver.id, None, None).unwrap();
        let dates: Vec<NaiveDate> = all.iter().map(|l| l.log_date).collect();
        assert_eq!(dates, vec![date(3), date(2), date(1)]);

        let filtered = db
            .list_logs_for_driver(&driver.id, Some(date(2)), Some(date(2)))
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].log_date, date(2));

        let from = db
            .list_logs_for_driver(&driver.id, Some(date(2)), None)
            .unwrap();
        assert_eq!(from.len(), 2);
    }

    #[test]
    fn replace_log_entries_rederives_totals() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        let ids = db
            .insert_logs(&[new_log(&driver.id, None, planned_log(5, 3.0))])
            .unwrap();

        let mut entries = db.get_log(&ids[0]).unwrap().time_entries;
        for entry in &mut entries[60..96] {
            entry.status = DutyStatus::Driving;
        }
        let updated = db.replace_log_entries(&ids[0], entries.clone()).unwrap();

        assert_eq!(updated.time_entries, entries);
        assert_eq!(updated.totals.driving_minutes, 12 * 15 + 36 * 15);
        assert!(!updated.is_compliant);
    }

    #[test]
    fn replace_log_entries_regenerates_remarks() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        let mut resting = new_log(&driver.id, None, planned_log(6, 3.0));
        resting.remarks.push(REST_REMARK.to_string());
        let ids = db
            .insert_logs(&[new_log(&driver.id, None, planned_log(5, 3.0)), resting])
            .unwrap();

        let mut entries = db.get_log(&ids[0]).unwrap().time_entries;
        for entry in &mut entries[60..64] {
            entry.status = DutyStatus::Driving;
        }
        let updated = db.replace_log_entries(&ids[0], entries).unwrap();
        assert_eq!(
            updated.remarks,
            vec![
                "06:00 - Pickup",
                "07:00 - Driving",
                "10:00 - Delivery",
                "11:00 - Off duty",
                "15:00 - Driving",
                "16:00 - Off duty",
            ]
        );

        let entries = db.get_log(&ids[1]).unwrap().time_entries;
        let updated = db.replace_log_entries(&ids[1], entries).unwrap();
        assert_eq!(updated.remarks.last().map(String::as_str), Some(REST_REMARK));
        assert_eq!(updated.remarks.len(), 5);
    }

    #[test]
    fn replace_log_entries_rejects_partial_day() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        let ids = db
            .insert_logs(&[new_log(&driver.id, None, planned_log(5, 3.0))])
            .unwrap();
        let entries = vec![TimeEntry::new(QuarterHour::new(0).unwrap(), DutyStatus::OffDuty)];
        assert!(matches!(
            db.replace_log_entries(&ids[0], entries),
            Err(DbError::InvalidEntries(_))
        ));
    }

    #[test]
    fn violations_resolve_and_drop_out_of_active_list() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(70.0)).unwrap();
        let all_driving: Vec<TimeEntry> = (0..96)
            .map(|q| TimeEntry::new(QuarterHour::new(q).unwrap(), DutyStatus::Driving))
            .collect();
        let violations = compute_violations(&all_driving, driver.current_cycle_hours);
        assert_eq!(violations.len(), 4);

        let ids = db
            .insert_violations(&driver.id, None, &violations)
            .unwrap();
        let active = db.list_active_violations(&driver.id).unwrap();
        assert_eq!(active.len(), 4);
        let stored: Vec<Violation> = active.iter().map(|v| v.violation.clone()).collect();
        assert_eq!(stored, violations);

        db.resolve_violation(&ids[0]).unwrap();
        let active = db.list_active_violations(&driver.id).unwrap();
        assert_eq!(active.len(), 3);
        assert!(active.iter().all(|v| !v.resolved && v.id != ids[0]));

        assert!(matches!(
            db.resolve_violation("missing"),
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn corrupt_entries_surface_as_invalid_record() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db.insert_driver("Amy", "L-1", cycle(0.0)).unwrap();
        let ids = db
            .insert_logs(&[new_log(&driver.id, None, planned_log(5, 3.0))])
            .unwrap();
        db.conn
            .execute(
                "UPDATE eld_logs SET time_entries = ? WHERE id = ?",
                params![r#"[{"quarterHour":120,"status":"driving"}]"#, ids[0]],
            )
            .unwrap();
        assert!(matches!(
            db.get_log(&ids[0]),
            Err(DbError::InvalidRecord { table: "eld_log", .. })
        ));
    }
}
