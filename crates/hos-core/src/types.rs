//! Core type definitions with validation.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::limits::{MINUTES_PER_QUARTER, QUARTERS_PER_DAY};

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A quarter-hour index outside 0..=95.
    #[error("quarter hour must be between 0 and 95, got {value}")]
    QuarterHourOutOfRange { value: i64 },

    /// Unknown duty status string.
    #[error("invalid duty status: {value}")]
    InvalidDutyStatus { value: String },

    /// Unknown trip status string.
    #[error("invalid trip status: {value}")]
    InvalidTripStatus { value: String },

    /// Cycle hours were negative or not a number.
    #[error("cycle hours must be a non-negative number, got {value}")]
    InvalidCycleHours { value: f64 },

    /// A day did not contain exactly 96 entries.
    #[error("a daily log needs {expected} entries, got {count}")]
    WrongEntryCount { expected: u32, count: usize },

    /// Entries were not in contiguous quarter-hour order.
    #[error("entry at position {position} has quarter hour {found}")]
    EntryOutOfOrder { position: usize, found: u8 },
}

/// A driver's duty status for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DutyStatus {
    /// Off duty.
    OffDuty,
    /// Sleeper berth.
    Sleeper,
    /// Driving.
    Driving,
    /// On duty, not driving.
    OnDuty,
}

impl DutyStatus {
    /// String representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OffDuty => "off-duty",
            Self::Sleeper => "sleeper",
            Self::Driving => "driving",
            Self::OnDuty => "on-duty",
        }
    }

    /// Whether the slot counts toward on-duty time. Driving does.
    #[must_use]
    pub const fn is_working(&self) -> bool {
        matches!(self, Self::Driving | Self::OnDuty)
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DutyStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off-duty" => Ok(Self::OffDuty),
            "sleeper" => Ok(Self::Sleeper),
            "driving" => Ok(Self::Driving),
            "on-duty" => Ok(Self::OnDuty),
            _ => Err(ValidationError::InvalidDutyStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a planned trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    #[default]
    Planned,
    Active,
    Completed,
}

impl TripStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TripStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(ValidationError::InvalidTripStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Index of a 15-minute slot within a day, in \[0, 95\].
///
/// Slot 0 covers 00:00–00:15 and slot 95 covers 23:45–00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct QuarterHour(u8);

impl QuarterHour {
    /// Creates a slot index after validation.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|v| u32::from(*v) < QUARTERS_PER_DAY)
            .map(Self)
            .ok_or(ValidationError::QuarterHourOutOfRange { value })
    }

    /// Slot containing the given wall-clock time.
    ///
    /// Returns `None` when `hour` or `minute` is outside a day.
    #[must_use]
    pub fn from_clock(hour: u32, minute: u32) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        u8::try_from(hour * 4 + minute / MINUTES_PER_QUARTER)
            .ok()
            .map(Self)
    }

    /// Returns the inner index.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns the inner index widened for arithmetic.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<i64> for QuarterHour {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuarterHour> for u8 {
    fn from(q: QuarterHour) -> Self {
        q.0
    }
}

impl fmt::Display for QuarterHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One 15-minute slot of a driver's day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    /// Which slot of the day.
    pub quarter_hour: QuarterHour,
    /// Duty status during the slot.
    pub status: DutyStatus,
    /// Label on the first slot of a labeled span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TimeEntry {
    /// Creates an unlabeled entry.
    #[must_use]
    pub const fn new(quarter_hour: QuarterHour, status: DutyStatus) -> Self {
        Self {
            quarter_hour,
            status,
            description: None,
        }
    }

    /// Attaches a label.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Cumulative on-duty hours across the rolling cycle window.
///
/// Tracked outside the engine and passed in precomputed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CycleHours(f64);

impl CycleHours {
    /// A driver with no hours in the current cycle.
    pub const ZERO: Self = Self(0.0);

    /// Creates a value after validation.
    ///
    /// Returns an error for negative, infinite or NaN input.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidCycleHours { value });
        }
        Ok(Self(value))
    }

    /// Returns the inner hours.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for CycleHours {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CycleHours> for f64 {
    fn from(c: CycleHours) -> Self {
        c.0
    }
}

impl fmt::Display for CycleHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Minutes spent in each duty status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DutyTotals {
    pub driving_minutes: u32,
    /// On duty, not driving.
    pub on_duty_minutes: u32,
    pub off_duty_minutes: u32,
    pub sleeper_minutes: u32,
}

impl DutyTotals {
    /// Sums slot durations per status.
    pub fn from_entries(entries: &[TimeEntry]) -> Self {
        let mut totals = Self::default();
        for entry in entries {
            let bucket = match entry.status {
                DutyStatus::Driving => &mut totals.driving_minutes,
                DutyStatus::OnDuty => &mut totals.on_duty_minutes,
                DutyStatus::OffDuty => &mut totals.off_duty_minutes,
                DutyStatus::Sleeper => &mut totals.sleeper_minutes,
            };
            *bucket += MINUTES_PER_QUARTER;
        }
        totals
    }

    /// Total minutes across all statuses.
    #[must_use]
    pub const fn total_minutes(&self) -> u32 {
        self.driving_minutes + self.on_duty_minutes + self.off_duty_minutes + self.sleeper_minutes
    }
}

/// One calendar day of entries.
///
/// Always holds 96 entries in quarter-hour order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyLog {
    date: NaiveDate,
    entries: Vec<TimeEntry>,
    totals: DutyTotals,
}

impl DailyLog {
    /// Creates a log after checking the entries cover the day exactly once.
    pub fn new(date: NaiveDate, entries: Vec<TimeEntry>) -> Result<Self, ValidationError> {
        validate_day(&entries)?;
        let totals = DutyTotals::from_entries(&entries);
        Ok(Self {
            date,
            entries,
            totals,
        })
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn totals(&self) -> DutyTotals {
        self.totals
    }
}

/// Checks that `entries` are exactly slots 0..=95 in order.
pub fn validate_day(entries: &[TimeEntry]) -> Result<(), ValidationError> {
    if entries.len() != QUARTERS_PER_DAY as usize {
        return Err(ValidationError::WrongEntryCount {
            expected: QUARTERS_PER_DAY,
            count: entries.len(),
        });
    }
    for (position, entry) in entries.iter().enumerate() {
        if usize::from(entry.quarter_hour.value()) != position {
            return Err(ValidationError::EntryOutOfOrder {
                position,
                found: entry.quarter_hour.value(),
            });
        }
    }
    Ok(())
}
