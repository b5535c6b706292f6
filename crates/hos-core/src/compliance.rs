//! Compliance evaluation.
//!
//! Aggregates a day's entries and tests them against the four limits:
//! driving, on-duty window, cycle, and continuous work since the last break.
//! Every limit is strict: reaching it exactly is already non-compliant.

use serde::Serialize;

use crate::limits::{
    BREAK_REQUIRED_AFTER_MINUTES, CYCLE_LIMIT_HOURS, DRIVE_LIMIT_MINUTES, DUTY_LIMIT_MINUTES,
    MINUTES_PER_QUARTER,
};
use crate::types::{CycleHours, DutyStatus, TimeEntry};

/// Minute totals the limits are tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DutyAggregates {
    /// Slots spent driving.
    pub driving_minutes: u32,
    /// Slots spent driving or on duty.
    pub on_duty_minutes: u32,
    /// Working slots at the end of the list, back to the last rest slot.
    pub minutes_since_last_break: u32,
}

impl DutyAggregates {
    /// Computes all aggregates in one pass.
    ///
    /// The trailing run is reset on every off-duty or sleeper slot, which
    /// leaves exactly the run a backward scan from the last entry would find.
    pub fn from_entries(entries: &[TimeEntry]) -> Self {
        let mut aggregates = Self::default();
        for entry in entries {
            if entry.status == DutyStatus::Driving {
                aggregates.driving_minutes += MINUTES_PER_QUARTER;
            }
            if entry.status.is_working() {
                aggregates.on_duty_minutes += MINUTES_PER_QUARTER;
                aggregates.minutes_since_last_break += MINUTES_PER_QUARTER;
            } else {
                aggregates.minutes_since_last_break = 0;
            }
        }
        aggregates
    }

    /// Whether every limit is still ahead of the driver.
    #[must_use]
    pub fn within_limits(&self, cycle_hours: CycleHours) -> bool {
        self.driving_minutes < DRIVE_LIMIT_MINUTES
            && self.on_duty_minutes < DUTY_LIMIT_MINUTES
            && cycle_hours.value() < CYCLE_LIMIT_HOURS
            && self.minutes_since_last_break < BREAK_REQUIRED_AFTER_MINUTES
    }
}

/// Result of evaluating one set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub aggregates: DutyAggregates,
    pub cycle_hours: CycleHours,
    pub is_compliant: bool,
}

/// Evaluates entries against all limits.
pub fn evaluate(entries: &[TimeEntry], cycle_hours: CycleHours) -> Evaluation {
    let aggregates = DutyAggregates::from_entries(entries);
    Evaluation {
        aggregates,
        cycle_hours,
        is_compliant: aggregates.within_limits(cycle_hours),
    }
}

/// Minutes spent driving.
pub fn driving_minutes(entries: &[TimeEntry]) -> u32 {
    count_minutes(entries, |status| status == DutyStatus::Driving)
}

/// Minutes spent driving or on duty.
pub fn on_duty_minutes(entries: &[TimeEntry]) -> u32 {
    count_minutes(entries, |status| status.is_working())
}

/// Continuous working minutes counted backward from the last entry.
///
/// Stops at the first off-duty or sleeper slot. Anything before that slot is
/// ignored, so this is not a search for the most recent qualifying break.
pub fn minutes_since_last_break(entries: &[TimeEntry]) -> u32 {
    let quarters = entries
        .iter()
        .rev()
        .take_while(|entry| entry.status.is_working())
        .count();
    quarters_to_minutes(quarters)
}

/// Whether the entries and cycle hours are within every limit.
pub fn is_compliant(entries: &[TimeEntry], cycle_hours: CycleHours) -> bool {
    DutyAggregates::from_entries(entries).within_limits(cycle_hours)
}

fn count_minutes(entries: &[TimeEntry], matches: impl Fn(DutyStatus) -> bool) -> u32 {
    quarters_to_minutes(entries.iter().filter(|entry| matches(entry.status)).count())
}

fn quarters_to_minutes(quarters: usize) -> u32 {
    // Callers pass at most a few days of slots.
    u32::try_from(quarters).unwrap_or(u32::MAX / MINUTES_PER_QUARTER) * MINUTES_PER_QUARTER
}
