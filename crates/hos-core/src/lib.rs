//! Core domain logic for hours-of-service planning.
//!
//! This crate contains the fundamental types and logic for:
//! - Schedule generation: turning a trip into quarter-hour duty entries
//! - Compliance: aggregating a day's entries and testing them against the limits
//! - Reporting: status summaries and itemized violations
//! - Stop planning and printable log sheets

pub mod compliance;
pub mod format;
pub mod limits;
pub mod report;
pub mod schedule;
pub mod sheet;
pub mod stops;
pub mod types;

pub use compliance::{
    DutyAggregates, Evaluation, driving_minutes, evaluate, is_compliant, minutes_since_last_break,
    on_duty_minutes,
};
pub use format::format_minutes;
pub use report::{
    HosStatus, NextBreak, Severity, StatusSummary, Violation, ViolationKind, compute_status,
    compute_violations,
};
pub use schedule::{
    DayPlan, DayTiming, ScheduleError, TripPlanRequest, day_remarks, generate_day, plan_trip,
};
pub use sheet::LogSheet;
pub use stops::{PlannedStop, StopKind, fuel_stop_count, plan_stops};
pub use types::{
    CycleHours, DailyLog, DutyStatus, DutyTotals, QuarterHour, TimeEntry, TripStatus,
    ValidationError,
};
