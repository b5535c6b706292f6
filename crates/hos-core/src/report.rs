//! Status summaries and itemized violations.
//!
//! The itemized driving and on-duty violations fire only once a limit is
//! exceeded, while [`crate::compliance`] already reports non-compliance when
//! a limit is reached. Both behaviours are kept as-is.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compliance::{DutyAggregates, evaluate};
use crate::format::format_minutes;
use crate::limits::{
    BREAK_REQUIRED_AFTER_MINUTES, CYCLE_LIMIT_HOURS, DRIVE_LIMIT_MINUTES, DUTY_LIMIT_MINUTES,
};
use crate::types::{CycleHours, TimeEntry};

pub const BREAK_REQUIRED_NOW: &str = "Break required now";

/// Time left before the mandatory break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextBreak {
    /// Minutes of work left before a break is due.
    In(u32),
    /// The break is due now.
    RequiredNow,
}

impl fmt::Display for NextBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In(minutes) => f.write_str(&format_minutes(*minutes)),
            Self::RequiredNow => f.write_str(BREAK_REQUIRED_NOW),
        }
    }
}

/// Point-in-time compliance snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HosStatus {
    pub drive_minutes_left: u32,
    pub on_duty_minutes_left: u32,
    pub cycle_hours_used: CycleHours,
    pub cycle_hours_left: f64,
    pub next_break: NextBreak,
    pub is_compliant: bool,
}

impl HosStatus {
    /// Status before any log exists for the driver.
    #[must_use]
    pub fn fresh(cycle_hours: CycleHours) -> Self {
        Self::from_aggregates(&DutyAggregates::default(), cycle_hours)
    }

    fn from_aggregates(aggregates: &DutyAggregates, cycle_hours: CycleHours) -> Self {
        let break_left =
            BREAK_REQUIRED_AFTER_MINUTES.saturating_sub(aggregates.minutes_since_last_break);
        Self {
            drive_minutes_left: DRIVE_LIMIT_MINUTES.saturating_sub(aggregates.driving_minutes),
            on_duty_minutes_left: DUTY_LIMIT_MINUTES.saturating_sub(aggregates.on_duty_minutes),
            cycle_hours_used: cycle_hours,
            cycle_hours_left: (CYCLE_LIMIT_HOURS - cycle_hours.value()).max(0.0),
            next_break: if break_left == 0 {
                NextBreak::RequiredNow
            } else {
                NextBreak::In(break_left)
            },
            is_compliant: aggregates.within_limits(cycle_hours),
        }
    }

    /// Renders the snapshot as display strings.
    #[must_use]
    pub fn summary(&self) -> StatusSummary {
        StatusSummary {
            drive_time_left: format_minutes(self.drive_minutes_left),
            on_duty_left: format_minutes(self.on_duty_minutes_left),
            cycle_used: format!("{}h / {CYCLE_LIMIT_HOURS}h", self.cycle_hours_used),
            next_break: self.next_break.to_string(),
            is_compliant: self.is_compliant,
        }
    }
}

/// Display form of [`HosStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub drive_time_left: String,
    pub on_duty_left: String,
    pub cycle_used: String,
    pub next_break: String,
    pub is_compliant: bool,
}

/// Computes the status for a day's entries.
pub fn compute_status(entries: &[TimeEntry], cycle_hours: CycleHours) -> HosStatus {
    let evaluation = evaluate(entries, cycle_hours);
    HosStatus::from_aggregates(&evaluation.aggregates, cycle_hours)
}

/// Which rule a violation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DrivingLimit,
    DutyLimit,
    BreakRequired,
    CycleLimit,
}

impl ViolationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DrivingLimit => "driving_limit",
            Self::DutyLimit => "duty_limit",
            Self::BreakRequired => "break_required",
            Self::CycleLimit => "cycle_limit",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViolationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driving_limit" => Ok(Self::DrivingLimit),
            "duty_limit" => Ok(Self::DutyLimit),
            "break_required" => Ok(Self::BreakRequired),
            "cycle_limit" => Ok(Self::CycleLimit),
            _ => Err(format!("invalid violation type: {s}")),
        }
    }
}

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Needs attention before it becomes a breach.
    Warning,
    /// A regulatory breach.
    Violation,
}

impl Severity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Violation => "violation",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(Self::Warning),
            "violation" => Ok(Self::Violation),
            _ => Err(format!("invalid severity: {s}")),
        }
    }
}

/// A discrete breach or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub description: String,
    pub severity: Severity,
}

/// Lists every rule the entries and cycle hours break.
pub fn compute_violations(entries: &[TimeEntry], cycle_hours: CycleHours) -> Vec<Violation> {
    let aggregates = evaluate(entries, cycle_hours).aggregates;
    let mut violations = Vec::new();

    if aggregates.driving_minutes > DRIVE_LIMIT_MINUTES {
        violations.push(Violation {
            kind: ViolationKind::DrivingLimit,
            description: format!(
                "Exceeded 11-hour driving limit by {}",
                format_minutes(aggregates.driving_minutes - DRIVE_LIMIT_MINUTES)
            ),
            severity: Severity::Violation,
        });
    }

    if aggregates.on_duty_minutes > DUTY_LIMIT_MINUTES {
        violations.push(Violation {
            kind: ViolationKind::DutyLimit,
            description: format!(
                "Exceeded 14-hour on-duty limit by {}",
                format_minutes(aggregates.on_duty_minutes - DUTY_LIMIT_MINUTES)
            ),
            severity: Severity::Violation,
        });
    }

    if aggregates.minutes_since_last_break >= BREAK_REQUIRED_AFTER_MINUTES {
        violations.push(Violation {
            kind: ViolationKind::BreakRequired,
            description: "30-minute break required after 8 hours of continuous on-duty time"
                .to_string(),
            severity: Severity::Warning,
        });
    }

    if cycle_hours.value() >= CYCLE_LIMIT_HOURS {
        violations.push(Violation {
            kind: ViolationKind::CycleLimit,
            description: "70-hour/8-day cycle limit reached".to_string(),
            severity: Severity::Violation,
        });
    }

    if !violations.is_empty() {
        tracing::debug!(count = violations.len(), "violations found");
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DutyStatus, QuarterHour};

    fn day(spans: &[(DutyStatus, usize)]) -> Vec<TimeEntry> {
        spans
            .iter()
            .flat_map(|(status, n)| std::iter::repeat_n(*status, *n))
            .enumerate()
            .map(|(i, status)| {
                let quarter = QuarterHour::new(i64::try_from(i).unwrap()).unwrap();
                TimeEntry::new(quarter, status)
            })
            .collect()
    }

    fn cycle(hours: f64) -> CycleHours {
        CycleHours::new(hours).unwrap()
    }

    fn kinds(violations: &[Violation]) -> Vec<ViolationKind> {
        violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn all_driving_day_reports_overage() {
        let log = day(&[(DutyStatus::Driving, 96)]);
        let violations = compute_violations(&log, cycle(0.0));
        assert_eq!(
            kinds(&violations),
            vec![
                ViolationKind::DrivingLimit,
                ViolationKind::DutyLimit,
                ViolationKind::BreakRequired,
            ]
        );
        assert_eq!(
            violations[0].description,
            "Exceeded 11-hour driving limit by 13h 00m"
        );
        assert_eq!(violations[0].severity, Severity::Violation);
        assert_eq!(
            violations[1].description,
            "Exceeded 14-hour on-duty limit by 10h 00m"
        );
        assert_eq!(violations[2].severity, Severity::Warning);
    }

    #[test]
    fn reaching_a_limit_is_not_itemized() {
        // Exactly 660 driving minutes: non-compliant but no driving violation.
        let log = day(&[
            (DutyStatus::Driving, 22),
            (DutyStatus::OffDuty, 2),
            (DutyStatus::Driving, 22),
            (DutyStatus::OffDuty, 50),
        ]);
        assert!(compute_violations(&log, cycle(0.0)).is_empty());
        assert!(!compute_status(&log, cycle(0.0)).is_compliant);
    }

    #[test]
    fn exceeding_by_one_slot_is_itemized() {
        let log = day(&[
            (DutyStatus::Driving, 22),
            (DutyStatus::OffDuty, 2),
            (DutyStatus::Driving, 23),
            (DutyStatus::OffDuty, 49),
        ]);
        let violations = compute_violations(&log, cycle(0.0));
        assert_eq!(kinds(&violations), vec![ViolationKind::DrivingLimit]);
        assert_eq!(
            violations[0].description,
            "Exceeded 11-hour driving limit by 0h 15m"
        );
    }

    #[test]
    fn cycle_at_limit_is_a_violation() {
        let log = day(&[(DutyStatus::OffDuty, 96)]);
        let violations = compute_violations(&log, cycle(70.0));
        assert_eq!(kinds(&violations), vec![ViolationKind::CycleLimit]);
        assert_eq!(violations[0].severity, Severity::Violation);
        assert!(compute_violations(&log, cycle(69.5)).is_empty());
    }

    #[test]
    fn break_warning_fires_at_threshold() {
        let log = day(&[(DutyStatus::OffDuty, 64), (DutyStatus::Driving, 32)]);
        let violations = compute_violations(&log, cycle(0.0));
        assert_eq!(kinds(&violations), vec![ViolationKind::BreakRequired]);
        assert_eq!(violations[0].severity, Severity::Warning);
    }

    #[test]
    fn status_reports_remaining_time() {
        let log = day(&[
            (DutyStatus::OffDuty, 24),
            (DutyStatus::OnDuty, 4),
            (DutyStatus::Driving, 20),
            (DutyStatus::OffDuty, 48),
        ]);
        let summary = compute_status(&log, cycle(42.5)).summary();
        assert_eq!(
            summary,
            StatusSummary {
                drive_time_left: "6h 00m".to_string(),
                on_duty_left: "8h 00m".to_string(),
                cycle_used: "42.5h / 70h".to_string(),
                next_break: "8h 00m".to_string(),
                is_compliant: true,
            }
        );
    }

    #[test]
    fn status_shows_break_required_now() {
        let log = day(&[(DutyStatus::OffDuty, 56), (DutyStatus::Driving, 40)]);
        let status = compute_status(&log, cycle(0.0));
        assert_eq!(status.next_break, NextBreak::RequiredNow);
        assert_eq!(status.summary().next_break, "Break required now");
        assert!(!status.is_compliant);
    }

    #[test]
    fn status_floors_remaining_at_zero() {
        let log = day(&[(DutyStatus::Driving, 96)]);
        let status = compute_status(&log, cycle(80.0));
        assert_eq!(status.drive_minutes_left, 0);
        assert_eq!(status.on_duty_minutes_left, 0);
        assert!(status.cycle_hours_left.abs() < f64::EPSILON);
        assert_eq!(status.summary().drive_time_left, "0h 00m");
    }

    #[test]
    fn fresh_status_matches_empty_log() {
        let status = HosStatus::fresh(cycle(12.0));
        assert_eq!(status, compute_status(&[], cycle(12.0)));
        let summary = status.summary();
        assert_eq!(summary.drive_time_left, "11h 00m");
        assert_eq!(summary.on_duty_left, "14h 00m");
        assert_eq!(summary.cycle_used, "12.0h / 70h");
        assert_eq!(summary.next_break, "8h 00m");
        assert!(summary.is_compliant);
    }

    #[test]
    fn violation_serializes_with_type_tag() {
        let violation = Violation {
            kind: ViolationKind::CycleLimit,
            description: "70-hour/8-day cycle limit reached".to_string(),
            severity: Severity::Violation,
        };
        let json = serde_json::to_string(&violation).unwrap();
        assert_eq!(
            json,
            r#"{"type":"cycle_limit","description":"70-hour/8-day cycle limit reached","severity":"violation"}"#
        );
    }
}
