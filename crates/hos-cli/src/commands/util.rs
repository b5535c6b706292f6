//! Shared utilities for CLI commands.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use hos_core::{CycleHours, DutyStatus, TimeEntry, Violation};
use hos_db::{Database, DbError, DriverRecord};

const START_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a local start time such as `2025-04-07T06:00`.
pub fn parse_start(s: &str) -> Result<NaiveDateTime> {
    START_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s.trim(), format).ok())
        .with_context(|| format!("Invalid start time: {s}. Use YYYY-MM-DDTHH:MM (e.g., 2025-04-07T06:00)"))
}

/// Validates cycle hours from the command line.
pub fn parse_cycle_hours(hours: f64) -> Result<CycleHours> {
    CycleHours::new(hours).context("invalid cycle hours")
}

/// Looks a driver up by ID, then by license number.
pub fn resolve_driver(db: &Database, key: &str) -> Result<DriverRecord> {
    match db.get_driver(key) {
        Ok(driver) => Ok(driver),
        Err(DbError::NotFound { .. }) => db
            .get_driver_by_license(key)
            .with_context(|| format!("driver not found: {key}")),
        Err(err) => Err(err).context("failed to load driver"),
    }
}

/// Reads a JSON list of entries from a file.
pub fn read_entries(path: &std::path::Path) -> Result<Vec<TimeEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse entries in {}", path.display()))
}

/// Date used when checking a file that carries no date of its own.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

const GRID_ROWS: [(&str, DutyStatus); 4] = [
    ("OFF", DutyStatus::OffDuty),
    ("SB", DutyStatus::Sleeper),
    ("D", DutyStatus::Driving),
    ("ON", DutyStatus::OnDuty),
];

/// Renders a day as the four-row duty grid of a paper log, one column per
/// quarter hour.
pub fn render_grid(entries: &[TimeEntry]) -> String {
    let mut output = String::new();
    let mut header = String::from("    ");
    for hour in 0..24 {
        write!(header, "{hour:<4}").unwrap();
    }
    output.push_str(header.trim_end());
    output.push('\n');

    for (label, status) in GRID_ROWS {
        let cells: String = entries
            .iter()
            .map(|entry| if entry.status == status { '#' } else { '.' })
            .collect();
        writeln!(output, "{label:<4}{cells}").unwrap();
    }
    output
}

/// One line per violation, or `None.`
pub fn format_violations(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "  None.\n".to_string();
    }
    let mut output = String::new();
    for violation in violations {
        writeln!(
            output,
            "  [{}] {}: {}",
            violation.severity, violation.kind, violation.description
        ).unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use hos_core::QuarterHour;

    #[test]
    fn parse_start_accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 7)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap();
        assert_eq!(parse_start("2025-04-07T06:30").unwrap(), expected);
        assert_eq!(parse_start("2025-04-07 06:30:00").unwrap(), expected);
    }

    #[test]
    fn parse_start_rejects_garbage() {
        let err = parse_start("next tuesday").unwrap_err();
        assert!(err.to_string().contains("Invalid start time"));
    }

    #[test]
    fn parse_cycle_hours_rejects_negative() {
        assert!(parse_cycle_hours(-1.0).is_err());
        assert!(parse_cycle_hours(12.5).is_ok());
    }

    #[test]
    fn resolve_driver_by_id_or_license() {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db
            .insert_driver("Ray Koenig", "TX-1001", CycleHours::ZERO)
            .unwrap();
        assert_eq!(resolve_driver(&db, &driver.id).unwrap(), driver);
        assert_eq!(resolve_driver(&db, "TX-1001").unwrap(), driver);
        let err = resolve_driver(&db, "nobody").unwrap_err();
        assert!(err.to_string().contains("driver not found: nobody"));
    }

    #[test]
    fn grid_marks_one_row_per_slot() {
        let entries: Vec<TimeEntry> = (0..96)
            .map(|q| {
                let status = if q < 4 {
                    DutyStatus::Driving
                } else {
                    DutyStatus::OffDuty
                };
                TimeEntry::new(QuarterHour::new(q).unwrap(), status)
            })
            .collect();
        let grid = render_grid(&entries);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("    0   1   2"));
        assert!(lines[0].ends_with("23"));
        assert_eq!(lines[1], format!("OFF {}{}", "....", "#".repeat(92)));
        assert_eq!(lines[2], format!("SB  {}", ".".repeat(96)));
        assert_eq!(lines[3], format!("D   {}{}", "####", ".".repeat(92)));
    }
}
