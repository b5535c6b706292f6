//! Evaluating hand-edited days.
//!
//! `check` evaluates a file of entries without storing anything; `amend`
//! replaces a stored log's entries and records what the new day violates.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use hos_core::{
    CycleHours, DailyLog, Evaluation, StatusSummary, Violation, compute_status,
    compute_violations, evaluate, format_minutes,
};
use hos_db::Database;
use serde::Serialize;

use crate::commands::util::{format_violations, parse_cycle_hours, read_entries, today};

#[derive(Debug, Serialize)]
struct CheckReport {
    #[serde(flatten)]
    evaluation: Evaluation,
    status: StatusSummary,
    violations: Vec<Violation>,
}

impl CheckReport {
    fn new(log: &DailyLog, cycle_hours: CycleHours) -> Self {
        Self {
            evaluation: evaluate(log.entries(), cycle_hours),
            status: compute_status(log.entries(), cycle_hours).summary(),
            violations: compute_violations(log.entries(), cycle_hours),
        }
    }

    fn render(&self) -> String {
        use std::fmt::Write as _;

        let aggregates = &self.evaluation.aggregates;
        let mut output = String::new();
        writeln!(
            output,
            "Driving:            {}",
            format_minutes(aggregates.driving_minutes)
        ).unwrap();
        writeln!(
            output,
            "On duty (total):    {}",
            format_minutes(aggregates.on_duty_minutes)
        ).unwrap();
        writeln!(
            output,
            "Since last break:   {}",
            format_minutes(aggregates.minutes_since_last_break)
        ).unwrap();
        writeln!(output, "Cycle used:         {}", self.status.cycle_used).unwrap();
        writeln!(output, "Drive time left:    {}", self.status.drive_time_left).unwrap();
        writeln!(output, "On-duty time left:  {}", self.status.on_duty_left).unwrap();
        writeln!(output, "Next break:         {}", self.status.next_break).unwrap();
        writeln!(
            output,
            "Compliant:          {}",
            if self.evaluation.is_compliant { "yes" } else { "no" }
        ).unwrap();
        output.push_str("Violations:\n");
        output.push_str(&format_violations(&self.violations));
        output
    }
}

pub fn check<W: Write>(writer: &mut W, file: &Path, cycle_hours: f64, json: bool) -> Result<()> {
    let cycle_hours = parse_cycle_hours(cycle_hours)?;
    let entries = read_entries(file)?;
    let log = DailyLog::new(today(), entries)
        .with_context(|| format!("{} is not a complete day", file.display()))?;
    let report = CheckReport::new(&log, cycle_hours);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", report.render())?;
    }
    Ok(())
}

pub fn amend<W: Write>(writer: &mut W, db: &mut Database, log_id: &str, file: &Path) -> Result<()> {
    let entries = read_entries(file)?;
    let record = db
        .replace_log_entries(log_id, entries)
        .with_context(|| format!("failed to amend log {log_id}"))?;
    let driver = db
        .get_driver(&record.driver_id)
        .context("failed to load driver")?;

    let log = record.daily_log().context("stored log is not a complete day")?;
    let report = CheckReport::new(&log, driver.current_cycle_hours);
    let ids = db
        .insert_violations(&record.driver_id, record.trip_id.as_deref(), &report.violations)
        .context("failed to store violations")?;

    writeln!(writer, "Amended log {} for {}", record.id, record.log_date)?;
    write!(writer, "{}", report.render())?;
    if !ids.is_empty() {
        writeln!(writer, "Recorded {} violation(s).", ids.len())?;
    }
    Ok(())
}
