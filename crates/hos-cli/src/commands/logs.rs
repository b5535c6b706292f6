//! Listing stored daily logs.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use hos_core::{DutyTotals, format_minutes};
use hos_db::{Database, LogRecord};
use serde::Serialize;

use crate::commands::util::resolve_driver;

/// Which logs to list.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub trip: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct LogJson<'a> {
    id: &'a str,
    trip_id: Option<&'a str>,
    log_date: String,
    total_miles: f64,
    totals: DutyTotals,
    is_compliant: bool,
    remarks: &'a [String],
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    key: &str,
    filter: &LogFilter,
    json: bool,
) -> Result<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            bail!("--from {from} is after --to {to}");
        }
    }

    let driver = resolve_driver(db, key)?;
    let logs = match &filter.trip {
        Some(trip_id) => db
            .list_logs_for_trip(trip_id)
            .context("failed to list logs")?
            .into_iter()
            .filter(|log| log.driver_id == driver.id)
            .filter(|log| filter.from.is_none_or(|from| log.log_date >= from))
            .filter(|log| filter.to.is_none_or(|to| log.log_date <= to))
            .collect(),
        None => db
            .list_logs_for_driver(&driver.id, filter.from, filter.to)
            .context("failed to list logs")?,
    };

    if json {
        let rows: Vec<LogJson<'_>> = logs.iter().map(log_json).collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    if logs.is_empty() {
        writeln!(writer, "No logs for {}.", driver.name)?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<12}{:<38}{:>9}{:>9}{:>9}  OK",
        "DATE", "ID", "DRIVING", "ON DUTY", "MILES"
    )?;
    for log in &logs {
        writeln!(
            writer,
            "{:<12}{:<38}{:>9}{:>9}{:>9.1}  {}",
            log.log_date.to_string(),
            log.id,
            format_minutes(log.totals.driving_minutes),
            format_minutes(log.totals.on_duty_minutes),
            log.total_miles,
            if log.is_compliant { "yes" } else { "no" }
        )?;
    }
    Ok(())
}

fn log_json(log: &LogRecord) -> LogJson<'_> {
    LogJson {
        id: &log.id,
        trip_id: log.trip_id.as_deref(),
        log_date: log.log_date.to_string(),
        total_miles: log.total_miles,
        totals: log.totals,
        is_compliant: log.is_compliant,
        remarks: &log.remarks,
    }
}
