//! Status command: time left for a driver based on their latest log.

use std::io::Write;

use anyhow::{Context, Result};
use hos_core::{HosStatus, StatusSummary, compute_status};
use hos_db::Database;
use serde::Serialize;

use crate::commands::util::resolve_driver;

#[derive(Debug, Serialize)]
struct StatusJson {
    driver_id: String,
    log_date: Option<String>,
    #[serde(flatten)]
    summary: StatusSummary,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, key: &str, json: bool) -> Result<()> {
    let driver = resolve_driver(db, key)?;
    let latest = db
        .latest_log_for_driver(&driver.id)
        .context("failed to load latest log")?;

    let status = latest.as_ref().map_or_else(
        || HosStatus::fresh(driver.current_cycle_hours),
        |log| compute_status(&log.time_entries, driver.current_cycle_hours),
    );
    let summary = status.summary();
    let log_date = latest.map(|log| log.log_date.to_string());

    if json {
        let payload = StatusJson {
            driver_id: driver.id,
            log_date,
            summary,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&payload)?)?;
        return Ok(());
    }

    writeln!(writer, "HOS status for {} ({})", driver.name, driver.license_number)?;
    writeln!(
        writer,
        "Based on:          {}",
        log_date.as_deref().unwrap_or("no logs yet")
    )?;
    writeln!(writer, "Drive time left:   {}", summary.drive_time_left)?;
    writeln!(writer, "On-duty time left: {}", summary.on_duty_left)?;
    writeln!(writer, "Cycle used:        {}", summary.cycle_used)?;
    writeln!(writer, "Next break:        {}", summary.next_break)?;
    writeln!(
        writer,
        "Compliant:         {}",
        if summary.is_compliant { "yes" } else { "no" }
    )?;
    Ok(())
}
