//! Log sheet export.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use hos_core::LogSheet;
use hos_db::Database;

/// Builds the printable sheet for a stored log.
pub fn build_sheet(db: &Database, log_id: &str) -> Result<LogSheet> {
    let record = db
        .get_log(log_id)
        .with_context(|| format!("failed to load log {log_id}"))?;
    let driver = db
        .get_driver(&record.driver_id)
        .context("failed to load driver")?;
    let log = record
        .daily_log()
        .context("stored log is not a complete day")?;
    Ok(LogSheet::from_log(
        &log,
        driver.name,
        record.total_miles,
        record.remarks,
    ))
}

pub fn run<W: Write>(writer: &mut W, db: &Database, log_id: &str, output: Option<&Path>) -> Result<()> {
    let sheet = build_sheet(db, log_id)?;
    let json = serde_json::to_string_pretty(&sheet)?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(writer, "Wrote log sheet for {} to {}", sheet.date, path.display())?;
        }
        None => writeln!(writer, "{json}")?,
    }
    Ok(())
}
