//! Listing and resolving recorded violations.

use std::io::Write;

use anyhow::{Context, Result};
use hos_core::Violation;
use hos_db::Database;
use serde::Serialize;

use crate::commands::util::resolve_driver;

#[derive(Debug, Serialize)]
struct ViolationJson<'a> {
    id: &'a str,
    trip_id: Option<&'a str>,
    timestamp: String,
    #[serde(flatten)]
    violation: &'a Violation,
}

pub fn list<W: Write>(writer: &mut W, db: &Database, key: &str, json: bool) -> Result<()> {
    let driver = resolve_driver(db, key)?;
    let records = db
        .list_active_violations(&driver.id)
        .context("failed to list violations")?;

    if json {
        let rows: Vec<ViolationJson<'_>> = records
            .iter()
            .map(|record| ViolationJson {
                id: &record.id,
                trip_id: record.trip_id.as_deref(),
                timestamp: record.timestamp.to_rfc3339(),
                violation: &record.violation,
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    if records.is_empty() {
        writeln!(writer, "No active violations for {}.", driver.name)?;
        return Ok(());
    }

    writeln!(writer, "Active violations for {}:", driver.name)?;
    for record in &records {
        let violation = &record.violation;
        writeln!(
            writer,
            "  {}  {}  [{}] {}: {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M"),
            violation.severity,
            violation.kind,
            violation.description
        )?;
    }
    Ok(())
}

pub fn resolve<W: Write>(writer: &mut W, db: &mut Database, id: &str) -> Result<()> {
    db.resolve_violation(id)
        .with_context(|| format!("failed to resolve violation {id}"))?;
    writeln!(writer, "Resolved {id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hos_core::{CycleHours, Severity, ViolationKind};

    fn seeded() -> (Database, String, Vec<String>) {
        let mut db = Database::open_in_memory().unwrap();
        let driver = db
            .insert_driver("Ray Koenig", "TX-1001", CycleHours::ZERO)
            .unwrap();
        let ids = db
            .insert_violations(
                &driver.id,
                None,
                &[Violation {
                    kind: ViolationKind::DrivingLimit,
                    description: "Exceeded 11-hour driving limit by 1h 15m".to_string(),
                    severity: Severity::Violation,
                }],
            )
            .unwrap();
        (db, driver.id, ids)
    }

    #[test]
    fn list_shows_active_violations() {
        let (db, _driver_id, ids) = seeded();
        let mut output = Vec::new();
        list(&mut output, &db, "TX-1001", false).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.starts_with("Active violations for Ray Koenig:\n"));
        assert!(output.contains(&ids[0]));
        assert!(output.contains(
            "[violation] driving_limit: Exceeded 11-hour driving limit by 1h 15m"
        ));
    }

    #[test]
    fn resolved_violations_disappear() {
        let (mut db, _driver_id, ids) = seeded();
        let mut output = Vec::new();
        resolve(&mut output, &mut db, &ids[0]).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), format!("Resolved {}\n", ids[0]));

        let mut output = Vec::new();
        list(&mut output, &db, "TX-1001", false).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "No active violations for Ray Koenig.\n"
        );
    }

    #[test]
    fn list_json_uses_type_field() {
        let (db, driver_id, _ids) = seeded();
        let mut output = Vec::new();
        list(&mut output, &db, &driver_id, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value[0]["type"], "driving_limit");
        assert_eq!(value[0]["severity"], "violation");
        assert!(value[0]["trip_id"].is_null());
    }

    #[test]
    fn resolve_unknown_id_fails() {
        let (mut db, _driver_id, _ids) = seeded();
        assert!(resolve(&mut Vec::new(), &mut db, "missing").is_err());
    }
}
