//! Driver management commands.

use std::io::Write;

use anyhow::{Context, Result};
use hos_db::{Database, DriverRecord};
use serde::Serialize;

use crate::commands::util::{parse_cycle_hours, resolve_driver};

#[derive(Debug, Serialize)]
struct DriverJson<'a> {
    id: &'a str,
    name: &'a str,
    license_number: &'a str,
    current_cycle_hours: f64,
    created_at: String,
}

impl<'a> From<&'a DriverRecord> for DriverJson<'a> {
    fn from(driver: &'a DriverRecord) -> Self {
        Self {
            id: &driver.id,
            name: &driver.name,
            license_number: &driver.license_number,
            current_cycle_hours: driver.current_cycle_hours.value(),
            created_at: driver.created_at.to_rfc3339(),
        }
    }
}

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    license: &str,
    cycle_hours: f64,
) -> Result<()> {
    let cycle_hours = parse_cycle_hours(cycle_hours)?;
    let driver = db
        .insert_driver(name, license, cycle_hours)
        .context("failed to create driver")?;
    writeln!(writer, "Created driver {} ({})", driver.name, driver.id)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let drivers = db.list_drivers().context("failed to list drivers")?;

    if json {
        let rows: Vec<DriverJson<'_>> = drivers.iter().map(DriverJson::from).collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    if drivers.is_empty() {
        writeln!(writer, "No drivers registered.")?;
        return Ok(());
    }

    writeln!(writer, "{:<24}{:<14}CYCLE", "NAME", "LICENSE")?;
    for driver in &drivers {
        writeln!(
            writer,
            "{:<24}{:<14}{}h",
            driver.name, driver.license_number, driver.current_cycle_hours
        )?;
    }
    Ok(())
}

pub fn show<W: Write>(writer: &mut W, db: &Database, key: &str) -> Result<()> {
    let driver = resolve_driver(db, key)?;
    let trips = db
        .list_trips_for_driver(&driver.id)
        .context("failed to list trips")?;

    writeln!(writer, "Driver:  {}", driver.name)?;
    writeln!(writer, "ID:      {}", driver.id)?;
    writeln!(writer, "License: {}", driver.license_number)?;
    writeln!(writer, "Cycle:   {}h / 70h", driver.current_cycle_hours)?;

    if trips.is_empty() {
        writeln!(writer, "No trips.")?;
        return Ok(());
    }
    writeln!(writer, "Trips:")?;
    for trip in trips {
        let miles = trip
            .total_distance
            .map_or_else(|| "?".to_string(), |miles| format!("{miles:.1}"));
        writeln!(
            writer,
            "  {}  {} -> {}  {miles} mi  [{}]",
            trip.id, trip.pickup_location, trip.dropoff_location, trip.status
        )?;
    }
    Ok(())
}

pub fn set_cycle<W: Write>(writer: &mut W, db: &mut Database, key: &str, hours: f64) -> Result<()> {
    let hours = parse_cycle_hours(hours)?;
    let driver = resolve_driver(db, key)?;
    db.update_cycle_hours(&driver.id, hours)
        .context("failed to update cycle hours")?;
    writeln!(writer, "{}: cycle hours set to {hours}h", driver.name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn list_renders_table() {
        let mut db = Database::open_in_memory().unwrap();
        let mut sink = Vec::new();
        add(&mut sink, &mut db, "Ray Koenig", "TX-1001", 42.5).unwrap();
        add(&mut sink, &mut db, "Ana Silva", "NM-77", 0.0).unwrap();

        let mut output = Vec::new();
        list(&mut output, &db, false).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_snapshot!(output, @r"
        NAME                    LICENSE       CYCLE
        Ana Silva               NM-77         0.0h
        Ray Koenig              TX-1001       42.5h
        ");
    }

    #[test]
    fn list_empty() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        list(&mut output, &db, false).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No drivers registered.\n");
    }

    #[test]
    fn list_json_includes_cycle_hours() {
        let mut db = Database::open_in_memory().unwrap();
        add(&mut Vec::new(), &mut db, "Ray Koenig", "TX-1001", 12.0).unwrap();
        let mut output = Vec::new();
        list(&mut output, &db, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value[0]["license_number"], "TX-1001");
        assert_eq!(value[0]["current_cycle_hours"], 12.0);
    }

    #[test]
    fn add_rejects_duplicate_license() {
        let mut db = Database::open_in_memory().unwrap();
        add(&mut Vec::new(), &mut db, "Ray Koenig", "TX-1001", 0.0).unwrap();
        let err = add(&mut Vec::new(), &mut db, "Other", "TX-1001", 0.0).unwrap_err();
        assert!(format!("{err:#}").contains("already exists"));
    }

    #[test]
    fn set_cycle_by_license() {
        let mut db = Database::open_in_memory().unwrap();
        add(&mut Vec::new(), &mut db, "Ray Koenig", "TX-1001", 0.0).unwrap();
        let mut output = Vec::new();
        set_cycle(&mut output, &mut db, "TX-1001", 55.0).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Ray Koenig: cycle hours set to 55.0h\n"
        );
        let driver = db.get_driver_by_license("TX-1001").unwrap();
        assert!((driver.current_cycle_hours.value() - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn show_without_trips() {
        let mut db = Database::open_in_memory().unwrap();
        add(&mut Vec::new(), &mut db, "Ray Koenig", "TX-1001", 8.0).unwrap();
        let mut output = Vec::new();
        show(&mut output, &db, "TX-1001").unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("License: TX-1001"));
        assert!(output.contains("Cycle:   8.0h / 70h"));
        assert!(output.ends_with("No trips.\n"));
    }
}
