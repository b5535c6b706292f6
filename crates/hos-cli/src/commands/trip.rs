//! Trip inspection and lifecycle commands.

use std::io::Write;

use anyhow::{Context, Result};
use hos_core::TripStatus;
use hos_db::Database;

pub fn show<W: Write>(writer: &mut W, db: &Database, id: &str) -> Result<()> {
    let trip = db
        .get_trip(id)
        .with_context(|| format!("trip not found: {id}"))?;
    let logs = db.list_logs_for_trip(id).context("failed to list logs")?;

    writeln!(writer, "Trip:     {}", trip.id)?;
    writeln!(writer, "Status:   {}", trip.status)?;
    writeln!(
        writer,
        "Route:    {} -> {} -> {}",
        trip.current_location, trip.pickup_location, trip.dropoff_location
    )?;
    if let Some(miles) = trip.total_distance {
        writeln!(writer, "Distance: {miles:.1} mi")?;
    }
    writeln!(writer, "Weight:   {} lbs", trip.estimated_weight)?;
    writeln!(writer, "Logs:     {}", logs.len())?;
    Ok(())
}

pub fn set_status<W: Write>(
    writer: &mut W,
    db: &mut Database,
    id: &str,
    status: TripStatus,
) -> Result<()> {
    let trip = db
        .get_trip(id)
        .with_context(|| format!("trip not found: {id}"))?;
    db.set_trip_status(&trip.id, status)
        .context("failed to update trip status")?;
    writeln!(writer, "Trip {}: {} -> {status}", trip.id, trip.status)?;
    Ok(())
}
