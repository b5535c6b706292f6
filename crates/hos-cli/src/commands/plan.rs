//! Route a trip, plan its days and record everything for a driver.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use hos_core::{TripPlanRequest, Violation, format_minutes, fuel_stop_count};
use hos_db::{Database, DriverRecord, NewLog, NewTrip, TripRecord};
use hos_route::{Client, RouteError, RouteSummary};
use serde::Serialize;

use crate::Config;
use crate::commands::schedule::{DayReport, build_reports};
use crate::commands::util::{parse_start, resolve_driver, today};

/// Arguments for [`run`].
#[derive(Debug, Clone)]
pub struct PlanArgs {
    pub driver: String,
    pub from: String,
    pub pickup: String,
    pub dropoff: String,
    pub start: Option<String>,
    pub weight: i64,
    pub json: bool,
}

/// What [`record_plan`] stored.
#[derive(Debug, Serialize)]
pub struct PlanOutcome {
    #[serde(skip)]
    pub trip: TripRecord,
    pub trip_id: String,
    pub log_ids: Vec<String>,
    pub violation_ids: Vec<String>,
    pub days: Vec<DayReport>,
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, config: &Config, args: &PlanArgs) -> Result<()> {
    let driver = resolve_driver(db, &args.driver)?;
    let start = match &args.start {
        Some(start) => parse_start(start)?,
        None => default_start(config)?,
    };

    let client = Client::new(config.endpoints()).context("failed to build routing client")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let route = runtime
        .block_on(client.route(&args.from, &args.pickup, &args.dropoff))
        .map_err(route_error)?;

    let outcome = record_plan(db, config, &driver, args, start, &route)?;

    if args.json {
        #[derive(Serialize)]
        struct PlanJson<'a> {
            route: &'a RouteSummary,
            #[serde(flatten)]
            outcome: &'a PlanOutcome,
        }
        let payload = PlanJson {
            route: &route,
            outcome: &outcome,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&payload)?)?;
    } else {
        write!(writer, "{}", format_outcome(&route, &outcome))?;
    }
    Ok(())
}

/// Plans the days for a routed trip and stores the trip, its logs and any
/// violations found.
pub fn record_plan(
    db: &mut Database,
    config: &Config,
    driver: &DriverRecord,
    args: &PlanArgs,
    start: NaiveDateTime,
    route: &RouteSummary,
) -> Result<PlanOutcome> {
    let request = TripPlanRequest {
        pickup_minutes: config.pickup_minutes,
        dropoff_minutes: config.dropoff_minutes,
        fuel_stops: fuel_stop_count(&route.stops),
        ..TripPlanRequest::new(
            start,
            f64::from(route.estimated_duration_minutes) / 60.0,
            route.total_distance_miles,
        )
    };
    let days = build_reports(&request, driver.current_cycle_hours)?;

    let trip = db
        .insert_trip(&NewTrip {
            driver_id: driver.id.clone(),
            current_location: args.from.clone(),
            pickup_location: args.pickup.clone(),
            dropoff_location: args.dropoff.clone(),
            estimated_weight: args.weight,
            total_distance: Some(route.total_distance_miles),
            estimated_duration: Some(i64::from(route.estimated_duration_minutes)),
            route_data: Some(serde_json::to_value(route).context("failed to encode route")?),
        })
        .context("failed to store trip")?;

    let logs: Vec<NewLog> = days
        .iter()
        .map(|day| NewLog {
            driver_id: driver.id.clone(),
            trip_id: Some(trip.id.clone()),
            log: day.plan.log.clone(),
            total_miles: day.plan.miles,
            remarks: day.plan.remarks.clone(),
            is_compliant: day.status.is_compliant,
        })
        .collect();
    let log_ids = db.insert_logs(&logs).context("failed to store logs")?;

    let violations: Vec<Violation> = days
        .iter()
        .flat_map(|day| day.violations.iter().cloned())
        .collect();
    let violation_ids = db
        .insert_violations(&driver.id, Some(&trip.id), &violations)
        .context("failed to store violations")?;

    tracing::debug!(
        trip_id = %trip.id,
        days = days.len(),
        violations = violation_ids.len(),
        "trip planned"
    );

    Ok(PlanOutcome {
        trip_id: trip.id.clone(),
        trip,
        log_ids,
        violation_ids,
        days,
    })
}

fn default_start(config: &Config) -> Result<NaiveDateTime> {
    let time = NaiveTime::from_hms_opt(config.start_hour, 0, 0)
        .with_context(|| format!("invalid start_hour in config: {}", config.start_hour))?;
    Ok(today().and_time(time))
}

fn route_error(err: RouteError) -> anyhow::Error {
    let (title, details) = err.user_message();
    anyhow::Error::new(err).context(format!("{title}. {details}"))
}

fn format_outcome(route: &RouteSummary, outcome: &PlanOutcome) -> String {
    use std::fmt::Write as _;

    let trip = &outcome.trip;
    let driving_minutes: u32 = outcome.days.iter().map(|d| d.plan.driving_minutes).sum();
    let mut output = String::new();
    writeln!(
        output,
        "Trip {}: {} -> {} -> {}",
        trip.id, trip.current_location, trip.pickup_location, trip.dropoff_location
    ).unwrap();
    writeln!(
        output,
        "Distance: {:.2} mi, {} driving over {} day(s)",
        route.total_distance_miles,
        format_minutes(driving_minutes),
        outcome.days.len()
    ).unwrap();
    output.push_str("Stops:\n");
    for stop in &route.stops {
        writeln!(
            output,
            "  {:<10}{} ({})",
            stop.id, stop.location, stop.description
        ).unwrap();
    }
    output.push_str("Logs:\n");
    for (day, id) in outcome.days.iter().zip(&outcome.log_ids) {
        writeln!(
            output,
            "  {}  {id}  {} driving  {} mi  {}",
            day.plan.log.date(),
            format_minutes(day.plan.driving_minutes),
            day.plan.miles,
            if day.status.is_compliant {
                "compliant"
            } else {
                "NOT COMPLIANT"
            }
        ).unwrap();
    }
    writeln!(output, "Violations recorded: {}", outcome.violation_ids.len()).unwrap();
    output
}
