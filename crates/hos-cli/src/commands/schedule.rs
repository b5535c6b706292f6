//! Offline trip scheduling.
//!
//! Lays a trip out as daily logs and evaluates each day, without routing
//! or persistence.

use std::io::Write;

use anyhow::{Context, Result};
use hos_core::{
    CycleHours, DayPlan, StatusSummary, TripPlanRequest, Violation, compute_status,
    compute_violations, format_minutes, plan_trip,
};
use serde::Serialize;

use crate::Config;
use crate::commands::util::{format_violations, parse_cycle_hours, parse_start, render_grid};

/// Arguments for [`run`].
#[derive(Debug, Clone)]
pub struct ScheduleArgs {
    pub start: String,
    pub driving_hours: f64,
    pub miles: f64,
    pub fuel_stops: u32,
    pub cycle_hours: f64,
    pub json: bool,
}

/// A planned day together with its evaluation.
#[derive(Debug, Serialize)]
pub struct DayReport {
    #[serde(flatten)]
    pub plan: DayPlan,
    pub status: StatusSummary,
    pub violations: Vec<Violation>,
}

/// Plans the days of a trip and evaluates each against `cycle_hours`.
pub fn build_reports(request: &TripPlanRequest, cycle_hours: CycleHours) -> Result<Vec<DayReport>> {
    let plans = plan_trip(request).context("failed to plan trip")?;
    Ok(plans
        .into_iter()
        .map(|plan| {
            let entries = plan.log.entries();
            let status = compute_status(entries, cycle_hours).summary();
            let violations = compute_violations(entries, cycle_hours);
            DayReport {
                plan,
                status,
                violations,
            }
        })
        .collect())
}

/// Text rendering of planned days.
pub fn format_reports(reports: &[DayReport]) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        let plan = &report.plan;
        let totals = plan.log.totals();
        writeln!(
            output,
            "DAY {} of {}  {}  {} driving  {} mi",
            plan.day_number,
            reports.len(),
            plan.log.date(),
            format_minutes(plan.driving_minutes),
            plan.miles
        ).unwrap();
        output.push_str(&render_grid(plan.log.entries()));
        writeln!(
            output,
            "Totals: driving {}, on duty {}, off duty {}, sleeper {}",
            format_minutes(totals.driving_minutes),
            format_minutes(totals.on_duty_minutes),
            format_minutes(totals.off_duty_minutes),
            format_minutes(totals.sleeper_minutes)
        ).unwrap();
        writeln!(
            output,
            "Compliant: {}",
            if report.status.is_compliant { "yes" } else { "no" }
        ).unwrap();
        output.push_str("Violations:\n");
        output.push_str(&format_violations(&report.violations));
        output.push_str("Remarks:\n");
        for remark in &plan.remarks {
            writeln!(output, "  {remark}").unwrap();
        }
    }
    output
}

pub fn run<W: Write>(writer: &mut W, config: &Config, args: &ScheduleArgs) -> Result<()> {
    let cycle_hours = parse_cycle_hours(args.cycle_hours)?;
    let request = TripPlanRequest {
        pickup_minutes: config.pickup_minutes,
        dropoff_minutes: config.dropoff_minutes,
        fuel_stops: args.fuel_stops,
        ..TripPlanRequest::new(parse_start(&args.start)?, args.driving_hours, args.miles)
    };
    let reports = build_reports(&request, cycle_hours)?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&reports)?)?;
    } else {
        write!(writer, "{}", format_reports(&reports))?;
    }
    Ok(())
}
