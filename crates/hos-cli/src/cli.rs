//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hos_core::TripStatus;

/// Hours-of-service trip planner.
///
/// Plans driving days as quarter-hour duty logs, checks them against the
/// federal property-carrying limits and keeps a record per driver.
#[derive(Debug, Parser)]
#[command(name = "hos", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage drivers.
    #[command(subcommand)]
    Driver(DriverAction),

    /// Inspect trips and move them through their lifecycle.
    #[command(subcommand)]
    Trip(TripAction),

    /// Lay out a trip as daily logs without touching the network or database.
    Schedule {
        /// When work begins, e.g. 2025-04-07T06:00.
        #[arg(long)]
        start: String,

        /// Total driving hours.
        #[arg(long)]
        driving_hours: f64,

        /// Total trip miles.
        #[arg(long, default_value_t = 0.0)]
        miles: f64,

        /// Fuel stops across the trip.
        #[arg(long, default_value_t = 0)]
        fuel_stops: u32,

        /// Hours already used in the 70-hour/8-day cycle.
        #[arg(long, default_value_t = 0.0)]
        cycle_hours: f64,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Route a trip, plan its days and record the logs for a driver.
    Plan {
        /// Driver ID or license number.
        #[arg(long)]
        driver: String,

        /// Where the truck is now.
        #[arg(long)]
        from: String,

        /// Where the load is picked up.
        #[arg(long)]
        pickup: String,

        /// Where the load is delivered.
        #[arg(long)]
        dropoff: String,

        /// When work begins (defaults to today at the configured start hour).
        #[arg(long)]
        start: Option<String>,

        /// Gross weight in pounds.
        #[arg(long, default_value_t = 80_000)]
        weight: i64,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show remaining driving, duty and cycle time for a driver.
    Status {
        /// Driver ID or license number.
        driver: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List a driver's unresolved violations.
    Violations {
        /// Driver ID or license number.
        driver: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Mark a violation as resolved.
    Resolve {
        /// Violation ID.
        id: String,
    },

    /// List daily logs.
    Logs {
        /// Driver ID or license number.
        driver: String,

        /// Only logs for this trip.
        #[arg(long)]
        trip: Option<String>,

        /// First date to include (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last date to include (YYYY-MM-DD).
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a day of entries read from a JSON file.
    Check {
        /// File holding a JSON list of 96 entries.
        file: PathBuf,

        /// Hours already used in the 70-hour/8-day cycle.
        #[arg(long, default_value_t = 0.0)]
        cycle_hours: f64,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replace a stored log's entries with a manually edited day.
    Amend {
        /// Log ID.
        log: String,

        /// File holding a JSON list of 96 entries.
        file: PathBuf,
    },

    /// Print the data for a printable log sheet as JSON.
    Export {
        /// Log ID.
        log: String,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Driver management actions.
#[derive(Debug, Subcommand)]
pub enum DriverAction {
    /// Register a driver.
    Add {
        /// Full name.
        name: String,

        /// License number; must be unique.
        license: String,

        /// Hours already used in the current cycle.
        #[arg(long, default_value_t = 0.0)]
        cycle_hours: f64,
    },

    /// List drivers.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one driver and their trips.
    Show {
        /// Driver ID or license number.
        driver: String,
    },

    /// Record the hours used in the current cycle.
    Cycle {
        /// Driver ID or license number.
        driver: String,

        /// Hours used.
        hours: f64,
    },
}

/// Trip actions.
#[derive(Debug, Subcommand)]
pub enum TripAction {
    /// Show one trip.
    Show {
        /// Trip ID.
        id: String,
    },

    /// Set a trip's status: planned, active or completed.
    Status {
        /// Trip ID.
        id: String,

        /// New status.
        status: TripStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_schedule_arguments() {
        let cli = Cli::try_parse_from([
            "hos",
            "schedule",
            "--start",
            "2025-04-07T06:00",
            "--driving-hours",
            "9.5",
            "--miles",
            "520",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Schedule {
                driving_hours,
                miles,
                fuel_stops,
                json,
                ..
            }) => {
                assert!((driving_hours - 9.5).abs() < f64::EPSILON);
                assert!((miles - 520.0).abs() < f64::EPSILON);
                assert_eq!(fuel_stops, 0);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_trip_status() {
        let cli = Cli::try_parse_from(["hos", "trip", "status", "abc", "active"]).unwrap();
        match cli.command {
            Some(Commands::Trip(TripAction::Status { id, status })) => {
                assert_eq!(id, "abc");
                assert_eq!(status, TripStatus::Active);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["hos", "trip", "status", "abc", "cancelled"]).is_err());
    }

    #[test]
    fn parses_log_date_filters() {
        let cli = Cli::try_parse_from([
            "hos", "logs", "TX-1001", "--from", "2025-04-01", "--to", "2025-04-07",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Logs { from, to, .. }) => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 4, 1));
                assert_eq!(to, NaiveDate::from_ymd_opt(2025, 4, 7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
