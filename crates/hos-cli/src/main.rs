use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hos_cli::commands::{
    check, driver, export, logs, plan, schedule, status, trip, violations,
};
use hos_cli::{Cli, Commands, Config, DriverAction, TripAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(hos_db::Database, Config)> {
    let config = load_config(config_path)?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = hos_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let config_path = cli.config.as_deref();

    match &cli.command {
        Some(Commands::Driver(action)) => {
            let (mut db, _config) = open_database(config_path)?;
            match action {
                DriverAction::Add {
                    name,
                    license,
                    cycle_hours,
                } => driver::add(&mut out, &mut db, name, license, *cycle_hours)?,
                DriverAction::List { json } => driver::list(&mut out, &db, *json)?,
                DriverAction::Show { driver: key } => driver::show(&mut out, &db, key)?,
                DriverAction::Cycle { driver: key, hours } => {
                    driver::set_cycle(&mut out, &mut db, key, *hours)?;
                }
            }
        }
        Some(Commands::Trip(action)) => {
            let (mut db, _config) = open_database(config_path)?;
            match action {
                TripAction::Show { id } => trip::show(&mut out, &db, id)?,
                TripAction::Status { id, status } => {
                    trip::set_status(&mut out, &mut db, id, *status)?;
                }
            }
        }
        Some(Commands::Schedule {
            start,
            driving_hours,
            miles,
            fuel_stops,
            cycle_hours,
            json,
        }) => {
            // Offline: no database needed
            let config = load_config(config_path)?;
            let args = schedule::ScheduleArgs {
                start: start.clone(),
                driving_hours: *driving_hours,
                miles: *miles,
                fuel_stops: *fuel_stops,
                cycle_hours: *cycle_hours,
                json: *json,
            };
            schedule::run(&mut out, &config, &args)?;
        }
        Some(Commands::Plan {
            driver: key,
            from,
            pickup,
            dropoff,
            start,
            weight,
            json,
        }) => {
            let (mut db, config) = open_database(config_path)?;
            let args = plan::PlanArgs {
                driver: key.clone(),
                from: from.clone(),
                pickup: pickup.clone(),
                dropoff: dropoff.clone(),
                start: start.clone(),
                weight: *weight,
                json: *json,
            };
            plan::run(&mut out, &mut db, &config, &args)?;
        }
        Some(Commands::Status { driver: key, json }) => {
            let (db, _config) = open_database(config_path)?;
            status::run(&mut out, &db, key, *json)?;
        }
        Some(Commands::Violations { driver: key, json }) => {
            let (db, _config) = open_database(config_path)?;
            violations::list(&mut out, &db, key, *json)?;
        }
        Some(Commands::Resolve { id }) => {
            let (mut db, _config) = open_database(config_path)?;
            violations::resolve(&mut out, &mut db, id)?;
        }
        Some(Commands::Logs {
            driver: key,
            trip,
            from,
            to,
            json,
        }) => {
            let (db, _config) = open_database(config_path)?;
            let filter = logs::LogFilter {
                trip: trip.clone(),
                from: *from,
                to: *to,
            };
            logs::run(&mut out, &db, key, &filter, *json)?;
        }
        Some(Commands::Check {
            file,
            cycle_hours,
            json,
        }) => {
            check::check(&mut out, file, *cycle_hours, *json)?;
        }
        Some(Commands::Amend { log, file }) => {
            let (mut db, _config) = open_database(config_path)?;
            check::amend(&mut out, &mut db, log, file)?;
        }
        Some(Commands::Export { log, output }) => {
            let (db, _config) = open_database(config_path)?;
            export::run(&mut out, &db, log, output.as_deref())?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}
