//! Required stops along a route.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::limits::{DAILY_DRIVING_HOURS, DAILY_REST_MINUTES};
use crate::schedule::{DEFAULT_STOP_MINUTES, FUEL_STOP_MINUTES};

/// Miles between mandatory fuel stops.
pub const FUEL_INTERVAL_MILES: f64 = 1000.0;

/// Kind of stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    Pickup,
    Fuel,
    Rest,
    Dropoff,
}

impl StopKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Fuel => "fuel",
            Self::Rest => "rest",
            Self::Dropoff => "dropoff",
        }
    }
}

impl fmt::Display for StopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stop the driver must make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStop {
    /// `{kind}-{n}`, numbered in route order from 1.
    pub id: String,
    pub kind: StopKind,
    pub location: String,
    pub description: String,
    pub duration_minutes: u32,
    pub required: bool,
}

/// Plans the stops for a route.
///
/// Pickup comes first and dropoff last. In between there is one fuel stop per
/// full 1000 miles and one 10-hour rest per full 11 hours of driving.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn plan_stops(
    pickup_location: &str,
    dropoff_location: &str,
    total_miles: f64,
    duration_minutes: f64,
) -> Vec<PlannedStop> {
    let fuel_stops = (total_miles.max(0.0) / FUEL_INTERVAL_MILES).floor() as u32;
    let rest_stops = (duration_minutes.max(0.0) / 60.0 / DAILY_DRIVING_HOURS).floor() as u32;

    let mut stops = Vec::new();
    let mut push = |kind: StopKind, location: String, description: &str, duration_minutes| {
        let id = format!("{kind}-{}", stops.len() + 1);
        stops.push(PlannedStop {
            id,
            kind,
            location,
            description: description.to_string(),
            duration_minutes,
            required: true,
        });
    };

    push(
        StopKind::Pickup,
        pickup_location.to_string(),
        "Load pickup - 1 hour",
        DEFAULT_STOP_MINUTES,
    );
    for n in 1..=fuel_stops {
        push(
            StopKind::Fuel,
            format!("Fuel Stop {n}"),
            "Required fuel stop",
            FUEL_STOP_MINUTES,
        );
    }
    for n in 1..=rest_stops {
        push(
            StopKind::Rest,
            format!("Rest Area {n}"),
            "Required 10-hour rest break",
            DAILY_REST_MINUTES,
        );
    }
    push(
        StopKind::Dropoff,
        dropoff_location.to_string(),
        "Unload delivery - 1 hour",
        DEFAULT_STOP_MINUTES,
    );

    stops
}

/// Number of fuel stops among `stops`.
pub fn fuel_stop_count(stops: &[PlannedStop]) -> u32 {
    let count = stops.iter().filter(|s| s.kind == StopKind::Fuel).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
