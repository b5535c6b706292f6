//! Geocoding and road routing for trip planning.
//!
//! Locations are resolved through a Nominatim-compatible search endpoint and
//! routed through an OSRM-compatible endpoint. The engine only ever sees the
//! resulting distance and duration; everything else here is transport.

use std::fmt;
use std::time::Duration;

use hos_core::{PlannedStop, plan_stops};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);
const ROUTE_TIMEOUT: Duration = Duration::from_secs(15);
const METERS_PER_MILE: f64 = 1609.34;
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_ROUTING_URL: &str = "https://router.project-osrm.org";

/// Routing client errors.
#[derive(Debug, Error)]
pub enum RouteError {
    /// An endpoint URL was unusable.
    #[error("invalid endpoint: {reason}")]
    InvalidEndpoint { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// The geocoder returned no match.
    #[error("could not find location: {location}")]
    LocationNotFound { location: String },
    /// The geocoder could not be reached or answered with an error.
    #[error("geocoding failed for {location}: {message}")]
    Geocoding { location: String, message: String },
    /// The router found no path through the waypoints.
    #[error("no route found between locations")]
    NoRoute,
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RouteError {
    /// Short error title and a suggestion suitable for showing to a driver.
    #[must_use]
    pub const fn user_message(&self) -> (&'static str, &'static str) {
        match self {
            Self::LocationNotFound { .. } => (
                "Location not found",
                "One or more locations could not be found. Please check spelling and try common city names.",
            ),
            Self::Geocoding { .. } => (
                "Address lookup service temporarily unavailable",
                "Our address lookup service is temporarily busy. Please try again in a moment or use major city names.",
            ),
            Self::NoRoute => (
                "No route available",
                "No driving route could be found between these locations. Please check the addresses.",
            ),
            Self::InvalidEndpoint { .. }
            | Self::ClientBuild(_)
            | Self::Request(_)
            | Self::InvalidResponse(_) => (
                "Failed to calculate route",
                "Please check your locations and try again",
            ),
        }
    }
}

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Distance, duration and path for a current → pickup → dropoff trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// `[lon, lat]` pairs along the path.
    pub coordinates: Vec<[f64; 2]>,
    /// Miles, rounded to two decimals.
    pub total_distance_miles: f64,
    pub estimated_duration_minutes: u32,
    pub stops: Vec<PlannedStop>,
}

/// Endpoints used by [`Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub geocode_url: String,
    pub routing_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            routing_url: DEFAULT_ROUTING_URL.to_string(),
        }
    }
}

/// Geocoding and routing client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("geocode_url", &self.endpoints.geocode_url)
            .field("routing_url", &self.endpoints.routing_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for the given endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if either URL is blank or not http(s), or if the
    /// HTTP client fails to build.
    pub fn new(endpoints: Endpoints) -> Result<Self, RouteError> {
        let endpoints = Endpoints {
            geocode_url: normalize_base_url(&endpoints.geocode_url)?,
            routing_url: normalize_base_url(&endpoints.routing_url)?,
        };
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(RouteError::ClientBuild)?;
        Ok(Self { http, endpoints })
    }

    /// Resolves a free-form location to coordinates.
    pub async fn geocode(&self, location: &str) -> Result<Coordinates, RouteError> {
        let geocoding = |message: String| RouteError::Geocoding {
            location: location.to_string(),
            message,
        };

        let response = self
            .http
            .get(format!("{}/search", self.endpoints.geocode_url))
            .query(&[("q", location), ("format", "json"), ("limit", "1")])
            .timeout(GEOCODE_TIMEOUT)
            .send()
            .await
            .map_err(|err| geocoding(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| geocoding(err.to_string()))?;
        if !status.is_success() {
            return Err(geocoding(format!("status {status}")));
        }

        let coords = parse_geocode(location, &body)?;
        tracing::debug!(location, lat = coords.lat, lon = coords.lon, "geocoded");
        Ok(coords)
    }

    /// Routes current → pickup → dropoff and plans the required stops.
    pub async fn route(
        &self,
        current_location: &str,
        pickup_location: &str,
        dropoff_location: &str,
    ) -> Result<RouteSummary, RouteError> {
        let current = self.geocode(current_location).await?;
        let pickup = self.geocode(pickup_location).await?;
        let dropoff = self.geocode(dropoff_location).await?;

        let response = self
            .http
            .get(format!(
                "{}/route/v1/driving/{}",
                self.endpoints.routing_url,
                waypoints(&[current, pickup, dropoff])
            ))
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "true"),
            ])
            .timeout(ROUTE_TIMEOUT)
            .send()
            .await?;

        let body = response.text().await?;
        let route = parse_route(&body)?;
        let summary = summarize(route, pickup_location, dropoff_location);
        tracing::debug!(
            miles = summary.total_distance_miles,
            minutes = summary.estimated_duration_minutes,
            stops = summary.stops.len(),
            "route calculated"
        );
        Ok(summary)
    }
}

fn normalize_base_url(url: &str) -> Result<String, RouteError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(RouteError::InvalidEndpoint {
            reason: "URL cannot be empty",
        });
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(RouteError::InvalidEndpoint {
            reason: "URL must start with http:// or https://",
        });
    }
    Ok(trimmed.to_string())
}

/// OSRM takes `lon,lat` pairs separated by `;`.
fn waypoints(points: &[Coordinates]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.lon, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_geocode(location: &str, body: &str) -> Result<Coordinates, RouteError> {
    // Nominatim sends coordinates as strings.
    #[derive(Deserialize)]
    struct Place {
        lat: String,
        lon: String,
    }

    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|err| RouteError::InvalidResponse(err.to_string()))?;
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::LocationNotFound {
            location: location.to_string(),
        })?;
    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|err| RouteError::InvalidResponse(format!("bad coordinate {value}: {err}")))
    };
    Ok(Coordinates {
        lat: parse(&place.lat)?,
        lon: parse(&place.lon)?,
    })
}

#[derive(Debug, Clone, PartialEq)]
struct Route {
    coordinates: Vec<[f64; 2]>,
    distance_meters: f64,
    duration_seconds: f64,
}

fn parse_route(body: &str) -> Result<Route, RouteError> {
    #[derive(Deserialize)]
    struct Payload {
        code: String,
        #[serde(default)]
        routes: Vec<RoutePayload>,
    }

    #[derive(Deserialize)]
    struct RoutePayload {
        distance: f64,
        duration: f64,
        geometry: Geometry,
    }

    #[derive(Deserialize)]
    struct Geometry {
        coordinates: Vec<[f64; 2]>,
    }

    let payload: Payload =
        serde_json::from_str(body).map_err(|err| RouteError::InvalidResponse(err.to_string()))?;
    if payload.code != "Ok" {
        return Err(RouteError::NoRoute);
    }
    let route = payload.routes.into_iter().next().ok_or(RouteError::NoRoute)?;
    Ok(Route {
        coordinates: route.geometry.coordinates,
        distance_meters: route.distance,
        duration_seconds: route.duration,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn summarize(route: Route, pickup_location: &str, dropoff_location: &str) -> RouteSummary {
    let miles = route.distance_meters / METERS_PER_MILE;
    let minutes = route.duration_seconds / 60.0;
    RouteSummary {
        coordinates: route.coordinates,
        total_distance_miles: (miles * 100.0).round() / 100.0,
        estimated_duration_minutes: minutes.max(0.0).round() as u32,
        stops: plan_stops(pickup_location, dropoff_location, miles, minutes),
    }
}
