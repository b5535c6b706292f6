//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use hos_core::schedule::DEFAULT_STOP_MINUTES;
use hos_route::{DEFAULT_GEOCODE_URL, DEFAULT_ROUTING_URL, Endpoints};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Nominatim-compatible search endpoint.
    pub geocode_url: String,
    /// OSRM-compatible routing endpoint.
    pub routing_url: String,
    /// Minutes spent loading at pickup.
    pub pickup_minutes: u32,
    /// Minutes spent unloading at delivery.
    pub dropoff_minutes: u32,
    /// Hour of day work begins when `plan` is not given a start.
    pub start_hour: u32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("hos.db"),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            routing_url: DEFAULT_ROUTING_URL.to_string(),
            pickup_minutes: DEFAULT_STOP_MINUTES,
            dropoff_minutes: DEFAULT_STOP_MINUTES,
            start_hour: 6,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, `~/.config/hos/config.toml`, the given
    /// file, then `HOS_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("HOS_"));

        figment.extract()
    }

    /// Routing endpoints from this configuration.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            geocode_url: self.geocode_url.clone(),
            routing_url: self.routing_url.clone(),
        }
    }
}

/// Returns the platform-specific config directory for hos.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hos"))
}

/// Returns the platform-specific data directory for hos.
///
/// On Linux: `~/.local/share/hos`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("hos"))
}
