//! Hours-of-service CLI library.
//!
//! Wires the engine, the record store and the routing client together
//! behind the `hos` binary.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, DriverAction, TripAction};
pub use config::Config;
