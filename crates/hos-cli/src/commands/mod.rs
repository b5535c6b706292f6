//! CLI subcommand implementations.

pub mod check;
pub mod driver;
pub mod export;
pub mod logs;
pub mod plan;
pub mod schedule;
pub mod status;
pub mod trip;
pub mod util;
pub mod violations;
