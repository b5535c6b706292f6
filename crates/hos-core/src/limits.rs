//! Regulatory limits for property-carrying drivers.
//!
//! Minute values are compared against quarter-hour aggregates, so every
//! limit here is a multiple of [`MINUTES_PER_QUARTER`].

/// Length of one log slot.
pub const MINUTES_PER_QUARTER: u32 = 15;

/// Slots in one calendar day.
pub const QUARTERS_PER_DAY: u32 = 96;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u32 = MINUTES_PER_QUARTER * QUARTERS_PER_DAY;

/// 11-hour driving limit.
pub const DRIVE_LIMIT_MINUTES: u32 = 11 * 60;

/// 14-hour on-duty window.
pub const DUTY_LIMIT_MINUTES: u32 = 14 * 60;

/// 70-hour cycle limit.
pub const CYCLE_LIMIT_HOURS: f64 = 70.0;

/// Days in the rolling cycle window. Cycle hours arrive precomputed.
pub const CYCLE_WINDOW_DAYS: u32 = 8;

/// Continuous working time after which a break is mandatory.
pub const BREAK_REQUIRED_AFTER_MINUTES: u32 = 8 * 60;

/// Length of the mandatory break.
pub const BREAK_DURATION_MINUTES: u32 = 30;

/// Driving allotted to a single day when a trip is split.
pub const DAILY_DRIVING_HOURS: f64 = 11.0;

/// Rest taken between driving days.
pub const DAILY_REST_MINUTES: u32 = 10 * 60;

/// Consecutive working slots that trigger an inserted break.
pub const BREAK_REQUIRED_AFTER_QUARTERS: u32 = BREAK_REQUIRED_AFTER_MINUTES / MINUTES_PER_QUARTER;

/// Slots consumed by an inserted break.
pub const BREAK_QUARTERS: u32 = BREAK_DURATION_MINUTES / MINUTES_PER_QUARTER;
