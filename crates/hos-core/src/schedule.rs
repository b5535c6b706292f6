//! Schedule generation.
//!
//! Turns trip timing into quarter-hour duty entries. A single day is laid
//! out as: off duty until the start slot, pickup, driving with a mandatory
//! break after eight hours of continuous work, fuel stops, delivery, then
//! off duty until midnight. Work that does not fit before midnight is
//! dropped from that day.
//!
//! Trips with more driving than one day allows are split by [`plan_trip`]
//! into consecutive days of at most eleven hours each, carrying any driving
//! cut off at midnight into the following day.

use chrono::{Days, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use thiserror::Error;

use crate::format::format_quarter_start;
use crate::limits::{
    BREAK_QUARTERS, BREAK_REQUIRED_AFTER_QUARTERS, DAILY_DRIVING_HOURS, MINUTES_PER_QUARTER,
    QUARTERS_PER_DAY,
};
use crate::types::{DailyLog, DutyStatus, QuarterHour, TimeEntry, ValidationError};

pub const PICKUP_LABEL: &str = "Pickup";
pub const BREAK_LABEL: &str = "30-min break";
pub const FUEL_LABEL: &str = "Fuel stop";
pub const DELIVERY_LABEL: &str = "Delivery";
pub const REST_REMARK: &str = "10-hour rest period before next driving day";

/// Default time spent loading and unloading.
pub const DEFAULT_STOP_MINUTES: u32 = 60;

/// Minutes consumed by one fuel stop.
pub const FUEL_STOP_MINUTES: u32 = 30;

/// Schedule generation errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    /// Driving hours were negative or not a number.
    #[error("driving hours must be a non-negative number, got {value}")]
    InvalidDrivingHours { value: f64 },

    /// Trip distance was negative or not a number.
    #[error("trip miles must be a non-negative number, got {value}")]
    InvalidMiles { value: f64 },

    /// The trip runs past the last representable date.
    #[error("trip day {day} is past the supported date range")]
    DateOutOfRange { day: u64 },

    /// A generated day failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Timing parameters for one day of work.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTiming {
    /// When work begins. Only the time of day is used.
    pub start: NaiveDateTime,
    /// Total driving to schedule.
    pub driving_hours: f64,
    pub pickup_minutes: u32,
    pub dropoff_minutes: u32,
    pub fuel_stops: u32,
}

impl DayTiming {
    /// Timing with the default one-hour pickup and delivery and no fuel stops.
    #[must_use]
    pub const fn new(start: NaiveDateTime, driving_hours: f64) -> Self {
        Self {
            start,
            driving_hours,
            pickup_minutes: DEFAULT_STOP_MINUTES,
            dropoff_minutes: DEFAULT_STOP_MINUTES,
            fuel_stops: 0,
        }
    }
}

/// Generates one day of 96 entries.
pub fn generate_day(timing: &DayTiming) -> Result<Vec<TimeEntry>, ScheduleError> {
    let quarters = driving_quarters(timing.driving_hours)?;
    let mut day = DayBuilder::default();
    if quarters > 0 {
        let placed = day.push_work(timing.start, timing.pickup_minutes, quarters);
        day.dropped += quarters - placed;
        day.push_stops(timing.fuel_stops, timing.dropoff_minutes);
    }
    Ok(day.finish(timing.start))
}

/// Accumulates entries for one day, refusing anything past slot 95.
#[derive(Debug, Default)]
struct DayBuilder {
    entries: Vec<TimeEntry>,
    dropped: u32,
}

impl DayBuilder {
    fn is_full(&self) -> bool {
        self.entries.len() >= QUARTERS_PER_DAY as usize
    }

    /// Off duty until `start`, then pickup, then up to `quarters` of driving
    /// with a break after every 32 working slots. Returns the driving slots
    /// that fit before midnight.
    fn push_work(&mut self, start: NaiveDateTime, pickup_minutes: u32, quarters: u32) -> u32 {
        let start_quarter =
            QuarterHour::from_clock(start.hour(), start.minute()).map_or(0, QuarterHour::index);
        self.push_span(DutyStatus::OffDuty, start_quarter, None);

        let mut consecutive = self.push_span(
            DutyStatus::OnDuty,
            pickup_minutes.div_ceil(MINUTES_PER_QUARTER),
            Some(PICKUP_LABEL),
        );

        let mut placed = 0;
        while placed < quarters && !self.is_full() {
            if consecutive >= BREAK_REQUIRED_AFTER_QUARTERS {
                self.push_span(DutyStatus::OffDuty, BREAK_QUARTERS, Some(BREAK_LABEL));
                consecutive = 0;
                continue;
            }
            self.push_span(DutyStatus::Driving, 1, None);
            placed += 1;
            consecutive += 1;
        }
        placed
    }

    /// Fuel stops, then delivery.
    fn push_stops(&mut self, fuel_stops: u32, dropoff_minutes: u32) {
        let fuel_quarters = FUEL_STOP_MINUTES.div_ceil(MINUTES_PER_QUARTER);
        for _ in 0..fuel_stops {
            self.push_span(DutyStatus::OnDuty, fuel_quarters, Some(FUEL_LABEL));
        }
        self.push_span(
            DutyStatus::OnDuty,
            dropoff_minutes.div_ceil(MINUTES_PER_QUARTER),
            Some(DELIVERY_LABEL),
        );
    }

    /// Appends up to `quarters` slots, labeling the first. Returns how many fit.
    fn push_span(&mut self, status: DutyStatus, quarters: u32, label: Option<&str>) -> u32 {
        let mut pushed = 0;
        for offset in 0..quarters {
            let Some(quarter) = self.next_quarter() else {
                self.dropped += quarters - offset;
                break;
            };
            let mut entry = TimeEntry::new(quarter, status);
            if offset == 0 {
                entry.description = label.map(str::to_string);
            }
            self.entries.push(entry);
            pushed += 1;
        }
        pushed
    }

    /// Pads the day with off duty and returns its entries.
    fn finish(mut self, start: NaiveDateTime) -> Vec<TimeEntry> {
        if self.dropped > 0 {
            tracing::warn!(
                %start,
                dropped_quarters = self.dropped,
                "work does not fit before midnight; truncating day"
            );
        }
        while let Some(quarter) = self.next_quarter() {
            self.entries.push(TimeEntry::new(quarter, DutyStatus::OffDuty));
        }
        self.entries
    }

    fn next_quarter(&self) -> Option<QuarterHour> {
        let next = i64::try_from(self.entries.len()).ok()?;
        QuarterHour::new(next).ok()
    }
}

/// Converts hours to whole quarters, rounding to the nearest slot.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn driving_quarters(hours: f64) -> Result<u32, ScheduleError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(ScheduleError::InvalidDrivingHours { value: hours });
    }
    // Saturates for absurd inputs; a day holds 96 slots regardless.
    Ok((hours * 4.0).round() as u32)
}

/// Parameters for planning a whole trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPlanRequest {
    /// When the first day's work begins.
    pub start: NaiveDateTime,
    /// Total driving for the trip.
    pub driving_hours: f64,
    /// Total trip distance.
    pub total_miles: f64,
    pub pickup_minutes: u32,
    pub dropoff_minutes: u32,
    /// Fuel stops across the whole trip.
    pub fuel_stops: u32,
    /// When work begins on every day after the first.
    pub next_day_start: NaiveTime,
}

impl TripPlanRequest {
    #[must_use]
    pub fn new(start: NaiveDateTime, driving_hours: f64, total_miles: f64) -> Self {
        Self {
            start,
            driving_hours,
            total_miles,
            pickup_minutes: DEFAULT_STOP_MINUTES,
            dropoff_minutes: DEFAULT_STOP_MINUTES,
            fuel_stops: 0,
            next_day_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
        }
    }
}

/// One day of a planned trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    /// 1-based position within the trip.
    pub day_number: u32,
    pub log: DailyLog,
    /// Driving actually placed on this day.
    pub driving_minutes: u32,
    pub miles: f64,
    pub remarks: Vec<String>,
}

/// Plans a trip as one or more days.
///
/// Each day takes at most eleven hours of driving. Driving that does not
/// fit before midnight moves to the next day, so a late first start adds
/// days rather than losing hours. Miles are shared in proportion to each
/// day's driving, which drifts from the true per-day distance when speed
/// varies along the route. Pickup only happens on the first day and
/// delivery on the last.
pub fn plan_trip(request: &TripPlanRequest) -> Result<Vec<DayPlan>, ScheduleError> {
    let total_quarters = driving_quarters(request.driving_hours)?;
    if !request.total_miles.is_finite() || request.total_miles < 0.0 {
        return Err(ScheduleError::InvalidMiles {
            value: request.total_miles,
        });
    }

    let daily_quarters = driving_quarters(DAILY_DRIVING_HOURS)?;
    tracing::debug!(
        driving_hours = request.driving_hours,
        total_quarters,
        "planning trip"
    );

    // Days after the first have no pickup, so each places at least one slot.
    let mut plans = Vec::new();
    let mut scheduled = 0;
    let mut offset: u32 = 0;
    while offset == 0 || scheduled < total_quarters {
        let first = offset == 0;
        let allotted = (total_quarters - scheduled).min(daily_quarters);

        let date = request
            .start
            .date()
            .checked_add_days(Days::new(u64::from(offset)))
            .ok_or(ScheduleError::DateOutOfRange {
                day: u64::from(offset) + 1,
            })?;
        let start = date.and_time(if first {
            request.start.time()
        } else {
            request.next_day_start
        });

        let mut day = DayBuilder::default();
        let pickup_minutes = if first { request.pickup_minutes } else { 0 };
        let placed = if allotted == 0 {
            0
        } else {
            day.push_work(start, pickup_minutes, allotted)
        };
        let last = scheduled + placed >= total_quarters;
        if allotted > 0 {
            day.push_stops(
                fuel_stops_for_day(
                    request.fuel_stops,
                    scheduled,
                    scheduled + placed,
                    total_quarters,
                ),
                if last { request.dropoff_minutes } else { 0 },
            );
        }
        let log = DailyLog::new(date, day.finish(start))?;

        let mut remarks = day_remarks(log.entries());
        if !last {
            remarks.push(REST_REMARK.to_string());
        }

        let miles = if first && last {
            request.total_miles
        } else {
            (f64::from(placed) / f64::from(total_quarters) * request.total_miles).round()
        };

        plans.push(DayPlan {
            day_number: offset + 1,
            log,
            driving_minutes: placed * MINUTES_PER_QUARTER,
            miles,
            remarks,
        });
        scheduled += placed;
        offset += 1;
    }

    tracing::debug!(day_count = plans.len(), "planned trip");
    Ok(plans)
}

/// Fuel stops falling within the driving slots `from..to` of the trip.
fn fuel_stops_for_day(total_stops: u32, from: u32, to: u32, total_quarters: u32) -> u32 {
    if total_quarters == 0 {
        return total_stops;
    }
    let through = |quarter: u32| {
        let share = u64::from(total_stops) * u64::from(quarter) / u64::from(total_quarters);
        u32::try_from(share).unwrap_or(total_stops)
    };
    through(to) - through(from)
}

/// Log remarks: one `HH:MM - text` line per labeled slot or status change.
pub fn day_remarks(entries: &[TimeEntry]) -> Vec<String> {
    let mut remarks = Vec::new();
    let mut previous: Option<DutyStatus> = None;
    for entry in entries {
        let text = match (&entry.description, previous) {
            (Some(label), _) => Some(label.as_str()),
            (None, Some(prev)) if prev != entry.status => Some(status_title(entry.status)),
            _ => None,
        };
        if let Some(text) = text {
            remarks.push(format!(
                "{} - {text}",
                format_quarter_start(entry.quarter_hour.index())
            ));
        }
        previous = Some(entry.status);
    }
    remarks
}

const fn status_title(status: DutyStatus) -> &'static str {
    match status {
        DutyStatus::OffDuty => "Off duty",
        DutyStatus::Sleeper => "Sleeper berth",
        DutyStatus::Driving => "Driving",
        DutyStatus::OnDuty => "On duty",
    }
}
