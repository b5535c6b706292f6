//! Print-ready daily log sheets.

use serde::Serialize;

use crate::format::format_minutes;
use crate::types::{DailyLog, TimeEntry};

/// Everything a printed log sheet shows for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSheet {
    pub driver_name: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub total_miles: f64,
    pub time_entries: Vec<TimeEntry>,
    pub driving_time: String,
    pub on_duty_time: String,
    pub off_duty_time: String,
    pub sleeper_berth_time: String,
    pub remarks: Vec<String>,
}

impl LogSheet {
    /// Builds a sheet from a validated day.
    #[must_use]
    pub fn from_log(
        log: &DailyLog,
        driver_name: impl Into<String>,
        total_miles: f64,
        remarks: Vec<String>,
    ) -> Self {
        let totals = log.totals();
        Self {
            driver_name: driver_name.into(),
            date: log.date().format("%Y-%m-%d").to_string(),
            total_miles,
            time_entries: log.entries().to_vec(),
            driving_time: format_minutes(totals.driving_minutes),
            on_duty_time: format_minutes(totals.on_duty_minutes),
            off_duty_time: format_minutes(totals.off_duty_minutes),
            sleeper_berth_time: format_minutes(totals.sleeper_minutes),
            remarks,
        }
    }
}
