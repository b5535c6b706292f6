//! Duration and clock formatting shared by reports and log sheets.

use crate::limits::MINUTES_PER_QUARTER;

/// Formats minutes as `"{h}h {mm}m"` with zero-padded minutes.
pub fn format_minutes(minutes: u32) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// Formats the start of a quarter-hour slot as `HH:MM`.
pub fn format_quarter_start(quarter: u32) -> String {
    let minutes = quarter * MINUTES_PER_QUARTER;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_minutes_pads_minutes() {
        assert_eq!(format_minutes(0), "0h 00m");
        assert_eq!(format_minutes(5), "0h 05m");
        assert_eq!(format_minutes(660), "11h 00m");
        assert_eq!(format_minutes(780), "13h 00m");
        assert_eq!(format_minutes(495), "8h 15m");
    }

    #[test]
    fn format_quarter_start_renders_clock_time() {
        assert_eq!(format_quarter_start(0), "00:00");
        assert_eq!(format_quarter_start(1), "00:15");
        assert_eq!(format_quarter_start(24), "06:00");
        assert_eq!(format_quarter_start(95), "23:45");
    }
}
