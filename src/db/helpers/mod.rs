use chrono::{DateTime, Local};

/// Timestamp layout of the window log columns.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_datetime(value: &DateTime<Local>) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_without_fractional_seconds() {
        let value = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(format_datetime(&value), "2024-03-09 07:05:03");
    }
}
