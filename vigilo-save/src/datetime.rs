//! Date/time text as the save header stores it: a date part and a time part
//! in separate description fields. Malformed text is common in the wild
//! (locale-edited saves), so parse failures yield `None` instead of
//! aborting the read.

use chrono::NaiveDateTime;

/// `M/d/yyyy H:mm`, 24-hour clock, local wall time.
pub fn parse_local_24h(date_text: &str, time_text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{date_text} {time_text}"), "%m/%d/%Y %H:%M").ok()
}

/// `M/d/yyyy h:mm tt`, 12-hour clock, UTC (the in-game calendar).
pub fn parse_utc_12h(date_text: &str, time_text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{date_text} {time_text}"), "%m/%d/%Y %I:%M %p").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_unpadded_24_hour_text() {
        assert_eq!(
            parse_local_24h("3/14/2017", "13:05"),
            NaiveDate::from_ymd_opt(2017, 3, 14).and_then(|d| d.and_hms_opt(13, 5, 0))
        );
    }

    #[test]
    fn parses_12_hour_text_with_meridiem() {
        assert_eq!(
            parse_utc_12h("5/1/2035", "3:00 PM"),
            NaiveDate::from_ymd_opt(2035, 5, 1).and_then(|d| d.and_hms_opt(15, 0, 0))
        );
    }

    #[test]
    fn malformed_text_is_absent_not_fatal() {
        assert_eq!(parse_local_24h("yesterday", "noonish"), None);
        assert_eq!(parse_utc_12h("", ""), None);
    }
}
