use chrono::{NaiveDate, NaiveTime};

use crate::methods::CALCULATION_METHODS;
use crate::models::{IpLocation, PrayerApiResponse};
use crate::schedule::{ramadan_highlights, NextPrayer};

/// Date format expected by the proxy and the upstream API
pub const API_DATE_FORMAT: &str = "%d-%m-%Y";

/// Converts a 24-hour `HH:mm[:ss]` time, optionally suffixed with a
/// parenthesized timezone (`"04:12 (+06)"`), into `"H:MM AM|PM"`.
///
/// Returns `None` when the hour or minute is missing or out of range.
pub fn format_12h(raw: &str) -> Option<String> {
    let clean = strip_timezone(raw);
    let mut parts = clean.split(':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }

    let period = if hour >= 12 { "PM" } else { "AM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    Some(format!("{hour12}:{minute:02} {period}"))
}

/// Parses a `"H:MM AM|PM"` display time back into a wall-clock time
pub fn parse_12h(display: &str) -> Option<NaiveTime> {
    let (clock, period) = display.trim().split_once(' ')?;
    let (hour, minute) = clock.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }

    let hour24 = match (period, hour) {
        ("AM", 12) => 0,
        ("AM", h) => h,
        ("PM", 12) => 12,
        ("PM", h) => h + 12,
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0)
}

fn strip_timezone(raw: &str) -> &str {
    let trimmed = raw.trim_end();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.find('(') {
            return trimmed[..open].trim_end();
        }
    }
    trimmed
}

/// Formats a calendar date the way the proxy expects it (`dd-mm-yyyy`)
pub fn to_api_date(date: NaiveDate) -> String {
    date.format(API_DATE_FORMAT).to_string()
}

pub fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), API_DATE_FORMAT).ok()
}

/// Formats a prayer schedule into a human-readable string
pub fn format_schedule(response: &PrayerApiResponse) -> String {
    let timings = &response.timings;
    let hijri = &response.date.hijri;
    let gregorian = &response.date.gregorian;

    let mut output = format!(
        "Prayer Times\nDate: {} {} ({})\nHijri: {} {} {} {}\nMethod: {} (#{})\n\n",
        gregorian.weekday.en,
        gregorian.date,
        gregorian.month.en,
        hijri.day,
        hijri.month,
        hijri.year,
        hijri.designation,
        response.meta.method.name,
        response.meta.method.id,
    );

    for (label, time) in [
        ("Imsak", &timings.imsak),
        ("Fajr", &timings.fajr),
        ("Sunrise", &timings.sunrise),
        ("Dhuhr", &timings.dhuhr),
        ("Asr", &timings.asr),
        ("Sunset", &timings.sunset),
        ("Maghrib", &timings.maghrib),
        ("Isha", &timings.isha),
        ("Midnight", &timings.midnight),
    ] {
        output.push_str(&format!("  {label:<9}{time}\n"));
    }

    if let Some(highlights) = ramadan_highlights(response) {
        output.push_str(&format!(
            "\nRamadan\n  Sahoor ends  {}\n  Iftar        {}\n",
            highlights.sahoor_ends, highlights.iftar
        ));
    }

    if !hijri.holidays.is_empty() {
        output.push_str(&format!("\nHolidays: {}\n", hijri.holidays.join(", ")));
    }
    output
}

pub fn format_countdown(next: &NextPrayer) -> String {
    let total = next.remaining.num_seconds().max(0);
    let when = if next.tomorrow { " (tomorrow)" } else { "" };
    format!(
        "Next prayer: {}{} in {:02}:{:02}:{:02}",
        next.name.label(),
        when,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

pub fn format_ip_location(location: &IpLocation) -> String {
    format!(
        "Approximate location: {:.4}, {:.4} (via {})",
        location.latitude,
        location.longitude,
        location.source.as_str()
    )
}

pub fn format_methods() -> String {
    let mut output = String::from("Calculation Methods:\n\n");
    for (id, name) in CALCULATION_METHODS {
        output.push_str(&format!("  {id:>2}  {name}\n"));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_boundary_hours() {
        assert_eq!(format_12h("00:00").as_deref(), Some("12:00 AM"));
        assert_eq!(format_12h("13:05").as_deref(), Some("1:05 PM"));
        assert_eq!(format_12h("23:59").as_deref(), Some("11:59 PM"));
        assert_eq!(format_12h("12:00").as_deref(), Some("12:00 PM"));
        assert_eq!(format_12h("04:12").as_deref(), Some("4:12 AM"));
    }

    #[test]
    fn strips_parenthetical_timezone_and_seconds() {
        assert_eq!(format_12h("04:12 (+06)").as_deref(), Some("4:12 AM"));
        assert_eq!(format_12h("18:07 (BST)").as_deref(), Some("6:07 PM"));
        assert_eq!(format_12h("05:30:45").as_deref(), Some("5:30 AM"));
    }

    #[test]
    fn rejects_malformed_times() {
        assert_eq!(format_12h(""), None);
        assert_eq!(format_12h("noon"), None);
        assert_eq!(format_12h("24:00"), None);
        assert_eq!(format_12h("10:75"), None);
        assert_eq!(format_12h("10"), None);
    }

    #[test]
    fn parse_12h_inverts_format_12h() {
        for hour in 0..24 {
            for minute in [0, 1, 30, 59] {
                let raw = format!("{hour:02}:{minute:02}");
                let display = format_12h(&raw).expect("valid");
                let parsed = parse_12h(&display).expect("parse");
                assert_eq!(parsed, NaiveTime::from_hms_opt(hour, minute, 0).expect("time"));
            }
        }
        assert_eq!(parse_12h("13:00 PM"), None);
        assert_eq!(parse_12h("5:00"), None);
    }

    #[test]
    fn api_dates_use_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).expect("date");
        assert_eq!(to_api_date(date), "01-03-2026");
        assert_eq!(parse_api_date("01-03-2026"), Some(date));
        assert_eq!(parse_api_date("2026-03-01"), None);
    }
}
