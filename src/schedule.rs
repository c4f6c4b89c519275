use chrono::{Duration, NaiveDateTime};

use crate::formatters::parse_12h;
use crate::models::{PrayerApiResponse, PrayerTimesData};

/// Hijri month number of Ramadan
pub const RAMADAN_MONTH: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrayerName {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    pub const DAILY: [PrayerName; 5] = [
        PrayerName::Fajr,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }

    fn time(self, timings: &PrayerTimesData) -> &str {
        match self {
            PrayerName::Fajr => &timings.fajr,
            PrayerName::Dhuhr => &timings.dhuhr,
            PrayerName::Asr => &timings.asr,
            PrayerName::Maghrib => &timings.maghrib,
            PrayerName::Isha => &timings.isha,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextPrayer {
    pub name: PrayerName,
    pub at: NaiveDateTime,
    pub remaining: Duration,
    /// Every prayer of the day has passed; this is tomorrow's Fajr
    pub tomorrow: bool,
}

/// Finds the first daily prayer strictly after `now`, wrapping to the next
/// day's Fajr once Isha has passed. Times that fail to parse are skipped.
pub fn next_prayer(timings: &PrayerTimesData, now: NaiveDateTime) -> Option<NextPrayer> {
    let today = now.date();
    let upcoming = PrayerName::DAILY.iter().find_map(|&name| {
        let at = today.and_time(parse_12h(name.time(timings))?);
        (at > now).then_some((name, at))
    });

    let (name, at, tomorrow) = match upcoming {
        Some((name, at)) => (name, at, false),
        None => {
            let fajr = parse_12h(&timings.fajr)?;
            (PrayerName::Fajr, today.succ_opt()?.and_time(fajr), true)
        }
    };

    Some(NextPrayer {
        name,
        at,
        remaining: at - now,
        tomorrow,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamadanHighlights {
    pub sahoor_ends: String,
    pub iftar: String,
}

pub fn is_ramadan(response: &PrayerApiResponse) -> bool {
    response.date.hijri.month_number == RAMADAN_MONTH
}

pub fn ramadan_highlights(response: &PrayerApiResponse) -> Option<RamadanHighlights> {
    is_ramadan(response).then(|| RamadanHighlights {
        sahoor_ends: response.timings.fajr.clone(),
        iftar: response.timings.maghrib.clone(),
    })
}
