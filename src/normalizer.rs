//! Maps the untrusted upstream timings payload onto [`PrayerApiResponse`].

use serde_json::Value;

use crate::error::NormalizeError;
use crate::formatters::format_12h;
use crate::methods::{BANGLADESH_METHOD_ID, BANGLADESH_METHOD_NAME};
use crate::models::{
    CalendarDate, GregorianDate, GregorianMonth, HijriDate, LocalizedName, MethodMeta,
    PrayerApiResponse, PrayerTimesData, ResponseMeta,
};

const UNKNOWN_METHOD_NAME: &str = "Unknown method";

pub fn normalize(
    payload: &Value,
    requested_method: u32,
) -> Result<PrayerApiResponse, NormalizeError> {
    let data = payload.get("data").ok_or(NormalizeError::InvalidStructure)?;
    let timings = present(data.get("timings")).ok_or(NormalizeError::InvalidStructure)?;
    let date = present(data.get("date")).ok_or(NormalizeError::InvalidStructure)?;

    let hijri = present(date.get("hijri"));
    let gregorian = present(date.get("gregorian"));
    let (Some(hijri), Some(gregorian)) = (hijri, gregorian) else {
        return Err(NormalizeError::MissingDateFields);
    };

    let timing = |field: &'static str| {
        timings
            .get(field)
            .and_then(Value::as_str)
            .and_then(format_12h)
            .ok_or(NormalizeError::InvalidTiming(field))
    };
    // Field order here is the validation order.
    let formatted = PrayerTimesData {
        fajr: timing("Fajr")?,
        sunrise: timing("Sunrise")?,
        dhuhr: timing("Dhuhr")?,
        asr: timing("Asr")?,
        sunset: timing("Sunset")?,
        maghrib: timing("Maghrib")?,
        isha: timing("Isha")?,
        imsak: timing("Imsak")?,
        midnight: timing("Midnight")?,
    };

    let method = if requested_method == BANGLADESH_METHOD_ID {
        MethodMeta {
            id: BANGLADESH_METHOD_ID,
            name: BANGLADESH_METHOD_NAME.to_string(),
        }
    } else {
        let upstream = data.get("meta").and_then(|meta| meta.get("method"));
        MethodMeta {
            id: upstream
                .and_then(|method| number(method.get("id")))
                .unwrap_or(requested_method),
            name: upstream
                .and_then(|method| method.get("name"))
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_METHOD_NAME)
                .to_string(),
        }
    };

    Ok(PrayerApiResponse {
        timings: formatted,
        date: CalendarDate {
            hijri: hijri_date(hijri),
            gregorian: gregorian_date(gregorian),
        },
        meta: ResponseMeta { method },
    })
}

fn hijri_date(hijri: &Value) -> HijriDate {
    HijriDate {
        day: text(hijri.get("day")),
        weekday: text(hijri.pointer("/weekday/en")),
        month: text(hijri.pointer("/month/en")),
        month_number: number(hijri.pointer("/month/number")).unwrap_or(0),
        year: text(hijri.get("year")),
        designation: text(hijri.pointer("/designation/abbreviated")),
        holidays: hijri
            .get("holidays")
            .and_then(Value::as_array)
            .map(|holidays| holidays.iter().map(|h| text(Some(h))).collect())
            .unwrap_or_default(),
    }
}

fn gregorian_date(gregorian: &Value) -> GregorianDate {
    GregorianDate {
        date: text(gregorian.get("date")),
        day: text(gregorian.get("day")),
        month: GregorianMonth {
            number: number(gregorian.pointer("/month/number")).unwrap_or(0),
            en: text(gregorian.pointer("/month/en")),
        },
        year: text(gregorian.get("year")),
        weekday: LocalizedName {
            en: text(gregorian.pointer("/weekday/en")),
        },
    }
}

/// Treats JSON `null` the same as an absent key
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Coerces any scalar to a string; absent or null becomes empty.
fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn number(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const REQUIRED_TIMINGS: [&str; 9] = [
        "Fajr", "Sunrise", "Dhuhr", "Asr", "Sunset", "Maghrib", "Isha", "Imsak", "Midnight",
    ];

    fn payload() -> Value {
        json!({
            "code": 200,
            "data": {
                "timings": {
                    "Fajr": "04:12 (+06)",
                    "Sunrise": "05:31 (+06)",
                    "Dhuhr": "11:58 (+06)",
                    "Asr": "15:21 (+06)",
                    "Sunset": "18:05 (+06)",
                    "Maghrib": "18:05 (+06)",
                    "Isha": "19:20 (+06)",
                    "Imsak": "04:02 (+06)",
                    "Midnight": "23:58 (+06)"
                },
                "date": {
                    "hijri": {
                        "day": "11",
                        "weekday": { "en": "Al Arba'a" },
                        "month": { "number": 9, "en": "Ramaḍān" },
                        "year": "1447",
                        "designation": { "abbreviated": "AH" },
                        "holidays": []
                    },
                    "gregorian": {
                        "date": "01-03-2026",
                        "day": "01",
                        "month": { "number": 3, "en": "March" },
                        "year": "2026",
                        "weekday": { "en": "Sunday" }
                    }
                },
                "meta": {
                    "method": { "id": 2, "name": "Islamic Society of North America (ISNA)" }
                }
            }
        })
    }

    #[test]
    fn normalizes_complete_payload() {
        let response = normalize(&payload(), 2).expect("normalize");
        assert_eq!(response.timings.fajr, "4:12 AM");
        assert_eq!(response.timings.maghrib, "6:05 PM");
        assert_eq!(response.timings.midnight, "11:58 PM");
        assert_eq!(response.date.hijri.month_number, 9);
        assert_eq!(response.date.hijri.designation, "AH");
        assert_eq!(response.date.gregorian.month.en, "March");
        assert_eq!(response.date.gregorian.weekday.en, "Sunday");
        assert_eq!(response.meta.method.id, 2);
        assert_eq!(response.meta.method.name, "Islamic Society of North America (ISNA)");
    }

    #[test]
    fn rejects_missing_timings_or_date() {
        let mut value = payload();
        value["data"].as_object_mut().expect("object").remove("timings");
        assert_eq!(normalize(&value, 2), Err(NormalizeError::InvalidStructure));

        assert_eq!(
            normalize(&json!({ "data": null }), 2),
            Err(NormalizeError::InvalidStructure)
        );
        assert_eq!(normalize(&json!("oops"), 2), Err(NormalizeError::InvalidStructure));
    }

    #[test]
    fn rejects_missing_hijri_or_gregorian() {
        let mut value = payload();
        value["data"]["date"]["gregorian"] = Value::Null;
        assert_eq!(normalize(&value, 2), Err(NormalizeError::MissingDateFields));
    }

    #[test]
    fn names_first_missing_timing_field() {
        for field in REQUIRED_TIMINGS {
            let mut value = payload();
            value["data"]["timings"]
                .as_object_mut()
                .expect("object")
                .remove(field);
            assert_eq!(
                normalize(&value, 2),
                Err(NormalizeError::InvalidTiming(field))
            );
        }

        let mut value = payload();
        value["data"]["timings"]["Asr"] = json!(1521);
        value["data"]["timings"]["Isha"] = json!(null);
        assert_eq!(normalize(&value, 2), Err(NormalizeError::InvalidTiming("Asr")));
    }

    #[test]
    fn unparseable_timing_is_reported_as_invalid() {
        let mut value = payload();
        value["data"]["timings"]["Dhuhr"] = json!("--:--");
        assert_eq!(normalize(&value, 2), Err(NormalizeError::InvalidTiming("Dhuhr")));
    }

    #[test]
    fn absent_date_subfields_become_empty_strings() {
        let mut value = payload();
        value["data"]["date"]["hijri"] = json!({ "day": 11 });
        value["data"]["date"]["gregorian"] = json!({});
        let response = normalize(&value, 2).expect("normalize");
        assert_eq!(response.date.hijri.day, "11");
        assert_eq!(response.date.hijri.month, "");
        assert_eq!(response.date.hijri.month_number, 0);
        assert!(response.date.hijri.holidays.is_empty());
        assert_eq!(response.date.gregorian.date, "");
        assert_eq!(response.date.gregorian.month.number, 0);
    }

    #[test]
    fn falls_back_to_requested_method_when_meta_absent() {
        let mut value = payload();
        value["data"].as_object_mut().expect("object").remove("meta");
        let response = normalize(&value, 3).expect("normalize");
        assert_eq!(response.meta.method.id, 3);
        assert_eq!(response.meta.method.name, "Unknown method");
    }

    #[test]
    fn bangladesh_overrides_upstream_method_metadata() {
        let mut value = payload();
        value["data"]["meta"]["method"] = json!({ "id": 99, "name": "Custom" });
        let response = normalize(&value, BANGLADESH_METHOD_ID).expect("normalize");
        assert_eq!(
            response.meta.method,
            MethodMeta {
                id: 16,
                name: "Bangladesh".to_string()
            }
        );
    }
}
