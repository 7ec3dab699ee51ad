//! Input validation for forecast dates, current readings and forecast writes.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{CurrentWeatherReading, FieldErrors};

/// Forecasts are accepted from today up to this many days ahead, inclusive.
pub const MAX_FORECAST_DAYS: i64 = 10;

/// Longest accepted city name, in characters.
pub const MAX_CITY_LEN: usize = 100;

pub const MAX_TEMPERATURE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Invalid date format. Use DD.MM.YYYY")]
    Format,

    #[error("Date cannot be in the past")]
    Past,

    #[error("Date cannot be later than {}", .max_date.format("%d.%m.%Y"))]
    Future { max_date: NaiveDate },
}

/// Parse a strict `DD.MM.YYYY` date. Unpadded day or month is rejected.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'.' || bytes[5] != b'.' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%d.%m.%Y").ok()
}

/// Validate a forecast date against the local calendar date.
pub fn validate_forecast_date(raw: &str) -> Result<NaiveDate, DateError> {
    validate_forecast_date_on(raw, Local::now().date_naive())
}

/// Validate a forecast date against an explicit `today`.
pub fn validate_forecast_date_on(raw: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let date = parse_date(raw).ok_or(DateError::Format)?;
    let max_date = today + Duration::days(MAX_FORECAST_DAYS);

    if date < today {
        return Err(DateError::Past);
    }
    if date > max_date {
        return Err(DateError::Future { max_date });
    }

    Ok(date)
}

/// Check a string-encoded Celsius temperature. The value itself is kept as-is.
pub fn validate_temperature(raw: &str) -> Result<(), String> {
    let celsius = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| "Temperature must be a number".to_string())?;

    if celsius > MAX_TEMPERATURE {
        return Err(format!("Temperature cannot be above {MAX_TEMPERATURE}°C"));
    }
    Ok(())
}

fn is_hh_mm(value: &str) -> bool {
    let b = value.as_bytes();
    if b.len() != 5 || b[2] != b':' {
        return false;
    }
    if ![b[0], b[1], b[3], b[4]].iter().all(u8::is_ascii_digit) {
        return false;
    }
    let hour = (b[0] - b'0') * 10 + (b[1] - b'0');
    let minute = (b[3] - b'0') * 10 + (b[4] - b'0');
    hour <= 23 && minute <= 59
}

/// Normalize an observation time to 24-hour `HH:MM`.
///
/// Accepts `HH:MM` directly or a `YYYY-MM-DD hh:mm AM/PM` timestamp.
pub fn normalize_local_time(raw: &str) -> Result<String, String> {
    if is_hh_mm(raw) {
        return Ok(raw.to_string());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %I:%M %p")
        .map(|dt| dt.format("%H:%M").to_string())
        .map_err(|_| format!("Time '{raw}' does not match HH:MM or YYYY-MM-DD hh:mm AM/PM"))
}

/// Validate a raw reading, collecting errors for both fields.
pub fn validate_reading(temperature: &str, local_time: &str) -> Result<CurrentWeatherReading, FieldErrors> {
    let (temperature, local_time) = (temperature.trim(), local_time.trim());
    let mut errors = FieldErrors::new();

    if let Err(msg) = validate_temperature(temperature) {
        errors.add("temperature", msg);
    }
    let local_time = match normalize_local_time(local_time) {
        Ok(t) => Some(t),
        Err(msg) => {
            errors.add("local_time", msg);
            None
        }
    };

    match local_time {
        Some(local_time) if errors.is_empty() => Ok(CurrentWeatherReading {
            temperature: temperature.to_string(),
            local_time,
        }),
        _ => Err(errors),
    }
}

/// A forecast write that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidForecast {
    pub city: String,
    pub date: NaiveDate,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const INVALID_NUMBER: &str = "A valid number is required.";

fn required<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<&'a Value> {
    match obj.get(field) {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(Value::Null) => {
            errors.add(field, NOT_NULL);
            None
        }
        Some(v) => Some(v),
    }
}

fn city_field(value: &Value) -> Result<String, String> {
    let city = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err("Not a valid string.".to_string()),
    };
    if city.trim().is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if city.chars().count() > MAX_CITY_LEN {
        return Err(format!("Ensure this field has no more than {MAX_CITY_LEN} characters."));
    }
    Ok(city)
}

fn date_field(value: &Value, today: NaiveDate) -> Result<NaiveDate, String> {
    match value {
        Value::String(s) => validate_forecast_date_on(s, today).map_err(|e| e.to_string()),
        _ => Err("Not a valid string.".to_string()),
    }
}

fn number_field(value: &Value) -> Result<f64, String> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite()).ok_or_else(|| INVALID_NUMBER.to_string())
}

/// Object-level rule shared by every forecast write: min must not exceed max.
fn check_temperature_order(min_temperature: f64, max_temperature: f64) -> Result<(), FieldErrors> {
    if min_temperature > max_temperature {
        return Err(FieldErrors::single(
            "min_temperature",
            "Must not be greater than max_temperature.",
        ));
    }
    Ok(())
}

/// Validate a forecast write payload.
///
/// Every field is checked and all field errors are reported together. The
/// min/max ordering check only runs once all fields are individually valid.
pub fn validate_forecast_write_on(body: &Value, today: NaiveDate) -> Result<ValidForecast, FieldErrors> {
    let Some(obj) = body.as_object() else {
        return Err(FieldErrors::single(
            FieldErrors::NON_FIELD,
            "Invalid data. Expected a dictionary.",
        ));
    };

    let mut errors = FieldErrors::new();

    let city = required(obj, "city", &mut errors).and_then(|v| {
        city_field(v).map_err(|msg| errors.add("city", msg)).ok()
    });
    let date = required(obj, "date", &mut errors).and_then(|v| {
        date_field(v, today).map_err(|msg| errors.add("date", msg)).ok()
    });
    let min = required(obj, "min_temperature", &mut errors).and_then(|v| {
        number_field(v).map_err(|msg| errors.add("min_temperature", msg)).ok()
    });
    let max = required(obj, "max_temperature", &mut errors).and_then(|v| {
        number_field(v).map_err(|msg| errors.add("max_temperature", msg)).ok()
    });

    let (Some(city), Some(date), Some(min_temperature), Some(max_temperature)) =
        (city, date, min, max)
    else {
        return Err(errors);
    };

    check_temperature_order(min_temperature, max_temperature)?;

    Ok(ValidForecast { city, date, min_temperature, max_temperature })
}
