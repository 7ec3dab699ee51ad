use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted forecast for a single city and calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub city: String,
    pub date: NaiveDate,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

/// Public representation of a forecast. City and date are write-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastTemperatures {
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl From<&ForecastRecord> for ForecastTemperatures {
    fn from(record: &ForecastRecord) -> Self {
        Self {
            min_temperature: record.min_temperature,
            max_temperature: record.max_temperature,
        }
    }
}

/// Validated current-conditions reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentWeatherReading {
    pub temperature: String,
    pub local_time: String,
}

/// Whether an upsert inserted a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
        }
    }
}

/// Daily forecast as reported by the forecast provider.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    /// Provider date, `YYYY-MM-DD`.
    pub date: String,
    /// `None` when the provider reported `null` for the day.
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
}

/// Validation messages keyed by field name.
///
/// Serializes as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "non_field_errors";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

// wttr.in `format=j1` payload. Only the fields this service reads are
// modelled; everything else in the body is ignored.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WttrPayload {
    #[serde(default)]
    pub current_condition: Vec<WttrCondition>,
    #[serde(default)]
    pub nearest_area: Vec<WttrArea>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WttrCondition {
    #[serde(rename = "temp_C")]
    pub temp_c: Option<String>,
    #[serde(rename = "localObsDateTime")]
    pub local_obs_date_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WttrArea {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl WttrArea {
    /// Parsed `(latitude, longitude)`, if both are present and numeric.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.as_deref()?.trim().parse::<f64>().ok()?;
        let lon = self.longitude.as_deref()?.trim().parse::<f64>().ok()?;
        Some((lat, lon))
    }
}
