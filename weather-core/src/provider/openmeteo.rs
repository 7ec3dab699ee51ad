use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{model::DailyForecast, validation::parse_date};

use super::{ForecastError, ForecastProvider, truncate_body};

/// Daily fields requested from Open-Meteo. Only the temperatures are read.
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,weathercode";

/// Open-Meteo daily forecast client.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    daily: OmDaily,
}

/// First daily value. An empty series is a malformed response; a `null`
/// entry is passed on for validation.
fn first_value(values: &[Option<f64>], field: &str) -> Result<Option<f64>, ForecastError> {
    values
        .first()
        .copied()
        .ok_or_else(|| ForecastError::Unexpected(format!("daily.{field} is empty")))
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        city: &str,
        date: &str,
    ) -> Result<DailyForecast, ForecastError> {
        tracing::info!(city, date, "Fetching daily forecast from Open-Meteo");

        let api_date = parse_date(date)
            .ok_or_else(|| ForecastError::DateFormat(date.to_string()))?
            .format("%Y-%m-%d")
            .to_string();

        let url = format!("{}/v1/forecast", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string().as_str()),
                ("longitude", longitude.to_string().as_str()),
                ("daily", DAILY_FIELDS),
                ("start_date", api_date.as_str()),
                ("end_date", api_date.as_str()),
                ("timezone", "auto"),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| ForecastError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ForecastError::Transport(format!(
                "status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        let parsed: OmResponse = serde_json::from_str(&body)
            .map_err(|e| ForecastError::Unexpected(format!("invalid JSON: {e}")))?;

        Ok(DailyForecast {
            temp_max: first_value(&parsed.daily.temperature_2m_max, "temperature_2m_max")?,
            temp_min: first_value(&parsed.daily.temperature_2m_min, "temperature_2m_min")?,
            date: api_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_rejects_empty_and_keeps_null() {
        assert_eq!(first_value(&[Some(3.5), Some(1.0)], "x").unwrap(), Some(3.5));
        assert_eq!(first_value(&[None], "x").unwrap(), None);
        assert!(matches!(first_value(&[], "x"), Err(ForecastError::Unexpected(_))));
    }

    #[tokio::test]
    async fn bad_date_fails_before_any_request() {
        // Unroutable base URL: reaching the network would surface as Transport.
        let provider = OpenMeteoProvider::new(Client::new(), "http://127.0.0.1:9");
        let err = provider.fetch_forecast(55.75, 37.61, "Moscow", "2025-12-25").await.unwrap_err();
        assert!(matches!(err, ForecastError::DateFormat(_)));
    }
}
