use crate::{
    Config,
    model::{DailyForecast, WttrPayload},
    provider::{openmeteo::OpenMeteoProvider, wttr::WttrProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug};
use thiserror::Error;

pub mod openmeteo;
pub mod wttr;

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("weather-forecast-api/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Wttr,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Wttr => "wttr",
            ProviderId::OpenMeteo => "openmeteo",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::Wttr => "https://wttr.in",
            ProviderId::OpenMeteo => "https://api.open-meteo.com",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Wttr, ProviderId::OpenMeteo]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "wttr" | "wttr.in" => Ok(ProviderId::Wttr),
            "openmeteo" | "open-meteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: wttr, openmeteo."
            )),
        }
    }
}

/// Failure kinds of the daily forecast lookup. Callers distinguish them to
/// pick a response status.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Forecast provider request failed: {0}")]
    Transport(String),

    #[error("Invalid date format '{0}'. Use DD.MM.YYYY")]
    DateFormat(String),

    #[error("Unexpected forecast provider response: {0}")]
    Unexpected(String),
}

/// Current-conditions lookup by city name.
///
/// Failures are swallowed: `None` means the city is unknown or the provider
/// is unavailable.
#[async_trait]
pub trait CurrentConditionsProvider: Send + Sync + Debug {
    async fn fetch_current(&self, city: &str) -> Option<WttrPayload>;
}

/// Daily min/max temperature lookup for a single date at given coordinates.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        city: &str,
        date: &str,
    ) -> Result<DailyForecast, ForecastError>;
}

/// Shared HTTP client configured from the `[http]` section.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(config.http.timeout())
        .user_agent(config.http.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// Construct both providers from config, sharing one HTTP client.
pub fn providers_from_config(config: &Config) -> anyhow::Result<(WttrProvider, OpenMeteoProvider)> {
    let http = http_client(config)?;

    let current = WttrProvider::new(http.clone(), config.provider_base_url(ProviderId::Wttr));
    let forecast =
        OpenMeteoProvider::new(http, config.provider_base_url(ProviderId::OpenMeteo));

    Ok((current, forecast))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
