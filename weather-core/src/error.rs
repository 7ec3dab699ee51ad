use thiserror::Error;

use crate::{model::FieldErrors, provider::ForecastError, store::StoreError, validation::DateError};

/// Everything a weather request can fail with.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    InvalidDate(#[from] DateError),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("City '{0}' not found or unavailable.")]
    CityUnavailable(String),

    #[error("Could not extract latitude or longitude for city {0}")]
    CoordinatesMissing(String),

    #[error("Unexpected current conditions response: {0}")]
    UpstreamMalformed(String),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl WeatherError {
    /// Whether the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::InvalidDate(_) | Self::Validation(_)
        )
    }
}
