use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use weather_core::{ForecastError, WeatherError};

/// Error returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    Weather(WeatherError),
    /// The request body could not be decoded as JSON.
    MalformedBody(String),
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        ApiError::Weather(err)
    }
}

/// Response status for a service failure.
pub fn status_for(err: &WeatherError) -> StatusCode {
    match err {
        WeatherError::MissingParameter(_)
        | WeatherError::InvalidDate(_)
        | WeatherError::Validation(_) => StatusCode::BAD_REQUEST,
        WeatherError::CityUnavailable(_) => StatusCode::NOT_FOUND,
        WeatherError::Forecast(ForecastError::Transport(_)) => StatusCode::BAD_GATEWAY,
        WeatherError::CoordinatesMissing(_)
        | WeatherError::UpstreamMalformed(_)
        | WeatherError::Forecast(_)
        | WeatherError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MalformedBody(msg) => {
                tracing::warn!(error = %msg, "Rejected malformed request body");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Weather(err) => {
                let status = status_for(&err);
                if err.is_client_error() {
                    tracing::warn!(%status, error = %err, "Request rejected");
                } else {
                    tracing::error!(%status, error = %err, "Request failed");
                }

                match err {
                    WeatherError::Validation(errors) => (status, Json(errors)).into_response(),
                    other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
                }
            }
        }
    }
}
