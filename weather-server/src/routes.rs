use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use weather_core::{CurrentWeatherReading, ForecastTemperatures, WeatherService};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WeatherService>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherQuery {
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    city: Option<String>,
    date: Option<String>,
}

/// All API routes. Each path answers with and without the trailing slash.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather/current/", get(current_weather))
        .route("/weather/current", get(current_weather))
        .route("/weather/forecast/", get(get_forecast).post(post_forecast))
        .route("/weather/forecast", get(get_forecast).post(post_forecast))
        .with_state(state)
}

pub async fn current_weather(
    State(state): State<AppState>,
    Query(query): Query<CurrentWeatherQuery>,
) -> Result<Json<CurrentWeatherReading>, ApiError> {
    tracing::info!("Current weather requested");
    let reading = state.service.current_weather(query.city.as_deref()).await?;
    Ok(Json(reading))
}

pub async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastTemperatures>, ApiError> {
    tracing::info!("Forecast requested");
    let temps = state
        .service
        .forecast(query.city.as_deref(), query.date.as_deref())
        .await?;
    Ok(Json(temps))
}

pub async fn post_forecast(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ForecastTemperatures>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;
    let temps = state.service.save_forecast(&body).await?;
    Ok(Json(temps))
}
