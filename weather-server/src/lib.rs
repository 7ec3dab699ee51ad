//! HTTP layer for the weather forecast API.
//!
//! Routes live in [`routes`]; service failures are turned into responses by
//! [`error::ApiError`].

use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use weather_core::{
    Config, ForecastRepository, SqliteForecastStore, WeatherService,
    provider::providers_from_config,
};

pub mod error;
pub mod routes;

pub use routes::{AppState, router};

/// Wire providers from `config` to the given store.
pub fn build_service(
    config: &Config,
    store: Arc<dyn ForecastRepository>,
) -> anyhow::Result<WeatherService> {
    let (current, forecast) = providers_from_config(config)?;
    Ok(WeatherService::new(Arc::new(current), Arc::new(forecast), store))
}

/// Open the configured database and build the full application router.
pub fn app_from_config(config: &Config) -> anyhow::Result<Router> {
    let store = SqliteForecastStore::open(&config.database.path).with_context(|| {
        format!("Failed to open database: {}", config.database.path.display())
    })?;
    let service = build_service(config, Arc::new(store))?;
    Ok(app(service))
}

pub fn app(service: WeatherService) -> Router {
    router(AppState { service: Arc::new(service) })
}
