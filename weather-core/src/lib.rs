//! Core library for the weather forecast API.
//!
//! This crate defines:
//! - Configuration handling
//! - Clients for the current-conditions and daily-forecast providers
//! - Forecast storage
//! - Validation and request orchestration shared by the HTTP layer

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;
pub mod validation;

pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use model::{CurrentWeatherReading, FieldErrors, ForecastRecord, ForecastTemperatures};
pub use provider::{CurrentConditionsProvider, ForecastError, ForecastProvider, ProviderId};
pub use service::WeatherService;
pub use store::{ForecastRepository, SqliteForecastStore, StoreError};
pub use validation::DateError;
