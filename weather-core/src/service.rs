//! Request orchestration for current weather and forecast lookups/writes.

use chrono::{Local, NaiveDate};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    error::WeatherError,
    model::{CurrentWeatherReading, ForecastRecord, ForecastTemperatures},
    provider::{CurrentConditionsProvider, ForecastProvider},
    store::{ForecastRepository, StoreError, StoreResult},
    validation::{validate_forecast_date_on, validate_forecast_write_on, validate_reading},
};

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct WeatherService {
    current: Arc<dyn CurrentConditionsProvider>,
    forecast: Arc<dyn ForecastProvider>,
    store: Arc<dyn ForecastRepository>,
    today: Clock,
}

impl std::fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherService")
            .field("current", &self.current)
            .field("forecast", &self.forecast)
            .finish_non_exhaustive()
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl WeatherService {
    pub fn new(
        current: Arc<dyn CurrentConditionsProvider>,
        forecast: Arc<dyn ForecastProvider>,
        store: Arc<dyn ForecastRepository>,
    ) -> Self {
        Self { current, forecast, store, today: Arc::new(|| Local::now().date_naive()) }
    }

    /// Replace the calendar used for date-range checks.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub fn store(&self) -> &Arc<dyn ForecastRepository> {
        &self.store
    }

    /// Run a store call on the blocking pool so SQLite never stalls the
    /// async workers.
    async fn with_store<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn ForecastRepository) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Current temperature and local observation time for `city`.
    #[tracing::instrument(skip(self))]
    pub async fn current_weather(
        &self,
        city: Option<&str>,
    ) -> Result<CurrentWeatherReading, WeatherError> {
        let city = present(city).ok_or(WeatherError::MissingParameter("City name is required"))?;

        let payload = self
            .current
            .fetch_current(city)
            .await
            .ok_or_else(|| WeatherError::CityUnavailable(city.to_string()))?;

        let condition = payload.current_condition.first().ok_or_else(|| {
            WeatherError::UpstreamMalformed("current_condition is missing or empty".into())
        })?;

        let (Some(temperature), Some(local_time)) =
            (condition.temp_c.as_deref(), condition.local_obs_date_time.as_deref())
        else {
            return Err(WeatherError::UpstreamMalformed(
                "temp_C or localObsDateTime is missing".into(),
            ));
        };

        validate_reading(temperature, local_time).map_err(|errors| {
            tracing::error!(%errors, "Current reading failed validation");
            WeatherError::Validation(errors)
        })
    }

    /// Stored forecast for (city, date), or a live one computed from the
    /// providers. Live forecasts are validated but not persisted.
    #[tracing::instrument(skip(self))]
    pub async fn forecast(
        &self,
        city: Option<&str>,
        date: Option<&str>,
    ) -> Result<ForecastTemperatures, WeatherError> {
        let (Some(city), Some(date)) = (present(city), present(date)) else {
            return Err(WeatherError::MissingParameter("City name and date are required"));
        };

        let parsed = validate_forecast_date_on(date, (self.today)())?;

        let key = city.to_string();
        let stored = self.with_store(move |store| store.find_by_city_and_date(&key, parsed)).await?;

        if let Some(record) = stored {
            tracing::info!("Returning stored forecast");
            return Ok(ForecastTemperatures::from(&record));
        }

        let payload = self
            .current
            .fetch_current(city)
            .await
            .ok_or_else(|| WeatherError::CityUnavailable(city.to_string()))?;

        let (latitude, longitude) = payload
            .nearest_area
            .first()
            .and_then(|area| area.coordinates())
            .ok_or_else(|| WeatherError::CoordinatesMissing(city.to_string()))?;

        let daily = self.forecast.fetch_forecast(latitude, longitude, city, date).await?;

        // Provider output must pass the write rules; a `null` day is a field error.
        let shaped = json!({
            "city": city,
            "date": date,
            "min_temperature": daily.temp_min,
            "max_temperature": daily.temp_max,
        });
        let valid = validate_forecast_write_on(&shaped, (self.today)()).map_err(|errors| {
            tracing::error!(%errors, "Provider forecast failed validation");
            WeatherError::Validation(errors)
        })?;

        Ok(ForecastTemperatures {
            min_temperature: valid.min_temperature,
            max_temperature: valid.max_temperature,
        })
    }

    /// Validate and upsert a forecast write payload.
    #[tracing::instrument(skip_all)]
    pub async fn save_forecast(&self, body: &Value) -> Result<ForecastTemperatures, WeatherError> {
        let valid = validate_forecast_write_on(body, (self.today)()).map_err(|errors| {
            tracing::error!(%errors, "Forecast write failed validation");
            WeatherError::Validation(errors)
        })?;

        let record = ForecastRecord {
            city: valid.city,
            date: valid.date,
            min_temperature: valid.min_temperature,
            max_temperature: valid.max_temperature,
        };
        let temps = ForecastTemperatures::from(&record);
        let (city, date) = (record.city.clone(), record.date);
        let outcome = self.with_store(move |store| store.upsert(&record)).await?;

        tracing::info!(%city, %date, action = outcome.as_str(), "Forecast saved");

        Ok(temps)
    }
}
