//! SQLite-backed forecast storage.
//!
//! One row per (city, date); writes go through [`ForecastRepository::upsert`].

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params, types::Type};
use std::path::Path;
use thiserror::Error;

use crate::model::{ForecastRecord, UpsertOutcome};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid forecast record: {0}")]
    InvalidRecord(String),

    #[error("Storage task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for forecast records.
pub trait ForecastRepository: Send + Sync {
    fn find_by_city_and_date(&self, city: &str, date: NaiveDate) -> StoreResult<Option<ForecastRecord>>;

    /// Insert or overwrite the record keyed on (city, date). Atomic with
    /// respect to concurrent writers.
    fn upsert(&self, record: &ForecastRecord) -> StoreResult<UpsertOutcome>;

    fn count(&self) -> StoreResult<usize>;
}

pub struct SqliteForecastStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteForecastStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteForecastStore").finish_non_exhaustive()
    }
}

impl SqliteForecastStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_forecasts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                date TEXT NOT NULL,
                min_temperature REAL NOT NULL,
                max_temperature REAL NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_weather_forecasts_city_date
                ON weather_forecasts(city, date);
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ForecastRecord> {
        let city: String = row.get(0)?;
        let date_str: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        Ok(ForecastRecord {
            city,
            date,
            min_temperature: row.get(2)?,
            max_temperature: row.get(3)?,
        })
    }
}

impl ForecastRepository for SqliteForecastStore {
    fn find_by_city_and_date(&self, city: &str, date: NaiveDate) -> StoreResult<Option<ForecastRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT city, date, min_temperature, max_temperature
                 FROM weather_forecasts
                 WHERE city = ?1 AND date = ?2",
                params![city, date.format(DATE_FORMAT).to_string()],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn upsert(&self, record: &ForecastRecord) -> StoreResult<UpsertOutcome> {
        if record.min_temperature > record.max_temperature {
            return Err(StoreError::InvalidRecord(format!(
                "min_temperature {} is greater than max_temperature {}",
                record.min_temperature, record.max_temperature
            )));
        }

        let date = record.date.format(DATE_FORMAT).to_string();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM weather_forecasts WHERE city = ?1 AND date = ?2)",
            params![record.city, date],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO weather_forecasts (city, date, min_temperature, max_temperature)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(city, date) DO UPDATE SET
                min_temperature = excluded.min_temperature,
                max_temperature = excluded.max_temperature",
            params![record.city, date, record.min_temperature, record.max_temperature],
        )?;
        tx.commit()?;

        Ok(if exists { UpsertOutcome::Updated } else { UpsertOutcome::Created })
    }

    fn count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM weather_forecasts", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
