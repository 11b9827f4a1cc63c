/// Read-only data access over the climate dataset.
///
/// `ClimateStore` is the seam between the HTTP handlers and the database.
/// Implementations hold only the location of the data source; every call
/// opens its own session, runs one query and drops the session before
/// returning, so no connection state is ever shared between requests.
///
/// Backends:
/// - `sqlite`   — the `hawaii.sqlite` data file (default)
/// - `postgres` — the same two tables hosted in PostgreSQL

pub mod postgres;
pub mod sqlite;

use crate::model::{DateRange, PrecipitationReading, TemperatureStats};
use std::path::PathBuf;

pub use self::postgres::PostgresStore;
pub use self::sqlite::SqliteStore;

/// Tables every backend must expose.
pub const REQUIRED_TABLES: &[&str] = &["measurement", "station"];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("data file {0} does not exist")]
    MissingDataFile(PathBuf),

    #[error("SQLite query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("PostgreSQL query failed: {0}")]
    Postgres(#[from] ::postgres::Error),
}

/// Queries behind the API routes.
///
/// Dates are `YYYY-MM-DD` strings compared lexically against the stored
/// text, so callers must pass zero-padded dates.
pub trait ClimateStore: Send + Sync {
    /// Names of the tables in the data source, for startup introspection.
    fn table_names(&self) -> Result<Vec<String>, StoreError>;

    /// `(date, prcp)` for every measurement on or after `since`, all
    /// stations, in the database's natural order.
    fn precipitation_since(&self, since: &str) -> Result<Vec<PrecipitationReading>, StoreError>;

    /// Every station identifier, in the database's natural order.
    fn station_ids(&self) -> Result<Vec<String>, StoreError>;

    /// `tobs` for one station on or after `since`.
    fn tobs_for_station_since(
        &self,
        station: &str,
        since: &str,
    ) -> Result<Vec<Option<f64>>, StoreError>;

    /// MIN, AVG and MAX of `tobs` across all stations within `range`.
    fn temperature_stats(&self, range: &DateRange) -> Result<TemperatureStats, StoreError>;
}
