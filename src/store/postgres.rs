/// PostgreSQL backend for deployments that host the dataset in a database
/// server instead of the SQLite file.
///
/// Expects the tables from `sql/001_climate_schema.sql` in the connection's
/// default schema. `prcp` and `tobs` are NUMERIC and read as `Decimal`.

use super::{ClimateStore, StoreError};
use crate::model::{DateRange, PrecipitationReading, TemperatureStats};
use postgres::{Client, NoTls};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    url: String,
}

impl PostgresStore {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// A dedicated client, disconnected when dropped. `postgres::Client`
    /// needs `&mut self` for every query, so it cannot serve two requests.
    fn session(&self) -> Result<Client, StoreError> {
        Ok(Client::connect(&self.url, NoTls)?)
    }
}

fn to_f64(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_f64())
}

fn reading_from_columns(date: String, prcp: Option<Decimal>) -> PrecipitationReading {
    PrecipitationReading {
        date,
        precipitation: to_f64(prcp),
    }
}

/// MIN, AVG, MAX columns; all NULL when no rows matched.
fn stats_from_columns(
    min: Option<Decimal>,
    avg: Option<Decimal>,
    max: Option<Decimal>,
) -> TemperatureStats {
    TemperatureStats {
        min: to_f64(min),
        avg: to_f64(avg),
        max: to_f64(max),
    }
}

impl ClimateStore for PostgresStore {
    fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let mut client = self.session()?;
        let rows = client.query(
            "SELECT table_name::text FROM information_schema.tables
             WHERE table_schema = current_schema()
             ORDER BY table_name",
            &[],
        )?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn precipitation_since(&self, since: &str) -> Result<Vec<PrecipitationReading>, StoreError> {
        let mut client = self.session()?;
        let rows = client.query(
            "SELECT date, prcp FROM measurement WHERE date >= $1",
            &[&since],
        )?;

        Ok(rows
            .iter()
            .map(|row| reading_from_columns(row.get(0), row.get(1)))
            .collect())
    }

    fn station_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut client = self.session()?;
        let rows = client.query("SELECT station FROM station", &[])?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn tobs_for_station_since(
        &self,
        station: &str,
        since: &str,
    ) -> Result<Vec<Option<f64>>, StoreError> {
        let mut client = self.session()?;
        let rows = client.query(
            "SELECT tobs FROM measurement WHERE station = $1 AND date >= $2",
            &[&station, &since],
        )?;
        Ok(rows.iter().map(|row| to_f64(row.get(0))).collect())
    }

    fn temperature_stats(&self, range: &DateRange) -> Result<TemperatureStats, StoreError> {
        let mut client = self.session()?;
        let row = match &range.end {
            None => client.query_one(
                "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement WHERE date >= $1",
                &[&range.start],
            )?,
            Some(end) => client.query_one(
                "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement
                 WHERE date >= $1 AND date <= $2",
                &[&range.start, end],
            )?,
        };

        Ok(stats_from_columns(row.get(0), row.get(1), row.get(2)))
    }
}
