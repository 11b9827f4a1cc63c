/// SQLite backend over the pre-populated data file.
///
/// Sessions are opened read-only; the service never writes to the dataset.

use super::{ClimateStore, StoreError};
use crate::model::{DateRange, PrecipitationReading, TemperatureStats};
use rusqlite::{params, Connection, OpenFlags};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Binds the store to a data file. The file must already exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.is_file() {
            return Err(StoreError::MissingDataFile(path));
        }
        Ok(Self { path })
    }

    /// One read-only connection, closed when dropped.
    fn session(&self) -> Result<Connection, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }
}

impl ClimateStore for SqliteStore {
    fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.session()?;
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn precipitation_since(&self, since: &str) -> Result<Vec<PrecipitationReading>, StoreError> {
        let conn = self.session()?;
        let mut stmt = conn.prepare("SELECT date, prcp FROM measurement WHERE date >= ?1")?;
        let readings = stmt
            .query_map(params![since], |row| {
                Ok(PrecipitationReading {
                    date: row.get(0)?,
                    precipitation: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(readings)
    }

    fn station_ids(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.session()?;
        let mut stmt = conn.prepare("SELECT station FROM station")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn tobs_for_station_since(
        &self,
        station: &str,
        since: &str,
    ) -> Result<Vec<Option<f64>>, StoreError> {
        let conn = self.session()?;
        let mut stmt =
            conn.prepare("SELECT tobs FROM measurement WHERE station = ?1 AND date >= ?2")?;
        let temps = stmt
            .query_map(params![station, since], |row| row.get(0))?
            .collect::<Result<Vec<Option<f64>>, _>>()?;
        Ok(temps)
    }

    fn temperature_stats(&self, range: &DateRange) -> Result<TemperatureStats, StoreError> {
        let conn = self.session()?;
        let stats = match &range.end {
            None => conn.query_row(
                "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement WHERE date >= ?1",
                params![range.start],
                stats_from_row,
            )?,
            Some(end) => conn.query_row(
                "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement
                 WHERE date >= ?1 AND date <= ?2",
                params![range.start, end],
                stats_from_row,
            )?,
        };
        Ok(stats)
    }
}

fn stats_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TemperatureStats> {
    Ok(TemperatureStats {
        min: row.get(0)?,
        avg: row.get(1)?,
        max: row.get(2)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
