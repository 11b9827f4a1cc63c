/// Shared data types for the climate API.
///
/// Row types mirror the two tables of the climate dataset (`measurement`
/// and `station`); response types define the JSON shapes returned by the
/// HTTP layer.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// One row of the `station` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Station identifier, e.g. "USC00519397".
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// One daily reading from the `measurement` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub station: String,
    /// Stored as `YYYY-MM-DD` text.
    pub date: String,
    /// Precipitation, missing on some days.
    pub prcp: Option<f64>,
    /// Temperature observation.
    pub tobs: Option<f64>,
}

/// `(date, prcp)` projection used by the precipitation route.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecipitationReading {
    pub date: String,
    pub precipitation: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// Precipitation keyed by date.
///
/// Serializes as a JSON object with dates in ascending order. When several
/// stations report the same date, the row returned last by the database wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PrecipitationSeries(BTreeMap<String, Option<f64>>);

impl FromIterator<PrecipitationReading> for PrecipitationSeries {
    fn from_iter<I: IntoIterator<Item = PrecipitationReading>>(readings: I) -> Self {
        let mut series = BTreeMap::new();
        for reading in readings {
            series.insert(reading.date, reading.precipitation);
        }
        PrecipitationSeries(series)
    }
}

/// MIN / AVG / MAX of `tobs` over a date range.
///
/// All three are `None` when no rows match. Serializes as `[min, avg, max]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureStats {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

impl Serialize for TemperatureStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.min, self.avg, self.max).serialize(serializer)
    }
}

/// Validated bounds for a temperature stats query, in canonical `YYYY-MM-DD`
/// form. `end` is inclusive when present; without it the range is open-ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
