/// climate_api: read-only HTTP API over the Hawaii climate dataset.
///
/// # Module structure
///
/// ```text
/// climate_api
/// ├── model     — row types and JSON response shapes (TemperatureStats, PrecipitationSeries, …)
/// ├── dates     — YYYY-MM-DD validation and the lookback window
/// ├── config    — service configuration (climate_api.toml, DATABASE_URL)
/// ├── store     — ClimateStore data access trait
/// │   ├── sqlite   — read-only sessions on the hawaii.sqlite data file
/// │   └── postgres — the same tables hosted in PostgreSQL
/// ├── db        — data source selection and startup table validation
/// └── endpoint  — routes, handlers and the tiny_http server
/// ```

/// Public modules
pub mod config;
pub mod dates;
pub mod db;
pub mod endpoint;
pub mod model;
pub mod store;
