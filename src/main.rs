//! Climate Analysis API - HTTP server
//!
//! Serves precipitation, station and temperature queries over the
//! climate dataset:
//! 1. Loads configuration (climate_api.toml, DATABASE_URL)
//! 2. Opens the data source and checks the measurement/station tables
//! 3. Serves the HTTP API until the process is stopped
//!
//! Usage:
//!   cargo run --release                                 # Serve on 127.0.0.1:5000
//!   cargo run --release -- --port 8080                  # Override the port
//!   cargo run --release -- --config other.toml          # Use another config file
//!   cargo run --release -- --database data/hawaii.sqlite
//!
//! Environment:
//!   DATABASE_URL - SQLite path or PostgreSQL connection string
//!   RUST_LOG     - log filter (default: info)

use climate_api::config;
use climate_api::db;
use climate_api::endpoint;
use climate_api::store::REQUIRED_TABLES;
use log::{error, info};
use std::env;
use std::path::PathBuf;

fn usage(program: &str) -> String {
    format!("Usage: {} [--port PORT] [--config PATH] [--database LOCATION]", program)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port: Option<u16> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut database: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--port", Some(v)) => match v.parse() {
                Ok(p) => port = Some(p),
                Err(_) => {
                    error!("Invalid port '{}'", v);
                    std::process::exit(1);
                }
            },
            ("--config", Some(v)) => config_path = Some(PathBuf::from(v)),
            ("--database", Some(v)) => database = Some(v.clone()),
            (flag @ ("--port" | "--config" | "--database"), None) => {
                error!("{} requires a value", flag);
                std::process::exit(1);
            }
            (other, _) => {
                error!("Unknown argument: {}", other);
                error!("{}", usage(&args[0]));
                std::process::exit(1);
            }
        }
        i += 2;
    }

    let mut config = match config::load_service_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(database) = database {
        config.database = database;
    }

    info!("Climate Analysis API");
    info!(
        "Most active station: {}, lookback window: {} days",
        config.most_active_station, config.lookback_days
    );

    // Open the data source and introspect its schema
    let store = match db::connect_and_verify(&config.database, REQUIRED_TABLES) {
        Ok(store) => store,
        Err(e) => {
            error!("Database initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = endpoint::start_endpoint_server(&config, store) {
        error!("Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
