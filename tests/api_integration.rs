/// End-to-end tests for the HTTP API
///
/// Each test writes a small SQLite data file shaped like hawaii.sqlite,
/// starts the real endpoint server on an ephemeral port and queries it
/// over HTTP.
///
/// Run with: cargo test --test api_integration

use chrono::{Duration, Local, NaiveDate};
use climate_api::config::{ServiceConfig, MOST_ACTIVE_STATION};
use climate_api::db;
use climate_api::endpoint::{ApiContext, EndpointServer};
use climate_api::model::{Measurement, Station};
use climate_api::store::REQUIRED_TABLES;
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn station(id: &str, name: &str) -> Station {
    Station {
        station: id.to_string(),
        name: name.to_string(),
        latitude: 21.2716,
        longitude: -157.8168,
        elevation: 3.0,
    }
}

fn measurement(station: &str, date: &str, prcp: Option<f64>, tobs: f64) -> Measurement {
    Measurement {
        station: station.to_string(),
        date: date.to_string(),
        prcp,
        tobs: Some(tobs),
    }
}

fn days_ago(days: i64) -> String {
    (Local::now().date_naive() - Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn write_dataset(path: &Path, stations: &[Station], measurements: &[Measurement]) {
    let conn = Connection::open(path).expect("Failed to create data file");
    conn.execute_batch(
        "CREATE TABLE station (id INTEGER PRIMARY KEY, station TEXT, name TEXT,
                               latitude FLOAT, longitude FLOAT, elevation FLOAT);
         CREATE TABLE measurement (id INTEGER PRIMARY KEY, station TEXT, date TEXT,
                                   prcp FLOAT, tobs FLOAT);",
    )
    .expect("Failed to create tables");

    for s in stations {
        conn.execute(
            "INSERT INTO station (station, name, latitude, longitude, elevation)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![s.station, s.name, s.latitude, s.longitude, s.elevation],
        )
        .expect("Failed to insert station");
    }
    for m in measurements {
        conn.execute(
            "INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)",
            params![m.station, m.date, m.prcp, m.tobs],
        )
        .expect("Failed to insert measurement");
    }
}

/// Running server plus the temp dir that owns its data file.
struct TestServer {
    base_url: String,
    _dir: TempDir,
}

impl TestServer {
    fn start(stations: &[Station], measurements: &[Measurement]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("hawaii.sqlite");
        write_dataset(&path, stations, measurements);

        let config = ServiceConfig {
            database: path.to_string_lossy().into_owned(),
            worker_threads: 2,
            ..ServiceConfig::default()
        };
        let store = db::connect_and_verify(&config.database, REQUIRED_TABLES)
            .expect("Data file should pass table validation");

        let server = EndpointServer::bind("127.0.0.1:0", ApiContext::new(store, &config), config.worker_threads)
            .expect("Failed to bind test server");
        let addr = server.local_addr().expect("Server should listen on TCP");
        std::thread::spawn(move || server.run());

        TestServer {
            base_url: format!("http://{}", addr),
            _dir: dir,
        }
    }

    fn get(&self, path: &str) -> reqwest::blocking::Response {
        reqwest::blocking::get(format!("{}{}", self.base_url, path)).expect("Request failed")
    }

    fn get_json(&self, path: &str) -> (u16, Value) {
        let response = self.get(path);
        let status = response.status().as_u16();
        let body = response.json().expect("Response should be JSON");
        (status, body)
    }
}

fn hawaii_fixture() -> TestServer {
    TestServer::start(
        &[
            station("USC00519397", "WAIKIKI 717.2, HI US"),
            station("USC00513117", "KANEOHE 838.1, HI US"),
        ],
        &[
            measurement(MOST_ACTIVE_STATION, &days_ago(900), Some(2.0), 60.0),
            measurement(MOST_ACTIVE_STATION, &days_ago(20), Some(0.1), 72.0),
            measurement("USC00513117", &days_ago(20), Some(0.7), 77.0),
            measurement(MOST_ACTIVE_STATION, &days_ago(10), None, 75.0),
            measurement(MOST_ACTIVE_STATION, "2017-01-01", Some(0.0), 70.0),
            measurement(MOST_ACTIVE_STATION, "2017-01-02", Some(0.0), 80.0),
        ],
    )
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

#[test]
fn test_welcome_page_lists_routes() {
    let server = hawaii_fixture();
    let response = server.get("/");

    assert_eq!(response.status().as_u16(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));

    let body = response.text().unwrap();
    assert!(body.contains("/api/v1.0/precipitation"));
    assert!(body.contains("/api/v1.0/temp/start/end"));
}

#[test]
fn test_stations_returned_in_stored_order() {
    let server = hawaii_fixture();
    let (status, body) = server.get_json("/api/v1.0/stations");

    assert_eq!(status, 200);
    assert_eq!(body, json!(["USC00519397", "USC00513117"]));
}

#[test]
fn test_precipitation_covers_lookback_window() {
    let server = hawaii_fixture();
    let (status, body) = server.get_json("/api/v1.0/precipitation");
    assert_eq!(status, 200);

    let series = body.as_object().expect("precipitation should be a JSON object");
    let window_start = days_ago(730);
    let today = Local::now().date_naive();

    assert_eq!(series.len(), 2, "one entry per date inside the window");
    for key in series.keys() {
        let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").expect("key should be YYYY-MM-DD");
        assert!(key.as_str() >= window_start.as_str(), "{} is before the window", key);
        assert!(date <= today);
    }

    // Two stations reported this date; the later row wins
    assert_eq!(series[&days_ago(20)], json!(0.7));
    assert_eq!(series[&days_ago(10)], Value::Null);
}

#[test]
fn test_tobs_for_most_active_station_only() {
    let server = hawaii_fixture();
    let (status, body) = server.get_json("/api/v1.0/tobs");

    assert_eq!(status, 200);
    assert_eq!(body, json!([72.0, 75.0]));
}

#[test]
fn test_temperature_stats_closed_range() {
    let server = hawaii_fixture();
    let (status, body) = server.get_json("/api/v1.0/temp/2017-01-01/2017-01-02");

    assert_eq!(status, 200);
    assert_eq!(body, json!([70.0, 75.0, 80.0]));
}

#[test]
fn test_temperature_stats_open_range_is_superset_of_closed_range() {
    let server = hawaii_fixture();
    let (_, closed) = server.get_json("/api/v1.0/temp/2017-01-01/2017-01-02");
    let (_, open) = server.get_json("/api/v1.0/temp/2017-01-01");

    let closed: Vec<f64> = closed.as_array().unwrap().iter().map(|v| v.as_f64().unwrap()).collect();
    let open: Vec<f64> = open.as_array().unwrap().iter().map(|v| v.as_f64().unwrap()).collect();

    assert_eq!(open.len(), 3);
    assert!(open[0] <= open[2], "min must not exceed max");
    assert!(open[0] <= closed[0], "wider range cannot raise the minimum");
    assert!(open[2] >= closed[2], "wider range cannot lower the maximum");
}

#[test]
fn test_temperature_stats_without_rows() {
    let server = hawaii_fixture();
    let (status, body) = server.get_json("/api/v1.0/temp/2100-01-01");

    assert_eq!(status, 200);
    assert_eq!(body, json!([null, null, null]));
}

#[test]
fn test_invalid_date_is_bad_request() {
    let server = hawaii_fixture();
    let (status, body) = server.get_json("/api/v1.0/temp/not-a-date");

    assert_eq!(status, 400);
    assert_eq!(body["value"], json!("not-a-date"));
}

#[test]
fn test_unknown_route_is_not_found() {
    let server = hawaii_fixture();
    let (status, body) = server.get_json("/api/v1.0/humidity");

    assert_eq!(status, 404);
    assert_eq!(body["error"], json!("Not found"));
}

#[test]
fn test_concurrent_requests_each_get_a_session() {
    let server = hawaii_fixture();
    let base_url = server.base_url.clone();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let url = format!("{}/api/v1.0/stations", base_url);
            std::thread::spawn(move || {
                let response = reqwest::blocking::get(url).expect("Request failed");
                response.json::<Value>().expect("Response should be JSON")
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), json!(["USC00519397", "USC00513117"]));
    }
}

// ---------------------------------------------------------------------------
// Startup validation
// ---------------------------------------------------------------------------

#[test]
fn test_startup_rejects_dataset_without_station_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("measurements_only.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE measurement (station TEXT, date TEXT, prcp FLOAT, tobs FLOAT);")
        .unwrap();
    drop(conn);

    let result = db::connect_and_verify(path.to_str().unwrap(), REQUIRED_TABLES);
    let message = match result {
        Err(e) => e.to_string(),
        Ok(_) => panic!("validation should fail without a station table"),
    };
    assert!(message.contains("'station'"), "error should name the missing table: {}", message);
}
