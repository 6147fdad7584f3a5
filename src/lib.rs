/// dzmeteo_service: Algerian weather vigilance service.
///
/// # Module structure
///
/// ```text
/// dzmeteo_service
/// ├── model       — shared data types (City, DailyObservation, DayAlert, FetchFailure, …)
/// ├── config      — TOML service configuration loader (dzmeteo.toml + .env)
/// ├── cities      — built-in city registry grouped by region, TOML override
/// ├── runner      — bounded-concurrency task runner (order-preserving)
/// ├── refresh     — last-triggered-wins publication of refresh results
/// ├── daemon      — long-lived state and periodic national refresh loop
/// ├── endpoint    — JSON HTTP API over the daemon state
/// ├── ingest
/// │   ├── open_meteo — Open-Meteo forecast API: URL construction + JSON parsing
/// │   └── fixtures (test only) — representative API response payloads
/// ├── alert
/// │   └── thresholds — orange/red vigilance classification of a forecast day
/// └── analysis
///     ├── national   — per-city worst day + national red/orange/ok partition
///     └── detail     — single-city daily alerts + hourly means
/// ```

/// Public modules
pub mod alert;
pub mod analysis;
pub mod cities;
pub mod config;
pub mod daemon;
pub mod endpoint;
pub mod ingest;
pub mod model;
pub mod refresh;
pub mod runner;
