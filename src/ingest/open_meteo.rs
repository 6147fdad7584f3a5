//! Open-Meteo forecast API client.
//!
//! Handles URL construction, JSON response parsing, and the blocking
//! HTTP client for:
//!   https://api.open-meteo.com/v1/forecast
//!
//! The API returns each variable as a parallel array indexed by day (or
//! hour) offset, with `null` where it has no value. See `fixtures.rs` for
//! annotated examples of the response shape.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::time::Duration;

use crate::config::{ApiConfig, ConfigError};
use crate::ingest::{FieldSet, ForecastSource};
use crate::model::{
    City, CityForecast, DailyObservation, FetchFailure, HourlyObservation, FORECAST_DAYS,
};

/// Daily variables requested for every city.
pub const DAILY_VARIABLES: &[&str] = &[
    "temperature_2m_max",
    "temperature_2m_min",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
    "precipitation_sum",
    "sunrise",
    "sunset",
];

/// Hourly variables requested for the detail view.
pub const HOURLY_VARIABLES: &[&str] = &["relative_humidity_2m", "surface_pressure"];

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

// ---------------------------------------------------------------------------
// Serde structures for the forecast JSON
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ForecastResponse {
    timezone: Option<String>,
    utc_offset_seconds: Option<i32>,
    daily: Option<DailyBlock>,
    hourly: Option<HourlyBlock>,
}

#[derive(Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    wind_gusts_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    sunrise: Vec<Option<String>>,
    #[serde(default)]
    sunset: Vec<Option<String>>,
}

#[derive(Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    surface_pressure: Vec<Option<f64>>,
}

/// Error body returned with 4xx statuses, e.g.
/// `{"error": true, "reason": "Latitude must be in range of -90 to 90°."}`
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds a forecast URL for one city with a fixed 4-day horizon and the
/// time zone resolved from the coordinates (`timezone=auto`).
///
/// # Example
/// ```
/// use dzmeteo_service::ingest::open_meteo::build_forecast_url;
/// use dzmeteo_service::ingest::FieldSet;
/// use dzmeteo_service::model::City;
///
/// let alger = City::new("Alger", 36.7538, 3.0588, "Littoral");
/// let url = build_forecast_url("https://api.open-meteo.com/v1/forecast", &alger, FieldSet::Daily);
/// assert!(url.contains("latitude=36.7538"));
/// assert!(url.contains("forecast_days=4"));
/// ```
pub fn build_forecast_url(base_url: &str, city: &City, fields: FieldSet) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    let mut url = format!(
        "{}{}latitude={}&longitude={}&timezone=auto&forecast_days={}&daily={}",
        base_url,
        separator,
        city.lat,
        city.lon,
        FORECAST_DAYS,
        DAILY_VARIABLES.join(",")
    );
    if fields.includes_hourly() {
        url.push_str("&hourly=");
        url.push_str(&HOURLY_VARIABLES.join(","));
    }
    url
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a forecast response body for `city`.
///
/// Parallel arrays are zipped by index against `daily.time`; a missing
/// array or a `null` entry becomes `None`. The daily series is truncated
/// to the 4-day horizon. The `hourly` block is optional.
///
/// # Errors
/// Malformed JSON, a missing `daily` block, an empty daily series, or an
/// unparsable date/timestamp.
pub fn parse_forecast_response(city: &City, json: &str) -> Result<CityForecast, String> {
    let response: ForecastResponse = serde_json::from_str(json)
        .map_err(|e| format!("JSON deserialization failed: {}", e))?;

    let daily_block = response
        .daily
        .ok_or_else(|| "response has no daily block".to_string())?;

    if daily_block.time.is_empty() {
        return Err("daily series is empty".to_string());
    }

    let mut daily = Vec::with_capacity(FORECAST_DAYS);
    for (i, day) in daily_block.time.iter().take(FORECAST_DAYS).enumerate() {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|e| format!("invalid daily date '{}': {}", day, e))?;

        daily.push(DailyObservation {
            date,
            wind_speed_max: value_at(&daily_block.wind_speed_10m_max, i),
            wind_gust_max: value_at(&daily_block.wind_gusts_10m_max, i),
            precipitation_sum: value_at(&daily_block.precipitation_sum, i),
            temperature_min: value_at(&daily_block.temperature_2m_min, i),
            temperature_max: value_at(&daily_block.temperature_2m_max, i),
            sunrise: local_time_at(&daily_block.sunrise, i),
            sunset: local_time_at(&daily_block.sunset, i),
        });
    }

    let mut hourly = Vec::new();
    if let Some(block) = response.hourly {
        hourly.reserve(block.time.len());
        for (i, stamp) in block.time.iter().enumerate() {
            let time = NaiveDateTime::parse_from_str(stamp, LOCAL_TIME_FORMAT)
                .map_err(|e| format!("invalid hourly timestamp '{}': {}", stamp, e))?;
            hourly.push(HourlyObservation {
                time,
                relative_humidity: value_at(&block.relative_humidity_2m, i),
                surface_pressure: value_at(&block.surface_pressure, i),
            });
        }
    }

    Ok(CityForecast {
        city: city.clone(),
        timezone: response.timezone,
        utc_offset_seconds: response.utc_offset_seconds,
        daily,
        hourly,
    })
}

fn value_at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

fn local_time_at(series: &[Option<String>], index: usize) -> Option<NaiveDateTime> {
    series
        .get(index)
        .and_then(|s| s.as_deref())
        .and_then(|s| NaiveDateTime::parse_from_str(s, LOCAL_TIME_FORMAT).ok())
}

/// Extracts the `reason` from an Open-Meteo error body, if it is one.
pub fn api_error_reason(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .filter(|b| b.error)
        .and_then(|b| b.reason)
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Blocking Open-Meteo client. Cheap to share: the inner reqwest client is
/// reference counted and safe to use from many threads.
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(api: &ApiConfig) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .user_agent(concat!("dzmeteo_service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ForecastSource for OpenMeteoClient {
    fn fetch(&self, city: &City, fields: FieldSet) -> Result<CityForecast, FetchFailure> {
        let url = build_forecast_url(&self.base_url, city, fields);
        tracing::debug!(city = %city.name, %url, "fetching forecast");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FetchFailure::new(&city.name, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            FetchFailure::new(&city.name, format!("failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            let message = match api_error_reason(&body) {
                Some(reason) => format!("HTTP {}: {}", status, reason),
                None => format!("HTTP {}", status),
            };
            return Err(FetchFailure::new(&city.name, message));
        }

        parse_forecast_response(city, &body)
            .map_err(|e| FetchFailure::new(&city.name, format!("invalid forecast payload: {}", e)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
