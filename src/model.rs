//! Shared data types for the Algerian weather alert service.
//!
//! Everything the ingest layer produces and the alert/analysis layers
//! consume lives here, so that the engine modules only depend on plain
//! data and never on the HTTP client.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Forecast horizon
// ---------------------------------------------------------------------------

/// Number of forecast days requested for every city.
pub const FORECAST_DAYS: usize = 4;

// ---------------------------------------------------------------------------
// Cities
// ---------------------------------------------------------------------------

/// A monitored city. Immutable reference data loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Label of the registry group the city belongs to ("Littoral", "Sud", …).
    pub group: String,
}

impl City {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            group: group.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// One calendar day of forecast values for a city.
///
/// Every numeric field is optional: the upstream API reports `null` for
/// variables it has no value for, and that must stay "no signal" rather
/// than turning into zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub wind_speed_max: Option<f64>,
    pub wind_gust_max: Option<f64>,
    pub precipitation_sum: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

impl DailyObservation {
    /// A day with only a date and no values at all.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            wind_speed_max: None,
            wind_gust_max: None,
            precipitation_sum: None,
            temperature_min: None,
            temperature_max: None,
            sunrise: None,
            sunset: None,
        }
    }
}

/// One hour of the optional hourly series (detail view only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyObservation {
    pub time: NaiveDateTime,
    pub relative_humidity: Option<f64>,
    pub surface_pressure: Option<f64>,
}

/// Parsed forecast for a single city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityForecast {
    pub city: City,
    /// IANA zone resolved by the API from the coordinates (`timezone=auto`).
    pub timezone: Option<String>,
    pub utc_offset_seconds: Option<i32>,
    pub daily: Vec<DailyObservation>,
    /// Empty unless hourly fields were requested.
    pub hourly: Vec<HourlyObservation>,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Alert severity, ordered `None < Orange < Red`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Orange,
    Red,
}

/// Which observed signal crossed a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCause {
    Gust,
    Rain,
    Wind,
}

impl AlertCause {
    pub fn unit(self) -> &'static str {
        match self {
            AlertCause::Gust | AlertCause::Wind => "km/h",
            AlertCause::Rain => "mm",
        }
    }
}

/// An alert for a single day. Only produced when a threshold was crossed,
/// so `level` is never `AlertLevel::None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAlert {
    pub level: AlertLevel,
    pub label: String,
    /// Display string built from the rounded value, e.g. "Rafales 80 km/h".
    pub reason: String,
    pub cause: AlertCause,
    /// Unrounded measurement that triggered the alert.
    pub value: f64,
}

/// Worst alert found across a city's forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityAlertSummary {
    pub city: City,
    pub worst_day: Option<NaiveDate>,
    /// Day offset (0-based) of `worst_day` within the horizon.
    pub worst_day_index: Option<usize>,
    pub level: AlertLevel,
    pub label: Option<String>,
    pub reason: Option<String>,
}

impl CityAlertSummary {
    /// Summary for a city where no day crossed any threshold.
    pub fn clear(city: City) -> Self {
        Self {
            city,
            worst_day: None,
            worst_day_index: None,
            level: AlertLevel::None,
            label: None,
            reason: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Forecast retrieval failed for one city: transport error, non-success
/// HTTP status, or a payload that could not be parsed.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("forecast fetch failed for {city}: {message}")]
pub struct FetchFailure {
    pub city: String,
    pub message: String,
}

impl FetchFailure {
    pub fn new(city: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
