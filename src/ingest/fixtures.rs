//! Test fixtures: representative JSON payloads from the Open-Meteo
//! forecast API.
//!
//! These are structurally complete but trimmed to what the parser needs.
//! Real response shape:
//!   latitude, longitude, utc_offset_seconds, timezone
//!   daily_units { ... }
//!   daily
//!     .time[]                — local calendar dates "YYYY-MM-DD"
//!     .<variable>[]          — one value per date, `null` when unknown
//!     .sunrise[] / .sunset[] — local "YYYY-MM-DDTHH:MM", no offset
//!   hourly (only when requested)
//!     .time[]                — local "YYYY-MM-DDTHH:MM"
//!     .<variable>[]
//!
//! Note: any variable array may be missing or shorter than `time`, and
//! individual entries may be `null`. Parsers must treat both as "no value".

/// Alger, 4 days. Gusts [60, 80, 105, 40] km/h, wind 30 km/h, no rain:
/// expected day alerts are [none, orange, red, none].
pub(crate) fn fixture_alger_daily_json() -> &'static str {
    r#"{
      "latitude": 36.75,
      "longitude": 3.0625,
      "generationtime_ms": 0.12,
      "utc_offset_seconds": 3600,
      "timezone": "Africa/Algiers",
      "timezone_abbreviation": "CET",
      "elevation": 23.0,
      "daily_units": {
        "time": "iso8601",
        "temperature_2m_max": "°C",
        "temperature_2m_min": "°C",
        "wind_speed_10m_max": "km/h",
        "wind_gusts_10m_max": "km/h",
        "precipitation_sum": "mm",
        "sunrise": "iso8601",
        "sunset": "iso8601"
      },
      "daily": {
        "time": ["2024-12-01", "2024-12-02", "2024-12-03", "2024-12-04"],
        "temperature_2m_max": [17.4, 16.8, 15.2, 18.0],
        "temperature_2m_min": [9.1, 10.3, 8.7, 7.9],
        "wind_speed_10m_max": [30.0, 30.0, 30.0, 30.0],
        "wind_gusts_10m_max": [60.0, 80.0, 105.0, 40.0],
        "precipitation_sum": [0.0, 0.0, 0.0, 0.0],
        "sunrise": ["2024-12-01T07:39", "2024-12-02T07:40", "2024-12-03T07:41", "2024-12-04T07:42"],
        "sunset": ["2024-12-01T17:27", "2024-12-02T17:27", "2024-12-03T17:27", "2024-12-04T17:27"]
      }
    }"#
}

/// Same daily block as the Alger fixture plus six hourly samples spanning
/// two dates, one of them with a `null` humidity.
pub(crate) fn fixture_alger_with_hourly_json() -> &'static str {
    r#"{
      "latitude": 36.75,
      "longitude": 3.0625,
      "utc_offset_seconds": 3600,
      "timezone": "Africa/Algiers",
      "daily": {
        "time": ["2024-12-01", "2024-12-02", "2024-12-03", "2024-12-04"],
        "temperature_2m_max": [17.4, 16.8, 15.2, 18.0],
        "temperature_2m_min": [9.1, 10.3, 8.7, 7.9],
        "wind_speed_10m_max": [30.0, 30.0, 30.0, 30.0],
        "wind_gusts_10m_max": [60.0, 80.0, 105.0, 40.0],
        "precipitation_sum": [0.0, 0.0, 0.0, 0.0],
        "sunrise": ["2024-12-01T07:39", "2024-12-02T07:40", "2024-12-03T07:41", "2024-12-04T07:42"],
        "sunset": ["2024-12-01T17:27", "2024-12-02T17:27", "2024-12-03T17:27", "2024-12-04T17:27"]
      },
      "hourly_units": {
        "time": "iso8601",
        "relative_humidity_2m": "%",
        "surface_pressure": "hPa"
      },
      "hourly": {
        "time": [
          "2024-12-01T00:00", "2024-12-01T01:00", "2024-12-01T02:00",
          "2024-12-02T00:00", "2024-12-02T01:00", "2024-12-02T02:00"
        ],
        "relative_humidity_2m": [81.0, 79.0, null, 70.0, 72.0, 74.0],
        "surface_pressure": [1012.3, 1012.7, 1013.1, 1008.0, 1007.0, 1006.0]
      }
    }"#
}

/// Degraded payload: `null` gust and sunrise on day 0, a short wind array,
/// and no `precipitation_sum` array at all.
pub(crate) fn fixture_sparse_daily_json() -> &'static str {
    r#"{
      "utc_offset_seconds": 3600,
      "timezone": "Africa/Algiers",
      "daily": {
        "time": ["2024-12-01", "2024-12-02", "2024-12-03", "2024-12-04"],
        "wind_speed_10m_max": [22.0, 18.5],
        "wind_gusts_10m_max": [null, 41.0, 39.0, 35.0],
        "sunrise": [null, "2024-12-02T07:40", "2024-12-03T07:41", "2024-12-04T07:42"]
      }
    }"#
}

/// Seven days returned although only four are used.
pub(crate) fn fixture_seven_day_json() -> &'static str {
    r#"{
      "timezone": "Africa/Algiers",
      "daily": {
        "time": ["2024-12-01", "2024-12-02", "2024-12-03", "2024-12-04",
                 "2024-12-05", "2024-12-06", "2024-12-07"],
        "wind_gusts_10m_max": [10.0, 20.0, 30.0, 40.0, 120.0, 130.0, 140.0]
      }
    }"#
}

/// A response missing the `daily` block entirely.
pub(crate) fn fixture_no_daily_json() -> &'static str {
    r#"{
      "latitude": 36.75,
      "longitude": 3.0625,
      "timezone": "Africa/Algiers"
    }"#
}

/// Error body returned with HTTP 400 for invalid parameters.
pub(crate) fn fixture_api_error_json() -> &'static str {
    r#"{"error": true, "reason": "Latitude must be in range of -90 to 90°. Given: 123.0."}"#
}
