//! Forecast ingestion.
//!
//! Each upstream weather source gets its own file under `ingest/` and
//! implements `ForecastSource`, so the aggregation layer never depends on
//! a concrete HTTP client.

pub mod open_meteo;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::model::{City, CityForecast, FetchFailure};

/// Which forecast series to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSet {
    /// Daily series only. Lightweight; used by national aggregation.
    Daily,
    /// Daily plus the hourly humidity/pressure series; used by the
    /// single-city detail view.
    DailyAndHourly,
}

impl FieldSet {
    pub fn includes_hourly(self) -> bool {
        matches!(self, FieldSet::DailyAndHourly)
    }
}

/// A provider of per-city forecasts.
///
/// Implementations must be shareable across the worker threads of the
/// bounded runner.
pub trait ForecastSource: Send + Sync {
    fn fetch(&self, city: &City, fields: FieldSet) -> Result<CityForecast, FetchFailure>;
}
