//! Single-city detail view.
//!
//! Fetches one city's daily and hourly series, attaches the day alert to
//! each forecast day, and averages the hourly humidity/pressure samples
//! per calendar day. Unlike the national path, a fetch failure aborts the
//! whole detail request.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::alert::AlertClassifier;
use crate::ingest::{FieldSet, ForecastSource};
use crate::model::{City, DailyObservation, DayAlert, FetchFailure, HourlyObservation};

/// One forecast day with its alert, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDetail {
    pub observation: DailyObservation,
    pub alert: Option<DayAlert>,
}

/// Per-day means of the hourly series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyMeans {
    pub date: NaiveDate,
    pub relative_humidity_mean: Option<f64>,
    pub surface_pressure_mean: Option<f64>,
    /// Number of hourly rows seen for this date, including rows with nulls.
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityDetail {
    pub city: City,
    pub timezone: Option<String>,
    pub days: Vec<DayDetail>,
    pub hourly_means: Vec<HourlyMeans>,
}

impl CityDetail {
    /// The per-day alert stream, one slot per forecast day.
    pub fn day_alerts(&self) -> Vec<Option<&DayAlert>> {
        self.days.iter().map(|d| d.alert.as_ref()).collect()
    }
}

/// Fetches and classifies a single city for the detail view.
pub fn fetch_city_detail(
    source: &dyn ForecastSource,
    classifier: &AlertClassifier,
    city: &City,
) -> Result<CityDetail, FetchFailure> {
    let forecast = source.fetch(city, FieldSet::DailyAndHourly)?;

    let days = forecast
        .daily
        .into_iter()
        .map(|observation| {
            let alert = classifier.classify_observation(&observation);
            DayDetail { observation, alert }
        })
        .collect();

    Ok(CityDetail {
        city: forecast.city,
        timezone: forecast.timezone,
        days,
        hourly_means: hourly_means(&forecast.hourly),
    })
}

/// Averages hourly samples per local calendar day, ignoring missing
/// values. A day where every sample of a variable is missing yields `None`
/// for that variable.
pub fn hourly_means(hours: &[HourlyObservation]) -> Vec<HourlyMeans> {
    #[derive(Default)]
    struct Acc {
        humidity: (f64, usize),
        pressure: (f64, usize),
        samples: usize,
    }

    let mut by_day: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
    for hour in hours {
        let acc = by_day.entry(hour.time.date()).or_default();
        acc.samples += 1;
        if let Some(h) = hour.relative_humidity {
            acc.humidity.0 += h;
            acc.humidity.1 += 1;
        }
        if let Some(p) = hour.surface_pressure {
            acc.pressure.0 += p;
            acc.pressure.1 += 1;
        }
    }

    by_day
        .into_iter()
        .map(|(date, acc)| HourlyMeans {
            date,
            relative_humidity_mean: mean(acc.humidity),
            surface_pressure_mean: mean(acc.pressure),
            samples: acc.samples,
        })
        .collect()
}

fn mean((sum, count): (f64, usize)) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
