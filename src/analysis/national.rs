//! National alert aggregation.
//!
//! Fetches every registered city's daily series through the bounded
//! runner, reduces each city to its single worst day, and partitions the
//! result into red / orange / ok buckets.
//!
//! Reduction rule: keep the first alert found; replace it only when a
//! later day is red and the kept one is not. Red therefore dominates
//! regardless of day order, while among non-red alerts the earliest day
//! wins. Magnitudes are never compared, so with several red days the
//! first red is kept.
//!
//! A city whose fetch fails is left out of `summaries` and listed in
//! `failures` instead; the aggregation itself always succeeds.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::alert::AlertClassifier;
use crate::ingest::{FieldSet, ForecastSource};
use crate::model::{AlertLevel, City, CityAlertSummary, DayAlert, FetchFailure};
use crate::runner::{run_bounded, TaskFailure};

/// Default cap on simultaneous forecast requests.
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Failure message for cities left unfetched by `aggregate_while`.
pub const SKIPPED_MESSAGE: &str = "skipped: refresh superseded";

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Picks the worst day of a series: `(day_index, date, alert)`.
pub fn worst_day_alert<'a, I>(days: I) -> Option<(usize, NaiveDate, &'a DayAlert)>
where
    I: IntoIterator<Item = (NaiveDate, Option<&'a DayAlert>)>,
{
    let mut kept: Option<(usize, NaiveDate, &DayAlert)> = None;

    for (index, (date, alert)) in days.into_iter().enumerate() {
        let Some(alert) = alert else { continue };
        match kept {
            None => kept = Some((index, date, alert)),
            Some((_, _, current))
                if alert.level == AlertLevel::Red && current.level != AlertLevel::Red =>
            {
                kept = Some((index, date, alert));
            }
            Some(_) => {}
        }
    }

    kept
}

/// Builds a city's summary from its dated per-day alerts.
pub fn summarize_city(city: City, days: &[(NaiveDate, Option<DayAlert>)]) -> CityAlertSummary {
    match worst_day_alert(days.iter().map(|(date, alert)| (*date, alert.as_ref()))) {
        Some((index, date, alert)) => CityAlertSummary {
            city,
            worst_day: Some(date),
            worst_day_index: Some(index),
            level: alert.level,
            label: Some(alert.label.clone()),
            reason: Some(alert.reason.clone()),
        },
        None => CityAlertSummary::clear(city),
    }
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Summaries split by level, each bucket in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertPartition {
    pub red: Vec<CityAlertSummary>,
    pub orange: Vec<CityAlertSummary>,
    pub ok: Vec<CityAlertSummary>,
}

impl AlertPartition {
    pub fn total(&self) -> usize {
        self.red.len() + self.orange.len() + self.ok.len()
    }

    /// Highest level present anywhere in the country.
    pub fn national_level(&self) -> AlertLevel {
        if !self.red.is_empty() {
            AlertLevel::Red
        } else if !self.orange.is_empty() {
            AlertLevel::Orange
        } else {
            AlertLevel::None
        }
    }
}

/// Splits summaries into red / orange / ok buckets, preserving order.
pub fn partition(summaries: &[CityAlertSummary]) -> AlertPartition {
    let mut buckets = AlertPartition::default();
    for summary in summaries {
        let bucket = match summary.level {
            AlertLevel::Red => &mut buckets.red,
            AlertLevel::Orange => &mut buckets.orange,
            AlertLevel::None => &mut buckets.ok,
        };
        bucket.push(summary.clone());
    }
    buckets
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Result of one national refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalReport {
    pub generated_at: DateTime<Utc>,
    /// One entry per successfully fetched city, in registry order.
    pub summaries: Vec<CityAlertSummary>,
    /// Cities whose forecast could not be fetched, in registry order.
    pub failures: Vec<FetchFailure>,
}

impl NationalReport {
    pub fn partition(&self) -> AlertPartition {
        partition(&self.summaries)
    }
}

/// Fetches, classifies, and reduces forecasts for a set of cities.
#[derive(Clone)]
pub struct NationalAggregator {
    source: Arc<dyn ForecastSource>,
    classifier: AlertClassifier,
    concurrency: usize,
}

impl NationalAggregator {
    pub fn new(source: Arc<dyn ForecastSource>, classifier: AlertClassifier) -> Self {
        Self {
            source,
            classifier,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs one national refresh over `cities`.
    pub fn aggregate(&self, cities: &[City]) -> NationalReport {
        self.aggregate_while(cities, || true)
    }

    /// Like `aggregate`, but checks `keep_going` before each fetch. Cities
    /// reached after it turns false are not fetched and are reported as
    /// failures with `SKIPPED_MESSAGE`.
    pub fn aggregate_while<G>(&self, cities: &[City], keep_going: G) -> NationalReport
    where
        G: Fn() -> bool + Send + Sync + 'static,
    {
        let source = Arc::clone(&self.source);
        let classifier = self.classifier;

        let slots = run_bounded(cities.to_vec(), self.concurrency, move |city: &City| -> Result<CityAlertSummary, FetchFailure> {
            if !keep_going() {
                return Err(FetchFailure::new(&city.name, SKIPPED_MESSAGE));
            }
            let forecast = source.fetch(city, FieldSet::Daily)?;
            let days: Vec<(NaiveDate, Option<DayAlert>)> = forecast
                .daily
                .iter()
                .map(|day| (day.date, classifier.classify_observation(day)))
                .collect();
            Ok(summarize_city(city.clone(), &days))
        });

        let mut summaries = Vec::with_capacity(cities.len());
        let mut failures = Vec::new();
        for (city, slot) in cities.iter().zip(slots) {
            match slot {
                Ok(summary) => summaries.push(summary),
                Err(TaskFailure::Failed(failure)) if failure.message == SKIPPED_MESSAGE => {
                    tracing::debug!(city = %city.name, "fetch skipped");
                    failures.push(failure);
                }
                Err(TaskFailure::Failed(failure)) => {
                    tracing::warn!(city = %city.name, error = %failure.message, "forecast unavailable");
                    failures.push(failure);
                }
                Err(TaskFailure::Panicked(message)) => {
                    tracing::error!(city = %city.name, %message, "forecast task panicked");
                    failures.push(FetchFailure::new(&city.name, format!("task panicked: {}", message)));
                }
            }
        }

        let report = NationalReport {
            generated_at: Utc::now(),
            summaries,
            failures,
        };
        let buckets = report.partition();
        tracing::info!(
            red = buckets.red.len(),
            orange = buckets.orange.len(),
            ok = buckets.ok.len(),
            failed = report.failures.len(),
            "national refresh complete"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
