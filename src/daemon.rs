//! Core daemon implementation for the weather alert service.
//!
//! This module owns the long-lived state behind the dashboard:
//! 1. The city registry loaded once at startup
//! 2. The national aggregator (forecast source + classifier + concurrency cap)
//! 3. The refresh coordinator holding the latest published national report
//! 4. The optional periodic refresh loop
//!
//! Refreshes can be triggered at any time (endpoint, timer). Each one
//! takes a ticket before fetching, and only the most recently triggered
//! refresh is allowed to publish its report.
//!
//! Only one national aggregation runs at a time, so the configured
//! concurrency is also the cap on simultaneous forecast requests. Manual
//! triggers are handed to a single background worker that always runs
//! the newest pending ticket; triggers arriving while it is busy are
//! coalesced, and an in-flight refresh stops fetching once superseded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::alert::AlertClassifier;
use crate::analysis::detail::{fetch_city_detail, CityDetail};
use crate::analysis::national::{NationalAggregator, NationalReport};
use crate::cities::CityRegistry;
use crate::config::ServiceConfig;
use crate::ingest::ForecastSource;
use crate::model::{City, FetchFailure};
use crate::refresh::{Published, RefreshCoordinator, RefreshTicket};

// ---------------------------------------------------------------------------
// Daemon State
// ---------------------------------------------------------------------------

/// Main daemon state. Cheap to clone; clones share the same coordinator.
#[derive(Clone)]
pub struct Daemon {
    registry: Arc<CityRegistry>,
    source: Arc<dyn ForecastSource>,
    classifier: AlertClassifier,
    aggregator: NationalAggregator,
    reports: Arc<RefreshCoordinator<NationalReport>>,
    refresh_gate: Arc<Mutex<()>>,
    worker_active: Arc<AtomicBool>,
    poll_interval: Option<Duration>,
}

impl Daemon {
    /// Builds a daemon from a validated configuration.
    pub fn new(config: &ServiceConfig, registry: CityRegistry, source: Arc<dyn ForecastSource>) -> Self {
        let classifier = AlertClassifier::new(config.thresholds);
        let aggregator = NationalAggregator::new(Arc::clone(&source), classifier)
            .with_concurrency(config.aggregation.concurrency);
        let poll_interval = match config.daemon.poll_interval_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes * 60)),
        };

        Self {
            registry: Arc::new(registry),
            source,
            classifier,
            aggregator,
            reports: Arc::new(RefreshCoordinator::new()),
            refresh_gate: Arc::new(Mutex::new(())),
            worker_active: Arc::new(AtomicBool::new(false)),
            poll_interval,
        }
    }

    pub fn registry(&self) -> &CityRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &AlertClassifier {
        &self.classifier
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval
    }

    /// Latest published national report, if a refresh has completed.
    pub fn latest_report(&self) -> Option<Published<NationalReport>> {
        self.reports.latest()
    }

    /// Runs one national refresh synchronously and publishes it unless a
    /// newer refresh was triggered meanwhile. Returns the ticket used and
    /// whether the report was published.
    pub fn refresh_now(&self) -> (RefreshTicket, bool) {
        let ticket = self.reports.begin();
        let published = self.run_refresh(ticket);
        (ticket, published)
    }

    /// Requests a national refresh on the background worker and returns
    /// its ticket immediately. If the worker is busy, the request is left
    /// for it to pick up once the current refresh stops.
    pub fn trigger_refresh(&self) -> RefreshTicket {
        let ticket = self.reports.begin();
        if self.worker_active.swap(true, Ordering::SeqCst) {
            tracing::debug!(generation = ticket.generation(), "refresh worker busy, trigger coalesced");
            return ticket;
        }

        let daemon = self.clone();
        let spawned = thread::Builder::new()
            .name("dzmeteo-refresh".to_string())
            .spawn(move || daemon.drain_refreshes());
        if let Err(e) = spawned {
            self.worker_active.store(false, Ordering::SeqCst);
            tracing::error!(generation = ticket.generation(), error = %e, "failed to spawn refresh thread");
        }
        ticket
    }

    /// Refresh worker body: runs the newest ticket until nothing newer
    /// than the last run is pending, then releases the worker flag.
    fn drain_refreshes(&self) {
        let mut last_run = 0;
        loop {
            match self.reports.current_ticket() {
                Some(ticket) if ticket.generation() > last_run => {
                    self.run_refresh(ticket);
                    last_run = ticket.generation();
                }
                _ => {
                    self.worker_active.store(false, Ordering::SeqCst);
                    // a trigger may have seen the flag set just before the release
                    let pending = self.reports.current_generation() > last_run;
                    if !pending || self.worker_active.swap(true, Ordering::SeqCst) {
                        break;
                    }
                }
            }
        }
    }

    fn run_refresh(&self, ticket: RefreshTicket) -> bool {
        let _gate = self
            .refresh_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.reports.is_current(ticket) || self.reports.published_generation() >= ticket.generation() {
            tracing::debug!(generation = ticket.generation(), "refresh superseded before start");
            return false;
        }

        let started = Instant::now();
        tracing::info!(
            generation = ticket.generation(),
            cities = self.registry.len(),
            concurrency = self.aggregator.concurrency(),
            "national refresh started"
        );

        let cities = self.registry.all_cities();
        let reports = Arc::clone(&self.reports);
        let report = self
            .aggregator
            .aggregate_while(&cities, move || reports.is_current(ticket));
        let published = self.reports.publish(ticket, report);

        tracing::info!(
            generation = ticket.generation(),
            published,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "national refresh finished"
        );
        published
    }

    /// Fetches the detail view for one city. Failures are returned to the
    /// caller rather than swallowed.
    pub fn city_detail(&self, city: &City) -> Result<CityDetail, FetchFailure> {
        fetch_city_detail(self.source.as_ref(), &self.classifier, city)
    }

    /// Main daemon loop (runs indefinitely). With no poll interval the
    /// loop only performs the initial refresh and then parks, leaving
    /// refreshes to manual triggers.
    pub fn run(&self) {
        tracing::info!(
            cities = self.registry.len(),
            poll_interval_minutes = self.poll_interval.map(|d| d.as_secs() / 60),
            "starting daemon loop"
        );

        loop {
            let start = Instant::now();
            self.refresh_now();

            match self.poll_interval {
                Some(interval) => {
                    // Sleep until next poll interval
                    if let Some(remaining) = interval.checked_sub(start.elapsed()) {
                        thread::sleep(remaining);
                    }
                }
                None => loop {
                    thread::park();
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::FieldSet;
    use crate::model::{AlertLevel, CityForecast, DailyObservation};
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;

    /// Every city gets the same 4-day series with a single 80 km/h gust day.
    struct UniformSource;

    impl ForecastSource for UniformSource {
        fn fetch(&self, city: &City, _fields: FieldSet) -> Result<CityForecast, FetchFailure> {
            if city.name == "Adrar" {
                return Err(FetchFailure::new(&city.name, "HTTP 500 Internal Server Error"));
            }
            let start = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
            let daily = (0..4)
                .map(|i| DailyObservation {
                    wind_gust_max: Some(if i == 1 { 80.0 } else { 20.0 }),
                    ..DailyObservation::empty(start + chrono::Duration::days(i))
                })
                .collect();
            Ok(CityForecast {
                city: city.clone(),
                timezone: None,
                utc_offset_seconds: None,
                daily,
                hourly: Vec::new(),
            })
        }
    }

    fn daemon(config: &ServiceConfig) -> Daemon {
        Daemon::new(config, CityRegistry::builtin(), Arc::new(UniformSource))
    }

    #[test]
    fn test_daemon_creation_uses_config() {
        let d = daemon(&ServiceConfig::default());
        assert_eq!(d.poll_interval(), Some(Duration::from_secs(30 * 60)));
        assert_eq!(d.registry().len(), 24);
        assert!(d.latest_report().is_none());
    }

    #[test]
    fn test_zero_poll_interval_disables_loop_timer() {
        let mut config = ServiceConfig::default();
        config.daemon.poll_interval_minutes = 0;
        assert!(daemon(&config).poll_interval().is_none());
    }

    #[test]
    fn test_refresh_now_publishes_full_national_report() {
        let d = daemon(&ServiceConfig::default());
        let (ticket, published) = d.refresh_now();
        assert!(published);

        let latest = d.latest_report().expect("report should be published");
        assert_eq!(latest.generation, ticket.generation());
        // 24 cities, Adrar fails
        assert_eq!(latest.value.summaries.len(), 23);
        assert_eq!(latest.value.failures.len(), 1);
        assert_eq!(latest.value.failures[0].city, "Adrar");
        assert!(latest
            .value
            .summaries
            .iter()
            .all(|s| s.level == AlertLevel::Orange && s.worst_day_index == Some(1)));
    }

    #[test]
    fn test_triggered_refresh_eventually_publishes() {
        let d = daemon(&ServiceConfig::default());
        let ticket = d.trigger_refresh();

        let deadline = Instant::now() + Duration::from_secs(10);
        while d.latest_report().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        let latest = d.latest_report().expect("background refresh should publish");
        assert_eq!(latest.generation, ticket.generation());
    }

    /// Slow source that records how many fetches overlap.
    struct CountingSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl ForecastSource for CountingSource {
        fn fetch(&self, city: &City, fields: FieldSet) -> Result<CityForecast, FetchFailure> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(30));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            UniformSource.fetch(city, fields)
        }
    }

    #[test]
    fn test_overlapping_refreshes_share_the_request_cap() {
        let source = Arc::new(CountingSource {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        });
        let config = ServiceConfig::default();
        let d = Daemon::new(&config, CityRegistry::builtin(), Arc::clone(&source) as Arc<dyn ForecastSource>);

        let timer = {
            let d = d.clone();
            thread::spawn(move || d.refresh_now())
        };
        let tickets: Vec<RefreshTicket> = (0..4).map(|_| d.trigger_refresh()).collect();
        timer.join().unwrap();

        let newest = d.reports.current_generation();
        let deadline = Instant::now() + Duration::from_secs(20);
        while d.reports.published_generation() < newest && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(d.reports.published_generation(), newest);
        assert!(tickets.iter().all(|t| t.generation() <= newest));
        let peak = source.peak.load(Ordering::SeqCst);
        assert!(
            peak <= config.aggregation.concurrency,
            "peak {} in-flight fetches exceeds cap {}",
            peak,
            config.aggregation.concurrency
        );
        // five refreshes requested, superseded ones stop early
        assert!(source.calls.load(Ordering::SeqCst) < 5 * 24);
    }

    #[test]
    fn test_superseded_ticket_does_not_run() {
        let d = daemon(&ServiceConfig::default());
        let stale = d.reports.begin();
        d.reports.begin();
        assert!(!d.run_refresh(stale));
        assert!(d.latest_report().is_none());
    }

    #[test]
    fn test_stricter_thresholds_flow_into_aggregation() {
        let mut config = ServiceConfig::default();
        config.thresholds.gust_orange = 85.0;
        let d = daemon(&config);
        d.refresh_now();
        let latest = d.latest_report().unwrap();
        assert!(latest.value.summaries.iter().all(|s| s.level == AlertLevel::None));
    }

    #[test]
    fn test_city_detail_propagates_failure() {
        let d = daemon(&ServiceConfig::default());
        let adrar = d.registry().find("Adrar").unwrap().clone();
        let err = d.city_detail(&adrar).unwrap_err();
        assert_eq!(err.city, "Adrar");

        let alger = d.registry().find("Alger").unwrap().clone();
        let detail = d.city_detail(&alger).expect("Alger should succeed");
        assert_eq!(detail.days.len(), 4);
    }
}
