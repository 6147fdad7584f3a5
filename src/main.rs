//! Algerian Weather Vigilance Service - Main Binary
//!
//! Fetches four-day Open-Meteo forecasts for the registered Algerian
//! cities and grades each day against the orange/red vigilance thresholds.
//!
//! Usage:
//!   cargo run --release                          # One-shot national report (JSON on stdout)
//!   cargo run --release -- --city Oran           # One-shot detail for a single city
//!   cargo run --release -- --city                # One-shot detail for the default city (Alger)
//!   cargo run --release -- --endpoint 8080       # Daemon + HTTP endpoint on port 8080
//!   cargo run --release -- --config my.toml ...  # Explicit configuration file
//!
//! Environment:
//!   DZMETEO_CONFIG - configuration file path (also read from .env)
//!   RUST_LOG       - log filter (default: dzmeteo_service=info)

use dzmeteo_service::config::ServiceConfig;
use dzmeteo_service::daemon::Daemon;
use dzmeteo_service::endpoint;
use dzmeteo_service::ingest::open_meteo::OpenMeteoClient;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

enum Mode {
    National,
    City(Option<String>),
    Endpoint(u16),
}

fn main() {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dzmeteo_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut mode = Mode::National;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).filter(|v| !v.starts_with("--"));
        let mut step = 2;
        match (args[i].as_str(), value) {
            ("--config", Some(path)) => config_path = Some(PathBuf::from(path)),
            ("--city", name) => {
                mode = Mode::City(name.cloned());
                if name.is_none() {
                    step = 1;
                }
            }
            ("--endpoint", Some(port)) => match port.parse() {
                Ok(port) => mode = Mode::Endpoint(port),
                Err(_) => usage_error(&args[0], &format!("invalid port '{}'", port)),
            },
            ("--config" | "--endpoint", None) => {
                usage_error(&args[0], &format!("{} requires a value", args[i]))
            }
            (other, _) => usage_error(&args[0], &format!("unknown argument: {}", other)),
        }
        i += step;
    }

    let config = match ServiceConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => fatal(&format!("configuration error: {}", e)),
    };
    let registry = match config.load_registry() {
        Ok(registry) => registry,
        Err(e) => fatal(&format!("configuration error: {}", e)),
    };
    let client = match OpenMeteoClient::new(&config.api) {
        Ok(client) => client,
        Err(e) => fatal(&format!("failed to build HTTP client: {}", e)),
    };

    tracing::info!(
        cities = registry.len(),
        api = client.base_url(),
        concurrency = config.aggregation.concurrency,
        "dzmeteo service starting"
    );

    let daemon = Daemon::new(&config, registry, Arc::new(client));

    match mode {
        Mode::National => {
            daemon.refresh_now();
            let Some(latest) = daemon.latest_report() else {
                fatal("national refresh produced no report");
            };
            let report = &latest.value;
            print_json(&serde_json::json!({
                "generated_at": report.generated_at,
                "partition": report.partition(),
                "failures": report.failures,
            }));
        }
        Mode::City(name) => {
            let found = match &name {
                Some(name) => daemon.registry().find(name),
                None => daemon.registry().default_city(),
            };
            let Some(city) = found.cloned() else {
                fatal(&format!("city '{}' is not in the registry", name.unwrap_or_default()));
            };
            match daemon.city_detail(&city) {
                Ok(detail) => print_json(&detail),
                Err(e) => fatal(&e.to_string()),
            }
        }
        Mode::Endpoint(port) => {
            // Spawn endpoint server in background thread
            let server_daemon = daemon.clone();
            std::thread::spawn(move || {
                if let Err(e) = endpoint::start_endpoint_server(port, server_daemon) {
                    tracing::error!(error = %e, "endpoint server stopped");
                    std::process::exit(1);
                }
            });

            daemon.run();
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fatal(&format!("failed to serialize output: {}", e)),
    }
}

fn usage_error(program: &str, message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("Usage: {} [--config PATH] [--city [NAME] | --endpoint PORT]", program);
    std::process::exit(1);
}

fn fatal(message: &str) -> ! {
    tracing::error!("{}", message);
    std::process::exit(1);
}
