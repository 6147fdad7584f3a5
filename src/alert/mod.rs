//! Alert evaluation for the weather dashboard.
//!
//! Submodules:
//! - `thresholds` — per-day wind/gust/rain classification against the
//!   vigilance thresholds.

pub mod thresholds;

pub use thresholds::{AlertClassifier, Thresholds};
