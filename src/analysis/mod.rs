//! Alert analysis for the weather dashboard.
//!
//! Submodules:
//! - `national` — worst-day reduction per city, bounded national refresh,
//!   and red/orange/ok partitioning.
//! - `detail`   — single-city detail view (per-day alerts, hourly means).

pub mod detail;
pub mod national;
