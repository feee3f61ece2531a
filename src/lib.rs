//! trainwatch -- supervision-grade anomaly detection for daily training metrics.
//!
//! This crate provides the core library for threshold resolution, the four
//! detection dimensions (cheat rate, face-recognition failures, learn
//! conversion, problem remediation overdue), severity classification,
//! aggregation, export, and alert dispatch.

pub mod alert;
pub mod detect;
pub mod export;
pub mod metrics;
pub mod report;
pub mod storage;

use anyhow::Result;
use std::sync::Arc;

use detect::engine::{DetectionEngine, DetectionWindow};
use detect::thresholds::ThresholdSet;
use detect::{Anomaly, DetectionFilter};

/// Open the store at `db_path` and run one detection pass over the window.
pub async fn run_detection(
    db_path: &str,
    window: &DetectionWindow,
    filter: DetectionFilter,
    thresholds: &ThresholdSet,
) -> Result<Vec<Anomaly>> {
    tracing::info!(%db_path, "opening metric store");
    let pool = storage::open_pool(db_path)?;
    let store = Arc::new(storage::SqliteStore::new(pool));

    let engine = DetectionEngine::new(store.clone(), store);
    engine.run(window, filter, thresholds).await
}
