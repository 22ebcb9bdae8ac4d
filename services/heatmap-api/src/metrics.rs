//! Prometheus metrics for engine operations.
//!
//! Every engine endpoint counts its requests and failures and records how
//! long each operation took, labelled by operation name.

use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::handlers::common::ApiResult;

/// The process-wide recorder can only be installed once.
static RECORDER: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the Prometheus recorder, or hand back the one already installed.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let mut installed = RECORDER
        .lock()
        .map_err(|_| anyhow!("Prometheus recorder lock poisoned"))?;

    if let Some(handle) = installed.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    *installed = Some(handle.clone());
    Ok(handle)
}

/// Wall-clock timer for one operation.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_micros() as f64 / 1000.0
    }
}

/// Record a request to `operation`.
pub fn record_request(operation: &'static str) {
    counter!("heatmap_requests_total", "operation" => operation).increment(1);
}

/// Record how an operation finished.
pub fn record_outcome(operation: &'static str, duration_ms: f64, success: bool) {
    histogram!("heatmap_operation_duration_ms", "operation" => operation).record(duration_ms);
    if !success {
        counter!("heatmap_request_errors_total", "operation" => operation).increment(1);
    }
}

/// Run `work`, recording the request, its duration and whether it failed.
pub async fn observe<T, F>(operation: &'static str, work: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    record_request(operation);
    let timer = Timer::start();

    let result = work.await;
    record_outcome(operation, timer.elapsed_ms(), result.is_ok());

    result
}
