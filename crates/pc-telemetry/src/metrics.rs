//! Prometheus metrics for the segment client.
//!
//! All metrics follow the naming convention: `pc_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SEGMENT HISTORY METRICS (pc-03)
    // =========================================================================

    /// Completed history walks by outcome
    pub static ref HISTORY_VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("pc_history_verifications_total", "Total segment history walks"),
        &["outcome"]  // outcome: verified/partial/invalid
    ).expect("metric creation failed");

    /// Transaction blocks whose proofs checked out
    pub static ref HISTORY_BLOCKS_VERIFIED: Counter = Counter::new(
        "pc_history_blocks_verified_total",
        "Total blocks verified during history walks"
    ).expect("metric creation failed");

    /// Transaction blocks left unverified after the refetch budget
    pub static ref HISTORY_BLOCKS_UNVERIFIED: Counter = Counter::new(
        "pc_history_blocks_unverified_total",
        "Total blocks that could not be verified"
    ).expect("metric creation failed");

    /// Remote refetches of segmented blocks
    pub static ref HISTORY_REFETCHES: CounterVec = CounterVec::new(
        Opts::new("pc_history_refetches_total", "Total segmented block refetches"),
        &["result"]  // result: ok/not_found/transport
    ).expect("metric creation failed");

    /// Wall time of a full history walk
    pub static ref HISTORY_VERIFICATION_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "pc_history_verification_duration_seconds",
            "Time spent verifying a segment history"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // WALLET STATE METRICS (pc-03)
    // =========================================================================

    /// Spends applied to the wallet state engine
    pub static ref STATE_SPENDS: CounterVec = CounterVec::new(
        Opts::new("pc_state_spends_total", "Total spend attempts on the wallet state"),
        &["outcome"]  // outcome: applied/rejected
    ).expect("metric creation failed");
}

/// Register every metric with [`REGISTRY`].
///
/// Registering twice is harmless; already-registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HISTORY_VERIFICATIONS.clone()),
        Box::new(HISTORY_BLOCKS_VERIFIED.clone()),
        Box::new(HISTORY_BLOCKS_UNVERIFIED.clone()),
        Box::new(HISTORY_REFETCHES.clone()),
        Box::new(HISTORY_VERIFICATION_DURATION.clone()),
        Box::new(STATE_SPENDS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
