//! # PC Telemetry
//!
//! Logging and metrics for the Plasma segment client.
//!
//! ## Components
//!
//! - **Tracing**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   console or JSON formatting layer
//! - **Metrics**: Prometheus counters for history verification and wallet
//!   state transitions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PC_SERVICE_NAME` | `plasma-segment` | Service name in log lines |
//! | `PC_LOG_LEVEL` | `info` | Log level filter |
//! | `PC_JSON_LOGS` | `false` | JSON formatted logs |

#![warn(missing_docs)]

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, HISTORY_BLOCKS_UNVERIFIED,
    HISTORY_BLOCKS_VERIFIED, HISTORY_REFETCHES, HISTORY_VERIFICATIONS,
    HISTORY_VERIFICATION_DURATION, REGISTRY, STATE_SPENDS,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics, then install the tracing subscriber.
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_tracing(&config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
