//! API route handlers
//!
//! - Random inputs and batch predictions (sensor service)
//! - Single-row prediction (prediction service)
//! - WebSocket dataset replay
//! - Health and Prometheus counters (both services)

mod predict;
mod random;
mod status;
mod stream;

pub use predict::*;
pub use random::*;
pub use status::*;
pub use stream::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::config::{defaults, StreamConfig};
use crate::forest::Classifier;
use crate::generator::InputGenerator;
use crate::types::{FeatureRow, Label};

// ============================================================================
// API State
// ============================================================================

/// Shared state for both listeners. Everything is read-only after startup
/// except the atomic counters.
#[derive(Clone)]
pub struct ServiceState {
    /// Model loaded once at startup
    pub model: Arc<dyn Classifier>,
    pub generator: Arc<InputGenerator>,
    /// Dataset rows replayed over `/ws`
    pub replay_rows: Arc<Vec<FeatureRow>>,
    pub stream: StreamConfig,
    /// Rows generated per `/random_predict` call
    pub batch_size: usize,
    pub counters: Arc<ServiceCounters>,
    /// Cancelled on shutdown; ends open streams
    pub shutdown: CancellationToken,
}

impl ServiceState {
    pub fn new(
        model: Arc<dyn Classifier>,
        generator: InputGenerator,
        replay_rows: Vec<FeatureRow>,
        stream: StreamConfig,
    ) -> Self {
        Self {
            model,
            generator: Arc::new(generator),
            replay_rows: Arc::new(replay_rows),
            stream,
            batch_size: defaults::RANDOM_BATCH_SIZE,
            counters: Arc::new(ServiceCounters::default()),
            shutdown: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Predict one row and record it in the counters.
    pub fn predict(&self, row: &FeatureRow) -> Label {
        let label = self.model.predict(row);
        self.counters.record_prediction(label);
        label
    }
}

// ============================================================================
// Counters
// ============================================================================

/// Process-wide counters exported on `/metrics`.
#[derive(Debug)]
pub struct ServiceCounters {
    predictions: AtomicU64,
    faults: AtomicU64,
    stream_events: AtomicU64,
    started_at: Instant,
}

impl Default for ServiceCounters {
    fn default() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            stream_events: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }
}

impl ServiceCounters {
    pub fn record_prediction(&self, label: Label) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if label == 1 {
            self.faults.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_stream_event(&self) {
        self.stream_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn predictions(&self) -> u64 {
        self.predictions.load(Ordering::Relaxed)
    }

    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    pub fn stream_events(&self) -> u64 {
        self.stream_events.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
