use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::{Semaphore, TryAcquireError};
use tracing::{debug, warn};

use crate::error::AppError;

/// Lets one upload cycle run at a time. A second submit is rejected rather
/// than queued.
#[derive(Debug)]
pub struct ExtractionGate {
    permits: Semaphore,
    total: AtomicU64,
    rejected: AtomicU64,
}

impl Default for ExtractionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionGate {
    pub fn new() -> Self {
        Self {
            permits: Semaphore::new(1),
            total: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn in_progress(&self) -> bool {
        self.permits.available_permits() == 0
    }

    /// (total, rejected) submits seen so far.
    pub fn metrics(&self) -> (u64, u64) {
        (
            self.total.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
        )
    }
}

pub async fn extraction_gate_middleware(
    State(gate): State<Arc<ExtractionGate>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let total = gate.total.fetch_add(1, Ordering::Relaxed) + 1;

    let _permit = gate.permits.try_acquire().map_err(|e| match e {
        TryAcquireError::NoPermits => {
            let rejected = gate.rejected.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                total_submits = total,
                rejected_submits = rejected,
                "Submit rejected, an extraction is already running"
            );
            AppError::ExtractionInProgress
        }
        TryAcquireError::Closed => AppError::internal("extraction gate closed"),
    })?;

    debug!(total_submits = total, "Extraction permit acquired");
    let response = next.run(request).await;
    debug!("Extraction finished, permit released");

    Ok(response)
}
