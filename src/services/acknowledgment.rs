use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// How long a "copied" acknowledgment stays visible.
pub const ACK_WINDOW: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyTarget {
    Page { file_index: usize, page_index: usize },
    All,
}

/// Transient "copied" flags, one per copy target. Each flag clears itself
/// once `ACK_WINDOW` has passed since it was set; setting one never touches
/// another.
#[derive(Debug)]
pub struct CopyAcknowledgments {
    window: Duration,
    signaled: Mutex<HashMap<CopyTarget, Instant>>,
}

impl Default for CopyAcknowledgments {
    fn default() -> Self {
        Self::new(ACK_WINDOW)
    }
}

impl CopyAcknowledgments {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            signaled: Mutex::new(HashMap::new()),
        }
    }

    pub async fn signal(&self, target: CopyTarget, now: Instant) {
        let mut signaled = self.signaled.lock().await;
        signaled.retain(|_, at| now.saturating_duration_since(*at) < self.window);
        signaled.insert(target, now);
    }

    pub async fn is_active(&self, target: CopyTarget, now: Instant) -> bool {
        self.signaled
            .lock()
            .await
            .get(&target)
            .is_some_and(|at| now.saturating_duration_since(*at) < self.window)
    }

    pub async fn active_targets(&self, now: Instant) -> Vec<CopyTarget> {
        self.signaled
            .lock()
            .await
            .iter()
            .filter(|(_, at)| now.saturating_duration_since(**at) < self.window)
            .map(|(target, _)| *target)
            .collect()
    }
}
