use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::models::ResultSet;

/// Holds the results of the most recent successful upload cycle.
///
/// Readers get an immutable snapshot. A new cycle swaps in a whole new set;
/// nothing is ever merged or edited in place.
#[derive(Debug, Default)]
pub struct ResultStore {
    current: RwLock<Arc<ResultSet>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Arc<ResultSet> {
        Arc::clone(&*self.current.read().await)
    }

    pub async fn replace(&self, results: ResultSet) {
        let files = results.len();
        let pages: usize = results.iter().map(|f| f.pages.len()).sum();
        *self.current.write().await = Arc::new(results);
        info!(files, pages, "Result set replaced");
    }

    pub async fn is_empty(&self) -> bool {
        self.current.read().await.is_empty()
    }
}
