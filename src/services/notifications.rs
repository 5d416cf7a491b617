use tokio::sync::RwLock;

use crate::models::Notification;

/// Notifications of the last upload cycle, shown until the next one.
#[derive(Debug, Default)]
pub struct NotificationBoard {
    latest: RwLock<Vec<Notification>>,
}

impl NotificationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, notifications: Vec<Notification>) {
        *self.latest.write().await = notifications;
    }

    pub async fn latest(&self) -> Vec<Notification> {
        self.latest.read().await.clone()
    }
}
