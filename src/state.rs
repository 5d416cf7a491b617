use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::AppResult;
use crate::middleware::ExtractionGate;
use crate::services::{
    ClipboardSink, CopyAcknowledgments, ExtractionClient, FileIntake, NotificationBoard,
    ResultStore, SystemClipboard,
};

/// Everything the handlers share. Cloning is cheap; all parts are behind
/// `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub intake: Arc<Mutex<FileIntake>>,
    pub store: Arc<ResultStore>,
    pub client: Arc<ExtractionClient>,
    pub clipboard: Arc<dyn ClipboardSink>,
    pub acknowledgments: Arc<CopyAcknowledgments>,
    pub notifications: Arc<NotificationBoard>,
    pub gate: Arc<ExtractionGate>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        Self::with_clipboard(config, Arc::new(SystemClipboard))
    }

    pub fn with_clipboard(config: Config, clipboard: Arc<dyn ClipboardSink>) -> AppResult<Self> {
        let client = ExtractionClient::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            intake: Arc::new(Mutex::new(FileIntake::new())),
            store: Arc::new(ResultStore::new()),
            client: Arc::new(client),
            clipboard,
            acknowledgments: Arc::new(CopyAcknowledgments::default()),
            notifications: Arc::new(NotificationBoard::new()),
            gate: Arc::new(ExtractionGate::new()),
        })
    }
}
