use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{AppError, AppResult};

/// Destination of copy actions.
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> AppResult<()>;
}

/// Writes `text` on the blocking pool. Desktop clipboard calls may wait on the
/// display server or a clipboard manager.
pub async fn write_text(clipboard: Arc<dyn ClipboardSink>, text: String) -> AppResult<()> {
    tokio::task::spawn_blocking(move || clipboard.set_text(&text))
        .await
        .map_err(|e| AppError::internal(format!("clipboard task failed: {}", e)))?
}

/// The desktop clipboard of the machine running the desk.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> AppResult<()> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| AppError::clipboard(format!("failed to access clipboard: {}", e)))?;
        clipboard
            .set_text(text)
            .map_err(|e| AppError::clipboard(format!("failed to write clipboard: {}", e)))?;
        debug!(chars = text.chars().count(), "Copied text to system clipboard");
        Ok(())
    }
}

/// Keeps the last copied text in memory. Can be told to refuse writes.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    deny: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denying() -> Self {
        Self {
            contents: Mutex::new(None),
            deny: true,
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&self, text: &str) -> AppResult<()> {
        if self.deny {
            return Err(AppError::clipboard("clipboard write denied"));
        }
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| AppError::clipboard("clipboard state poisoned"))?;
        *contents = Some(text.to_string());
        Ok(())
    }
}
