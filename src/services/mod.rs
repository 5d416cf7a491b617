pub mod acknowledgment;
pub mod clipboard;
pub mod export;
pub mod extraction_client;
pub mod intake;
pub mod notifications;
pub mod result_store;
pub mod viewer;

pub use acknowledgment::{CopyAcknowledgments, CopyTarget, ACK_WINDOW};
pub use clipboard::{write_text, ClipboardSink, MemoryClipboard, SystemClipboard};
pub use extraction_client::{ExtractionClient, ExtractionOutcome};
pub use intake::FileIntake;
pub use notifications::NotificationBoard;
pub use result_store::ResultStore;
