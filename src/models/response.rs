use serde::{Deserialize, Serialize};

use crate::models::Notification;

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectedFileView {
    pub name: String,
    pub mime_type: String,
    pub size: usize,
    pub preview_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub success: bool,
    pub files: Vec<SelectedFileView>,
}

impl SelectionResponse {
    pub fn new(files: Vec<SelectedFileView>) -> Self {
        Self {
            success: true,
            files,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    /// False when there was no selection to hand over.
    pub submitted: bool,
    pub files: usize,
    pub pages: usize,
    pub notifications: Vec<Notification>,
    pub processing_time_ms: u64,
}

impl SubmitResponse {
    pub fn skipped() -> Self {
        Self {
            success: true,
            submitted: false,
            files: 0,
            pages: 0,
            notifications: Vec::new(),
            processing_time_ms: 0,
        }
    }

    pub fn completed(files: usize, pages: usize, notifications: Vec<Notification>, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            submitted: true,
            files,
            pages,
            notifications,
            processing_time_ms,
        }
    }

    pub fn failed(notification: Notification, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            submitted: true,
            files: 0,
            pages: 0,
            notifications: vec![notification],
            processing_time_ms,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CopyResponse {
    pub success: bool,
    pub copied: bool,
    pub characters: usize,
}

impl CopyResponse {
    pub fn new(copied: bool, characters: usize) -> Self {
        Self {
            success: true,
            copied,
            characters,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub extraction_api_url: String,
    pub extraction_in_progress: bool,
    pub result_files: usize,
    pub pending_files: usize,
    pub submits_total: u64,
    pub submits_rejected: u64,
}
