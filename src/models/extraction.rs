use serde::{Deserialize, Serialize};

/// Label of the single entry that holds every image of a batch.
pub const IMAGE_BATCH_LABEL: &str = "Uploaded Images";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Pdf,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub page: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(rename = "type")]
    pub kind: PageKind,
    /// Source file name, reported by the API for image pages.
    #[serde(default, rename = "filename", skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl ExtractedPage {
    pub fn new(page: u32, text: impl Into<String>, kind: PageKind) -> Self {
        Self {
            page,
            text: text.into(),
            filtered_text: None,
            image_base64: None,
            kind,
            source_name: None,
        }
    }

    pub fn with_filtered_text(mut self, filtered_text: impl Into<String>) -> Self {
        self.filtered_text = Some(filtered_text.into());
        self
    }

    pub fn with_preview(mut self, image_base64: impl Into<String>) -> Self {
        self.image_base64 = Some(image_base64.into());
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFileData {
    pub file_name: String,
    pub pages: Vec<ExtractedPage>,
}

impl ExtractedFileData {
    pub fn new(file_name: impl Into<String>, pages: Vec<ExtractedPage>) -> Self {
        Self {
            file_name: file_name.into(),
            pages,
        }
    }

    pub fn has_filtered_text(&self) -> bool {
        self.pages.iter().any(|p| p.filtered_text.is_some())
    }
}

/// Results of one successful upload cycle, in submission order.
pub type ResultSet = Vec<ExtractedFileData>;

/// A page as the Extraction API sends it. Everything except `text` may be
/// missing; see `services::extraction_client::normalize_pages`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub page: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub filtered_text: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<PageKind>,
    #[serde(default)]
    pub filename: Option<String>,
}
