use std::collections::HashSet;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    ExtractedFileData, ExtractedPage, Notification, PageKind, RawPage, ResultSet, UploadedFile,
    IMAGE_BATCH_LABEL,
};

pub const EXTRACT_IMAGES_PATH: &str = "/extract-images";
pub const EXTRACT_PDF_PATH: &str = "/extract-pdf";

/// Files of one submission, split by the endpoint that handles them.
#[derive(Debug)]
pub struct Partition<'a> {
    pub images: Vec<&'a UploadedFile>,
    pub pdfs: Vec<&'a UploadedFile>,
    pub skipped: Vec<&'a UploadedFile>,
}

/// Splits a selection into the image batch and the PDFs, keeping selection
/// order inside each group. Files that are neither are skipped.
pub fn partition(files: &[UploadedFile]) -> Partition<'_> {
    let mut partition = Partition {
        images: Vec::new(),
        pdfs: Vec::new(),
        skipped: Vec::new(),
    };
    for file in files {
        if file.is_image() {
            partition.images.push(file);
        } else if file.is_pdf() {
            partition.pdfs.push(file);
        } else {
            partition.skipped.push(file);
        }
    }
    partition
}

#[derive(Debug)]
pub struct ExtractionOutcome {
    pub results: ResultSet,
    pub notifications: Vec<Notification>,
}

impl ExtractionOutcome {
    pub fn page_count(&self) -> usize {
        self.results.iter().map(|f| f.pages.len()).sum()
    }
}

/// HTTP client for the external Extraction API.
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExtractionClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.extraction_api_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Runs one upload cycle: the image batch first, then each PDF in turn.
    /// The first failure aborts the cycle and nothing is returned, so a
    /// caller never sees a partial result set.
    pub async fn extract(&self, files: &[UploadedFile]) -> AppResult<ExtractionOutcome> {
        let start = Instant::now();
        let groups = partition(files);
        for file in &groups.skipped {
            debug!(file_name = %file.name, mime_type = %file.mime_type, "Skipping unsupported file");
        }

        info!(
            images = groups.images.len(),
            pdfs = groups.pdfs.len(),
            skipped = groups.skipped.len(),
            "Starting extraction cycle"
        );

        let mut results = ResultSet::new();
        let mut notifications = Vec::new();

        if !groups.images.is_empty() {
            let pages = self.extract_images(&groups.images).await?;
            notifications.push(Notification::success(format!(
                "Extracted text from {} images",
                groups.images.len()
            )));
            results.push(ExtractedFileData::new(IMAGE_BATCH_LABEL, pages));
        }

        // One at a time: PDF N+1 is not sent before PDF N has been answered.
        for pdf in &groups.pdfs {
            let pages = self.extract_pdf(pdf).await?;
            notifications.push(Notification::success(format!(
                "Extracted text from {}",
                pdf.name
            )));
            results.push(ExtractedFileData::new(pdf.name.clone(), pages));
        }

        info!(
            files = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extraction cycle completed"
        );

        Ok(ExtractionOutcome {
            results,
            notifications,
        })
    }

    async fn extract_images(&self, images: &[&UploadedFile]) -> AppResult<Vec<ExtractedPage>> {
        let mut form = Form::new();
        for image in images {
            form = form.part("files", file_part(image)?);
        }
        self.post_form(EXTRACT_IMAGES_PATH, form, PageKind::Image).await
    }

    async fn extract_pdf(&self, pdf: &UploadedFile) -> AppResult<Vec<ExtractedPage>> {
        let form = Form::new().part("file", file_part(pdf)?);
        self.post_form(EXTRACT_PDF_PATH, form, PageKind::Pdf).await
    }

    async fn post_form(&self, path: &str, form: Form, kind: PageKind) -> AppResult<Vec<ExtractedPage>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Sending extraction request");

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let pages = parse_pages(path, &body, kind)?;
        debug!(endpoint = path, pages = pages.len(), bytes = body.len(), "Extraction response parsed");
        Ok(pages)
    }
}

fn file_part(file: &UploadedFile) -> AppResult<Part> {
    Part::bytes(file.content.to_vec())
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)
        .map_err(|e| AppError::InvalidUpload {
            message: format!("{} has an unusable content type: {}", file.name, e),
        })
}

/// Decodes an Extraction API body. Anything but a JSON array of pages is
/// malformed, including the `{"error": ...}` object the API sends with a
/// success status.
pub fn parse_pages(endpoint: &str, body: &[u8], default_kind: PageKind) -> AppResult<Vec<ExtractedPage>> {
    let raw: Vec<RawPage> =
        serde_json::from_slice(body).map_err(|e| AppError::malformed(endpoint, e.to_string()))?;
    Ok(normalize_pages(raw, default_kind))
}

/// Fills in what the API left out and makes page numbers unique.
pub fn normalize_pages(raw: Vec<RawPage>, default_kind: PageKind) -> Vec<ExtractedPage> {
    let mut pages: Vec<ExtractedPage> = raw
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| ExtractedPage {
            page: raw.page.unwrap_or(idx as u32 + 1),
            text: raw.text,
            filtered_text: raw.filtered_text.filter(|t| !t.is_empty()),
            image_base64: raw.image_base64.and_then(valid_preview),
            kind: raw.kind.unwrap_or(default_kind),
            source_name: raw.filename.filter(|n| !n.is_empty()),
        })
        .collect();

    let distinct: HashSet<u32> = pages.iter().map(|p| p.page).collect();
    if distinct.len() != pages.len() {
        warn!(pages = pages.len(), "Duplicate page numbers in response, renumbering");
        for (idx, page) in pages.iter_mut().enumerate() {
            page.page = idx as u32 + 1;
        }
    }
    pages
}

fn valid_preview(encoded: String) -> Option<String> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return None;
    }
    match STANDARD.decode(trimmed) {
        Ok(_) => Some(trimmed.to_string()),
        Err(e) => {
            warn!(error = %e, "Dropping preview that is not valid base64");
            None
        }
    }
}
