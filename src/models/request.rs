use bytes::Bytes;

pub const PDF_MIME: &str = "application/pdf";
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// A file the user picked or dropped, held only while it is the pending
/// selection.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub size: usize,
    pub content: Bytes,
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len(),
            content,
            mime_type: mime_type.into(),
        }
    }

    /// Builds a file from what the browser sent. A missing or generic content
    /// type is replaced by one sniffed from the payload.
    pub fn from_upload(name: impl Into<String>, declared_mime: Option<&str>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let mime_type = match declared_mime.map(str::trim) {
            Some(mime) if !mime.is_empty() && mime != OCTET_STREAM_MIME => mime.to_ascii_lowercase(),
            _ => sniff_mime(&content).to_string(),
        };
        Self::new(name, mime_type, content)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }
}

fn sniff_mime(content: &[u8]) -> &'static str {
    if content.starts_with(b"%PDF") {
        return PDF_MIME;
    }
    match image::guess_format(content) {
        Ok(format) => format.to_mime_type(),
        Err(_) => OCTET_STREAM_MIME,
    }
}
