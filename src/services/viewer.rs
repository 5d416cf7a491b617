use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    ExtractedPage, Notification, NotificationLevel, PageKind, ResultSet, SelectedFileView,
};
use crate::services::acknowledgment::{CopyAcknowledgments, CopyTarget};
use crate::services::clipboard::{write_text, ClipboardSink};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewView {
    pub kind: PageKind,
    pub data_uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub page_index: usize,
    pub page: u32,
    pub text: String,
    pub filtered_text: Option<String>,
    pub source_name: Option<String>,
    pub preview: Option<PreviewView>,
    pub copied: bool,
    pub copy_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileView {
    pub file_index: usize,
    pub file_name: String,
    pub pages: Vec<PageView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub files: Vec<FileView>,
    pub all_copied: bool,
}

/// PDF pages embed as documents, everything else as an image. No preview
/// without data.
pub fn preview_for(page: &ExtractedPage) -> Option<PreviewView> {
    let data = page.image_base64.as_deref()?;
    let mime = match page.kind {
        PageKind::Pdf => "application/pdf",
        PageKind::Image => "image/png",
    };
    Some(PreviewView {
        kind: page.kind,
        data_uri: format!("data:{};base64,{}", mime, data),
    })
}

pub fn results_view(results: &ResultSet, active: &[CopyTarget]) -> ResultsView {
    let files = results
        .iter()
        .enumerate()
        .map(|(file_index, file)| FileView {
            file_index,
            file_name: file.file_name.clone(),
            pages: file
                .pages
                .iter()
                .enumerate()
                .map(|(page_index, page)| PageView {
                    page_index,
                    page: page.page,
                    text: page.text.clone(),
                    filtered_text: page.filtered_text.clone(),
                    source_name: page.source_name.clone(),
                    preview: preview_for(page),
                    copied: active.contains(&CopyTarget::Page { file_index, page_index }),
                    copy_url: format!("/api/results/{}/{}/copy", file_index, page_index),
                })
                .collect(),
        })
        .collect();

    ResultsView {
        files,
        all_copied: active.contains(&CopyTarget::All),
    }
}

/// Copies one page's text. An unknown page is `NotFound`; a clipboard
/// failure is logged and reported as not copied.
pub async fn copy_page_text(
    results: &ResultSet,
    file_index: usize,
    page_index: usize,
    clipboard: Arc<dyn ClipboardSink>,
    acks: &CopyAcknowledgments,
) -> AppResult<(bool, usize)> {
    let page = results
        .get(file_index)
        .and_then(|file| file.pages.get(page_index))
        .ok_or_else(|| AppError::not_found(format!("Page {} of file {}", page_index, file_index)))?;

    let characters = page.text.chars().count();
    match write_text(clipboard, page.text.clone()).await {
        Ok(()) => {
            acks.signal(CopyTarget::Page { file_index, page_index }, Instant::now())
                .await;
            info!(file_index, page_index, characters, "Copied page text");
            Ok((true, characters))
        }
        Err(e) => {
            warn!(file_index, page_index, error = %e, "Failed to copy page text");
            Ok((false, characters))
        }
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// State the index page is drawn from.
pub struct IndexPage<'a> {
    pub selection: &'a [SelectedFileView],
    pub notifications: &'a [Notification],
    pub results: &'a ResultsView,
    pub busy: bool,
}

const SCRIPT: &str = r#"
async function call(method, url, body) {
  await fetch(url, { method, body });
  location.reload();
}
function sendFiles(files) {
  const form = new FormData();
  for (const f of files) form.append("files", f);
  call("POST", "/api/selection", form);
}
const drop = document.getElementById("drop");
drop.addEventListener("dragover", (e) => e.preventDefault());
drop.addEventListener("drop", (e) => { e.preventDefault(); sendFiles(e.dataTransfer.files); });
document.getElementById("picker").addEventListener("change", (e) => sendFiles(e.target.files));
document.querySelectorAll("[data-post]").forEach((b) =>
  b.addEventListener("click", () => call("POST", b.dataset.post)));
document.querySelectorAll("[data-delete]").forEach((b) =>
  b.addEventListener("click", () => call("DELETE", b.dataset.delete)));
if (document.querySelector(".copied")) setTimeout(() => location.reload(), 2000);
"#;

pub fn render_index(page: &IndexPage<'_>) -> String {
    let mut html = String::from(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Text Extractor</title></head><body>",
    );
    html.push_str("<h1>Text Extractor</h1>");

    for note in page.notifications {
        let class = match note.level {
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
        };
        let _ = write!(
            html,
            "<div class=\"notification {}\"><strong>{}</strong> {}</div>",
            class,
            escape_html(&note.title),
            escape_html(&note.description)
        );
    }

    html.push_str("<section id=\"drop\">");
    if page.busy {
        html.push_str("<p class=\"busy\">Extracting…</p>");
    } else {
        html.push_str("<h3>Upload Files</h3>");
    }
    html.push_str("<p>Drop your pdf/images here or click to browse</p>");
    html.push_str("<input id=\"picker\" type=\"file\" multiple accept=\".pdf,image/*\">");
    let _ = write!(
        html,
        "<button data-post=\"/api/submit\"{}>Upload Files</button>",
        if page.selection.is_empty() || page.busy { " disabled" } else { "" }
    );
    if !page.selection.is_empty() {
        html.push_str("<button data-delete=\"/api/selection\">Remove</button><ul>");
        for file in page.selection {
            let _ = write!(html, "<li>{}", escape_html(&file.name));
            if let Some(url) = &file.preview_url {
                let _ = write!(html, "<img src=\"{}\" alt=\"{}\" width=\"120\">", url, escape_html(&file.name));
            }
            html.push_str("</li>");
        }
        html.push_str("</ul>");
    }
    html.push_str("</section>");

    if !page.results.files.is_empty() {
        let _ = write!(
            html,
            "<nav><a href=\"/export/xlsx\">Download Sheet (Excel)</a> \
             <a href=\"/export/txt\">Download All Text (Text)</a> \
             <button data-post=\"/api/results/copy\"{}>Copy All Text</button></nav>",
            if page.results.all_copied { " class=\"copied\"" } else { "" }
        );
    }

    for file in &page.results.files {
        let _ = write!(html, "<article><h3>{}</h3>", escape_html(&file.file_name));
        for view in &file.pages {
            let _ = write!(html, "<div class=\"page\"><h4>Page {}", view.page);
            if let Some(name) = &view.source_name {
                let _ = write!(html, " · {}", escape_html(name));
            }
            let _ = write!(
                html,
                "</h4><button data-post=\"{}\"{}>{}</button>",
                view.copy_url,
                if view.copied { " class=\"copied\"" } else { "" },
                if view.copied { "Copied" } else { "Copy" }
            );
            match &view.preview {
                Some(PreviewView { kind: PageKind::Pdf, data_uri }) => {
                    let _ = write!(
                        html,
                        "<embed src=\"{}\" type=\"application/pdf\" title=\"Page {}\" height=\"300\">",
                        data_uri, view.page
                    );
                }
                Some(PreviewView { data_uri, .. }) => {
                    let _ = write!(html, "<img src=\"{}\" alt=\"Page {}\" height=\"300\">", data_uri, view.page);
                }
                None => {}
            }
            let _ = write!(html, "<pre>{}</pre></div><hr>", escape_html(&view.text));
        }
        html.push_str("</article>");
    }

    let _ = write!(html, "<script>{}</script></body></html>", SCRIPT);
    html
}
