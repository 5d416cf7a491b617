//! Spreadsheet, transcript and clipboard exports of the current result set.
//!
//! Every export reads a snapshot and leaves it untouched.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rust_xlsxwriter::{Format, Workbook};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ExtractedFileData, ResultSet};
use crate::services::acknowledgment::{CopyAcknowledgments, CopyTarget};
use crate::services::clipboard::{write_text, ClipboardSink};

pub const SPREADSHEET_FILE_NAME: &str = "extracted-text.xlsx";
pub const TEXT_FILE_NAME: &str = "extracted-text.txt";
pub const SPREADSHEET_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel refuses longer sheet names.
pub const MAX_SHEET_NAME_CHARS: usize = 31;
/// Excel refuses longer cell strings.
pub const MAX_CELL_CHARS: usize = 32_767;

const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

pub const HEADER_PAGE: &str = "Page Number";
pub const HEADER_TEXT: &str = "Extracted Text";
pub const HEADER_FILTERED: &str = "Filtered Text";

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub page: u32,
    pub text: String,
    pub filtered_text: Option<String>,
}

/// Worksheet contents before they are written out.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub name: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<SheetRow>,
}

impl SheetPlan {
    /// Header row included.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }
}

pub fn workbook_plan(results: &ResultSet) -> Vec<SheetPlan> {
    let mut used = HashSet::new();
    results
        .iter()
        .enumerate()
        .map(|(idx, file)| sheet_plan(file, sheet_name(&file.file_name, idx, &mut used)))
        .collect()
}

fn sheet_plan(file: &ExtractedFileData, name: String) -> SheetPlan {
    let mut headers = vec![HEADER_PAGE, HEADER_TEXT];
    if file.has_filtered_text() {
        headers.push(HEADER_FILTERED);
    }
    SheetPlan {
        name,
        headers,
        rows: file
            .pages
            .iter()
            .map(|page| SheetRow {
                page: page.page,
                text: page.text.clone(),
                filtered_text: page.filtered_text.clone(),
            })
            .collect(),
    }
}

/// Turns a file name into a sheet name Excel accepts, unique within the
/// workbook (case-insensitive).
pub fn sheet_name(file_name: &str, position: usize, used: &mut HashSet<String>) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    let mut base = cleaned.trim_matches('\'').to_string();
    if base.trim().is_empty() {
        base = format!("Sheet{}", position + 1);
    } else if base.eq_ignore_ascii_case("history") {
        base.push('_');
    }

    let mut candidate = base.clone();
    let mut copy = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({})", copy);
        let stem: String = base
            .chars()
            .take(MAX_SHEET_NAME_CHARS - suffix.chars().count())
            .collect();
        candidate = format!("{}{}", stem.trim_end_matches('\''), suffix);
        copy += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}

fn cell_text(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text.to_string();
    }
    warn!(chars = text.chars().count(), "Truncating cell text to the xlsx limit");
    text.chars().take(MAX_CELL_CHARS).collect()
}

/// Renders the whole result set as an xlsx workbook, one sheet per file.
pub fn spreadsheet_bytes(results: &ResultSet) -> AppResult<Vec<u8>> {
    if results.is_empty() {
        return Err(AppError::NoResults);
    }

    let plan = workbook_plan(results);
    let header_format = Format::new().set_bold();
    let mut workbook = Workbook::new();

    for sheet in &plan {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name.as_str())?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        for (idx, row) in sheet.rows.iter().enumerate() {
            let line = idx as u32 + 1;
            worksheet.write_number(line, 0, row.page)?;
            worksheet.write_string(line, 1, cell_text(&row.text))?;
            if let Some(filtered) = &row.filtered_text {
                worksheet.write_string(line, 2, cell_text(filtered))?;
            }
        }
        worksheet.set_column_width(1, 80)?;
        if sheet.headers.len() > 2 {
            worksheet.set_column_width(2, 80)?;
        }
    }

    let buffer = workbook.save_to_buffer()?;
    info!(sheets = plan.len(), bytes = buffer.len(), "Spreadsheet export built");
    Ok(buffer)
}

/// Line placed between two pages of the transcript.
pub fn page_separator() -> String {
    format!("\n{}\n\n", "-".repeat(64))
}

/// Human-readable transcript: a header per file, then every page.
pub fn plain_text(results: &ResultSet) -> String {
    let separator = page_separator();
    results
        .iter()
        .map(|file| {
            let pages = file
                .pages
                .iter()
                .map(|page| format!("Page {}\nText: \n\n{}", page.page, page.text))
                .collect::<Vec<_>>()
                .join(&separator);
            format!("{}\n\n{}", file.file_name, pages)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Every page's text, newline-joined, with no file boundaries.
pub fn all_text(results: &ResultSet) -> String {
    results
        .iter()
        .flat_map(|file| file.pages.iter().map(|page| page.text.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Copies all text to the clipboard. A clipboard failure is logged and
/// reported as `false`; it never becomes an error.
pub async fn copy_all_text(
    results: &ResultSet,
    clipboard: Arc<dyn ClipboardSink>,
    acks: &CopyAcknowledgments,
) -> (bool, usize) {
    let text = all_text(results);
    let characters = text.chars().count();
    match write_text(clipboard, text).await {
        Ok(()) => {
            acks.signal(CopyTarget::All, Instant::now()).await;
            info!(characters, "Copied all text");
            (true, characters)
        }
        Err(e) => {
            warn!(error = %e, "Failed to copy all text");
            (false, characters)
        }
    }
}
