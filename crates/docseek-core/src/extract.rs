//! Text extraction and chunking
//!
//! Plain text, source code and markup are read directly, notebooks are
//! flattened to their cell sources, and PDF/DOCX documents go through their
//! format readers. Extracted text is split on paragraph boundaries into
//! chunks of bounded size.

use std::path::Path;
use std::sync::LazyLock;

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};
use regex::Regex;

use crate::{DocseekError, Result};

/// Extensions read as UTF-8 text
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "java", "cpp", "c", "ts", "html", "css", "json", "xml",
];

/// Document formats that need a dedicated reader
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "ipynb"];

/// Paragraph separator: a blank line, possibly containing whitespace
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Check if a file extension indicates a text file.
pub fn is_text_extension(ext: &str) -> bool {
    TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Check if a file has an extension we know how to extract.
pub fn is_supported(path: &Path) -> bool {
    let ext = extension(path);
    is_text_extension(&ext) || DOCUMENT_EXTENSIONS.contains(&ext.as_str())
}

/// Extract text content from a file, returning an empty string on failure.
///
/// Failures are logged; callers treat an empty result as "nothing to index".
pub fn extract_text(path: &Path) -> String {
    match try_extract_text(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Error reading {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Extract text content from a file.
///
/// Unsupported extensions yield an empty string rather than an error.
pub fn try_extract_text(path: &Path) -> Result<String> {
    let ext = extension(path);
    match ext.as_str() {
        "pdf" => extract_pdf(path),
        "docx" => extract_docx(path),
        "ipynb" => extract_notebook(path),
        e if is_text_extension(e) => {
            let bytes = std::fs::read(path)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Ok(String::new()),
    }
}

/// Extract text page by page, separating pages with a blank line.
fn extract_pdf(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| DocseekError::Extract(e.to_string()))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        let text = doc
            .extract_text(&[*page_number])
            .map_err(|e| DocseekError::Extract(format!("page {page_number}: {e}")))?;
        pages.push(text);
    }

    Ok(pages.join("\n\n"))
}

/// Extract the non-blank paragraphs of a Word document.
fn extract_docx(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| DocseekError::Extract(e.to_string()))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

/// Extract code and markdown cell sources from a Jupyter notebook.
fn extract_notebook(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    let notebook: serde_json::Value = serde_json::from_str(&content)?;

    let cells = notebook
        .get("cells")
        .and_then(|c| c.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let sources: Vec<String> = cells
        .iter()
        .filter(|cell| {
            matches!(
                cell.get("cell_type").and_then(|t| t.as_str()),
                Some("code" | "markdown")
            )
        })
        .map(|cell| match cell.get("source") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(lines)) => {
                lines.iter().filter_map(|l| l.as_str()).collect()
            }
            _ => String::new(),
        })
        .collect();

    Ok(sources.join("\n\n"))
}

/// Split text into chunks on paragraph boundaries.
///
/// Paragraphs are joined with a single space while the chunk stays within
/// `max_chars` characters. A paragraph longer than the budget on its own
/// becomes a single oversized chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for para in PARAGRAPH_BREAK.split(text) {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }
        let para_len = para.chars().count();

        if current.is_empty() {
            current.push_str(para);
            current_len = para_len;
        } else if current_len + 1 + para_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(para);
            current_len = para_len;
        } else {
            current.push(' ');
            current.push_str(para);
            current_len += 1 + para_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
