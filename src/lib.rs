//! PDF markup extraction using lopdf
//!
//! This crate provides:
//! - Comment extraction: annotation contents paired with the document
//!   text they reference via quadpoint geometry
//! - Highlighted-line detection with enumerated comment association
//!   (yellow / light-blue, distance-thresholded)
//! - Color-grouped highlight spans over the full reference palette
//!
//! Processing is strictly sequential: one document, all pages in order,
//! each run a pure function of the document bytes and the options.

pub mod color;
pub mod comments;
pub mod geometry;
pub mod highlights;
pub mod layout;
pub mod output;
pub mod page;

pub use geometry::Rect;
pub use highlights::HighlightOptions;
pub use output::{CommentRecord, GroupRecord, HighlightRecord};

use lopdf::Document;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Invalid PDF structure")]
    InvalidStructure,
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Parse(e.to_string())
    }
}

/// Extract comment records (annotation content plus referenced text)
/// from a PDF file.
pub fn extract_comments<P: AsRef<Path>>(path: P) -> Result<Vec<CommentRecord>, PdfError> {
    let doc = Document::load(path)?;
    extract_comments_from_doc(&doc)
}

/// Extract comment records from a PDF memory buffer.
pub fn extract_comments_mem(buffer: &[u8]) -> Result<Vec<CommentRecord>, PdfError> {
    let doc = Document::load_mem(buffer)?;
    extract_comments_from_doc(&doc)
}

fn extract_comments_from_doc(doc: &Document) -> Result<Vec<CommentRecord>, PdfError> {
    let pages = page::load_pages(doc)?;
    Ok(comments::comment_records(&pages))
}

/// Run the thresholded pipeline: enumerated comments and raw lines
/// highlighted in the requested colors.
pub fn extract_highlighted_lines<P: AsRef<Path>>(
    path: P,
    options: &HighlightOptions,
) -> Result<Vec<HighlightRecord>, PdfError> {
    let doc = Document::load(path)?;
    extract_highlighted_lines_from_doc(&doc, options)
}

/// Thresholded pipeline over a PDF memory buffer.
pub fn extract_highlighted_lines_mem(
    buffer: &[u8],
    options: &HighlightOptions,
) -> Result<Vec<HighlightRecord>, PdfError> {
    let doc = Document::load_mem(buffer)?;
    extract_highlighted_lines_from_doc(&doc, options)
}

fn extract_highlighted_lines_from_doc(
    doc: &Document,
    options: &HighlightOptions,
) -> Result<Vec<HighlightRecord>, PdfError> {
    let pages = page::load_pages(doc)?;
    Ok(highlights::highlighted_lines(&pages, options))
}

/// Run the palette pipeline: adjacent same-color highlights merged into
/// logical spans with their covered text.
pub fn extract_highlight_groups<P: AsRef<Path>>(path: P) -> Result<Vec<GroupRecord>, PdfError> {
    let doc = Document::load(path)?;
    extract_highlight_groups_from_doc(&doc)
}

/// Palette pipeline over a PDF memory buffer.
pub fn extract_highlight_groups_mem(buffer: &[u8]) -> Result<Vec<GroupRecord>, PdfError> {
    let doc = Document::load_mem(buffer)?;
    extract_highlight_groups_from_doc(&doc)
}

fn extract_highlight_groups_from_doc(doc: &Document) -> Result<Vec<GroupRecord>, PdfError> {
    let pages = page::load_pages(doc)?;
    Ok(highlights::highlight_groups(&pages))
}
