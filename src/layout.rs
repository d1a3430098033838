//! Page text layout extraction.
//!
//! Interprets a page's decoded content stream into positioned text spans
//! (tracking the CTM and text matrices through `BT`/`ET`, `Tf`,
//! `Td`/`TD`/`Tm`/`T*` and the show-text operators), then groups spans
//! into reading-order lines. Geometry is converted from PDF bottom-left
//! coordinates into top-down page coordinates so callers can sort by
//! `(top, left)` directly.
//!
//! lopdf exposes no glyph metrics at this layer, so span widths are
//! estimated from character count and rendered font size.

use crate::geometry::Rect;
use crate::PdfError;
use lopdf::{Document, Object, ObjectId};

/// Fraction of the font size above the baseline.
const ASCENT: f32 = 0.8;
/// Fraction of the font size below the baseline.
const DESCENT: f32 = 0.2;
/// Estimated average glyph width as a fraction of font size.
const WIDTH_FACTOR: f32 = 0.5;
/// Spans on the same baseline within this distance join one line.
const LINE_Y_TOLERANCE: f32 = 3.0;

/// A positioned run of text within a line.
#[derive(Debug, Clone)]
pub struct Span {
    pub text: String,
    pub bbox: Rect,
}

/// One line of page text in top-down coordinates.
#[derive(Debug, Clone)]
pub struct Line {
    /// Span texts concatenated in x order, trimmed.
    pub text: String,
    pub bbox: Rect,
    pub spans: Vec<Span>,
}

/// A raw show-text item in PDF coordinates (baseline origin).
#[derive(Debug, Clone)]
struct RawItem {
    text: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Multiply two 2D transformation matrices in `[a, b, c, d, e, f]` form.
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// Helper to get f32 from a numeric object.
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Compute effective font size from base size and text matrix scale.
fn effective_font_size(base_size: f32, text_matrix: &[f32; 6]) -> f32 {
    let scale_x = (text_matrix[0].powi(2) + text_matrix[1].powi(2)).sqrt();
    let scale_y = (text_matrix[2].powi(2) + text_matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Decode a PDF string: UTF-16BE when BOM-prefixed, Latin-1 otherwise.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn decode_text_operand(obj: &Object) -> Option<String> {
    if let Object::String(bytes, _) = obj {
        Some(decode_pdf_string(bytes))
    } else {
        None
    }
}

/// Extract ordered text lines from one page.
pub fn extract_lines(
    doc: &Document,
    page_id: ObjectId,
    page_height: f32,
) -> Result<Vec<Line>, PdfError> {
    let items = page_text_items(doc, page_id)?;
    Ok(build_lines(items, page_height))
}

/// Run the content-stream interpreter and collect raw show-text items.
fn page_text_items(doc: &Document, page_id: ObjectId) -> Result<Vec<RawItem>, PdfError> {
    use lopdf::content::Content;

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let mut items = Vec::new();

    let mut ctm = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut ctm_stack: Vec<[f32; 6]> = Vec::new();

    let mut current_font_size: f32 = 12.0;
    let mut text_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut in_text_block = false;

    let mut push_item = |text: String, text_matrix: &[f32; 6], ctm: &[f32; 6], size: f32| {
        if text.trim().is_empty() {
            return;
        }
        let rendered_size = effective_font_size(size, text_matrix);
        let combined = multiply_matrices(text_matrix, ctm);
        let (x, y) = (combined[4], combined[5]);
        let width = text.chars().count() as f32 * rendered_size * WIDTH_FACTOR;
        items.push(RawItem {
            text,
            x,
            y,
            width,
            height: rendered_size,
        });
    };

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => ctm_stack.push(ctm),
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    ctm = saved;
                }
            }
            "cm" => {
                if op.operands.len() >= 6 {
                    let new_matrix = [
                        get_number(&op.operands[0]).unwrap_or(1.0),
                        get_number(&op.operands[1]).unwrap_or(0.0),
                        get_number(&op.operands[2]).unwrap_or(0.0),
                        get_number(&op.operands[3]).unwrap_or(1.0),
                        get_number(&op.operands[4]).unwrap_or(0.0),
                        get_number(&op.operands[5]).unwrap_or(0.0),
                    ];
                    ctm = multiply_matrices(&new_matrix, &ctm);
                }
            }
            "BT" => {
                in_text_block = true;
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Some(size) = get_number(&op.operands[1]) {
                        current_font_size = size;
                    }
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    line_matrix[4] += tx;
                    line_matrix[5] += ty;
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        text_matrix[i] =
                            get_number(operand).unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    line_matrix = text_matrix;
                }
            }
            "T*" => {
                // Approximate line height
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
            }
            "Tj" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Some(text) = decode_text_operand(&op.operands[0]) {
                        push_item(text, &text_matrix, &ctm, current_font_size);
                    }
                }
            }
            "TJ" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Ok(array) = op.operands[0].as_array() {
                        let mut combined_text = String::new();
                        for item in array {
                            if let Some(text) = decode_text_operand(item) {
                                combined_text.push_str(&text);
                            }
                        }
                        push_item(combined_text, &text_matrix, &ctm, current_font_size);
                    }
                }
            }
            "'" => {
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
                if let Some(text) = op.operands.first().and_then(decode_text_operand) {
                    push_item(text, &text_matrix, &ctm, current_font_size);
                }
            }
            _ => {}
        }
    }

    Ok(items)
}

/// Group raw items into reading-order lines with top-down bboxes.
fn build_lines(items: Vec<RawItem>, page_height: f32) -> Vec<Line> {
    if items.is_empty() {
        return Vec::new();
    }

    // Merge consecutive items on the same baseline, preserving stream
    // order within the grouping pass.
    let mut groups: Vec<Vec<RawItem>> = Vec::new();
    for item in items {
        let same_line = groups
            .last()
            .and_then(|g| g.last())
            .map_or(false, |last| (last.y - item.y).abs() < LINE_Y_TOLERANCE);
        if same_line {
            groups.last_mut().unwrap().push(item);
        } else {
            groups.push(vec![item]);
        }
    }

    let mut lines: Vec<Line> = Vec::new();
    for mut group in groups {
        group.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        let spans: Vec<Span> = group
            .iter()
            .map(|item| Span {
                text: item.text.clone(),
                bbox: Rect::new(
                    item.x,
                    page_height - (item.y + ASCENT * item.height),
                    item.x + item.width,
                    page_height - (item.y - DESCENT * item.height),
                ),
            })
            .collect();

        let text = join_spans(spans.iter());
        if text.is_empty() {
            continue;
        }

        let bbox = spans
            .iter()
            .skip(1)
            .fold(spans[0].bbox, |acc, s| acc.union(&s.bbox));

        lines.push(Line { text, bbox, spans });
    }

    lines.sort_by(|a, b| {
        (a.bbox.y0, a.bbox.x0)
            .partial_cmp(&(b.bbox.y0, b.bbox.x0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    lines
}

/// Concatenate span texts in x order, inserting a space across gaps
/// wider than a quarter of the span height. Result is trimmed.
fn join_spans<'a, I>(spans: I) -> String
where
    I: Iterator<Item = &'a Span>,
{
    let mut text = String::new();
    let mut prev_right: Option<f32> = None;
    for span in spans {
        if let Some(right) = prev_right {
            let gap = span.bbox.x0 - right;
            if gap > 0.25 * span.bbox.height() && !text.ends_with(' ') {
                text.push(' ');
            }
        }
        text.push_str(&span.text);
        prev_right = Some(span.bbox.x1);
    }
    text.trim().to_string()
}

/// Collect the text a rectangle visually covers, one string per source
/// line in reading order. A span counts as covered when it overlaps the
/// rectangle horizontally and at least half of its height lies inside
/// the rectangle's vertical range.
pub fn clip_text(lines: &[Line], rect: &Rect) -> Vec<String> {
    let mut parts = Vec::new();
    for line in lines {
        let hit: Vec<&Span> = line
            .spans
            .iter()
            .filter(|span| {
                span.bbox.x1 >= rect.x0
                    && span.bbox.x0 <= rect.x1
                    && span.bbox.vertical_overlap(rect) >= 0.5 * span.bbox.height()
            })
            .collect();
        if hit.is_empty() {
            continue;
        }
        let text = join_spans(hit.into_iter());
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts
}
