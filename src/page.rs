//! Per-page document model over lopdf.
//!
//! Walks each page's `/Annots` array into annotation records (rectangle,
//! quad points, authored contents, stroke `/C` and interior `/IC`
//! colors) and, for pages without annotations, scans the content stream
//! for filled rectangle drawings. All geometry is converted into
//! top-down page coordinates using the page's (inheritable) `/MediaBox`.

use crate::color::Rgb;
use crate::geometry::Rect;
use crate::layout::{self, Line};
use crate::PdfError;
use log::{debug, warn};
use lopdf::{Document, Dictionary, Object, ObjectId};

/// A read-only markup annotation.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Bounding rectangle (top-down coordinates).
    pub rect: Rect,
    /// Quad vertices for text markup annotations, flattened point list
    /// with stride 4 per quad. Top-down coordinates.
    pub quads: Option<Vec<(f32, f32)>>,
    /// Authored free-text content (`/Contents`).
    pub contents: Option<String>,
    /// Stroke color (`/C`).
    pub stroke: Option<Rgb>,
    /// Interior/fill color (`/IC`).
    pub fill: Option<Rgb>,
}

/// A filled vector shape, used as a highlight source only on pages that
/// carry no annotations.
#[derive(Debug, Clone)]
pub struct Drawing {
    pub rect: Rect,
    pub fill: Option<Rgb>,
}

/// One processed page: ordered text lines plus markup sources.
#[derive(Debug)]
pub struct PageData {
    /// 1-based page number.
    pub number: u32,
    pub lines: Vec<Line>,
    pub annotations: Vec<Annotation>,
    /// Populated only when `annotations` is empty.
    pub drawings: Vec<Drawing>,
}

/// Load every page of the document, strictly in order.
pub fn load_pages(doc: &Document) -> Result<Vec<PageData>, PdfError> {
    let mut pages = Vec::new();
    for (&number, &page_id) in doc.get_pages().iter() {
        let height = page_height(doc, page_id);
        let lines = layout::extract_lines(doc, page_id, height)?;
        let annotations = page_annotations(doc, page_id, height);
        let drawings = if annotations.is_empty() {
            page_drawings(doc, page_id, height)?
        } else {
            Vec::new()
        };
        debug!(
            "page {}: {} lines, {} annotations, {} drawings",
            number,
            lines.len(),
            annotations.len(),
            drawings.len()
        );
        pages.push(PageData {
            number,
            lines,
            annotations,
            drawings,
        });
    }
    Ok(pages)
}

/// Resolve the page height from `/MediaBox`, walking the `/Parent` chain
/// for inherited values. US Letter height when absent.
fn page_height(doc: &Document, page_id: ObjectId) -> f32 {
    let mut current = page_id;
    for _ in 0..16 {
        let dict = match doc.get_dictionary(current) {
            Ok(d) => d,
            Err(_) => break,
        };
        if let Ok(mb) = dict.get(b"MediaBox") {
            if let Some(values) = numbers(resolve(doc, mb)) {
                if values.len() >= 4 {
                    return values[3] - values[1];
                }
            }
        }
        match dict.get(b"Parent").and_then(|p| p.as_reference()) {
            Ok(parent) => current = parent,
            Err(_) => break,
        }
    }
    792.0
}

/// Follow a reference one level; non-references pass through.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    if let Ok(id) = obj.as_reference() {
        doc.get_object(id).unwrap_or(obj)
    } else {
        obj
    }
}

/// Read a numeric array (resolving one level of indirection).
fn numbers(obj: &Object) -> Option<Vec<f32>> {
    let array = obj.as_array().ok()?;
    let values: Vec<f32> = array.iter().filter_map(layout::get_number).collect();
    if values.len() == array.len() {
        Some(values)
    } else {
        None
    }
}

fn color_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Rgb> {
    let values = numbers(resolve(doc, dict.get(key).ok()?))?;
    match values.len() {
        3 => Some([values[0], values[1], values[2]]),
        1 => Some([values[0], values[0], values[0]]),
        _ => None,
    }
}

/// Convert a PDF-space rectangle array `[x0 y0 x1 y1]` to top-down.
fn rect_from_values(values: &[f32], page_height: f32) -> Rect {
    Rect::new(
        values[0],
        page_height - values[3],
        values[2],
        page_height - values[1],
    )
}

/// Enumerate the page's annotations. Malformed entries are skipped with
/// a warning rather than failing the run.
fn page_annotations(doc: &Document, page_id: ObjectId, page_height: f32) -> Vec<Annotation> {
    let annots = match doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|dict| dict.get(b"Annots").ok())
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
    {
        Some(array) => array,
        None => return Vec::new(),
    };

    let mut result = Vec::new();
    for entry in annots {
        let dict = match resolve(doc, entry).as_dict() {
            Ok(d) => d,
            Err(_) => {
                warn!("skipping non-dictionary /Annots entry");
                continue;
            }
        };

        let rect = match dict
            .get(b"Rect")
            .ok()
            .map(|obj| resolve(doc, obj))
            .and_then(numbers)
        {
            Some(values) if values.len() >= 4 => rect_from_values(&values, page_height),
            _ => {
                warn!("skipping annotation without a usable /Rect");
                continue;
            }
        };

        let quads = dict
            .get(b"QuadPoints")
            .ok()
            .map(|obj| resolve(doc, obj))
            .and_then(numbers)
            .map(|values| {
                values
                    .chunks_exact(2)
                    .map(|pair| (pair[0], page_height - pair[1]))
                    .collect::<Vec<_>>()
            })
            .filter(|points| !points.is_empty());

        let contents = match dict.get(b"Contents").ok().map(|obj| resolve(doc, obj)) {
            Some(Object::String(bytes, _)) => {
                let text = layout::decode_pdf_string(bytes);
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            _ => None,
        };

        result.push(Annotation {
            rect,
            quads,
            contents,
            stroke: color_entry(doc, dict, b"C"),
            fill: color_entry(doc, dict, b"IC"),
        });
    }
    result
}

/// Scan the content stream for filled rectangle paths, tracking the CTM
/// and the non-stroking color (`rg`, `g`, `k`, and 3-operand `sc`/`scn`).
fn page_drawings(
    doc: &Document,
    page_id: ObjectId,
    page_height: f32,
) -> Result<Vec<Drawing>, PdfError> {
    use lopdf::content::Content;

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let mut drawings = Vec::new();

    let mut ctm = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut ctm_stack: Vec<([f32; 6], Option<Rgb>)> = Vec::new();
    let mut fill: Option<Rgb> = None;
    let mut pending: Vec<Rect> = Vec::new();

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => ctm_stack.push((ctm, fill)),
            "Q" => {
                if let Some((saved_ctm, saved_fill)) = ctm_stack.pop() {
                    ctm = saved_ctm;
                    fill = saved_fill;
                }
            }
            "cm" => {
                if op.operands.len() >= 6 {
                    let mut m = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        m[i] = layout::get_number(operand)
                            .unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    ctm = [
                        m[0] * ctm[0] + m[1] * ctm[2],
                        m[0] * ctm[1] + m[1] * ctm[3],
                        m[2] * ctm[0] + m[3] * ctm[2],
                        m[2] * ctm[1] + m[3] * ctm[3],
                        m[4] * ctm[0] + m[5] * ctm[2] + ctm[4],
                        m[4] * ctm[1] + m[5] * ctm[3] + ctm[5],
                    ];
                }
            }
            "rg" => {
                if let Some(c) = rgb_operands(&op.operands, 3) {
                    fill = Some(c);
                }
            }
            "g" => {
                if let Some(v) = op.operands.first().and_then(layout::get_number) {
                    fill = Some([v, v, v]);
                }
            }
            "k" => {
                if op.operands.len() >= 4 {
                    let v: Vec<f32> = op
                        .operands
                        .iter()
                        .take(4)
                        .filter_map(layout::get_number)
                        .collect();
                    if v.len() == 4 {
                        let (c, m, y, k) = (v[0], v[1], v[2], v[3]);
                        fill = Some([
                            (1.0 - c) * (1.0 - k),
                            (1.0 - m) * (1.0 - k),
                            (1.0 - y) * (1.0 - k),
                        ]);
                    }
                }
            }
            "sc" | "scn" => {
                // Only plain 3-component colors; patterns are ignored.
                if let Some(c) = rgb_operands(&op.operands, 3) {
                    fill = Some(c);
                }
            }
            "re" => {
                if op.operands.len() >= 4 {
                    let v: Vec<f32> = op
                        .operands
                        .iter()
                        .take(4)
                        .filter_map(layout::get_number)
                        .collect();
                    if v.len() == 4 {
                        pending.push(transformed_rect(v[0], v[1], v[2], v[3], &ctm, page_height));
                    }
                }
            }
            // Fill (and fill-and-stroke) path-painting operators.
            "f" | "F" | "f*" | "b" | "B" | "b*" | "B*" => {
                for rect in pending.drain(..) {
                    drawings.push(Drawing { rect, fill });
                }
            }
            // Stroke-only or no-op painting ends the path without a fill.
            "S" | "s" | "n" => pending.clear(),
            _ => {}
        }
    }

    Ok(drawings)
}

fn rgb_operands(operands: &[Object], n: usize) -> Option<Rgb> {
    if operands.len() != n {
        return None;
    }
    let v: Vec<f32> = operands.iter().filter_map(layout::get_number).collect();
    if v.len() == 3 {
        Some([v[0], v[1], v[2]])
    } else {
        None
    }
}

/// Transform a `re` rectangle through the CTM and flip to top-down
/// coordinates, taking the bbox of the four transformed corners.
fn transformed_rect(x: f32, y: f32, w: f32, h: f32, ctm: &[f32; 6], page_height: f32) -> Rect {
    let corners = [(x, y), (x + w, y), (x, y + h), (x + w, y + h)];
    let mut xs = [0.0f32; 4];
    let mut ys = [0.0f32; 4];
    for (i, (cx, cy)) in corners.iter().enumerate() {
        xs[i] = ctm[0] * cx + ctm[2] * cy + ctm[4];
        ys[i] = ctm[1] * cx + ctm[3] * cy + ctm[5];
    }
    let x0 = xs.iter().copied().fold(f32::INFINITY, f32::min);
    let x1 = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let y_min = ys.iter().copied().fold(f32::INFINITY, f32::min);
    let y_max = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    Rect::new(x0, page_height - y_max, x1, page_height - y_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformed_rect_identity_flips_y() {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let rect = transformed_rect(10.0, 700.0, 100.0, 14.0, &identity, 792.0);
        assert_eq!(rect, Rect::new(10.0, 78.0, 110.0, 92.0));
    }

    #[test]
    fn test_transformed_rect_translation() {
        let translate = [1.0, 0.0, 0.0, 1.0, 5.0, -10.0];
        let rect = transformed_rect(0.0, 0.0, 10.0, 10.0, &translate, 100.0);
        assert_eq!(rect, Rect::new(5.0, 100.0, 15.0, 110.0));
    }

    #[test]
    fn test_rect_from_values() {
        // PDF rect [72, 700, 200, 720] on a 792pt page.
        let rect = rect_from_values(&[72.0, 700.0, 200.0, 720.0], 792.0);
        assert_eq!(rect, Rect::new(72.0, 72.0, 200.0, 92.0));
    }
}
