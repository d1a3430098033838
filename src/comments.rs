//! Enumerated comment clustering and the comment-reference pipeline.

use crate::geometry::{self, Rect};
use crate::layout::{self, Line};
use crate::output::CommentRecord;
use crate::page::{Annotation, PageData};
use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s*").unwrap());

/// A paragraph of consecutive lines opened by a `"<N>. ..."` line.
#[derive(Debug, Clone)]
pub struct Comment {
    /// The captured leading integer, as text.
    pub num: String,
    /// Indices into the page's line sequence, in order.
    pub lines: Vec<usize>,
    /// Space-joined concatenation of the constituent line texts.
    pub text: String,
}

/// Cluster a page's sorted lines into enumerated comments.
///
/// A line matching the leading-integer-dot pattern always starts a new
/// comment, flushing the open one; non-matching lines append to the open
/// comment and are dropped when none is open yet.
pub fn cluster_comments(lines: &[Line]) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut current: Option<Comment> = None;

    for (idx, line) in lines.iter().enumerate() {
        if let Some(caps) = COMMENT_PATTERN.captures(&line.text) {
            if let Some(open) = current.take() {
                comments.push(open);
            }
            current = Some(Comment {
                num: caps[1].to_string(),
                lines: vec![idx],
                text: line.text.clone(),
            });
        } else if let Some(open) = current.as_mut() {
            open.lines.push(idx);
            open.text.push(' ');
            open.text.push_str(&line.text);
        }
    }
    if let Some(open) = current {
        comments.push(open);
    }
    comments
}

/// The exact document text an annotation visually covers: quad-derived
/// rectangles (falling back to the annotation's own rectangle), each
/// clipped against the page text, right-trimmed and newline-joined.
pub fn extract_reference(lines: &[Line], annot: &Annotation) -> String {
    let rects: Vec<Rect> = match &annot.quads {
        Some(points) => {
            let rects = geometry::quads_to_rects(points);
            if rects.is_empty() {
                vec![annot.rect]
            } else {
                rects
            }
        }
        None => vec![annot.rect],
    };

    let mut parts = Vec::new();
    for rect in &rects {
        let text = layout::clip_text(lines, rect).join("\n");
        let text = text.trim_end();
        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }
    parts.join("\n").trim_end().to_string()
}

/// Comment-reference pipeline: one record per content-bearing annotation,
/// in encounter order.
pub fn comment_records(pages: &[PageData]) -> Vec<CommentRecord> {
    let mut records = Vec::new();
    for page in pages {
        for annot in &page.annotations {
            let content = match &annot.contents {
                Some(text) if !text.is_empty() => text.clone(),
                _ => continue,
            };
            records.push(CommentRecord {
                page: page.number,
                reference: extract_reference(&page.lines, annot),
                text: content,
            });
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Span;

    fn line(text: &str, y0: f32) -> Line {
        let bbox = Rect::new(72.0, y0, 72.0 + text.len() as f32 * 6.0, y0 + 12.0);
        Line {
            text: text.to_string(),
            bbox,
            spans: vec![Span {
                text: text.to_string(),
                bbox,
            }],
        }
    }

    #[test]
    fn test_cluster_two_comments_with_continuation() {
        let lines = vec![
            line("1. Foo", 100.0),
            line("continued", 114.0),
            line("2. Bar", 128.0),
        ];
        let comments = cluster_comments(&lines);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].num, "1");
        assert_eq!(comments[0].text, "1. Foo continued");
        assert_eq!(comments[0].lines, vec![0, 1]);
        assert_eq!(comments[1].num, "2");
        assert_eq!(comments[1].text, "2. Bar");
    }

    #[test]
    fn test_cluster_drops_lines_before_first_match() {
        let lines = vec![
            line("preamble", 80.0),
            line("3. Start", 100.0),
            line("tail", 114.0),
        ];
        let comments = cluster_comments(&lines);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].num, "3");
        assert_eq!(comments[0].text, "3. Start tail");
    }

    #[test]
    fn test_cluster_match_always_starts_new_comment() {
        let lines = vec![line("1. One", 100.0), line("2. Two", 114.0)];
        let comments = cluster_comments(&lines);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].lines.len(), 1);
    }

    #[test]
    fn test_cluster_no_matches_yields_nothing() {
        let lines = vec![line("plain", 100.0), line("text", 114.0)];
        assert!(cluster_comments(&lines).is_empty());
    }

    #[test]
    fn test_extract_reference_falls_back_to_annotation_rect() {
        let lines = vec![line("target text", 100.0)];
        let annot = Annotation {
            rect: Rect::new(70.0, 98.0, 200.0, 114.0),
            quads: None,
            contents: Some("note".to_string()),
            stroke: None,
            fill: None,
        };
        assert_eq!(extract_reference(&lines, &annot), "target text");
    }

    #[test]
    fn test_extract_reference_joins_quad_rects_with_newlines() {
        let lines = vec![line("first", 100.0), line("second", 120.0)];
        // One quad per line, given bottom-most first to exercise sorting.
        let quads = vec![
            (70.0, 118.0),
            (200.0, 118.0),
            (70.0, 134.0),
            (200.0, 134.0),
            (70.0, 98.0),
            (200.0, 98.0),
            (70.0, 114.0),
            (200.0, 114.0),
        ];
        let annot = Annotation {
            rect: Rect::new(70.0, 98.0, 200.0, 134.0),
            quads: Some(quads),
            contents: None,
            stroke: None,
            fill: None,
        };
        assert_eq!(extract_reference(&lines, &annot), "first\nsecond");
    }
}
