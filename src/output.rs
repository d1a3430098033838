//! Result records and their plain-text / JSON renderings.

use crate::PdfError;
use serde::{Deserialize, Serialize};

/// One content-bearing annotation with the document text it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// 1-based page number.
    pub page: u32,
    /// Underlying document text covered by the annotation.
    pub reference: String,
    /// The annotation's own authored content.
    pub text: String,
}

/// One enumerated comment (or raw highlighted line) from the thresholded
/// pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRecord {
    pub page: u32,
    /// Comment number, or `None` for a raw highlighted line.
    pub comment: Option<String>,
    pub colors: Vec<String>,
    pub text: String,
}

/// One merged highlight group from the palette pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub page: u32,
    pub colors: Vec<String>,
    pub text: String,
}

/// Pretty-printed JSON array (2-space indent).
pub fn to_json<T: Serialize>(records: &[T]) -> Result<String, PdfError> {
    serde_json::to_string_pretty(records).map_err(|e| PdfError::Parse(e.to_string()))
}

/// Numbered human-readable blocks, one per comment record.
pub fn render_comments_text(records: &[CommentRecord]) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "{}. Page: {}, Reference: \"{}\"\n",
            i + 1,
            record.page,
            record.reference
        ));
        out.push_str(&format!("Comment: \"{}\"\n", record.text));
        if i + 1 != records.len() {
            out.push('\n');
        }
    }
    out
}

/// `page P comment N colors C` blocks separated by `---` markers.
pub fn render_highlights_text(records: &[HighlightRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let comment = record.comment.as_deref().unwrap_or("n/a");
        out.push_str(&format!(
            "page {} comment {} colors {}\n",
            record.page,
            comment,
            record.colors.join(", ")
        ));
        out.push_str(&record.text);
        out.push_str("\n---\n");
    }
    out
}

/// Grouped form of the highlight rendering, without comment numbers.
pub fn render_groups_text(records: &[GroupRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "page {} colors {}\n",
            record.page,
            record.colors.join(", ")
        ));
        out.push_str(&record.text);
        out.push_str("\n---\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_comments_text_numbered_blocks() {
        let records = vec![
            CommentRecord {
                page: 1,
                reference: "quoted span".to_string(),
                text: "fix this".to_string(),
            },
            CommentRecord {
                page: 2,
                reference: "other".to_string(),
                text: "and this".to_string(),
            },
        ];
        let text = render_comments_text(&records);
        assert_eq!(
            text,
            "1. Page: 1, Reference: \"quoted span\"\nComment: \"fix this\"\n\n\
             2. Page: 2, Reference: \"other\"\nComment: \"and this\"\n"
        );
    }

    #[test]
    fn test_render_highlights_text_uses_na_for_missing_comment() {
        let records = vec![HighlightRecord {
            page: 3,
            comment: None,
            colors: vec!["yellow".to_string(), "light blue".to_string()],
            text: "a line".to_string(),
        }];
        let text = render_highlights_text(&records);
        assert_eq!(text, "page 3 comment n/a colors yellow, light blue\na line\n---\n");
    }

    #[test]
    fn test_json_round_trip() {
        let records = vec![GroupRecord {
            page: 1,
            colors: vec!["yellow".to_string()],
            text: "Hello world".to_string(),
        }];
        let json = to_json(&records).unwrap();
        assert!(json.contains("  \"page\": 1"));
        let parsed: Vec<GroupRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_json_null_comment() {
        let records = vec![HighlightRecord {
            page: 1,
            comment: None,
            colors: vec!["yellow".to_string()],
            text: "t".to_string(),
        }];
        let json = to_json(&records).unwrap();
        assert!(json.contains("\"comment\": null"));
    }
}
