//! Highlight detection, line coverage, and the two highlight pipelines.
//!
//! The thresholded pipeline associates yellow / light-blue highlights
//! with enumerated comments (and with raw highlighted lines when a
//! highlight touches no comment). The palette pipeline classifies every
//! highlight against the full reference palette and merges adjacent
//! same-color rectangles into logical multi-line groups.

use crate::color::{self, Rgb};
use crate::comments::cluster_comments;
use crate::geometry::{covered_length, merge_intervals, Rect};
use crate::layout::{self, Line};
use crate::output::{GroupRecord, HighlightRecord};
use crate::page::PageData;
use log::debug;
use std::collections::{BTreeSet, HashSet};

/// Coverage ratio below which a line counts as partially highlighted.
const FULL_COVERAGE_RATIO: f32 = 0.95;
/// Trailing shortfall beyond max(6, 10% width) marks unhighlighted text
/// after the highlight.
const TRAILING_MIN_GAP: f32 = 6.0;
const TRAILING_WIDTH_FRACTION: f32 = 0.10;

/// One highlighted region on a page.
#[derive(Debug, Clone)]
pub struct Highlight {
    /// 1-based page number.
    pub page: u32,
    pub rect: Rect,
    pub color: Rgb,
}

/// Options for the thresholded pipeline.
#[derive(Debug, Clone)]
pub struct HighlightOptions {
    /// Requested color names: `"yellow"` and/or `"light-blue"`.
    pub colors: Vec<String>,
    pub yellow_threshold: f32,
    pub light_blue_threshold: f32,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            colors: vec!["yellow".to_string(), "light-blue".to_string()],
            yellow_threshold: color::DEFAULT_THRESHOLD,
            light_blue_threshold: color::DEFAULT_THRESHOLD,
        }
    }
}

/// Collect highlights from every page: annotation colors (fill, falling
/// back to stroke) first, filled drawings only on annotation-free pages.
pub fn collect_highlights(pages: &[PageData]) -> Vec<Highlight> {
    let mut highlights = Vec::new();
    for page in pages {
        for annot in &page.annotations {
            if let Some(color) = annot.fill.or(annot.stroke) {
                highlights.push(Highlight {
                    page: page.number,
                    rect: annot.rect,
                    color,
                });
            }
        }
        if page.annotations.is_empty() {
            for drawing in &page.drawings {
                if let Some(color) = drawing.fill {
                    highlights.push(Highlight {
                        page: page.number,
                        rect: drawing.rect,
                        color,
                    });
                }
            }
        }
    }
    debug!("collected {} highlights", highlights.len());
    highlights
}

/// Per-line highlight coverage, derived from the merged horizontal
/// overlap intervals of every intersecting highlight.
#[derive(Debug, Clone, Copy)]
pub struct LineCoverage {
    /// At least one highlight intersects the line.
    pub highlighted: bool,
    /// Merged coverage falls short of 95% of the line width.
    pub has_unhighlighted_gap: bool,
    /// The rightmost highlighted x leaves more than max(6, 10% of the
    /// line width) of trailing text uncovered.
    pub has_unhighlighted_after: bool,
    /// Rightmost highlighted x coordinate.
    pub highlighted_max_x: f32,
}

/// Compute coverage for one line against a page's highlights.
pub fn line_coverage(line: &Line, highlights: &[Highlight]) -> LineCoverage {
    let mut intervals = Vec::new();
    for h in highlights {
        if h.rect.intersects(&line.bbox) {
            let x0 = h.rect.x0.max(line.bbox.x0);
            let x1 = h.rect.x1.min(line.bbox.x1);
            if x1 >= x0 {
                intervals.push((x0, x1));
            }
        }
    }
    if intervals.is_empty() {
        return LineCoverage {
            highlighted: false,
            has_unhighlighted_gap: false,
            has_unhighlighted_after: false,
            highlighted_max_x: line.bbox.x0,
        };
    }

    let merged = merge_intervals(intervals);
    let covered = covered_length(&merged);
    let width = line.bbox.width();
    let ratio = covered / width.max(1.0);
    let max_x = merged.last().map(|(_, e)| *e).unwrap_or(line.bbox.x0);

    LineCoverage {
        highlighted: true,
        has_unhighlighted_gap: ratio < FULL_COVERAGE_RATIO,
        has_unhighlighted_after: (line.bbox.x1 - max_x)
            > TRAILING_MIN_GAP.max(TRAILING_WIDTH_FRACTION * width),
        highlighted_max_x: max_x,
    }
}

/// Thresholded pipeline: enumerated comments tagged with the requested
/// colors, plus raw highlighted lines for highlights touching no
/// comment. De-duplicated on `(page, comment-or-none, text)`.
pub fn highlighted_lines(pages: &[PageData], options: &HighlightOptions) -> Vec<HighlightRecord> {
    let highlights = collect_highlights(pages);
    let want_yellow = options.colors.iter().any(|c| c == "yellow");
    let want_light_blue = options.colors.iter().any(|c| c == "light-blue");

    let mut records = Vec::new();
    let mut seen: HashSet<(u32, Option<String>, String)> = HashSet::new();

    for page in pages {
        let comments = cluster_comments(&page.lines);
        let page_highlights: Vec<&Highlight> = highlights
            .iter()
            .filter(|h| h.page == page.number)
            .collect();

        for comment in &comments {
            let mut labels: BTreeSet<&'static str> = BTreeSet::new();
            for h in &page_highlights {
                for &idx in &comment.lines {
                    if page.lines[idx].bbox.intersects(&h.rect) {
                        if want_yellow
                            && color::matches(h.color, color::YELLOW, options.yellow_threshold)
                        {
                            labels.insert("yellow");
                        }
                        if want_light_blue
                            && color::matches(
                                h.color,
                                color::LIGHT_BLUE,
                                options.light_blue_threshold,
                            )
                        {
                            labels.insert("light blue");
                        }
                        break;
                    }
                }
            }
            if labels.is_empty() {
                continue;
            }
            let record = HighlightRecord {
                page: page.number,
                comment: Some(comment.num.clone()),
                colors: labels.iter().map(|l| l.to_string()).collect(),
                text: comment.text.clone(),
            };
            let key = (record.page, record.comment.clone(), record.text.clone());
            if seen.insert(key) {
                records.push(record);
            }
        }

        // Highlighted lines that are not part of any enumerated comment.
        for h in &page_highlights {
            let touches_comment = comments.iter().any(|c| {
                c.lines
                    .iter()
                    .any(|&idx| page.lines[idx].bbox.intersects(&h.rect))
            });
            if touches_comment {
                continue;
            }

            let mut colors = Vec::new();
            if want_yellow && color::matches(h.color, color::YELLOW, options.yellow_threshold) {
                colors.push("yellow".to_string());
            }
            if want_light_blue
                && color::matches(h.color, color::LIGHT_BLUE, options.light_blue_threshold)
            {
                colors.push("light blue".to_string());
            }
            if colors.is_empty() {
                continue;
            }

            for text in layout::clip_text(&page.lines, &h.rect) {
                let key = (page.number, None, text.clone());
                if seen.insert(key) {
                    records.push(HighlightRecord {
                        page: page.number,
                        comment: None,
                        colors: colors.clone(),
                        text,
                    });
                }
            }
        }
    }
    records
}

/// A highlight covers a line when they overlap horizontally and at least
/// half of the shorter vertical extent lies inside the highlight. Plain
/// closed intersection would absorb a neighboring line whose bbox the
/// highlight merely touches.
fn covers_line(rect: &Rect, line: &Line) -> bool {
    rect.x1 >= line.bbox.x0
        && rect.x0 <= line.bbox.x1
        && rect.vertical_overlap(&line.bbox) >= 0.5 * line.bbox.height().min(rect.height())
}

/// Merge heuristic for two highlight rectangles of the same classified
/// color. `prev` is always the most recently merged rectangle of the
/// open group, never the group's union bbox: comparing against the union
/// would let the tolerated gap grow across long multi-line chains.
fn should_merge_rects(
    prev: &Rect,
    cand: &Rect,
    lines: &[Line],
    coverage: &[LineCoverage],
) -> bool {
    let prev_h = prev.height().max(1.0);

    let same_line =
        prev.vertical_overlap(cand) > 0.0 || (cand.y0 - prev.y0).abs() <= 0.5 * prev_h;
    if same_line {
        return prev.horizontal_gap(cand) <= 6.0f32.max(0.6 * prev_h);
    }

    if prev.vertical_gap(cand) > 4.0f32.max(0.8 * prev_h) {
        return false;
    }

    // A partially highlighted line between the two rectangles means the
    // highlight span ended there.
    let lo = prev.y0.min(cand.y0);
    let hi = prev.y0.max(cand.y0);
    let start = lines.partition_point(|l| l.bbox.y0 <= lo);
    for (line, cov) in lines[start..].iter().zip(&coverage[start..]) {
        if line.bbox.y0 >= hi {
            break;
        }
        if cov.has_unhighlighted_after {
            return false;
        }
    }
    true
}

struct OpenGroup {
    color: &'static str,
    bbox: Rect,
    /// Most recently merged rectangle; merge decisions compare against
    /// this, not against `bbox`.
    last: Rect,
    line_idx: BTreeSet<usize>,
}

/// Palette pipeline: classify every highlight, keep those covering at
/// least one text line, and fold adjacent same-color rectangles into
/// groups. De-duplicated on `(page, text)`.
pub fn highlight_groups(pages: &[PageData]) -> Vec<GroupRecord> {
    let highlights = collect_highlights(pages);
    let mut records = Vec::new();
    let mut seen: HashSet<(u32, String)> = HashSet::new();

    for page in pages {
        let coverage: Vec<LineCoverage> = {
            let page_highlights: Vec<Highlight> = highlights
                .iter()
                .filter(|h| h.page == page.number)
                .cloned()
                .collect();
            page.lines
                .iter()
                .map(|line| line_coverage(line, &page_highlights))
                .collect()
        };

        // Classified highlights that cover at least one text line.
        let mut spans: Vec<(Rect, &'static str, Vec<usize>)> = highlights
            .iter()
            .filter(|h| h.page == page.number)
            .filter_map(|h| {
                let covered: Vec<usize> = page
                    .lines
                    .iter()
                    .enumerate()
                    .filter(|(_, line)| covers_line(&h.rect, line))
                    .map(|(idx, _)| idx)
                    .collect();
                if covered.is_empty() {
                    None
                } else {
                    Some((h.rect, color::classify(h.color), covered))
                }
            })
            .collect();

        spans.sort_by(|a, b| {
            (a.0.y0, a.0.x0)
                .partial_cmp(&(b.0.y0, b.0.x0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut open: Option<OpenGroup> = None;
        for (rect, label, covered) in spans {
            let merged = match open.as_mut() {
                Some(group)
                    if group.color == label
                        && should_merge_rects(&group.last, &rect, &page.lines, &coverage) =>
                {
                    group.bbox = group.bbox.union(&rect);
                    group.last = rect;
                    group.line_idx.extend(covered.iter().copied());
                    true
                }
                _ => false,
            };
            if !merged {
                if let Some(group) = open.take() {
                    finish_group(page, group, &mut seen, &mut records);
                }
                open = Some(OpenGroup {
                    color: label,
                    bbox: rect,
                    last: rect,
                    line_idx: covered.into_iter().collect(),
                });
            }
        }
        if let Some(group) = open.take() {
            finish_group(page, group, &mut seen, &mut records);
        }
    }
    records
}

fn finish_group(
    page: &PageData,
    group: OpenGroup,
    seen: &mut HashSet<(u32, String)>,
    records: &mut Vec<GroupRecord>,
) {
    let text = group
        .line_idx
        .iter()
        .map(|&idx| page.lines[idx].text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return;
    }
    if seen.insert((page.number, text.clone())) {
        records.push(GroupRecord {
            page: page.number,
            colors: vec![group.color.to_string()],
            text,
        });
    }
}
