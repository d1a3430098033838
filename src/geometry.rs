//! Rectangle and interval arithmetic shared by both extraction pipelines.
//!
//! All rectangles are axis-aligned in top-down page coordinates:
//! `y0` is the top edge and `y1` the bottom edge, so sorting by
//! `(y0, x0)` gives reading order.

/// An axis-aligned rectangle with `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Create a rectangle, normalizing corner order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Closed-interval intersection test: rectangles sharing only a
    /// boundary edge still intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x1 < other.x0 || other.x1 < self.x0 || self.y1 < other.y0 || other.y1 < self.y0)
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Vertical extent shared with `other` (negative when disjoint).
    pub fn vertical_overlap(&self, other: &Rect) -> f32 {
        self.y1.min(other.y1) - self.y0.max(other.y0)
    }

    /// Horizontal distance between `self` and `other`, zero when they
    /// overlap on the x axis.
    pub fn horizontal_gap(&self, other: &Rect) -> f32 {
        (other.x0 - self.x1).max(self.x0 - other.x1).max(0.0)
    }

    /// Vertical distance between `self` and `other`, zero when they
    /// overlap on the y axis.
    pub fn vertical_gap(&self, other: &Rect) -> f32 {
        (other.y0 - self.y1).max(self.y0 - other.y1).max(0.0)
    }
}

/// Convert a flat quad-vertex list (stride 4 per quad) into one covering
/// rectangle per quad, sorted by `(top, left)`.
pub fn quads_to_rects(points: &[(f32, f32)]) -> Vec<Rect> {
    let mut rects: Vec<Rect> = points
        .chunks_exact(4)
        .map(|quad| {
            let xs = quad.iter().map(|p| p.0);
            let ys = quad.iter().map(|p| p.1);
            Rect {
                x0: xs.clone().fold(f32::INFINITY, f32::min),
                y0: ys.clone().fold(f32::INFINITY, f32::min),
                x1: xs.fold(f32::NEG_INFINITY, f32::max),
                y1: ys.fold(f32::NEG_INFINITY, f32::max),
            }
        })
        .collect();

    rects.sort_by(|a, b| {
        (a.y0, a.x0)
            .partial_cmp(&(b.y0, b.x0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rects
}

/// Merge overlapping or touching `(x0, x1)` intervals, returning the
/// merged set sorted by start.
pub fn merge_intervals(mut intervals: Vec<(f32, f32)>) -> Vec<(f32, f32)> {
    intervals.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<(f32, f32)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Total length covered by a merged interval set.
pub fn covered_length(merged: &[(f32, f32)]) -> f32 {
    merged.iter().map(|(s, e)| e - s).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_corners() {
        let r = Rect::new(10.0, 20.0, 5.0, 2.0);
        assert_eq!(r, Rect::new(5.0, 2.0, 10.0, 20.0));
        assert_eq!(r.width(), 5.0);
        assert_eq!(r.height(), 18.0);
    }

    #[test]
    fn test_intersects_symmetric() {
        let pairs = [
            (Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(5.0, 5.0, 15.0, 15.0)),
            (Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(20.0, 20.0, 30.0, 30.0)),
            (Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(10.0, 0.0, 20.0, 10.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(a.intersects(&b), b.intersects(&a));
        }
    }

    #[test]
    fn test_intersects_closed_on_shared_edge() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersects(&b));

        let c = Rect::new(0.0, 10.0, 10.0, 20.0);
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_intersects_disjoint() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.5, 0.0, 20.0, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_quads_to_rects_sorted_by_top_left() {
        // Two quads given bottom-most first; output must be top-first.
        let points = vec![
            (72.0, 50.0),
            (140.0, 50.0),
            (72.0, 62.0),
            (140.0, 62.0),
            (72.0, 20.0),
            (140.0, 20.0),
            (72.0, 32.0),
            (140.0, 32.0),
        ];
        let rects = quads_to_rects(&points);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0], Rect::new(72.0, 20.0, 140.0, 32.0));
        assert_eq!(rects[1], Rect::new(72.0, 50.0, 140.0, 62.0));
    }

    #[test]
    fn test_quads_to_rects_ignores_trailing_partial_quad() {
        let points = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        assert!(quads_to_rects(&points).is_empty());
    }

    #[test]
    fn test_merge_intervals_overlapping_and_touching() {
        let merged = merge_intervals(vec![(5.0, 10.0), (0.0, 5.0), (12.0, 14.0)]);
        assert_eq!(merged, vec![(0.0, 10.0), (12.0, 14.0)]);
        assert_eq!(covered_length(&merged), 12.0);
    }

    #[test]
    fn test_merge_intervals_contained() {
        let merged = merge_intervals(vec![(0.0, 20.0), (5.0, 10.0)]);
        assert_eq!(merged, vec![(0.0, 20.0)]);
    }

    #[test]
    fn test_gaps() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(13.0, 0.0, 20.0, 10.0);
        assert_eq!(a.horizontal_gap(&b), 3.0);
        assert_eq!(b.horizontal_gap(&a), 3.0);
        assert_eq!(a.vertical_gap(&b), 0.0);

        let below = Rect::new(0.0, 15.0, 10.0, 25.0);
        assert_eq!(a.vertical_gap(&below), 5.0);
        assert_eq!(below.vertical_gap(&a), 5.0);
    }
}
