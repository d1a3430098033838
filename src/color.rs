//! Highlight color classification.
//!
//! Two intentionally different policies, one per pipeline:
//!
//! - `classify` maps any RGB triple to the nearest entry of a fixed
//!   eight-color palette and never rejects, so the grouping pipeline can
//!   label every highlight it sees.
//! - `matches` is the thresholded membership test used by the enumerated
//!   comment pipeline: a color belongs to a target only within a
//!   caller-configurable distance, and may match several targets at once.

/// An RGB triple with components in `[0, 1]`.
pub type Rgb = [f32; 3];

pub const YELLOW: Rgb = [1.0, 1.0, 0.0];
pub const LIGHT_BLUE: Rgb = [0.6, 0.8, 1.0];

/// Default distance threshold for the thresholded membership test.
pub const DEFAULT_THRESHOLD: f32 = 0.35;

/// Reference palette for nearest-label classification. Declaration order
/// is the tie-break order and must stay fixed.
pub const PALETTE: [(&str, Rgb); 8] = [
    ("yellow", YELLOW),
    ("green", [0.0, 1.0, 0.0]),
    ("blue", [0.0, 0.0, 1.0]),
    ("light-blue", LIGHT_BLUE),
    ("red", [1.0, 0.0, 0.0]),
    ("orange", [1.0, 0.65, 0.0]),
    ("purple", [0.5, 0.0, 0.5]),
    ("pink", [1.0, 0.75, 0.8]),
];

/// Euclidean distance between two RGB triples.
pub fn distance(a: Rgb, b: Rgb) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Nearest palette label for `color`. Total: always returns a label,
/// regardless of how far the color is from every reference entry.
pub fn classify(color: Rgb) -> &'static str {
    let mut best = PALETTE[0].0;
    let mut best_dist = distance(color, PALETTE[0].1);
    for (label, reference) in &PALETTE[1..] {
        let d = distance(color, *reference);
        if d < best_dist {
            best = label;
            best_dist = d;
        }
    }
    best
}

/// Thresholded membership: does `color` lie within `threshold` of
/// `target`?
pub fn matches(color: Rgb, target: Rgb, threshold: f32) -> bool {
    distance(color, target) <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_basic() {
        assert_eq!(distance([0.0, 0.0, 0.0], [0.0, 0.0, 0.0]), 0.0);
        assert!((distance([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((distance([0.0, 0.0, 0.0], [0.6, 0.8, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_classify_exact_palette_entries() {
        for (label, reference) in PALETTE {
            assert_eq!(classify(reference), label);
        }
    }

    #[test]
    fn test_classify_near_miss() {
        assert_eq!(classify([0.95, 0.95, 0.1]), "yellow");
        assert_eq!(classify([0.55, 0.75, 0.95]), "light-blue");
    }

    #[test]
    fn test_classify_total_even_when_far() {
        // Black is far from every reference entry but still classifies.
        let label = classify([0.0, 0.0, 0.0]);
        assert!(PALETTE.iter().any(|(l, _)| *l == label));
    }

    #[test]
    fn test_classify_tie_resolves_to_declaration_order() {
        // Midpoint of yellow and green is equidistant from both; yellow
        // is declared first.
        assert_eq!(classify([0.5, 1.0, 0.0]), "yellow");
    }

    #[test]
    fn test_matches_threshold() {
        assert!(matches([1.0, 1.0, 0.0], YELLOW, DEFAULT_THRESHOLD));
        assert!(matches([0.9, 0.9, 0.1], YELLOW, DEFAULT_THRESHOLD));
        assert!(!matches([0.0, 0.0, 1.0], YELLOW, DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_matches_is_not_exclusive() {
        // A pale cyan-ish color can sit within a generous threshold of
        // both targets at once.
        let c = [0.8, 0.9, 0.5];
        assert!(matches(c, YELLOW, 0.8));
        assert!(matches(c, LIGHT_BLUE, 0.8));
    }
}
