//! Logical ranges and the geometry queries the overlay needs from rendered content.

use std::fmt;
use std::str::FromStr;

use folio_scene::Rect;

use crate::error::OverlayError;

/// Half-open span `[start, end)` of logical offsets into rendered content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Overlap test. A collapsed range intersects a span that contains its position.
    pub fn intersects(&self, other: &TextRange) -> bool {
        if self.is_empty() {
            return other.start <= self.start && self.start < other.end;
        }
        if other.is_empty() {
            return self.start <= other.start && other.start < self.end;
        }
        self.start < other.end && other.start < self.end
    }

    /// The part of `self` lying inside `bounds`.
    pub fn clip_to(&self, bounds: &TextRange) -> TextRange {
        let start = self.start.max(bounds.start);
        TextRange {
            start,
            end: self.end.min(bounds.end).max(start),
        }
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Layout queries answered by a rendered document.
pub trait ContentGeometry {
    /// Paragraph-like blocks (paragraphs and headings) around `range`, in document order.
    /// Blocks that do not intersect `range` are ignored by the caller.
    fn blocks(&self, range: TextRange) -> Vec<TextRange>;

    /// Screen rectangles covering `range`, one per line box.
    fn client_rects(&self, range: TextRange) -> Vec<Rect>;

    /// Factor applied to reported rectangles for renderers that do not zoom them.
    fn zoom_correction(&self) -> f32 {
        1.0
    }
}

/// Split `range` at block boundaries, clipping each block to the range.
/// Falls back to the whole range when no block intersects it.
pub fn split_by_blocks(geometry: &dyn ContentGeometry, range: TextRange) -> Vec<TextRange> {
    let split: Vec<TextRange> = geometry
        .blocks(range)
        .iter()
        .filter(|block| block.intersects(&range))
        .map(|block| block.clip_to(&range))
        .collect();
    if split.is_empty() { vec![range] } else { split }
}

/// Screen rectangles for `range`, block by block, scaled by the zoom correction.
pub fn range_rects(geometry: &dyn ContentGeometry, range: TextRange) -> Vec<Rect> {
    let zoom = geometry.zoom_correction();
    split_by_blocks(geometry, range)
        .into_iter()
        .flat_map(|part| geometry.client_rects(part))
        .map(|rect| rect.scaled(zoom))
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WritingMode {
    #[default]
    HorizontalTb,
    VerticalRl,
    VerticalLr,
}

impl WritingMode {
    pub fn is_vertical(&self) -> bool {
        matches!(self, WritingMode::VerticalRl | WritingMode::VerticalLr)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WritingMode::HorizontalTb => "horizontal-tb",
            WritingMode::VerticalRl => "vertical-rl",
            WritingMode::VerticalLr => "vertical-lr",
        }
    }
}

impl FromStr for WritingMode {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "horizontal-tb" => Ok(WritingMode::HorizontalTb),
            "vertical-rl" => Ok(WritingMode::VerticalRl),
            "vertical-lr" => Ok(WritingMode::VerticalLr),
            other => Err(OverlayError::UnknownWritingMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blocks(Vec<TextRange>);

    impl ContentGeometry for Blocks {
        fn blocks(&self, _range: TextRange) -> Vec<TextRange> {
            self.0.clone()
        }

        fn client_rects(&self, range: TextRange) -> Vec<Rect> {
            vec![Rect::new(range.start as f32, 0.0, (range.end - range.start) as f32, 10.0)]
        }

        fn zoom_correction(&self) -> f32 {
            2.0
        }
    }

    #[test]
    fn intersection_is_half_open() {
        let a = TextRange::new(0, 10);
        assert!(a.intersects(&TextRange::new(9, 12)));
        assert!(!a.intersects(&TextRange::new(10, 12)));
        assert!(TextRange::new(4, 4).intersects(&a));
        assert!(!TextRange::new(10, 10).intersects(&a));
    }

    #[test]
    fn split_clips_outer_blocks_to_the_range() {
        let geometry = Blocks(vec![TextRange::new(0, 10), TextRange::new(10, 20), TextRange::new(20, 30)]);
        let parts = split_by_blocks(&geometry, TextRange::new(5, 15));
        assert_eq!(parts, vec![TextRange::new(5, 10), TextRange::new(10, 15)]);
    }

    #[test]
    fn range_outside_every_block_is_kept_whole() {
        let geometry = Blocks(vec![TextRange::new(0, 10)]);
        assert_eq!(split_by_blocks(&geometry, TextRange::new(40, 50)), vec![TextRange::new(40, 50)]);
    }

    #[test]
    fn rects_are_zoom_corrected() {
        let geometry = Blocks(Vec::new());
        let rects = range_rects(&geometry, TextRange::new(3, 5));
        assert_eq!(rects, vec![Rect::new(6.0, 0.0, 4.0, 20.0)]);
    }

    #[test]
    fn writing_mode_names() {
        assert_eq!("vertical-rl".parse::<WritingMode>().ok(), Some(WritingMode::VerticalRl));
        assert!("sideways".parse::<WritingMode>().is_err());
        assert!(!WritingMode::default().is_vertical());
    }
}
