//! Keyed annotation store over a content geometry: drawing, redraw after
//! reflow, hit-testing and the loupe hole clip.

use std::fmt::Write;

use folio_config::OverlayConfig;
use folio_scene::{Drawable, FillRule, Path, Rect, svg};
use tracing::{debug, trace, warn};

use crate::draw::{Draw, DrawOptions};
use crate::geometry::{ContentGeometry, TextRange, range_rects};

/// Slack around annotation rectangles when resolving a pointer position.
pub const DEFAULT_HIT_TOLERANCE: f32 = 5.0;

/// Half-extent of the clip rectangle surrounding a loupe hole; large enough
/// to cover long scrolled documents.
const HOLE_CLIP_EXTENT: f32 = 2_000_000.0;

const HOLE_CLIP_ID: &str = "folio-loupe-clip";

/// One registered annotation.
#[derive(Clone, Debug)]
pub struct OverlayEntry {
    range: TextRange,
    draw: Draw,
    options: DrawOptions,
    element: Drawable,
    rects: Vec<Rect>,
}

impl OverlayEntry {
    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn draw(&self) -> &Draw {
        &self.draw
    }

    pub fn options(&self) -> &DrawOptions {
        &self.options
    }

    pub fn element(&self) -> &Drawable {
        &self.element
    }

    /// Rectangles as left by the draw strategy; these are what hit-testing uses.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }
}

/// Result of a successful [`Overlayer::hit_test`].
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayHit {
    pub key: String,
    pub range: TextRange,
    pub rect: Rect,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Hole {
    x: f32,
    y: f32,
    r: f32,
}

/// Vector annotation layer over one rendered document.
///
/// Entries are kept in insertion order; re-adding a key moves it to the top.
pub struct Overlayer<G> {
    geometry: G,
    entries: Vec<(String, OverlayEntry)>,
    hit_tolerance: f32,
    hole: Option<Hole>,
}

impl<G: ContentGeometry> Overlayer<G> {
    pub fn new(geometry: G) -> Self {
        Self {
            geometry,
            entries: Vec::new(),
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            hole: None,
        }
    }

    pub fn from_config(geometry: G, config: &OverlayConfig) -> Self {
        Self::new(geometry).with_hit_tolerance(config.hit_tolerance)
    }

    pub fn with_hit_tolerance(mut self, tolerance: f32) -> Self {
        if tolerance.is_finite() && tolerance >= 0.0 {
            self.hit_tolerance = tolerance;
        } else {
            warn!(tolerance, "invalid hit tolerance, keeping {}", self.hit_tolerance);
        }
        self
    }

    pub fn hit_tolerance(&self) -> f32 {
        self.hit_tolerance
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Mutable access to the content geometry. Call [`Overlayer::redraw`]
    /// afterwards if the layout changed.
    pub fn geometry_mut(&mut self) -> &mut G {
        &mut self.geometry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&OverlayEntry> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &OverlayEntry)> + '_ {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn render(&self, range: TextRange, draw: &Draw, options: &DrawOptions) -> (Vec<Rect>, Drawable) {
        let mut rects = range_rects(&self.geometry, range);
        let element = draw.apply(&mut rects, options);
        (rects, element)
    }

    /// Register an annotation, replacing any existing entry under `key`.
    pub fn add(&mut self, key: impl Into<String>, range: TextRange, draw: impl Into<Draw>, options: DrawOptions) {
        let key = key.into();
        self.remove(&key);
        let draw = draw.into();
        let (rects, element) = self.render(range, &draw, &options);
        trace!(%key, %range, rects = rects.len(), "overlay added");
        self.entries.push((
            key,
            OverlayEntry {
                range,
                draw,
                options,
                element,
                rects,
            },
        ));
    }

    /// Drop the entry under `key`. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) -> Option<OverlayEntry> {
        let index = self.position(key)?;
        trace!(key, "overlay removed");
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Recompute rectangles and elements for every entry after a layout change.
    /// Keys and their order are preserved.
    pub fn redraw(&mut self) {
        let rendered: Vec<(Vec<Rect>, Drawable)> = self
            .entries
            .iter()
            .map(|(_, entry)| self.render(entry.range, &entry.draw, &entry.options))
            .collect();
        for ((_, entry), (rects, element)) in self.entries.iter_mut().zip(rendered) {
            entry.rects = rects;
            entry.element = element;
        }
        debug!(entries = self.entries.len(), "overlay redrawn");
    }

    /// Topmost entry with a rectangle near `point`. Newer entries shadow older ones.
    pub fn hit_test(&self, point: [f32; 2]) -> Option<OverlayHit> {
        self.entries.iter().rev().find_map(|(key, entry)| {
            entry
                .rects
                .iter()
                .find(|rect| rect.contains_with_tolerance(point, self.hit_tolerance))
                .map(|rect| OverlayHit {
                    key: key.clone(),
                    range: entry.range,
                    rect: *rect,
                })
        })
    }

    /// Cut a circular hole of radius `r` centered on `(x, y)` out of the layer.
    pub fn set_hole(&mut self, x: f32, y: f32, r: f32) {
        self.hole = Some(Hole { x, y, r: r.abs() });
    }

    pub fn clear_hole(&mut self) {
        self.hole = None;
    }

    /// Even-odd clip covering everything except the hole, if one is set.
    pub fn clip_path(&self) -> Option<Path> {
        let Hole { x, y, r } = self.hole?;
        let lo = -HOLE_CLIP_EXTENT;
        let hi = HOLE_CLIP_EXTENT * 2.0;
        let mut path = Path::new().with_fill_rule(FillRule::EvenOdd);
        path.move_to(lo, lo)
            .line_to(hi, lo)
            .line_to(hi, hi)
            .line_to(lo, hi)
            .close()
            .move_to(x - r, y)
            .arc_by(r, r, true, false, 2.0 * r, 0.0)
            .arc_by(r, r, true, false, -2.0 * r, 0.0);
        Some(path)
    }

    /// The whole layer as an SVG document, entries in stacking order.
    pub fn to_svg(&self) -> String {
        let mut out = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg" pointer-events="none""#);
        let clip = self.clip_path();
        if clip.is_some() {
            let _ = write!(out, r#" clip-path="url(#{HOLE_CLIP_ID})""#);
        }
        out.push('>');
        if let Some(clip) = clip {
            let _ = write!(
                out,
                r#"<defs><clipPath id="{HOLE_CLIP_ID}" clipPathUnits="userSpaceOnUse"><path clip-rule="evenodd" d="{}"/></clipPath></defs>"#,
                svg::path_data(&clip)
            );
        }
        for (_, entry) in &self.entries {
            out.push_str(&entry.element.to_svg());
        }
        out.push_str("</svg>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::DrawStyle;

    /// Every offset is one 10px-wide glyph on a single line.
    struct Strip;

    impl ContentGeometry for Strip {
        fn blocks(&self, _range: TextRange) -> Vec<TextRange> {
            Vec::new()
        }

        fn client_rects(&self, range: TextRange) -> Vec<Rect> {
            vec![Rect::new(range.start as f32 * 10.0, 0.0, (range.end - range.start) as f32 * 10.0, 20.0)]
        }
    }

    #[test]
    fn re_adding_a_key_moves_it_to_the_top() {
        let mut overlay = Overlayer::new(Strip);
        overlay.add("a", TextRange::new(0, 5), DrawStyle::Underline, DrawOptions::new());
        overlay.add("b", TextRange::new(10, 15), DrawStyle::Underline, DrawOptions::new());
        overlay.add("a", TextRange::new(20, 25), DrawStyle::Underline, DrawOptions::new());
        let keys: Vec<&str> = overlay.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(overlay.get("a").map(|e| e.range()), Some(TextRange::new(20, 25)));
    }

    #[test]
    fn removing_an_unknown_key_is_a_no_op() {
        let mut overlay = Overlayer::new(Strip);
        overlay.add("a", TextRange::new(0, 5), DrawStyle::Outline, DrawOptions::new());
        assert!(overlay.remove("missing").is_none());
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn tolerance_is_configurable() {
        let config = OverlayConfig { hit_tolerance: 0.0 };
        let mut overlay = Overlayer::from_config(Strip, &config);
        overlay.add("a", TextRange::new(0, 5), DrawStyle::Highlight, DrawOptions::new());
        assert!(overlay.hit_test([52.0, 10.0]).is_none());
        let overlay = overlay.with_hit_tolerance(f32::NAN);
        assert_eq!(overlay.hit_tolerance(), 0.0);
        assert!(Overlayer::new(Strip).with_hit_tolerance(5.0).hit_test([0.0, 0.0]).is_none());
    }

    #[test]
    fn hole_is_an_even_odd_clip() {
        let mut overlay = Overlayer::new(Strip);
        assert!(overlay.clip_path().is_none());
        overlay.set_hole(100.0, 50.0, 30.0);
        let clip = overlay.clip_path().unwrap();
        assert_eq!(clip.fill_rule, FillRule::EvenOdd);
        assert_eq!(
            svg::path_data(&clip),
            "M -2000000 -2000000 L 4000000 -2000000 L 4000000 4000000 L -2000000 4000000 Z \
             M 70 50 A 30 30 0 1 0 130 50 A 30 30 0 1 0 70 50"
        );
        assert!(overlay.to_svg().contains(r#"clip-path="url(#folio-loupe-clip)""#));
        overlay.clear_hole();
        assert!(!overlay.to_svg().contains("clipPath"));
    }
}
