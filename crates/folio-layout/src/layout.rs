//! Scale and placement of the active spread inside the viewport.
//!
//! Everything here is a pure function of [`LayoutInput`]; the reader feeds the
//! result to the render surfaces.

use std::fmt;
use std::str::FromStr;

use folio_scene::{Rect, Size, Transform2D};

use crate::book::{Side, SpreadMode};
use crate::error::{LayoutError, Result};
use crate::surface::{Presentation, Visibility};

/// Default ratio of viewport height to width above which one page is shown.
pub const DEFAULT_PORTRAIT_THRESHOLD: f32 = 1.2;

/// How the spread is scaled to the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Zoom {
    /// A fixed multiplier.
    Fixed(f32),
    /// Fill the viewport width.
    FitWidth,
    /// Fit the whole spread in both axes.
    #[default]
    FitPage,
}

impl FromStr for Zoom {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "fit-width" => Ok(Zoom::FitWidth),
            "fit-page" => Ok(Zoom::FitPage),
            other => match other.parse::<f32>() {
                Ok(z) if z.is_finite() && z > 0.0 => Ok(Zoom::Fixed(z)),
                _ => Err(LayoutError::InvalidAttribute {
                    name: "zoom",
                    value: s.to_string(),
                }),
            },
        }
    }
}

impl fmt::Display for Zoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zoom::Fixed(z) => write!(f, "{z}"),
            Zoom::FitWidth => f.write_str("fit-width"),
            Zoom::FitPage => f.write_str("fit-page"),
        }
    }
}

/// What the layout needs to know about one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameMetrics {
    /// Intrinsic size; `None` for a blank side.
    pub size: Option<Size>,
    /// The document re-renders itself at the target scale.
    pub scale_aware: bool,
}

impl FrameMetrics {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn sized(size: Size) -> Self {
        Self {
            size: Some(size),
            scale_aware: false,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.size.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutInput {
    pub viewport: Size,
    pub spread_mode: SpreadMode,
    pub portrait_threshold: f32,
    pub zoom: Zoom,
    /// User multiplier, 1.0 for none.
    pub scale_factor: f32,
    /// Focused side. Ignored for center spreads.
    pub side: Side,
    pub left: FrameMetrics,
    /// Trailing frame, or the single frame of a center spread.
    pub right: FrameMetrics,
    pub center: bool,
}

/// Where one frame goes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Placement {
    /// The page box takes up room in the spread.
    pub in_flow: bool,
    /// The document itself is shown (in flow and not blank).
    pub displayed: bool,
    /// Top-left corner in content coordinates, before scrolling.
    pub origin: [f32; 2],
    pub outer: Size,
    pub surface_size: Size,
    pub content_scale: f32,
}

impl Placement {
    /// Map from the document's own coordinates to viewport coordinates.
    pub fn transform(&self, scroll: [f32; 2]) -> Transform2D {
        Transform2D::translate(self.origin[0] - scroll[0], self.origin[1] - scroll[1])
            .concat(Transform2D::scale(self.content_scale, self.content_scale))
    }

    pub fn presentation(&self, visibility: Visibility, scroll: [f32; 2]) -> Presentation {
        Presentation {
            visibility,
            displayed: self.displayed,
            origin: [self.origin[0] - scroll[0], self.origin[1] - scroll[1]],
            outer: self.outer,
            surface_size: self.surface_size,
            content_scale: self.content_scale,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutOutcome {
    /// Only the focused side is shown.
    pub portrait: bool,
    /// Effective scale including the user scale factor.
    pub scale: f32,
    pub left: Placement,
    /// Trailing frame, or the single frame of a center spread.
    pub right: Placement,
    pub center: bool,
    /// Bounding size of everything in flow.
    pub content: Size,
    pub overflow_x: bool,
    pub overflow_y: bool,
    /// Initial scroll offset that centers overflowing content.
    pub scroll: [f32; 2],
}

impl LayoutOutcome {
    /// Placements paired with the side they show.
    pub fn placements(&self) -> Vec<(Side, Placement)> {
        if self.center {
            vec![(Side::Center, self.right)]
        } else {
            vec![(Side::Left, self.left), (Side::Right, self.right)]
        }
    }

    /// Resolve a viewport point to the page under it and the point in that
    /// page's document coordinates.
    pub fn locate(&self, point: [f32; 2], scroll: [f32; 2]) -> Option<(Side, [f32; 2])> {
        self.placements()
            .into_iter()
            .filter(|(_, placement)| placement.displayed)
            .find_map(|(side, placement)| {
                let transform = placement.transform(scroll);
                let bounds = Rect::new(
                    0.0,
                    0.0,
                    placement.surface_size.width,
                    placement.surface_size.height,
                );
                if !transform.local_rect_contains(bounds, point) {
                    return None;
                }
                transform.inverse_apply(point).map(|local| (side, local))
            })
    }
}

fn usable_or_one(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

fn place(metrics: FrameMetrics, blank: Size, scale: f32, in_flow: bool) -> Placement {
    let intrinsic = metrics.size.unwrap_or(blank);
    let outer = Size::new(intrinsic.width * scale, intrinsic.height * scale);
    let (surface_size, content_scale) = if metrics.scale_aware {
        (outer, 1.0)
    } else {
        (intrinsic, scale)
    };
    Placement {
        in_flow,
        displayed: in_flow && !metrics.is_blank(),
        origin: [0.0, 0.0],
        outer,
        surface_size,
        content_scale,
    }
}

/// Compute orientation, scale and placement for the active spread.
pub fn compute_layout(input: &LayoutInput) -> LayoutOutcome {
    let Size { width, height } = input.viewport;
    let portrait = !input.spread_mode.forces_dual_page() && height > width * input.portrait_threshold;

    let left = input.left.size;
    let right = input.right.size;
    // A blank side borrows its neighbour's size so the spread keeps its shape.
    let blank = Size::new(
        left.or(right).map_or(0.0, |s| s.width),
        left.or(right).map_or(0.0, |s| s.height),
    );
    let left = left.unwrap_or(blank);
    let right = right.unwrap_or(blank);

    let single = portrait || input.center;
    let target = if !input.center && input.side == Side::Left {
        left
    } else {
        right
    };

    let fit_width = if single {
        width / target.width
    } else {
        width / (left.width + right.width)
    };
    let fit_height = if single {
        height / target.height
    } else {
        height / left.height.max(right.height)
    };
    let base = match input.zoom {
        Zoom::Fixed(z) => z,
        Zoom::FitWidth => fit_width,
        Zoom::FitPage => fit_width.min(fit_height),
    };
    let scale = usable_or_one(base) * input.scale_factor;

    let (mut left_place, mut right_place) = if input.center {
        (Placement::default(), place(input.right, blank, scale, true))
    } else {
        let show_left = !portrait || input.side == Side::Left;
        let show_right = !portrait || input.side != Side::Left;
        (
            place(input.left, blank, scale, show_left),
            place(input.right, blank, scale, show_right),
        )
    };

    let in_flow = [left_place, right_place];
    let in_flow = in_flow.iter().filter(|p| p.in_flow);
    let content = in_flow.fold(Size::default(), |acc, p| {
        Size::new(acc.width + p.outer.width, acc.height.max(p.outer.height))
    });

    // Content that fits is centered; content that overflows starts at the
    // leading edge and scrolls.
    let offset_x = ((width - content.width) / 2.0).max(0.0);
    let mut x = offset_x;
    for placement in [&mut left_place, &mut right_place] {
        if !placement.in_flow {
            continue;
        }
        placement.origin = [x, ((height - placement.outer.height) / 2.0).max(0.0)];
        x += placement.outer.width;
    }

    LayoutOutcome {
        portrait,
        scale,
        left: left_place,
        right: right_place,
        center: input.center,
        content,
        overflow_x: content.width > width,
        overflow_y: content.height > height,
        scroll: [((content.width - width) / 2.0).max(0.0), 0.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landscape_pair() -> LayoutInput {
        LayoutInput {
            viewport: Size::new(1000.0, 800.0),
            spread_mode: SpreadMode::Auto,
            portrait_threshold: DEFAULT_PORTRAIT_THRESHOLD,
            zoom: Zoom::FitPage,
            scale_factor: 1.0,
            side: Side::Left,
            left: FrameMetrics::sized(Size::new(500.0, 1000.0)),
            right: FrameMetrics::sized(Size::new(500.0, 1000.0)),
            center: false,
        }
    }

    #[test]
    fn fit_page_uses_the_tighter_axis() {
        let out = compute_layout(&landscape_pair());
        assert!(!out.portrait);
        assert_eq!(out.scale, 0.8);
        assert_eq!(out.content, Size::new(800.0, 800.0));
        assert_eq!(out.left.origin, [100.0, 0.0]);
        assert_eq!(out.right.origin, [500.0, 0.0]);
        assert!(!out.overflow_x && !out.overflow_y);
    }

    #[test]
    fn fit_width_can_overflow_vertically() {
        let out = compute_layout(&LayoutInput {
            zoom: Zoom::FitWidth,
            ..landscape_pair()
        });
        assert_eq!(out.scale, 1.0);
        assert!(out.overflow_y);
        assert!(!out.overflow_x);
    }

    #[test]
    fn tall_viewport_shows_one_side() {
        let out = compute_layout(&LayoutInput {
            viewport: Size::new(500.0, 1000.0),
            side: Side::Right,
            ..landscape_pair()
        });
        assert!(out.portrait);
        assert!(!out.left.in_flow);
        assert!(out.right.displayed);
        assert_eq!(out.scale, 1.0);
        assert_eq!(out.right.origin, [0.0, 0.0]);
    }

    #[test]
    fn forced_pairs_ignore_the_portrait_threshold() {
        let out = compute_layout(&LayoutInput {
            viewport: Size::new(500.0, 1000.0),
            spread_mode: SpreadMode::Both,
            ..landscape_pair()
        });
        assert!(!out.portrait);
        assert!(out.left.displayed && out.right.displayed);
        assert_eq!(out.scale, 0.5);
    }

    #[test]
    fn threshold_is_configurable() {
        let input = LayoutInput {
            viewport: Size::new(1000.0, 1100.0),
            ..landscape_pair()
        };
        assert!(!compute_layout(&input).portrait);
        assert!(
            compute_layout(&LayoutInput {
                portrait_threshold: 1.0,
                ..input
            })
            .portrait
        );
    }

    #[test]
    fn blank_side_keeps_its_room() {
        let out = compute_layout(&LayoutInput {
            right: FrameMetrics::blank(),
            ..landscape_pair()
        });
        assert!(out.right.in_flow);
        assert!(!out.right.displayed);
        assert_eq!(out.content.width, 800.0);
    }

    #[test]
    fn degenerate_sizes_fall_back_to_unit_scale() {
        let out = compute_layout(&LayoutInput {
            left: FrameMetrics::blank(),
            right: FrameMetrics::blank(),
            scale_factor: 1.5,
            ..landscape_pair()
        });
        assert_eq!(out.scale, 1.5);
    }

    #[test]
    fn scale_aware_frames_are_sized_not_transformed() {
        let out = compute_layout(&LayoutInput {
            center: true,
            zoom: Zoom::Fixed(2.0),
            right: FrameMetrics {
                size: Some(Size::new(100.0, 100.0)),
                scale_aware: true,
            },
            ..landscape_pair()
        });
        assert_eq!(out.right.surface_size, Size::new(200.0, 200.0));
        assert_eq!(out.right.content_scale, 1.0);
        assert_eq!(out.placements().len(), 1);
    }

    #[test]
    fn locate_maps_into_document_space() {
        let out = compute_layout(&landscape_pair());
        // Right page starts at x=500 with scale 0.8.
        let (side, local) = out.locate([540.0, 80.0], [0.0, 0.0]).unwrap();
        assert_eq!(side, Side::Right);
        assert!((local[0] - 50.0).abs() < 1e-3 && (local[1] - 100.0).abs() < 1e-3);
        assert_eq!(out.locate([50.0, 10.0], [0.0, 0.0]), None);
    }

    #[test]
    fn zoom_parses_keywords_and_numbers() {
        assert_eq!("fit-width".parse::<Zoom>().unwrap(), Zoom::FitWidth);
        assert_eq!("1.25".parse::<Zoom>().unwrap(), Zoom::Fixed(1.25));
        assert!("-1".parse::<Zoom>().is_err());
        assert!("huge".parse::<Zoom>().is_err());
    }
}
