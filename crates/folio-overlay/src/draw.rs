//! Drawing strategies: pure functions from a rectangle list and options to a
//! [`Drawable`]. A strategy may rewrite the rectangle list it is handed; the
//! rewritten list is what hit-testing sees.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use folio_scene::{
    BlendMode, Color, Drawable, Painter, Path, Rect, RoundedRadii, RoundedRect, Stroke, Transform2D,
};
use tracing::trace;

use crate::error::{OverlayError, Result};
use crate::geometry::WritingMode;

/// Per-annotation drawing options. Unset fields fall back to the preset's own default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawOptions {
    pub color: Option<Color>,
    /// Stroke width (underline, strikethrough, squiggly, outline).
    pub width: Option<f32>,
    pub padding: Option<f32>,
    pub radius: Option<f32>,
    /// Extra inline extension at the two ends of a highlight.
    pub radius_padding: Option<f32>,
    pub opacity: Option<f32>,
    pub blend: BlendMode,
    /// Marker edge length (bubble).
    pub size: Option<f32>,
    pub writing_mode: WritingMode,
    /// Image reference (copy-image).
    pub src: Option<String>,
}

impl DrawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the color from any CSS color string.
    pub fn color(mut self, css: &str) -> Result<Self> {
        self.color = Some(Color::parse_css(css)?);
        Ok(self)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_radius_padding(mut self, radius_padding: f32) -> Self {
        self.radius_padding = Some(radius_padding);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_writing_mode(mut self, writing_mode: WritingMode) -> Self {
        self.writing_mode = writing_mode;
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    fn vertical(&self) -> bool {
        self.writing_mode.is_vertical()
    }
}

fn red() -> Color {
    Color::rgba(255, 0, 0, 255)
}

/// Built-in drawing strategies, selectable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawStyle {
    Underline,
    Strikethrough,
    Squiggly,
    Highlight,
    Outline,
    Bubble,
    CopyImage,
}

impl DrawStyle {
    pub const ALL: [DrawStyle; 7] = [
        DrawStyle::Underline,
        DrawStyle::Strikethrough,
        DrawStyle::Squiggly,
        DrawStyle::Highlight,
        DrawStyle::Outline,
        DrawStyle::Bubble,
        DrawStyle::CopyImage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DrawStyle::Underline => "underline",
            DrawStyle::Strikethrough => "strikethrough",
            DrawStyle::Squiggly => "squiggly",
            DrawStyle::Highlight => "highlight",
            DrawStyle::Outline => "outline",
            DrawStyle::Bubble => "bubble",
            DrawStyle::CopyImage => "copy-image",
        }
    }

    pub fn draw(&self, rects: &mut Vec<Rect>, options: &DrawOptions) -> Drawable {
        match self {
            DrawStyle::Underline => underline(rects, options),
            DrawStyle::Strikethrough => strikethrough(rects, options),
            DrawStyle::Squiggly => squiggly(rects, options),
            DrawStyle::Highlight => highlight(rects, options),
            DrawStyle::Outline => outline(rects, options),
            DrawStyle::Bubble => bubble(rects, options),
            DrawStyle::CopyImage => copy_image(rects, options),
        }
    }
}

impl FromStr for DrawStyle {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "copyImage" => Ok(DrawStyle::CopyImage),
            name => DrawStyle::ALL
                .into_iter()
                .find(|style| style.name() == name)
                .ok_or_else(|| OverlayError::UnknownStyle(name.to_string())),
        }
    }
}

impl fmt::Display for DrawStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type DrawFn = dyn Fn(&mut Vec<Rect>, &DrawOptions) -> Drawable;

/// A drawing strategy: one of the presets or a caller-supplied closure.
#[derive(Clone)]
pub enum Draw {
    Preset(DrawStyle),
    Custom(Rc<DrawFn>),
}

impl Draw {
    pub fn custom(f: impl Fn(&mut Vec<Rect>, &DrawOptions) -> Drawable + 'static) -> Self {
        Draw::Custom(Rc::new(f))
    }

    pub fn apply(&self, rects: &mut Vec<Rect>, options: &DrawOptions) -> Drawable {
        match self {
            Draw::Preset(style) => style.draw(rects, options),
            Draw::Custom(f) => f(rects, options),
        }
    }
}

impl From<DrawStyle> for Draw {
    fn from(style: DrawStyle) -> Self {
        Draw::Preset(style)
    }
}

impl fmt::Debug for Draw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Draw::Preset(style) => f.debug_tuple("Preset").field(style).finish(),
            Draw::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub fn underline(rects: &[Rect], options: &DrawOptions) -> Drawable {
    let color = options.color.unwrap_or_else(red);
    let sw = options.width.unwrap_or(2.0);
    let padding = options.padding.unwrap_or(0.0);
    let mut painter = Painter::new();
    for r in rects {
        let bar = if options.vertical() {
            Rect::new(r.right() - sw / 2.0 + padding, r.top(), sw, r.h)
        } else {
            Rect::new(r.left(), r.bottom() - sw / 2.0 + padding, r.w, sw)
        };
        painter.fill_rect(bar, color);
    }
    painter.finish()
}

pub fn strikethrough(rects: &[Rect], options: &DrawOptions) -> Drawable {
    let color = options.color.unwrap_or_else(red);
    let sw = options.width.unwrap_or(2.0);
    let mut painter = Painter::new();
    for r in rects {
        let [cx, cy] = r.center();
        let bar = if options.vertical() {
            Rect::new(cx, r.top(), sw, r.h)
        } else {
            Rect::new(r.left(), cy, r.w, sw)
        };
        painter.fill_rect(bar, color);
    }
    painter.finish()
}

/// Zig-zag under (or beside) each line. Segment length tracks the stroke width.
pub fn squiggly(rects: &[Rect], options: &DrawOptions) -> Drawable {
    let color = options.color.unwrap_or_else(red);
    let sw = options.width.unwrap_or(2.0);
    let padding = options.padding.unwrap_or(0.0);
    let block = sw * 1.5;
    let mut painter = Painter::new();
    for r in rects {
        let extent = if options.vertical() { r.h } else { r.w };
        let n = segment_count(extent, block);
        let inline = extent / n as f32;
        let mut path = Path::new();
        if options.vertical() {
            path.move_to(r.right() - sw / 2.0 + padding, r.top());
            for i in 0..n {
                path.line_by(if i % 2 == 1 { -block } else { block }, inline);
            }
        } else {
            path.move_to(r.left(), r.bottom() + sw / 2.0 + padding);
            for i in 0..n {
                path.line_by(inline, if i % 2 == 1 { block } else { -block });
            }
        }
        painter.stroke_path(path, Stroke::new(sw), color);
    }
    painter.finish()
}

fn segment_count(extent: f32, block: f32) -> usize {
    let n = (extent / block / 1.5).round();
    if n.is_finite() && n >= 1.0 { n as usize } else { 1 }
}

/// Filled box per line, rounded only at the start of the first line and the
/// end of the last, so adjacent lines join without a visible seam.
pub fn highlight(rects: &[Rect], options: &DrawOptions) -> Drawable {
    let color = options.color.unwrap_or_else(red);
    let padding = options.padding.unwrap_or(0.0);
    let radius = options.radius.unwrap_or(4.0);
    let radius_padding = options.radius_padding.unwrap_or(2.0);
    let mut painter = Painter::new();
    painter.opacity(options.opacity.unwrap_or(0.3)).blend(options.blend);

    let last_index = rects.len().saturating_sub(1);
    for (index, r) in rects.iter().enumerate() {
        let first = index == 0;
        let last = index == last_index;
        let lead = if first { radius_padding } else { 0.0 };
        let trail = if last { radius_padding } else { 0.0 };
        let start = if first { radius } else { 0.0 };
        let end = if last { radius } else { 0.0 };

        let (rect, radii) = if options.vertical() {
            (
                Rect::new(
                    r.left() - padding,
                    r.top() - padding - lead,
                    r.w + padding * 2.0,
                    r.h + padding * 2.0 + lead + trail,
                ),
                RoundedRadii { tl: start, tr: start, br: end, bl: end },
            )
        } else {
            (
                Rect::new(
                    r.left() - padding - lead,
                    r.top() - padding,
                    r.w + padding * 2.0 + lead + trail,
                    r.h + padding * 2.0,
                ),
                RoundedRadii { tl: start, tr: end, br: end, bl: start },
            )
        };
        painter.fill_rounded_rect(
            RoundedRect {
                rect,
                radii: radii.clamped_to(rect),
            },
            color,
        );
    }
    painter.finish()
}

pub fn outline(rects: &[Rect], options: &DrawOptions) -> Drawable {
    let color = options.color.unwrap_or_else(red);
    let sw = options.width.unwrap_or(3.0);
    let padding = options.padding.unwrap_or(0.0);
    let radius = options.radius.unwrap_or(3.0);
    let mut painter = Painter::new();
    for r in rects {
        painter.stroke_rounded_rect(
            RoundedRect {
                rect: r.inflate(padding),
                radii: RoundedRadii::uniform(radius),
            },
            Stroke::new(sw),
            color,
        );
    }
    painter.finish()
}

/// Fixed-size speech-bubble marker at the first line's trailing corner.
/// Collapses `rects` to the marker's padded bounds.
pub fn bubble(rects: &mut Vec<Rect>, options: &DrawOptions) -> Drawable {
    let color = options.color.unwrap_or_else(|| Color::rgba(0xfb, 0xbf, 0x24, 255));
    let s = options.size.unwrap_or(20.0);
    let padding = options.padding.unwrap_or(10.0);
    let mut painter = Painter::new();
    painter.opacity(options.opacity.unwrap_or(0.85));

    let Some(&anchor) = rects.first() else {
        return painter.finish();
    };
    rects.truncate(1);
    let x = anchor.right() - s + padding;
    let y = if options.vertical() {
        anchor.bottom() - s + padding
    } else {
        anchor.top() - s + padding
    };
    rects[0] = Rect::from_ltrb(x - padding, y - padding, x + s + padding, y + s + padding);

    let r = s * 0.15;
    let mut body = Path::new();
    body.move_to(x + r, y)
        .line_by(s - 2.0 * r, 0.0)
        .arc_by(r, r, false, true, r, r)
        .line_by(0.0, s * 0.65 - 2.0 * r)
        .arc_by(r, r, false, true, -r, r)
        .line_by(-s * 0.3, 0.0)
        .line_by(-s * 0.15, s * 0.2)
        .line_by(s * 0.05, -s * 0.2)
        .line_by(-s * 0.6 + 2.0 * r, 0.0)
        .arc_by(r, r, false, true, -r, -r)
        .line_by(0.0, -s * 0.65 + 2.0 * r)
        .arc_by(r, r, false, true, r, -r)
        .close();

    if options.vertical() {
        painter.push_transform(Transform2D::rotate_about(90.0, x + s / 2.0, y + s / 2.0));
    }
    painter.fill_path(body.clone(), color);
    painter.stroke_path(body, Stroke::new(1.0), Color::from_srgba(0, 0, 0, 0.2));

    let ink = Color::from_srgba(0, 0, 0, 0.3);
    let text = Stroke::round(1.5);
    for (row, end) in [(0.18, 0.8), (0.33, 0.8), (0.48, 0.6)] {
        painter.line([x + s * 0.2, y + s * row], [x + s * end, y + s * row], text, ink);
    }
    painter.pop_transform();
    painter.finish()
}

/// Duplicate of an image at the first rectangle, so filters applied to the
/// overlay can treat it separately from the page.
pub fn copy_image(rects: &[Rect], options: &DrawOptions) -> Drawable {
    let mut painter = Painter::new();
    match (rects.first(), options.src.as_deref()) {
        (Some(rect), Some(src)) => painter.image(src, *rect),
        _ => trace!("copy-image without a rectangle or source draws nothing"),
    }
    painter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_scene::{Command, PathCmd};

    fn line_rects() -> Vec<Rect> {
        vec![Rect::new(10.0, 0.0, 200.0, 20.0), Rect::new(0.0, 20.0, 120.0, 20.0)]
    }

    #[test]
    fn styles_parse_by_name() {
        for style in DrawStyle::ALL {
            assert_eq!(style.name().parse::<DrawStyle>().unwrap(), style);
        }
        assert_eq!("copyImage".parse::<DrawStyle>().unwrap(), DrawStyle::CopyImage);
        assert!(matches!("glow".parse::<DrawStyle>(), Err(OverlayError::UnknownStyle(name)) if name == "glow"));
    }

    #[test]
    fn underline_sits_on_the_bottom_edge() {
        let d = underline(&line_rects(), &DrawOptions::new());
        assert_eq!(
            d.commands[0],
            Command::FillRect { rect: Rect::new(10.0, 19.0, 200.0, 2.0), color: red() }
        );
    }

    #[test]
    fn vertical_underline_uses_the_right_edge() {
        let options = DrawOptions::new().with_writing_mode(WritingMode::VerticalRl).with_padding(1.0);
        let d = underline(&[Rect::new(0.0, 0.0, 20.0, 100.0)], &options);
        let Command::FillRect { rect, .. } = d.commands[0] else {
            panic!("expected a filled bar");
        };
        assert_eq!(rect, Rect::new(20.0, 0.0, 2.0, 100.0));
    }

    #[test]
    fn strikethrough_crosses_the_middle() {
        let d = strikethrough(&[Rect::new(0.0, 10.0, 50.0, 20.0)], &DrawOptions::new());
        let Command::FillRect { rect, .. } = d.commands[0] else {
            panic!("expected a filled bar");
        };
        assert_eq!(rect, Rect::new(0.0, 20.0, 50.0, 2.0));
    }

    #[test]
    fn squiggly_segment_count_follows_stroke_width() {
        // block = 3, extent 90 => round(90 / 3 / 1.5) = 20 segments
        let d = squiggly(&[Rect::new(0.0, 0.0, 90.0, 20.0)], &DrawOptions::new());
        let Command::StrokePath { path, .. } = &d.commands[0] else {
            panic!("expected a stroked path");
        };
        assert_eq!(path.cmds.len(), 21);
        assert_eq!(path.cmds[0], PathCmd::MoveTo([0.0, 21.0]));
        assert_eq!(path.current_point()[0], 90.0);
    }

    #[test]
    fn vertical_strikethrough_runs_down_the_middle() {
        let options = DrawOptions::new().with_writing_mode(WritingMode::VerticalRl);
        let d = strikethrough(&[Rect::new(0.0, 0.0, 20.0, 100.0)], &options);
        let Command::FillRect { rect, .. } = d.commands[0] else {
            panic!("expected a filled bar");
        };
        assert_eq!(rect, Rect::new(10.0, 0.0, 2.0, 100.0));
    }

    #[test]
    fn vertical_squiggly_zigzags_along_the_right_edge() {
        let options = DrawOptions::new().with_writing_mode(WritingMode::VerticalRl);
        let d = squiggly(&[Rect::new(0.0, 0.0, 20.0, 90.0)], &options);
        let Command::StrokePath { path, .. } = &d.commands[0] else {
            panic!("expected a stroked path");
        };
        assert_eq!(path.cmds.len(), 21);
        assert_eq!(path.cmds[0], PathCmd::MoveTo([19.0, 0.0]));
        assert_eq!(path.cmds[1], PathCmd::LineTo([22.0, 4.5]));
        assert_eq!(path.current_point(), [19.0, 90.0]);
    }

    #[test]
    fn narrow_squiggly_still_draws_a_segment() {
        let d = squiggly(&[Rect::new(0.0, 0.0, 1.0, 20.0)], &DrawOptions::new());
        let Command::StrokePath { path, .. } = &d.commands[0] else {
            panic!("expected a stroked path");
        };
        assert_eq!(path.cmds.len(), 2);
        assert_eq!(segment_count(10.0, 0.0), 1);
    }

    #[test]
    fn highlight_rounds_only_the_outer_ends() {
        let d = highlight(&line_rects(), &DrawOptions::new());
        assert_eq!(d.opacity, 0.3);
        let radii: Vec<RoundedRadii> = d
            .commands
            .iter()
            .map(|cmd| match cmd {
                Command::FillRoundedRect { rrect, .. } => rrect.radii,
                other => panic!("unexpected command {other:?}"),
            })
            .collect();
        assert_eq!(radii[0], RoundedRadii { tl: 4.0, tr: 0.0, br: 0.0, bl: 4.0 });
        assert_eq!(radii[1], RoundedRadii { tl: 0.0, tr: 4.0, br: 4.0, bl: 0.0 });
    }

    #[test]
    fn single_line_highlight_is_padded_on_both_ends() {
        let d = highlight(&[Rect::new(10.0, 0.0, 100.0, 20.0)], &DrawOptions::new().with_radius(0.0));
        assert_eq!(
            d.commands[0],
            Command::FillRect { rect: Rect::new(8.0, 0.0, 104.0, 20.0), color: red() }
        );
    }

    #[test]
    fn outline_inflates_by_padding() {
        let d = outline(&[Rect::new(10.0, 10.0, 10.0, 10.0)], &DrawOptions::new().with_padding(2.0));
        let Command::StrokeRoundedRect { rrect, stroke, .. } = d.commands[0] else {
            panic!("expected a stroked rounded rect");
        };
        assert_eq!(rrect.rect, Rect::new(8.0, 8.0, 14.0, 14.0));
        assert_eq!(stroke.width, 3.0);
        assert_eq!(rrect.radii, RoundedRadii::uniform(3.0));
    }

    #[test]
    fn bubble_collapses_rects_to_the_marker() {
        let mut rects = line_rects();
        let d = bubble(&mut rects, &DrawOptions::new());
        // anchor right = 210, top = 0: x = 200, y = -10
        assert_eq!(rects, vec![Rect::from_ltrb(190.0, -20.0, 230.0, 20.0)]);
        assert_eq!(d.opacity, 0.85);
        // body fill, body stroke, three text lines
        assert_eq!(d.commands.len(), 5);
    }

    #[test]
    fn vertical_bubble_is_rotated() {
        let mut rects = vec![Rect::new(0.0, 0.0, 20.0, 100.0)];
        let d = bubble(&mut rects, &DrawOptions::new().with_writing_mode(WritingMode::VerticalLr));
        let Command::FillPath { transform, .. } = &d.commands[0] else {
            panic!("expected a filled path");
        };
        assert!(!transform.is_identity());
    }

    #[test]
    fn bubble_without_rects_is_empty() {
        let mut rects = Vec::new();
        assert!(bubble(&mut rects, &DrawOptions::new()).is_empty());
    }

    #[test]
    fn copy_image_needs_a_source() {
        assert!(copy_image(&line_rects(), &DrawOptions::new()).is_empty());
        let d = copy_image(&line_rects(), &DrawOptions::new().with_src("fig.png"));
        assert_eq!(
            d.commands[0],
            Command::Image { href: "fig.png".into(), rect: line_rects()[0] }
        );
    }

    #[test]
    fn custom_draw_receives_options() {
        let draw = Draw::custom(|rects, options| {
            let mut painter = Painter::new();
            painter.opacity(options.opacity.unwrap_or(1.0));
            rects.clear();
            painter.finish()
        });
        let mut rects = line_rects();
        let d = draw.apply(&mut rects, &DrawOptions::new().with_opacity(0.5));
        assert_eq!(d.opacity, 0.5);
        assert!(rects.is_empty());
    }
}
