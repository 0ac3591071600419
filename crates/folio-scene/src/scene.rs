#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform2D {
    // Affine 2D: [a, b, c, d, e, f] for matrix [[a c e],[b d f],[0 0 1]]
    pub m: [f32; 6],
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    /// Compose two transforms: self ∘ other (apply `other`, then `self`).
    pub fn concat(self, other: Self) -> Self {
        let [a1, b1, c1, d1, e1, f1] = self.m;
        let [a2, b2, c2, d2, e2, f2] = other.m;
        let a = a1 * a2 + c1 * b2;
        let b = b1 * a2 + d1 * b2;
        let c = a1 * c2 + c1 * d2;
        let d = b1 * c2 + d1 * d2;
        let e = a1 * e2 + c1 * f2 + e1;
        let f = b1 * e2 + d1 * f2 + f1;
        Self {
            m: [a, b, c, d, e, f],
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            m: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, tx, ty],
        }
    }

    /// Rotation by `degrees` (clockwise in a y-down space) around `(cx, cy)`.
    pub fn rotate_about(degrees: f32, cx: f32, cy: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let rotate = Self {
            m: [cos, sin, -sin, cos, 0.0, 0.0],
        };
        Self::translate(cx, cy)
            .concat(rotate)
            .concat(Self::translate(-cx, -cy))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Apply the transform to a point (x, y).
    pub fn apply(&self, p: [f32; 2]) -> [f32; 2] {
        let [a, b, c, d, e, f] = self.m;
        [a * p[0] + c * p[1] + e, b * p[0] + d * p[1] + f]
    }

    /// Apply the inverse transform to a world-space point. Returns None if non-invertible.
    pub fn inverse_apply(&self, p: [f32; 2]) -> Option<[f32; 2]> {
        let [a, b, c, d, e, f] = self.m;
        let det = a * d - b * c;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let ia = d * inv_det;
        let ib = -b * inv_det;
        let ic = -c * inv_det;
        let id = a * inv_det;
        // Inverse translation = -inv_linear * [e, f]
        let ie = -(ia * e + ic * f);
        let iff = -(ib * e + id * f);
        Some([ia * p[0] + ic * p[1] + ie, ib * p[0] + id * p[1] + iff])
    }
}

/// Width/height pair in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both dimensions finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned rectangle in y-down screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            x: left,
            y: top,
            w: right - left,
            h: bottom - top,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> [f32; 2] {
        [self.x + self.w * 0.5, self.y + self.h * 0.5]
    }

    /// Scale every edge (and therefore width and height) by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            w: self.w * factor,
            h: self.h * factor,
        }
    }

    /// Grow by `d` on every side.
    pub fn inflate(&self, d: f32) -> Self {
        Self {
            x: self.x - d,
            y: self.y - d,
            w: self.w + d * 2.0,
            h: self.h + d * 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RoundedRadii {
    pub tl: f32,
    pub tr: f32,
    pub br: f32,
    pub bl: f32,
}

impl RoundedRadii {
    pub const fn uniform(r: f32) -> Self {
        Self {
            tl: r,
            tr: r,
            br: r,
            bl: r,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.tl == 0.0 && self.tr == 0.0 && self.br == 0.0 && self.bl == 0.0
    }

    /// Clamp each radius so it never exceeds half the rect's width or height.
    pub fn clamped_to(&self, rect: Rect) -> Self {
        let max = (rect.w * 0.5).min(rect.h * 0.5).max(0.0);
        Self {
            tl: self.tl.min(max),
            tr: self.tr.min(max),
            br: self.br.min(max),
            bl: self.bl.min(max),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundedRect {
    pub rect: Rect,
    pub radii: RoundedRadii,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub cap: LineCap,
}

impl Stroke {
    pub const fn new(width: f32) -> Self {
        Self {
            width,
            cap: LineCap::Butt,
        }
    }

    pub const fn round(width: f32) -> Self {
        Self {
            width,
            cap: LineCap::Round,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorLinPremul {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Alias for the premultiplied linear color type, for a friendlier name in APIs.
pub type Color = ColorLinPremul;

// Constructors for ColorLinPremul are defined in color.rs to keep scene.rs focused

// --- Path geometry ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PathCmd {
    MoveTo([f32; 2]),
    LineTo([f32; 2]),
    QuadTo([f32; 2], [f32; 2]),
    /// Elliptical arc: radii, x-axis rotation, large-arc, sweep, end point.
    ArcTo {
        radii: [f32; 2],
        rotation: f32,
        large_arc: bool,
        sweep: bool,
        to: [f32; 2],
    },
    Close,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    pub cmds: Vec<PathCmd>,
    pub fill_rule: FillRule,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = rule;
        self
    }

    /// Current pen position, or the origin for an empty path.
    pub fn current_point(&self) -> [f32; 2] {
        let mut start = [0.0, 0.0];
        let mut pen = [0.0, 0.0];
        for cmd in &self.cmds {
            match *cmd {
                PathCmd::MoveTo(p) => {
                    start = p;
                    pen = p;
                }
                PathCmd::LineTo(p) | PathCmd::QuadTo(_, p) | PathCmd::ArcTo { to: p, .. } => pen = p,
                PathCmd::Close => pen = start,
            }
        }
        pen
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.cmds.push(PathCmd::MoveTo([x, y]));
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.cmds.push(PathCmd::LineTo([x, y]));
        self
    }

    /// Line relative to the current pen position.
    pub fn line_by(&mut self, dx: f32, dy: f32) -> &mut Self {
        let [x, y] = self.current_point();
        self.line_to(x + dx, y + dy)
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        self.cmds.push(PathCmd::QuadTo([cx, cy], [x, y]));
        self
    }

    /// Arc relative to the current pen position.
    pub fn arc_by(&mut self, rx: f32, ry: f32, large_arc: bool, sweep: bool, dx: f32, dy: f32) -> &mut Self {
        let [x, y] = self.current_point();
        self.cmds.push(PathCmd::ArcTo {
            radii: [rx, ry],
            rotation: 0.0,
            large_arc,
            sweep,
            to: [x + dx, y + dy],
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.cmds.push(PathCmd::Close);
        self
    }

    /// Rounded rectangle outline with per-corner radii, drawn with quadratic
    /// corners. Radii are clamped to half the rect's smaller dimension.
    pub fn rounded_rect(rrect: RoundedRect) -> Self {
        let Rect { x, y, w, h } = rrect.rect;
        let r = rrect.radii.clamped_to(rrect.rect);
        let mut p = Path::new();
        p.move_to(x + r.tl, y).line_to(x + w - r.tr, y);
        if r.tr > 0.0 {
            p.quad_to(x + w, y, x + w, y + r.tr);
        } else {
            p.line_to(x + w, y);
        }
        p.line_to(x + w, y + h - r.br);
        if r.br > 0.0 {
            p.quad_to(x + w, y + h, x + w - r.br, y + h);
        } else {
            p.line_to(x + w, y + h);
        }
        p.line_to(x + r.bl, y + h);
        if r.bl > 0.0 {
            p.quad_to(x, y + h, x, y + h - r.bl);
        } else {
            p.line_to(x, y + h);
        }
        p.line_to(x, y + r.tl);
        if r.tl > 0.0 {
            p.quad_to(x, y, x + r.tl, y);
        } else {
            p.line_to(x, y);
        }
        p.close();
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_about_center_keeps_center_fixed() {
        let t = Transform2D::rotate_about(90.0, 10.0, 10.0);
        let c = t.apply([10.0, 10.0]);
        assert!((c[0] - 10.0).abs() < 1e-4 && (c[1] - 10.0).abs() < 1e-4);
        let p = t.apply([20.0, 10.0]);
        assert!((p[0] - 10.0).abs() < 1e-4, "got {:?}", p);
        assert!((p[1] - 20.0).abs() < 1e-4, "got {:?}", p);
    }

    #[test]
    fn inverse_apply_round_trips() {
        let t = Transform2D::translate(5.0, -3.0).concat(Transform2D::scale(2.0, 4.0));
        let world = t.apply([1.5, 2.5]);
        let back = t.inverse_apply(world).unwrap();
        assert!((back[0] - 1.5).abs() < 1e-5);
        assert!((back[1] - 2.5).abs() < 1e-5);
    }

    #[test]
    fn relative_segments_follow_the_pen() {
        let mut p = Path::new();
        p.move_to(1.0, 1.0).line_by(2.0, 0.0).line_by(0.0, 3.0);
        assert_eq!(p.current_point(), [3.0, 4.0]);
        assert_eq!(p.cmds.last(), Some(&PathCmd::LineTo([3.0, 4.0])));
    }

    #[test]
    fn rounded_rect_path_uses_square_corners_where_radius_is_zero() {
        let rrect = RoundedRect {
            rect: Rect::new(0.0, 0.0, 40.0, 10.0),
            radii: RoundedRadii { tl: 4.0, tr: 0.0, br: 0.0, bl: 4.0 },
        };
        let path = Path::rounded_rect(rrect);
        let quads = path.cmds.iter().filter(|c| matches!(c, PathCmd::QuadTo(..))).count();
        assert_eq!(quads, 2);
    }

    #[test]
    fn radii_clamp_to_half_the_short_side() {
        let r = RoundedRadii::uniform(20.0).clamped_to(Rect::new(0.0, 0.0, 100.0, 8.0));
        assert_eq!(r, RoundedRadii::uniform(4.0));
    }
}
