//! SVG serialization of drawables, for hosts that composite overlays as markup.

use std::fmt::Write;

use crate::drawable::{Command, Drawable};
use crate::scene::*;

fn num(v: f32) -> String {
    // Trim float noise so output stays stable across platforms.
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// `d` attribute for a path.
pub fn path_data(path: &Path) -> String {
    let mut d = String::new();
    for cmd in &path.cmds {
        if !d.is_empty() {
            d.push(' ');
        }
        match cmd {
            PathCmd::MoveTo([x, y]) => {
                let _ = write!(d, "M {} {}", num(*x), num(*y));
            }
            PathCmd::LineTo([x, y]) => {
                let _ = write!(d, "L {} {}", num(*x), num(*y));
            }
            PathCmd::QuadTo([cx, cy], [x, y]) => {
                let _ = write!(d, "Q {} {} {} {}", num(*cx), num(*cy), num(*x), num(*y));
            }
            PathCmd::ArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                to,
            } => {
                let _ = write!(
                    d,
                    "A {} {} {} {} {} {} {}",
                    num(radii[0]),
                    num(radii[1]),
                    num(*rotation),
                    *large_arc as u8,
                    *sweep as u8,
                    num(to[0]),
                    num(to[1])
                );
            }
            PathCmd::Close => d.push('Z'),
        }
    }
    d
}

fn transform_attr(t: &Transform2D) -> String {
    if t.is_identity() {
        return String::new();
    }
    let [a, b, c, d, e, f] = t.m;
    format!(
        r#" transform="matrix({} {} {} {} {} {})""#,
        num(a),
        num(b),
        num(c),
        num(d),
        num(e),
        num(f)
    )
}

fn rect_attrs(r: &Rect) -> String {
    format!(
        r#"x="{}" y="{}" width="{}" height="{}""#,
        num(r.x),
        num(r.y),
        num(r.w),
        num(r.h)
    )
}

impl Drawable {
    /// Serialize as a single `<g>` element.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "<g");
        if self.opacity < 1.0 {
            let _ = write!(out, r#" opacity="{}""#, num(self.opacity));
        }
        if self.blend != Default::default() {
            let _ = write!(out, r#" style="mix-blend-mode: {}""#, self.blend.as_css());
        }
        out.push('>');
        for cmd in &self.commands {
            match cmd {
                Command::FillRect { rect, color } => {
                    let _ = write!(out, r#"<rect {} fill="{}"/>"#, rect_attrs(rect), color.to_css());
                }
                Command::FillRoundedRect { rrect, color } => {
                    let _ = write!(
                        out,
                        r#"<path d="{}" fill="{}"/>"#,
                        path_data(&Path::rounded_rect(*rrect)),
                        color.to_css()
                    );
                }
                Command::StrokeRoundedRect { rrect, stroke, color } => {
                    let _ = write!(
                        out,
                        r#"<rect {} rx="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                        rect_attrs(&rrect.rect),
                        num(rrect.radii.tl),
                        color.to_css(),
                        num(stroke.width)
                    );
                }
                Command::FillPath { path, color, transform } => {
                    let rule = match path.fill_rule {
                        FillRule::NonZero => "",
                        FillRule::EvenOdd => r#" fill-rule="evenodd""#,
                    };
                    let _ = write!(
                        out,
                        r#"<path d="{}" fill="{}"{}{}/>"#,
                        path_data(path),
                        color.to_css(),
                        rule,
                        transform_attr(transform)
                    );
                }
                Command::StrokePath {
                    path,
                    stroke,
                    color,
                    transform,
                } => {
                    let cap = match stroke.cap {
                        LineCap::Butt => "",
                        LineCap::Round => r#" stroke-linecap="round""#,
                    };
                    let _ = write!(
                        out,
                        r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}"{}{}/>"#,
                        path_data(path),
                        color.to_css(),
                        num(stroke.width),
                        cap,
                        transform_attr(transform)
                    );
                }
                Command::Image { href, rect } => {
                    let _ = write!(out, r#"<image href="{}" {}/>"#, escape_attr(href), rect_attrs(rect));
                }
            }
        }
        out.push_str("</g>");
        out
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::painter::Painter;

    #[test]
    fn path_data_uses_absolute_commands() {
        let mut p = Path::new();
        p.move_to(0.0, 0.5).line_to(10.0, 0.5).quad_to(12.0, 0.5, 12.0, 2.5).close();
        assert_eq!(path_data(&p), "M 0 0.5 L 10 0.5 Q 12 0.5 12 2.5 Z");
    }

    #[test]
    fn group_carries_opacity_and_children() {
        let mut painter = Painter::new();
        painter.opacity(0.3);
        painter.fill_rect(Rect::new(1.0, 2.0, 3.0, 4.0), ColorLinPremul::rgba(255, 0, 0, 255));
        painter.image("a&b.png", Rect::new(0.0, 0.0, 1.0, 1.0));
        let svg = painter.finish().to_svg();
        assert_eq!(
            svg,
            r##"<g opacity="0.3"><rect x="1" y="2" width="3" height="4" fill="#ff0000"/><image href="a&amp;b.png" x="0" y="0" width="1" height="1"/></g>"##
        );
    }
}
