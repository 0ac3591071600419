use crate::drawable::{BlendMode, Command, Drawable};
use crate::scene::*;

/// Builds a [`Drawable`] command by command, tracking a transform stack the
/// same way for every path it records.
pub struct Painter {
    drawable: Drawable,
    transform_stack: Vec<Transform2D>,
}

impl Default for Painter {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter {
    pub fn new() -> Self {
        Self {
            drawable: Drawable::default(),
            transform_stack: vec![Transform2D::identity()],
        }
    }

    pub fn opacity(&mut self, opacity: f32) -> &mut Self {
        self.drawable.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn blend(&mut self, blend: BlendMode) -> &mut Self {
        self.drawable.blend = blend;
        self
    }

    pub fn current_transform(&self) -> Transform2D {
        self.transform_stack
            .last()
            .copied()
            .unwrap_or_else(Transform2D::identity)
    }

    pub fn push_transform(&mut self, t: Transform2D) {
        // Compose with current transform so nested pushes multiply.
        let composed = self.current_transform().concat(t);
        self.transform_stack.push(composed);
    }

    pub fn pop_transform(&mut self) {
        if self.transform_stack.len() > 1 {
            let _ = self.transform_stack.pop();
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: ColorLinPremul) {
        self.drawable.commands.push(Command::FillRect { rect, color });
    }

    pub fn fill_rounded_rect(&mut self, rrect: RoundedRect, color: ColorLinPremul) {
        if rrect.radii.is_zero() {
            self.fill_rect(rrect.rect, color);
        } else {
            self.drawable
                .commands
                .push(Command::FillRoundedRect { rrect, color });
        }
    }

    pub fn stroke_rounded_rect(&mut self, rrect: RoundedRect, stroke: Stroke, color: ColorLinPremul) {
        self.drawable
            .commands
            .push(Command::StrokeRoundedRect { rrect, stroke, color });
    }

    /// Fill a path with a solid color.
    pub fn fill_path(&mut self, path: Path, color: ColorLinPremul) {
        let transform = self.current_transform();
        self.drawable.commands.push(Command::FillPath {
            path,
            color,
            transform,
        });
    }

    /// Stroke a path with uniform width and a solid color.
    pub fn stroke_path(&mut self, path: Path, stroke: Stroke, color: ColorLinPremul) {
        let transform = self.current_transform();
        self.drawable.commands.push(Command::StrokePath {
            path,
            stroke,
            color,
            transform,
        });
    }

    pub fn line(&mut self, from: [f32; 2], to: [f32; 2], stroke: Stroke, color: ColorLinPremul) {
        let mut path = Path::new();
        path.move_to(from[0], from[1]).line_to(to[0], to[1]);
        self.stroke_path(path, stroke, color);
    }

    pub fn image(&mut self, href: impl Into<String>, rect: Rect) {
        self.drawable.commands.push(Command::Image {
            href: href.into(),
            rect,
        });
    }

    pub fn finish(self) -> Drawable {
        self.drawable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_transforms_compose_and_pop() {
        let mut p = Painter::new();
        p.push_transform(Transform2D::translate(10.0, 0.0));
        p.push_transform(Transform2D::scale(2.0, 2.0));
        assert_eq!(p.current_transform().apply([1.0, 1.0]), [12.0, 2.0]);
        p.pop_transform();
        p.pop_transform();
        p.pop_transform();
        assert!(p.current_transform().is_identity());
    }

    #[test]
    fn square_rounded_rect_degrades_to_plain_fill() {
        let mut p = Painter::new();
        let color = ColorLinPremul::rgba(255, 0, 0, 255);
        p.fill_rounded_rect(
            RoundedRect { rect: Rect::new(0.0, 0.0, 4.0, 4.0), radii: RoundedRadii::default() },
            color,
        );
        assert!(matches!(p.finish().commands[0], Command::FillRect { .. }));
    }
}
