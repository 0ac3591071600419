use crate::scene::*;

/// How a drawable layer composites onto the content below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Darken,
}

impl BlendMode {
    pub fn as_css(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Darken => "darken",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    FillRect { rect: Rect, color: ColorLinPremul },
    FillRoundedRect { rrect: RoundedRect, color: ColorLinPremul },
    StrokeRoundedRect { rrect: RoundedRect, stroke: Stroke, color: ColorLinPremul },
    /// Filled path (solid color only)
    FillPath { path: Path, color: ColorLinPremul, transform: Transform2D },
    StrokePath { path: Path, stroke: Stroke, color: ColorLinPremul, transform: Transform2D },
    /// A copy of an external image placed at `rect`.
    Image { href: String, rect: Rect },
}

/// A self-contained vector element: one overlay annotation, drawn as a group.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawable {
    pub opacity: f32,
    pub blend: BlendMode,
    pub commands: Vec<Command>,
}

impl Default for Drawable {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend: BlendMode::Normal,
            commands: Vec::new(),
        }
    }
}

impl Drawable {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
