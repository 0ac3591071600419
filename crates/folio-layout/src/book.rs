//! The paginated document model the layout engine consumes.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use folio_scene::Size;
use futures::future::LocalBoxFuture;

use crate::error::{LayoutError, Result};
use crate::surface::RenderSurface;

/// Reading direction of the book.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Side a fresh spread opens on when no explicit side was requested.
    pub fn leading_side(self) -> Side {
        match self {
            Direction::Ltr => Side::Left,
            Direction::Rtl => Side::Right,
        }
    }
}

/// Placement hint carried by a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSpread {
    Left,
    Right,
    Center,
}

/// Which half of a spread is focused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Center,
}

/// Pagination mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpreadMode {
    /// Every section is shown alone.
    None,
    /// Pair pages, dropping to one page in tall viewports.
    #[default]
    Auto,
    /// Same as `Auto`.
    Landscape,
    /// Pair pages even in tall viewports.
    Portrait,
    /// Same as `Portrait`.
    Both,
}

impl SpreadMode {
    pub fn is_none(self) -> bool {
        self == SpreadMode::None
    }

    /// Modes that keep two pages side by side regardless of aspect ratio.
    pub fn forces_dual_page(self) -> bool {
        matches!(self, SpreadMode::Portrait | SpreadMode::Both)
    }
}

impl FromStr for SpreadMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SpreadMode::None),
            "auto" | "" => Ok(SpreadMode::Auto),
            "landscape" => Ok(SpreadMode::Landscape),
            "portrait" | "portrait-pairs" => Ok(SpreadMode::Portrait),
            "both" => Ok(SpreadMode::Both),
            _ => Err(LayoutError::InvalidAttribute {
                name: "spread",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SpreadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpreadMode::None => "none",
            SpreadMode::Auto => "auto",
            SpreadMode::Landscape => "landscape",
            SpreadMode::Portrait => "portrait",
            SpreadMode::Both => "both",
        })
    }
}

/// Arguments handed to a document's zoom hook on every render.
pub struct ZoomEvent<'a> {
    pub surface: &'a dyn RenderSurface,
    pub scale: f32,
}

/// Callback for documents that re-rasterize themselves at the effective scale
/// instead of being scaled by a transform.
pub type ZoomHook = Rc<dyn Fn(ZoomEvent<'_>)>;

/// What a section loader resolves to.
#[derive(Clone)]
pub struct RenderSource {
    /// Document address handed to the render surface.
    pub src: String,
    /// Inline document body, when the loader already has it.
    pub data: Option<String>,
    pub on_zoom: Option<ZoomHook>,
}

impl RenderSource {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            data: None,
            on_zoom: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_zoom_hook(mut self, hook: ZoomHook) -> Self {
        self.on_zoom = Some(hook);
        self
    }
}

impl fmt::Debug for RenderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSource")
            .field("src", &self.src)
            .field("data", &self.data.as_ref().map(|d| d.len()))
            .field("on_zoom", &self.on_zoom.is_some())
            .finish()
    }
}

/// Produces the renderable content of a section on demand.
///
/// `Ok(None)` means the section has nothing to show and is treated as blank.
pub trait SectionLoader {
    fn load(&self) -> LocalBoxFuture<'_, Result<Option<RenderSource>>>;
}

impl SectionLoader for RenderSource {
    fn load(&self) -> LocalBoxFuture<'_, Result<Option<RenderSource>>> {
        let source = self.clone();
        Box::pin(async move { Ok(Some(source)) })
    }
}

/// One page of the book.
#[derive(Clone)]
pub struct Section {
    pub id: String,
    pub page_spread: Option<PageSpread>,
    pub loader: Option<Rc<dyn SectionLoader>>,
}

impl Section {
    pub fn new(id: impl Into<String>, loader: Rc<dyn SectionLoader>) -> Self {
        Self {
            id: id.into(),
            page_spread: None,
            loader: Some(loader),
        }
    }

    /// A section whose content is known up front.
    pub fn with_source(id: impl Into<String>, source: RenderSource) -> Self {
        Self::new(id, Rc::new(source))
    }

    pub fn page_spread(mut self, hint: PageSpread) -> Self {
        self.page_spread = Some(hint);
        self
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("page_spread", &self.page_spread)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

/// Book-level fallback page size, either as a size or as a viewport string.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultViewport {
    Size(Size),
    Meta(String),
}

/// Rendition properties declared by the book.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rendition {
    pub spread: Option<SpreadMode>,
    pub viewport: Option<DefaultViewport>,
}

#[derive(Clone, Debug, Default)]
pub struct Book {
    pub sections: Vec<Section>,
    pub dir: Direction,
    pub rendition: Rendition,
}

impl Book {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            sections,
            ..Default::default()
        }
    }

    pub fn rtl(mut self) -> Self {
        self.dir = Direction::Rtl;
        self
    }

    pub fn is_rtl(&self) -> bool {
        self.dir == Direction::Rtl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_mode_parses_aliases() {
        assert_eq!("portrait-pairs".parse::<SpreadMode>().unwrap(), SpreadMode::Portrait);
        assert_eq!(" Both ".parse::<SpreadMode>().unwrap(), SpreadMode::Both);
        assert_eq!("".parse::<SpreadMode>().unwrap(), SpreadMode::Auto);
        assert!("sideways".parse::<SpreadMode>().is_err());
    }

    #[test]
    fn dual_page_modes() {
        assert!(SpreadMode::Both.forces_dual_page());
        assert!(SpreadMode::Portrait.forces_dual_page());
        assert!(!SpreadMode::Auto.forces_dual_page());
        assert!(!SpreadMode::Landscape.forces_dual_page());
    }

    #[test]
    fn leading_side_follows_direction() {
        assert_eq!(Direction::Ltr.leading_side(), Side::Left);
        assert_eq!(Direction::Rtl.leading_side(), Side::Right);
    }
}
