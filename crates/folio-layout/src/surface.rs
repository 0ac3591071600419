//! Contract between the layout engine and the host's rendering surfaces.
//!
//! A surface is an isolated container that turns a [`RenderSource`] into
//! pixels. The engine never looks inside it: it only loads content, reads back
//! the metadata needed to size the page, and tells the surface where and how
//! large to present itself.

use std::rc::Rc;

use folio_scene::Size;
use futures::future::LocalBoxFuture;

use crate::book::RenderSource;
use crate::error::Result;

/// Size hints a loaded document exposes, in the order they are consulted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentMetrics {
    /// `viewBox` of an SVG root element, when the document is SVG.
    pub view_box: Option<String>,
    /// Content of `<meta name="viewport">`.
    pub meta_viewport: Option<String>,
    /// Natural size of the first image in the document.
    pub first_image: Option<Size>,
}

/// Whether a surface takes part in the visible layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// In flow, visible and interactive.
    Visible,
    /// Out of flow, hidden, and ignoring pointer input.
    Detached,
}

/// Presentation attributes pushed to a surface after every layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Presentation {
    pub visibility: Visibility,
    /// `false` hides the page entirely (blank side, or the off side in portrait).
    pub displayed: bool,
    /// Top-left corner relative to the viewport, after scrolling.
    pub origin: [f32; 2],
    /// Box the page occupies on screen.
    pub outer: Size,
    /// Size of the document viewport inside the box.
    pub surface_size: Size,
    /// Scale applied to the document by transform, with origin at the top left.
    pub content_scale: f32,
}

impl Presentation {
    /// State of a surface that is rendered off screen for prefetching.
    pub fn detached() -> Self {
        Self {
            visibility: Visibility::Detached,
            ..Self::pending()
        }
    }

    /// State of a surface that is attached but not laid out yet.
    pub fn pending() -> Self {
        Self {
            visibility: Visibility::Visible,
            displayed: false,
            origin: [0.0, 0.0],
            outer: Size::default(),
            surface_size: Size::default(),
            content_scale: 1.0,
        }
    }
}

/// One isolated rendering container.
pub trait RenderSurface {
    /// Load a document and resolve once it is ready to be measured.
    fn load<'a>(&'a self, source: &'a RenderSource) -> LocalBoxFuture<'a, Result<DocumentMetrics>>;

    /// Apply presentation attributes.
    fn present(&self, presentation: &Presentation);

    /// Free the surface. Called exactly once per surface.
    fn release(&self);
}

/// Factory for render surfaces, owned by the host application.
pub trait RenderHost {
    /// Create and attach a new surface for `section` (`None` for a blank side).
    fn create_surface(&self, section: Option<usize>) -> Rc<dyn RenderSurface>;
}
