//! Adapter between a UI toolkit's element lifecycle and [`FixedLayout`].

use folio_scene::Size;
use futures::future::LocalBoxFuture;
use tracing::trace;

use crate::book::{Book, SpreadMode};
use crate::error::{LayoutError, Result};
use crate::layout::Zoom;
use crate::reader::FixedLayout;

/// The lifecycle a host toolkit drives a component through.
pub trait Component {
    /// The component was attached with the given viewport size.
    fn mount(&mut self, viewport: Size);

    /// A string attribute changed on the host element.
    fn on_attribute_change<'a>(&'a mut self, name: &'a str, value: &'a str) -> LocalBoxFuture<'a, Result<()>>;

    /// Lay out again with current state.
    fn render(&mut self);
}

/// Exposes a [`FixedLayout`] through the [`Component`] lifecycle.
///
/// Understood attributes: `zoom` (`fit-width`, `fit-page` or a number),
/// `scale-factor` (percentage) and `spread` (pagination mode).
pub struct FixedLayoutHost {
    layout: FixedLayout,
    mounted: bool,
}

impl FixedLayoutHost {
    pub fn new(layout: FixedLayout) -> Self {
        Self {
            layout,
            mounted: false,
        }
    }

    pub fn layout(&self) -> &FixedLayout {
        &self.layout
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn open(&mut self, book: Book) {
        self.layout.open(book);
    }

    /// The host element was resized.
    pub fn on_resize(&mut self, viewport: Size) {
        self.layout.resize(viewport.width, viewport.height);
    }

    /// The host element is going away.
    pub fn unmount(&mut self) {
        self.layout.destroy();
        self.mounted = false;
    }
}

impl Component for FixedLayoutHost {
    fn mount(&mut self, viewport: Size) {
        self.mounted = true;
        self.on_resize(viewport);
    }

    fn on_attribute_change<'a>(&'a mut self, name: &'a str, value: &'a str) -> LocalBoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match name {
                "zoom" => self.layout.set_zoom(value.parse::<Zoom>()?),
                "scale-factor" => {
                    let percent = value
                        .trim()
                        .parse::<f32>()
                        .ok()
                        .filter(|p| p.is_finite() && *p > 0.0)
                        .ok_or_else(|| LayoutError::InvalidAttribute {
                            name: "scale-factor",
                            value: value.to_string(),
                        })?;
                    self.layout.set_scale_factor(percent);
                }
                "spread" => self.layout.set_spread(value.parse::<SpreadMode>()?).await?,
                _ => trace!(name, value, "ignoring unknown attribute"),
            }
            Ok(())
        })
    }

    fn render(&mut self) {
        self.layout.relayout();
    }
}
