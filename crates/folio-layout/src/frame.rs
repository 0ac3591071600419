//! Frames: one section rendered into one surface.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use folio_scene::Size;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::book::{DefaultViewport, RenderSource, ZoomEvent, ZoomHook};
use crate::error::Result;
use crate::event::ReaderEvent;
use crate::layout::FrameMetrics;
use crate::surface::{Presentation, RenderHost, RenderSurface};
use crate::viewport::resolve_intrinsic_size;

/// A section rendered into a surface, with its intrinsic size.
pub struct Frame {
    section: Option<usize>,
    surface: Rc<dyn RenderSurface>,
    size: Option<Size>,
    on_zoom: Option<ZoomHook>,
    detached: Cell<bool>,
    released: Cell<bool>,
}

impl Frame {
    pub fn section(&self) -> Option<usize> {
        self.section
    }

    pub fn surface(&self) -> &Rc<dyn RenderSurface> {
        &self.surface
    }

    /// Intrinsic size; `None` for a blank frame.
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn is_blank(&self) -> bool {
        self.size.is_none()
    }

    pub fn is_detached(&self) -> bool {
        self.detached.get()
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    /// Move the frame off screen or back. The loaded document is kept.
    pub fn set_detached(&self, detached: bool) {
        if self.detached.replace(detached) != detached && detached {
            self.present(&Presentation::detached());
        }
    }

    pub fn metrics(&self) -> FrameMetrics {
        FrameMetrics {
            size: self.size,
            scale_aware: self.on_zoom.is_some(),
        }
    }

    /// Tell a scale-aware document the effective scale.
    pub fn apply_zoom(&self, scale: f32) {
        if let Some(hook) = &self.on_zoom
            && !self.released.get()
        {
            hook(ZoomEvent {
                surface: self.surface.as_ref(),
                scale,
            });
        }
    }

    pub fn present(&self, presentation: &Presentation) {
        if !self.released.get() {
            self.surface.present(presentation);
        }
    }

    /// Free the surface. Later calls are no-ops.
    pub fn release(&self) {
        if !self.released.replace(true) {
            self.surface.release();
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("section", &self.section)
            .field("size", &self.size)
            .field("detached", &self.detached.get())
            .field("released", &self.released.get())
            .finish_non_exhaustive()
    }
}

/// Arguments to [`FrameFactory::create_frame`].
#[derive(Debug, Default)]
pub struct FrameRequest {
    pub section: Option<usize>,
    /// `None` produces a blank frame.
    pub source: Option<RenderSource>,
    /// Render off screen for prefetching.
    pub detached: bool,
}

/// Creates frames through the host's [`RenderHost`].
pub struct FrameFactory {
    host: Rc<dyn RenderHost>,
    events: UnboundedSender<ReaderEvent>,
    default_viewport: RefCell<Option<DefaultViewport>>,
}

impl FrameFactory {
    pub fn new(host: Rc<dyn RenderHost>, events: UnboundedSender<ReaderEvent>) -> Self {
        Self {
            host,
            events,
            default_viewport: RefCell::new(None),
        }
    }

    /// Book-level page size used when a document declares none.
    pub fn set_default_viewport(&self, viewport: Option<DefaultViewport>) {
        *self.default_viewport.borrow_mut() = viewport;
    }

    /// Attach a new surface and load `request.source` into it.
    ///
    /// Resolves once the document is ready and its intrinsic size is known.
    /// Blank requests resolve immediately. On failure the surface is released.
    pub async fn create_frame(&self, request: FrameRequest) -> Result<Frame> {
        let FrameRequest {
            section,
            source,
            detached,
        } = request;
        let surface = self.host.create_surface(section);
        surface.present(&if detached {
            Presentation::detached()
        } else {
            Presentation::pending()
        });

        let Some(source) = source else {
            return Ok(Frame {
                section,
                surface,
                size: None,
                on_zoom: None,
                detached: Cell::new(detached),
                released: Cell::new(false),
            });
        };

        let metrics = match surface.load(&source).await {
            Ok(metrics) => metrics,
            Err(e) => {
                surface.release();
                return Err(e);
            }
        };
        let _ = self.events.send(ReaderEvent::Load {
            section,
            surface: surface.clone(),
        });

        let (size, origin) = resolve_intrinsic_size(&metrics, self.default_viewport.borrow().as_ref());
        debug!(
            ?section,
            ?origin,
            width = size.width,
            height = size.height,
            detached,
            "frame ready"
        );

        Ok(Frame {
            section,
            surface,
            size: Some(size),
            on_zoom: source.on_zoom,
            detached: Cell::new(detached),
            released: Cell::new(false),
        })
    }
}
