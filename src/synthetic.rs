//! In-memory stand-ins for a real rendering surface and text layout.

use std::cell::Cell;
use std::rc::Rc;

use folio_layout::{DocumentMetrics, Presentation, RenderHost, RenderSource, RenderSurface, Result};
use folio_overlay::{ContentGeometry, TextRange};
use folio_scene::{Rect, Size};
use futures::future::LocalBoxFuture;
use tracing::debug;

/// Surface that "renders" instantly and reports a fixed page size.
pub struct PageSurface {
    section: Option<usize>,
    page: Size,
    released: Cell<bool>,
}

impl RenderSurface for PageSurface {
    fn load<'a>(&'a self, source: &'a RenderSource) -> LocalBoxFuture<'a, Result<DocumentMetrics>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            debug!(section = ?self.section, src = %source.src, "rendered page");
            // Alternate between the two ways documents declare their size.
            let metrics = if self.section.unwrap_or(0) % 2 == 0 {
                DocumentMetrics {
                    view_box: Some(format!("0 0 {} {}", self.page.width, self.page.height)),
                    ..Default::default()
                }
            } else {
                DocumentMetrics {
                    meta_viewport: Some(format!("width={}, height={}", self.page.width, self.page.height)),
                    ..Default::default()
                }
            };
            Ok(metrics)
        })
    }

    fn present(&self, presentation: &Presentation) {
        debug!(
            section = ?self.section,
            displayed = presentation.displayed,
            x = presentation.origin[0],
            scale = presentation.content_scale,
            "present"
        );
    }

    fn release(&self) {
        if !self.released.replace(true) {
            debug!(section = ?self.section, "released surface");
        }
    }
}

pub struct PageHost {
    pub page: Size,
}

impl RenderHost for PageHost {
    fn create_surface(&self, section: Option<usize>) -> Rc<dyn RenderSurface> {
        Rc::new(PageSurface {
            section,
            page: self.page,
            released: Cell::new(false),
        })
    }
}

/// Monospaced column of text: `per_line` offsets per line box.
pub struct TextColumn {
    pub paragraphs: Vec<TextRange>,
    pub per_line: usize,
    pub glyph: Size,
    pub margin: [f32; 2],
}

impl ContentGeometry for TextColumn {
    fn blocks(&self, _range: TextRange) -> Vec<TextRange> {
        self.paragraphs.clone()
    }

    fn client_rects(&self, range: TextRange) -> Vec<Rect> {
        if range.is_empty() || self.per_line == 0 {
            return Vec::new();
        }
        let n = self.per_line;
        (range.start / n..=(range.end - 1) / n)
            .map(|line| {
                let first = range.start.max(line * n) - line * n;
                let last = range.end.min((line + 1) * n) - line * n;
                Rect::new(
                    self.margin[0] + first as f32 * self.glyph.width,
                    self.margin[1] + line as f32 * self.glyph.height,
                    (last - first) as f32 * self.glyph.width,
                    self.glyph.height,
                )
            })
            .collect()
    }
}
