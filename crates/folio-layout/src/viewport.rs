//! Intrinsic page size resolution.

use folio_scene::Size;
use tracing::warn;

use crate::book::DefaultViewport;
use crate::surface::DocumentMetrics;

/// Size used when a document declares nothing usable.
pub const FALLBACK_SIZE: Size = Size::new(1000.0, 2000.0);

/// Where an intrinsic size came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeSource {
    ViewBox,
    MetaViewport,
    BookDefault,
    Image,
    Fallback,
}

/// Split a viewport declaration such as `width=1200, height=1600` into
/// key/value pairs. Commas, semicolons and whitespace all separate entries.
pub fn parse_viewport(content: &str) -> Vec<(String, String)> {
    // Glue `width = 1200` back together before splitting on whitespace.
    let mut normalized = content.to_string();
    while normalized.contains(" =") || normalized.contains("= ") {
        normalized = normalized.replace(" =", "=").replace("= ", "=");
    }
    normalized
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => (entry.trim().to_string(), String::new()),
        })
        .collect()
}

/// Width and height from parsed viewport entries, when both are usable.
pub fn viewport_size(entries: &[(String, String)]) -> Option<Size> {
    let lookup = |name: &str| {
        entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.parse::<f32>().ok())
    };
    let size = Size::new(lookup("width")?, lookup("height")?);
    size.is_usable().then_some(size)
}

/// Width and height of an SVG `viewBox` (`min-x min-y width height`).
pub fn view_box_size(view_box: &str) -> Option<Size> {
    let parts: Vec<f32> = view_box
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::parse::<f32>)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [_, _, width, height] => Some(Size::new(*width, *height)).filter(Size::is_usable),
        _ => None,
    }
}

/// Resolve a loaded document's intrinsic size.
///
/// Tries the SVG `viewBox`, the document's meta viewport, the book's default
/// viewport, then the first image, and finally [`FALLBACK_SIZE`]. Each
/// candidate counts only when both dimensions are finite and positive.
pub fn resolve_intrinsic_size(
    metrics: &DocumentMetrics,
    book_default: Option<&DefaultViewport>,
) -> (Size, SizeSource) {
    if let Some(size) = metrics.view_box.as_deref().and_then(view_box_size) {
        return (size, SizeSource::ViewBox);
    }
    if let Some(size) = metrics
        .meta_viewport
        .as_deref()
        .and_then(|content| viewport_size(&parse_viewport(content)))
    {
        return (size, SizeSource::MetaViewport);
    }
    let default_size = match book_default {
        Some(DefaultViewport::Meta(content)) => viewport_size(&parse_viewport(content)),
        Some(DefaultViewport::Size(size)) => Some(*size).filter(Size::is_usable),
        None => None,
    };
    if let Some(size) = default_size {
        return (size, SizeSource::BookDefault);
    }
    if let Some(size) = metrics.first_image.filter(Size::is_usable) {
        return (size, SizeSource::Image);
    }
    warn!(
        width = FALLBACK_SIZE.width,
        height = FALLBACK_SIZE.height,
        "missing viewport properties, using fallback page size"
    );
    (FALLBACK_SIZE, SizeSource::Fallback)
}
