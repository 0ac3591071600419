//! Notifications emitted by the reader.

use std::fmt;
use std::rc::Rc;

use crate::surface::RenderSurface;

/// Why the location changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationReason {
    /// Page turn, including turns inside a portrait pair and respreads.
    Page,
    /// Jump to a section by `go_to`.
    Navigation,
    /// Jump to a section in order to select something inside it.
    Selection,
}

impl NavigationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            NavigationReason::Page => "page",
            NavigationReason::Navigation => "navigation",
            NavigationReason::Selection => "selection",
        }
    }
}

/// Payload of a location change.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub reason: NavigationReason,
    /// Section index of the focused page.
    pub index: Option<usize>,
    /// Fixed-layout pages are atomic, so this is always `0.0`.
    pub fraction: f32,
    /// Always `1.0` for the same reason.
    pub size: f32,
}

pub enum ReaderEvent {
    /// A navigation completed.
    Relocate(Location),
    /// A section's document finished loading into `surface`.
    Load {
        section: Option<usize>,
        surface: Rc<dyn RenderSurface>,
    },
}

impl fmt::Debug for ReaderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderEvent::Relocate(location) => f.debug_tuple("Relocate").field(location).finish(),
            ReaderEvent::Load { section, .. } => f.debug_struct("Load").field("section", section).finish_non_exhaustive(),
        }
    }
}
