//! Annotation overlay for rendered documents.
//!
//! An [`Overlayer`] maps annotation keys to logical text ranges, asks the
//! document's [`ContentGeometry`] for the line boxes of each range (split at
//! paragraph boundaries) and turns them into vector [`folio_scene::Drawable`]s
//! through a drawing strategy. Pointer positions resolve back to the topmost
//! annotation with [`Overlayer::hit_test`].

pub mod draw;
mod error;
mod geometry;
mod overlayer;

pub use draw::{Draw, DrawOptions, DrawStyle};
pub use error::{OverlayError, Result};
pub use geometry::{ContentGeometry, TextRange, WritingMode, range_rects, split_by_blocks};
pub use overlayer::{DEFAULT_HIT_TOLERANCE, OverlayEntry, OverlayHit, Overlayer};
