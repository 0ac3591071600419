//! Fixed-layout pagination for document readers.
//!
//! Sections of a book are paired into spreads, each spread is rendered into
//! isolated surfaces supplied by the host, scaled to the viewport, and kept in
//! a small LRU cache that is filled ahead of navigation by a bounded
//! background queue.
//!
//! The reader is single-threaded: drive it from a `tokio::task::LocalSet`.

mod book;
mod cache;
mod error;
mod event;
mod frame;
mod host;
mod layout;
mod preload;
mod reader;
mod spread;
mod surface;
pub mod viewport;

pub use book::{
    Book, DefaultViewport, Direction, PageSpread, RenderSource, Rendition, Section, SectionLoader, Side, SpreadMode,
    ZoomEvent, ZoomHook,
};
pub use cache::{PrerenderedSpread, SpreadCache, SpreadKey, SpreadSources};
pub use error::{LayoutError, Result};
pub use event::{Location, NavigationReason, ReaderEvent};
pub use frame::{Frame, FrameFactory, FrameRequest};
pub use host::{Component, FixedLayoutHost};
pub use layout::{
    DEFAULT_PORTRAIT_THRESHOLD, FrameMetrics, LayoutInput, LayoutOutcome, Placement, Zoom, compute_layout,
};
pub use preload::{PreloadDirection, PreloadQueue, PreloadTask, preload_window};
pub use reader::{Content, FixedLayout, LayoutState, PagePoint, ReaderOptions, Target};
pub use spread::{PlanOptions, Spread, SpreadPosition, plan_spreads, spread_of};
pub use surface::{DocumentMetrics, Presentation, RenderHost, RenderSurface, Visibility};
