//! The fixed-layout reader: navigation over spreads, with a prerender cache
//! filled in the background.
//!
//! All state lives behind `Rc`/`RefCell` and background work runs on
//! [`tokio::task::spawn_local`], so a [`FixedLayout`] must be driven from
//! inside a [`tokio::task::LocalSet`]. Borrows are never held across an
//! await; anything that can change while a task is suspended is re-checked
//! after it resumes.

use std::cell::RefCell;
use std::rc::Rc;

use folio_config::FolioConfig;
use folio_scene::Size;
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, trace, warn};

use crate::book::{Book, Direction, RenderSource, SectionLoader, Side, SpreadMode};
use crate::cache::{PrerenderedSpread, SpreadCache, SpreadKey, SpreadSources};
use crate::error::Result;
use crate::event::{Location, NavigationReason, ReaderEvent};
use crate::frame::{Frame, FrameFactory, FrameRequest};
use crate::layout::{DEFAULT_PORTRAIT_THRESHOLD, LayoutInput, LayoutOutcome, Zoom, compute_layout};
use crate::preload::{PreloadQueue, PreloadTask, preload_window};
use crate::spread::{PlanOptions, Spread, SpreadPosition, plan_spreads, spread_of};
use crate::surface::{RenderHost, RenderSurface, Visibility};

/// Tunables of a [`FixedLayout`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReaderOptions {
    pub zoom: Zoom,
    /// User scale multiplier (1.0 = 100%).
    pub scale_factor: f32,
    /// Pagination mode that overrides the book's rendition properties.
    pub spread: Option<SpreadMode>,
    pub portrait_threshold: f32,
    pub first_page_blank: bool,
    pub max_cached_spreads: usize,
    pub prerendered_spreads: usize,
    pub max_concurrent_preloads: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            zoom: Zoom::FitPage,
            scale_factor: 1.0,
            spread: None,
            portrait_threshold: DEFAULT_PORTRAIT_THRESHOLD,
            first_page_blank: false,
            max_cached_spreads: 2,
            prerendered_spreads: 1,
            max_concurrent_preloads: 1,
        }
    }
}

impl ReaderOptions {
    /// Options from the `[layout]` and `[preload]` tables. Unparsable values
    /// are logged and replaced by defaults.
    pub fn from_config(config: &FolioConfig) -> Self {
        let defaults = Self::default();
        let zoom = config.layout.zoom.parse().unwrap_or_else(|e| {
            warn!(error = %e, "invalid zoom in configuration");
            defaults.zoom
        });
        let spread = config.layout.spread.as_deref().and_then(|mode| match mode.parse() {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!(error = %e, "invalid spread mode in configuration");
                None
            }
        });
        let scale_factor = positive("scale_factor", config.layout.scale_factor / 100.0, defaults.scale_factor);
        let portrait_threshold = positive(
            "portrait_threshold",
            config.layout.portrait_threshold,
            defaults.portrait_threshold,
        );
        Self {
            zoom,
            scale_factor,
            spread,
            portrait_threshold,
            first_page_blank: config.layout.first_page_blank,
            max_cached_spreads: config.preload.max_cached_spreads,
            prerendered_spreads: config.preload.prerendered_spreads,
            max_concurrent_preloads: config.preload.max_concurrent_preloads,
        }
    }
}

fn positive(name: &str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!(value, "invalid {name} in configuration");
        default
    }
}

/// A section to navigate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    /// Section index in the book.
    pub index: usize,
}

impl From<usize> for Target {
    fn from(index: usize) -> Self {
        Self { index }
    }
}

/// A document surface currently held by the reader.
#[derive(Clone)]
pub struct Content {
    pub section: Option<usize>,
    pub surface: Rc<dyn RenderSurface>,
    /// Part of the displayed spread rather than a prerendered one.
    pub visible: bool,
}

/// A viewport point resolved to a page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PagePoint {
    pub section: Option<usize>,
    pub side: Side,
    /// Point in the document's own coordinates.
    pub point: [f32; 2],
}

/// Everything the reader knows about what is on screen.
#[derive(Debug, Default)]
pub struct LayoutState {
    pub book: Book,
    pub spreads: Vec<Spread>,
    pub spread_mode: SpreadMode,
    /// Mode set explicitly by the host, taking precedence over the book's.
    pub spread_override: Option<SpreadMode>,
    /// Index of the spread being shown or navigated to.
    pub index: Option<usize>,
    pub side: Option<Side>,
    pub current: Option<PrerenderedSpread>,
    pub viewport: Size,
    pub zoom: Zoom,
    pub scale_factor: f32,
    pub portrait_threshold: f32,
    /// Last computed layout of the current spread.
    pub layout: Option<LayoutOutcome>,
    pub scroll: [f32; 2],
    pub scroll_locked: bool,
    /// Bumped whenever the spread table is replaced.
    pub generation: u64,
}

impl LayoutState {
    /// Layout input for the current spread, if one is shown.
    pub fn layout_input(&self) -> Option<LayoutInput> {
        let side = self.side?;
        let current = self.current.as_ref()?;
        let metrics = |frame: &Option<Rc<Frame>>| frame.as_ref().map(|f| f.metrics()).unwrap_or_default();
        let center = current.center.is_some();
        Some(LayoutInput {
            viewport: self.viewport,
            spread_mode: self.spread_mode,
            portrait_threshold: self.portrait_threshold,
            zoom: self.zoom,
            scale_factor: self.scale_factor,
            side,
            left: metrics(&current.left),
            right: if center {
                metrics(&current.center)
            } else {
                metrics(&current.right)
            },
            center,
        })
    }

    /// Section that has focus.
    pub fn focused_section(&self) -> Option<usize> {
        self.spreads.get(self.index?)?.focused_section(self.side)
    }

    fn plan(&self, first_page_blank: bool) -> Vec<Spread> {
        let hints: Vec<_> = self.book.sections.iter().map(|s| s.page_spread).collect();
        plan_spreads(
            &hints,
            PlanOptions {
                mode: self.spread_mode,
                dir: self.book.dir,
                first_page_blank,
            },
        )
    }
}

struct Shared {
    options: ReaderOptions,
    state: RefCell<LayoutState>,
    cache: RefCell<SpreadCache>,
    queue: RefCell<PreloadQueue>,
    factory: FrameFactory,
    events: UnboundedSender<ReaderEvent>,
    settled: Notify,
}

/// Paginated reader for fixed-layout books.
///
/// Cloning is cheap and yields a handle to the same reader.
#[derive(Clone)]
pub struct FixedLayout {
    shared: Rc<Shared>,
}

impl FixedLayout {
    /// Create a reader drawing through `host`. Notifications arrive on the
    /// returned receiver.
    pub fn new(host: Rc<dyn RenderHost>, options: ReaderOptions) -> (Self, UnboundedReceiver<ReaderEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let state = LayoutState {
            spread_override: options.spread,
            zoom: options.zoom,
            scale_factor: options.scale_factor,
            portrait_threshold: options.portrait_threshold,
            ..Default::default()
        };
        let shared = Shared {
            queue: RefCell::new(PreloadQueue::new(options.max_concurrent_preloads.max(1))),
            options,
            state: RefCell::new(state),
            cache: RefCell::new(SpreadCache::new()),
            factory: FrameFactory::new(host, events.clone()),
            events,
            settled: Notify::new(),
        };
        (
            Self {
                shared: Rc::new(shared),
            },
            receiver,
        )
    }

    /// Open `book` and plan its spreads. Nothing is rendered until the first
    /// navigation.
    pub fn open(&self, book: Book) {
        self.discard_rendered();
        self.shared.factory.set_default_viewport(book.rendition.viewport.clone());

        let mut st = self.shared.state.borrow_mut();
        st.spread_mode = st.spread_override.or(book.rendition.spread).unwrap_or_default();
        st.book = book;
        st.spreads = st.plan(self.shared.options.first_page_blank);
        info!(
            sections = st.book.sections.len(),
            spreads = st.spreads.len(),
            mode = %st.spread_mode,
            rtl = st.book.is_rtl(),
            "opened book"
        );
    }

    /// Jump to the spread holding `target`'s section.
    pub async fn go_to(&self, target: impl Into<Target>) -> Result<()> {
        self.go_to_section(target.into(), NavigationReason::Navigation).await
    }

    /// Navigate to `target` in order to select something inside it.
    pub async fn select(&self, target: impl Into<Target>) -> Result<()> {
        self.go_to_section(target.into(), NavigationReason::Selection).await
    }

    async fn go_to_section(&self, target: Target, reason: NavigationReason) -> Result<()> {
        let position = {
            let st = self.shared.state.borrow();
            if target.index >= st.book.sections.len() {
                trace!(section = target.index, "ignoring navigation to unknown section");
                return Ok(());
            }
            spread_of(&st.spreads, target.index)
        };
        match position {
            Some(SpreadPosition { index, side }) => self.go_to_spread(index, Some(side), reason).await,
            None => Ok(()),
        }
    }

    /// Show spread `index`, focusing `side`.
    ///
    /// Out-of-range indices are ignored. Navigating to the spread already
    /// shown only changes the focused side.
    pub async fn go_to_spread(&self, index: usize, side: Option<Side>, reason: NavigationReason) -> Result<()> {
        let (spread, previous, generation) = {
            let mut st = self.shared.state.borrow_mut();
            let Some(spread) = st.spreads.get(index).copied() else {
                trace!(index, "ignoring navigation outside the spread table");
                return Ok(());
            };
            if st.index == Some(index) {
                drop(st);
                self.render(side);
                return Ok(());
            }
            let previous = st.index.replace(index);
            (spread, previous, st.generation)
        };

        match self.show(index, spread, side, generation).await {
            Ok(true) => {
                self.report_location(reason);
                self.preload_next_spreads();
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                let mut st = self.shared.state.borrow_mut();
                if st.generation == generation && st.index == Some(index) {
                    st.index = previous;
                }
                Err(e)
            }
        }
    }

    /// Render or fetch spread `index` and display it. Returns `false` when a
    /// newer navigation or a respread took over in the meantime.
    async fn show(&self, index: usize, spread: Spread, side: Option<Side>, generation: u64) -> Result<bool> {
        let key = SpreadKey(index);

        let cached = self.shared.cache.borrow().get(key);
        let frames = match cached {
            Some(frames) => frames,
            None => {
                let pending = self.shared.cache.borrow().loading(key);
                if let Some(notify) = pending {
                    debug!(%key, "waiting for in-flight preload");
                    notify.notified().await;
                    if self.is_stale(generation) {
                        return Ok(false);
                    }
                }
                let cached = self.shared.cache.borrow().get(key);
                match cached {
                    Some(frames) => frames,
                    None => {
                        let sources = self.load_sources(&spread).await?;
                        let frames = self.render_spread(&spread, sources, false).await?;
                        if self.is_stale(generation) {
                            frames.release();
                            return Ok(false);
                        }
                        let existing = self.shared.cache.borrow().get(key);
                        match existing {
                            Some(existing) => {
                                frames.release();
                                existing
                            }
                            None => {
                                self.shared.cache.borrow_mut().insert(key, frames.clone());
                                frames
                            }
                        }
                    }
                }
            }
        };
        self.shared.cache.borrow_mut().touch(key);

        if self.is_stale(generation) || self.shared.state.borrow().index != Some(index) {
            return Ok(false);
        }
        self.show_spread(frames, side);
        Ok(true)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.shared.state.borrow().generation != generation
    }

    async fn load_sources(&self, spread: &Spread) -> Result<SpreadSources> {
        let loader = |section: Option<usize>| -> Option<Rc<dyn SectionLoader>> {
            let st = self.shared.state.borrow();
            st.book.sections.get(section?)?.loader.clone()
        };
        let (left, right, center) = (loader(spread.left), loader(spread.right), loader(spread.center));
        Ok(SpreadSources {
            left: load_section(left).await?,
            right: load_section(right).await?,
            center: load_section(center).await?,
        })
    }

    async fn render_spread(&self, spread: &Spread, sources: SpreadSources, detached: bool) -> Result<PrerenderedSpread> {
        let factory = &self.shared.factory;
        if let Some(center) = spread.center {
            let frame = factory
                .create_frame(FrameRequest {
                    section: Some(center),
                    source: sources.center,
                    detached,
                })
                .await?;
            return Ok(PrerenderedSpread::center(frame));
        }

        let left = factory
            .create_frame(FrameRequest {
                section: spread.left,
                source: sources.left,
                detached,
            })
            .await?;
        let right = factory
            .create_frame(FrameRequest {
                section: spread.right,
                source: sources.right,
                detached,
            })
            .await;
        match right {
            Ok(right) => Ok(PrerenderedSpread::pair(left, right)),
            Err(e) => {
                left.release();
                Err(e)
            }
        }
    }

    /// Make `frames` the visible spread and move every other frame off screen.
    fn show_spread(&self, frames: PrerenderedSpread, side: Option<Side>) {
        let blank = |frame: &Option<Rc<Frame>>| frame.as_ref().is_none_or(|f| f.is_blank());
        let previous = {
            let mut st = self.shared.state.borrow_mut();
            let side = if frames.center.is_some() {
                Side::Center
            } else if blank(&frames.left) {
                Side::Right
            } else if blank(&frames.right) {
                Side::Left
            } else {
                side.unwrap_or_else(|| st.book.dir.leading_side())
            };
            st.side = Some(side);
            st.current.replace(frames.clone())
        };

        let visible: Vec<&Rc<Frame>> = frames.frames().collect();
        let is_visible = |frame: &Rc<Frame>| visible.iter().any(|v| Rc::ptr_eq(v, frame));
        {
            let cache = self.shared.cache.borrow();
            let cached = cache.keys().filter_map(|key| cache.get(key));
            for spread in cached.chain(previous) {
                for frame in spread.frames().filter(|f| !is_visible(f)) {
                    frame.set_detached(true);
                }
            }
        }
        for frame in &visible {
            frame.set_detached(false);
        }
        self.render(None);
    }

    /// Lay out the current spread and push the result to its surfaces.
    fn render(&self, side: Option<Side>) {
        let (current, outcome, scroll) = {
            let mut st = self.shared.state.borrow_mut();
            if let Some(side) = side {
                st.side = Some(side);
            }
            let Some(input) = st.layout_input() else {
                return;
            };
            let outcome = compute_layout(&input);
            st.layout = Some(outcome);
            st.scroll = outcome.scroll;
            let Some(current) = st.current.clone() else {
                return;
            };
            (current, outcome, st.scroll)
        };
        trace!(
            scale = outcome.scale,
            portrait = outcome.portrait,
            overflow_x = outcome.overflow_x,
            overflow_y = outcome.overflow_y,
            "layout"
        );
        for frame in current.frames() {
            frame.apply_zoom(outcome.scale);
        }
        present(&current, &outcome, scroll);
    }

    /// Turn the page inside a portrait pair. Returns whether it did.
    fn turn_within_spread(&self, towards: Side) -> bool {
        {
            let mut st = self.shared.state.borrow_mut();
            let Some(current) = &st.current else {
                return false;
            };
            if current.center.is_some() {
                return false;
            }
            let frame = match towards {
                Side::Left => &current.left,
                _ => &current.right,
            };
            if frame.as_ref().is_none_or(|f| f.is_blank()) {
                return false;
            }
            let portrait = st.layout.is_some_and(|layout| layout.portrait);
            if !portrait || st.side == Some(towards) {
                return false;
            }
            st.side = Some(towards);
        }
        self.render(None);
        self.report_location(NavigationReason::Page);
        true
    }

    /// Advance one page in reading order.
    pub async fn next(&self) -> Result<()> {
        let dir = self.direction();
        let towards = match dir {
            Direction::Ltr => Side::Right,
            Direction::Rtl => Side::Left,
        };
        if self.turn_within_spread(towards) {
            return Ok(());
        }
        let target = self.shared.state.borrow().index.map_or(0, |i| i + 1);
        self.go_to_spread(target, Some(dir.leading_side()), NavigationReason::Page)
            .await
    }

    /// Go back one page in reading order.
    pub async fn prev(&self) -> Result<()> {
        let dir = self.direction();
        let (towards, landing) = match dir {
            Direction::Ltr => (Side::Left, Side::Right),
            Direction::Rtl => (Side::Right, Side::Left),
        };
        if self.turn_within_spread(towards) {
            return Ok(());
        }
        let target = self.shared.state.borrow().index.and_then(|i| i.checked_sub(1));
        match target {
            Some(target) => self.go_to_spread(target, Some(landing), NavigationReason::Page).await,
            None => Ok(()),
        }
    }

    /// Scroll overflowing content. Ignored while scrolling is locked.
    pub fn pan(&self, dx: f32, dy: f32) {
        let (current, outcome, scroll) = {
            let mut st = self.shared.state.borrow_mut();
            if st.scroll_locked {
                return;
            }
            let (Some(current), Some(outcome)) = (st.current.clone(), st.layout) else {
                return;
            };
            st.scroll_locked = true;
            let max_x = (outcome.content.width - st.viewport.width).max(0.0);
            let max_y = (outcome.content.height - st.viewport.height).max(0.0);
            st.scroll = [
                (st.scroll[0] + dx).clamp(0.0, max_x),
                (st.scroll[1] + dy).clamp(0.0, max_y),
            ];
            (current, outcome, st.scroll)
        };
        present(&current, &outcome, scroll);
        self.shared.state.borrow_mut().scroll_locked = false;
    }

    /// Change the pagination mode, replanning spreads and staying on the
    /// focused section.
    ///
    /// Every rendered and in-flight spread is discarded first, since cache
    /// keys refer to positions in the old spread table.
    pub async fn set_spread(&self, mode: SpreadMode) -> Result<()> {
        let (section, dir) = {
            let st = self.shared.state.borrow();
            (st.focused_section(), st.book.dir)
        };
        self.discard_rendered();

        let target = {
            let mut st = self.shared.state.borrow_mut();
            st.spread_override = Some(mode);
            st.spread_mode = mode;
            st.spreads = st.plan(self.shared.options.first_page_blank);
            info!(%mode, spreads = st.spreads.len(), "respread");
            section.and_then(|section| spread_of(&st.spreads, section))
        };
        match target {
            Some(position) => {
                self.go_to_spread(position.index, Some(dir.leading_side()), NavigationReason::Page)
                    .await
            }
            None => Ok(()),
        }
    }

    pub fn set_zoom(&self, zoom: Zoom) {
        self.shared.state.borrow_mut().zoom = zoom;
        self.render(None);
    }

    /// Set the user scale factor as a percentage.
    /// Non-finite or non-positive values are ignored.
    pub fn set_scale_factor(&self, percent: f32) {
        if !percent.is_finite() || percent <= 0.0 {
            warn!(percent, "ignoring invalid scale factor");
            return;
        }
        self.shared.state.borrow_mut().scale_factor = percent / 100.0;
        self.render(None);
    }

    /// Viewport size changed.
    pub fn resize(&self, width: f32, height: f32) {
        self.shared.state.borrow_mut().viewport = Size::new(width, height);
        self.render(None);
    }

    /// Re-run layout with the current settings.
    pub fn relayout(&self) {
        self.render(None);
    }

    /// Section index of the focused page.
    pub fn index(&self) -> Option<usize> {
        self.shared.state.borrow().focused_section()
    }

    /// Index of the spread being shown.
    pub fn spread_index(&self) -> Option<usize> {
        self.shared.state.borrow().index
    }

    pub fn side(&self) -> Option<Side> {
        self.shared.state.borrow().side
    }

    pub fn spreads(&self) -> Vec<Spread> {
        self.shared.state.borrow().spreads.clone()
    }

    pub fn spread_of(&self, section: usize) -> Option<SpreadPosition> {
        spread_of(&self.shared.state.borrow().spreads, section)
    }

    pub fn spread_mode(&self) -> SpreadMode {
        self.shared.state.borrow().spread_mode
    }

    pub fn layout(&self) -> Option<LayoutOutcome> {
        self.shared.state.borrow().layout
    }

    pub fn is_overflow_x(&self) -> bool {
        self.layout().is_some_and(|layout| layout.overflow_x)
    }

    pub fn is_overflow_y(&self) -> bool {
        self.layout().is_some_and(|layout| layout.overflow_y)
    }

    pub fn scroll(&self) -> [f32; 2] {
        self.shared.state.borrow().scroll
    }

    pub fn scroll_locked(&self) -> bool {
        self.shared.state.borrow().scroll_locked
    }

    pub fn set_scroll_locked(&self, locked: bool) {
        self.shared.state.borrow_mut().scroll_locked = locked;
    }

    /// Keys of the spreads currently rendered, in no particular order.
    pub fn cached_spreads(&self) -> Vec<SpreadKey> {
        self.shared.cache.borrow().keys().collect()
    }

    /// Resolve a viewport point to the page under it.
    pub fn locate(&self, point: [f32; 2]) -> Option<PagePoint> {
        let st = self.shared.state.borrow();
        let (side, local) = st.layout?.locate(point, st.scroll)?;
        let section = st
            .current
            .as_ref()
            .and_then(|current| match side {
                Side::Left => current.left.as_ref(),
                Side::Right => current.right.as_ref(),
                Side::Center => current.center.as_ref(),
            })
            .and_then(|frame| frame.section());
        Some(PagePoint {
            section,
            side,
            point: local,
        })
    }

    /// Every loaded document, visible ones first.
    pub fn contents(&self) -> Vec<Content> {
        let st = self.shared.state.borrow();
        let cache = self.shared.cache.borrow();
        let mut contents: Vec<Content> = Vec::new();
        let visible = st.current.iter().map(|spread| (spread.clone(), true));
        let hidden = cache.keys().filter_map(|key| cache.get(key)).map(|spread| (spread, false));
        for (spread, is_visible) in visible.chain(hidden) {
            for frame in spread.frames() {
                if frame.is_blank() || frame.is_released() {
                    continue;
                }
                if contents.iter().any(|c| Rc::ptr_eq(&c.surface, frame.surface())) {
                    continue;
                }
                contents.push(Content {
                    section: frame.section(),
                    surface: frame.surface().clone(),
                    visible: is_visible,
                });
            }
        }
        contents
    }

    /// Release every surface and stop background work.
    pub fn destroy(&self) {
        self.discard_rendered();
        debug!("reader destroyed");
    }

    /// Resolves once no preload is queued or running.
    pub async fn preloads_settled(&self) {
        loop {
            let notified = self.shared.settled.notified();
            if self.shared.queue.borrow().is_idle() {
                return;
            }
            notified.await;
        }
    }

    fn direction(&self) -> Direction {
        self.shared.state.borrow().book.dir
    }

    fn report_location(&self, reason: NavigationReason) {
        let location = Location {
            reason,
            index: self.index(),
            fraction: 0.0,
            size: 1.0,
        };
        debug!(reason = reason.as_str(), index = ?location.index, "relocate");
        let _ = self.shared.events.send(ReaderEvent::Relocate(location));
    }

    /// Drop all rendered spreads and queued work, invalidating anything in flight.
    fn discard_rendered(&self) {
        self.shared.queue.borrow_mut().clear();
        self.shared.cache.borrow_mut().clear();
        let mut st = self.shared.state.borrow_mut();
        if let Some(current) = st.current.take() {
            current.release();
        }
        st.index = None;
        st.side = None;
        st.layout = None;
        st.scroll = [0.0, 0.0];
        st.generation += 1;
    }

    /// The shown spread and its preload window.
    fn protected_keys(&self) -> Vec<SpreadKey> {
        let st = self.shared.state.borrow();
        let Some(index) = st.index else {
            return Vec::new();
        };
        let window = preload_window(index, st.spreads.len(), self.shared.options.prerendered_spreads);
        std::iter::once(index)
            .chain(window.into_iter().map(|(i, _)| i))
            .map(SpreadKey)
            .collect()
    }

    /// Prune the cache, then queue neighbours of the current spread.
    fn preload_next_spreads(&self) {
        let (index, len, generation, spreads) = {
            let st = self.shared.state.borrow();
            let Some(index) = st.index else {
                return;
            };
            (index, st.spreads.len(), st.generation, st.spreads.clone())
        };
        let protect = self.protected_keys();
        let max_cached = self.shared.options.max_cached_spreads.max(1);
        self.shared.cache.borrow_mut().prune(max_cached, &protect);

        let window = preload_window(index, len, self.shared.options.prerendered_spreads);
        {
            let cache = self.shared.cache.borrow();
            let mut queue = self.shared.queue.borrow_mut();
            for (target_index, direction) in window {
                let key = SpreadKey(target_index);
                if cache.contains(key) || cache.loading(key).is_some() || queue.is_queued(target_index) {
                    continue;
                }
                queue.push(PreloadTask {
                    target_index,
                    direction,
                    spread: spreads[target_index],
                    generation,
                });
            }
        }
        self.drain_preloads();
    }

    /// Start queued preloads until the concurrency ceiling is reached.
    fn drain_preloads(&self) {
        loop {
            let next = self.shared.queue.borrow_mut().start_next();
            let Some(task) = next else {
                break;
            };
            let key = SpreadKey(task.target_index);
            let skip = {
                let cache = self.shared.cache.borrow();
                self.is_stale(task.generation) || cache.contains(key) || cache.loading(key).is_some()
            };
            if skip {
                self.shared.queue.borrow_mut().finish();
                continue;
            }

            let notify = self.shared.cache.borrow_mut().mark_loading(key);
            let this = self.clone();
            tokio::task::spawn_local(async move {
                if let Err(e) = this.run_preload(&task).await {
                    debug!(%key, error = %e, "preload failed");
                }
                this.shared.cache.borrow_mut().abandon_loading(key, &notify);
                notify.notify_waiters();
                this.shared.queue.borrow_mut().finish();
                this.drain_preloads();
            });
        }
        if self.shared.queue.borrow().is_idle() {
            self.shared.settled.notify_waiters();
        }
    }

    async fn run_preload(&self, task: &PreloadTask) -> Result<()> {
        let key = SpreadKey(task.target_index);
        debug!(%key, direction = ?task.direction, "preloading spread");

        let sources = self.load_sources(&task.spread).await?;
        if self.is_stale(task.generation) {
            return Ok(());
        }
        let frames = self.render_spread(&task.spread, sources, true).await?;
        if self.is_stale(task.generation) || self.shared.cache.borrow().contains(key) {
            frames.release();
            return Ok(());
        }

        let protect = self.protected_keys();
        {
            let mut cache = self.shared.cache.borrow_mut();
            cache.insert(key, frames.clone());
            cache.prune(self.shared.options.max_cached_spreads.max(1), &protect);
        }
        let scale = self.shared.state.borrow().layout.map_or(1.0, |layout| layout.scale);
        for frame in frames.frames() {
            frame.apply_zoom(scale);
        }
        Ok(())
    }
}

async fn load_section(loader: Option<Rc<dyn SectionLoader>>) -> Result<Option<RenderSource>> {
    match loader {
        Some(loader) => loader.load().await,
        None => Ok(None),
    }
}

fn present(current: &PrerenderedSpread, outcome: &LayoutOutcome, scroll: [f32; 2]) {
    let pairs = [
        (&current.left, outcome.left),
        (&current.right, outcome.right),
        (&current.center, outcome.right),
    ];
    for (frame, placement) in pairs {
        if let Some(frame) = frame {
            frame.present(&placement.presentation(Visibility::Visible, scroll));
        }
    }
}

