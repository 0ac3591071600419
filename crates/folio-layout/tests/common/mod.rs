#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use folio_layout::{
    Book, DocumentMetrics, LayoutError, Presentation, ReaderEvent, RenderHost, RenderSource, RenderSurface, Result,
    Section, SectionLoader, Visibility,
};
use folio_scene::Size;
use futures::future::LocalBoxFuture;
use tokio::sync::mpsc::UnboundedReceiver;

/// Counters shared by every surface of a [`FakeHost`].
#[derive(Debug, Default)]
pub struct HostLog {
    pub created: usize,
    pub released: usize,
    /// Section of every load, in order.
    pub loads: Vec<Option<usize>>,
    pub detached_in_flight: usize,
    pub peak_detached_in_flight: usize,
}

pub struct FakeSurface {
    pub section: Option<usize>,
    log: Rc<RefCell<HostLog>>,
    page: Size,
    delay: usize,
    detached: Cell<bool>,
    released: Cell<bool>,
    pub last: RefCell<Option<Presentation>>,
}

impl RenderSurface for FakeSurface {
    fn load<'a>(&'a self, _source: &'a RenderSource) -> LocalBoxFuture<'a, Result<DocumentMetrics>> {
        Box::pin(async move {
            let detached = self.detached.get();
            {
                let mut log = self.log.borrow_mut();
                log.loads.push(self.section);
                if detached {
                    log.detached_in_flight += 1;
                    log.peak_detached_in_flight = log.peak_detached_in_flight.max(log.detached_in_flight);
                }
            }
            for _ in 0..self.delay {
                tokio::task::yield_now().await;
            }
            if detached {
                self.log.borrow_mut().detached_in_flight -= 1;
            }
            Ok(DocumentMetrics {
                meta_viewport: Some(format!("width={}, height={}", self.page.width, self.page.height)),
                ..Default::default()
            })
        })
    }

    fn present(&self, presentation: &Presentation) {
        self.detached.set(presentation.visibility == Visibility::Detached);
        *self.last.borrow_mut() = Some(*presentation);
    }

    fn release(&self) {
        assert!(!self.released.replace(true), "surface released twice");
        self.log.borrow_mut().released += 1;
    }
}

impl FakeSurface {
    pub fn is_released(&self) -> bool {
        self.released.get()
    }
}

/// Render host whose surfaces report a fixed page size after `delay` yields.
pub struct FakeHost {
    pub log: Rc<RefCell<HostLog>>,
    pub surfaces: RefCell<Vec<Rc<FakeSurface>>>,
    pub page: Size,
    pub delay: usize,
}

impl FakeHost {
    pub fn new(page: Size, delay: usize) -> Rc<Self> {
        Rc::new(Self {
            log: Rc::default(),
            surfaces: RefCell::default(),
            page,
            delay,
        })
    }

    /// Surfaces created for `section` so far.
    pub fn surfaces_for(&self, section: usize) -> Vec<Rc<FakeSurface>> {
        self.surfaces
            .borrow()
            .iter()
            .filter(|s| s.section == Some(section))
            .cloned()
            .collect()
    }

    pub fn live(&self) -> usize {
        let log = self.log.borrow();
        log.created - log.released
    }
}

impl RenderHost for FakeHost {
    fn create_surface(&self, section: Option<usize>) -> Rc<dyn RenderSurface> {
        self.log.borrow_mut().created += 1;
        let surface = Rc::new(FakeSurface {
            section,
            log: self.log.clone(),
            page: self.page,
            delay: self.delay,
            detached: Cell::new(false),
            released: Cell::new(false),
            last: RefCell::new(None),
        });
        self.surfaces.borrow_mut().push(surface.clone());
        surface
    }
}

/// Loader that fails a set number of times before succeeding.
pub struct FlakyLoader {
    pub section: usize,
    pub failures_left: Cell<usize>,
}

impl SectionLoader for FlakyLoader {
    fn load(&self) -> LocalBoxFuture<'_, Result<Option<RenderSource>>> {
        Box::pin(async move {
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(LayoutError::Load {
                    section: self.section,
                    reason: "network unreachable".into(),
                });
            }
            Ok(Some(RenderSource::new(format!("page-{}.xhtml", self.section))))
        })
    }
}

pub fn sections(count: usize) -> Vec<Section> {
    (0..count)
        .map(|i| Section::with_source(format!("s{i}"), RenderSource::new(format!("page-{i}.xhtml"))))
        .collect()
}

pub fn book(count: usize) -> Book {
    Book::new(sections(count))
}

pub async fn local<F: Future>(future: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(future).await
}

/// Relocations currently queued on `events`, in order.
pub fn relocations(events: &mut UnboundedReceiver<ReaderEvent>) -> Vec<Option<usize>> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ReaderEvent::Relocate(location) = event {
            out.push(location.index);
        }
    }
    out
}
