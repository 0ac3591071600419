//! Folio demo: pages through a synthetic fixed-layout book and prints the
//! reader's notifications, then draws a few annotations as SVG.
//!
//! Set `RUST_LOG=debug` to watch rendering, caching and preloading.

mod synthetic;

use std::rc::Rc;

use anyhow::Result;
use folio_config::FolioConfig;
use folio_layout::{Book, FixedLayout, PageSpread, ReaderEvent, ReaderOptions, RenderSource, Section};
use folio_overlay::{DrawOptions, DrawStyle, Overlayer, TextRange};
use folio_scene::Size;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

use synthetic::{PageHost, TextColumn};

fn demo_book() -> Book {
    let sections = (0..9)
        .map(|i| {
            let section = Section::with_source(format!("page-{i}"), RenderSource::new(format!("page-{i}.xhtml")));
            // A fold-out plate that always sits alone.
            if i == 4 { section.page_spread(PageSpread::Center) } else { section }
        })
        .collect();
    Book::new(sections)
}

fn print_events(events: &mut UnboundedReceiver<ReaderEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            ReaderEvent::Relocate(location) => {
                println!("relocate ({}) -> section {:?}", location.reason.as_str(), location.index)
            }
            ReaderEvent::Load { section, .. } => println!("loaded section {section:?}"),
        }
    }
}

async fn read_book(config: &FolioConfig) -> Result<()> {
    let host = Rc::new(PageHost {
        page: Size::new(600.0, 800.0),
    });
    let (reader, mut events) = FixedLayout::new(host, ReaderOptions::from_config(config));
    reader.resize(1400.0, 900.0);
    reader.open(demo_book());
    for (i, spread) in reader.spreads().iter().enumerate() {
        println!("spread {i}: {spread:?}");
    }

    reader.go_to(0).await?;
    for _ in 0..3 {
        reader.next().await?;
    }
    reader.prev().await?;
    reader.preloads_settled().await;
    print_events(&mut events);

    if let Some(layout) = reader.layout() {
        println!(
            "at section {:?}, scale {:.3}, cached {:?}",
            reader.index(),
            layout.scale,
            reader.cached_spreads()
        );
    }
    reader.destroy();
    Ok(())
}

fn annotate(config: &FolioConfig) -> Result<()> {
    let column = TextColumn {
        paragraphs: vec![TextRange::new(0, 90), TextRange::new(90, 200)],
        per_line: 40,
        glyph: Size::new(9.0, 22.0),
        margin: [48.0, 64.0],
    };
    let mut overlay = Overlayer::from_config(column, &config.overlay);
    overlay.add(
        "highlight",
        TextRange::new(12, 130),
        DrawStyle::Highlight,
        DrawOptions::new().color("#facc15")?,
    );
    overlay.add("typo", TextRange::new(150, 158), "squiggly".parse::<DrawStyle>()?, DrawOptions::new());
    overlay.add("note", TextRange::new(40, 44), DrawStyle::Bubble, DrawOptions::new());

    let point = [60.0, 70.0];
    match overlay.hit_test(point) {
        Some(hit) => println!("hit {} over {} at {:?}", hit.key, hit.range, hit.rect),
        None => println!("no annotation at {point:?}"),
    }
    overlay.set_hole(200.0, 100.0, 40.0);
    println!("{}", overlay.to_svg());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = FolioConfig::load();
    tokio::task::LocalSet::new().run_until(read_book(&config)).await?;
    annotate(&config)
}
