//! folio-scene: geometry and vector drawing primitives shared by the layout
//! engine and the annotation overlay.

mod color;
mod drawable;
mod hit_test;
mod painter;
mod scene;
pub mod svg;

pub use color::ColorParseError;
pub use drawable::*;
pub use painter::*;
pub use scene::*;
