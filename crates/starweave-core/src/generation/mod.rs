//! Generation - procedural creation of galaxies and names

mod galaxy;
mod names;

pub use galaxy::*;
pub use names::*;
