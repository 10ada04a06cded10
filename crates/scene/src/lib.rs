pub mod graph;
pub mod hotspot;
pub mod panorama;

pub use graph::*;
pub use hotspot::*;
pub use panorama::*;
