pub mod engine;
pub mod extent;
pub mod geometry;
pub mod projector;
pub mod raw;
pub mod rotation;

// Geographic projection layer: raw projections, rotation, fitting.
pub use engine::*;
pub use extent::*;
pub use geometry::*;
pub use projector::*;
pub use raw::*;
pub use rotation::*;
