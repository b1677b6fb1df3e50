pub mod clamp;
pub mod gesture;
pub mod modes;

pub use clamp::*;
pub use gesture::*;
pub use modes::*;
