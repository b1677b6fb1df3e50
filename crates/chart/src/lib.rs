pub mod config;
pub mod error;
pub mod keys;
pub mod map_chart;
pub mod reconcile;
pub mod series;

pub use config::*;
pub use error::*;
pub use keys::*;
pub use map_chart::*;
pub use reconcile::*;
pub use series::*;
