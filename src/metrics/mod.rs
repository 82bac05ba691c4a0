//! Windowed metric aggregation.
//!
//! - `series`: fixed-length count/value history for one metric
//! - `definitions`: display name overrides and listing order
//! - `store`: the actor owning every series and running the window tick

pub mod definitions;
pub mod series;
pub mod store;

pub use definitions::Definitions;
pub use series::{MetricSeries, AVERAGE_EPSILON};
pub use store::{SeriesCommand, SeriesHandle, SeriesStore};
