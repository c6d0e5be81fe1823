//! Geographic units and boundary loading

mod unit;
pub mod boundary;

pub use unit::{GeographicUnit, district_from_display};
pub use boundary::{Boundaries, Feature, FeatureCollection, load_boundaries, load_boundaries_from_reader};
