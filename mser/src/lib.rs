#![cfg_attr(all(test, feature = "unstable"), feature(test))]
#![allow(missing_docs)]

pub mod boundary;
pub mod component;
pub mod engine;
pub mod error;
pub mod grow_history;
pub mod mser_detector;
pub mod neighborhood;
pub mod region;
pub mod source;
pub mod utils;
pub const IS_DEBUG: bool = false;

pub use engine::Mser;
pub use error::MserError;
pub use mser_detector::{detect_msers, detect_msers_with_heat_map, MserParameter};
pub use region::{Polarity, Region, RegionTree};
pub use source::{GrayVolume, HeatMap, HeatMapSink, IntensitySource};
