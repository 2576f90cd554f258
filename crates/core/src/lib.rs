//! # Verdis Core
//!
//! Core types for the verdis vegetation monitoring library.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced single-band grid
//! - `Image`: multi-band image with named bands and scalar properties
//! - `ImageCollection`: ordered, filterable, joinable image sequences
//! - `Region` / `RegionSet`: vector reduction domains
//! - Error types and native GeoTIFF I/O

pub mod collection;
pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use collection::{CompareOp, ImageCollection};
pub use crs::Crs;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Image, PropertyValue, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collection::{CompareOp, ImageCollection};
    pub use crate::crs::Crs;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Image, PropertyValue, Raster, RasterElement};
    pub use crate::vector::{Region, RegionSet};
    pub use crate::Algorithm;
}

/// Core trait for the analysis algorithms in verdis.
///
/// Algorithms are pure functions that transform input data according to
/// parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
