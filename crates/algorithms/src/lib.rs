//! # Verdis Algorithms
//!
//! Analysis algorithms for the verdis vegetation monitoring library.
//!
//! ## Categories
//!
//! - **imagery**: band algebra, thresholding, spectral indices
//! - **masking**: cloud/shadow detection and removal
//! - **morphology**: erosion, dilation, opening over masks
//! - **statistics**: zonal reductions over vector regions

pub mod imagery;
pub mod masking;
pub mod morphology;
pub mod statistics;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{
        band_math, band_math_binary, calc_vi, evi, gt, lt, mask_and, mask_or, ndvi,
        normalized_difference, BandMathOp, EviParams,
    };
    pub use crate::masking::{
        add_cloud_bands, add_cloud_shadow_mask, add_shadow_bands, apply_cloud_shadow_mask,
        CloudMaskConfig, CloudShadowMask,
    };
    pub use crate::morphology::{dilate, erode, opening, StructuringElement};
    pub use crate::statistics::{reduce_regions, ReduceParams, RegionStat};
    pub use verdis_core::prelude::*;
}
