//! Band algebra and spectral indices

mod band_math;
mod indices;

pub use band_math::{band_math, band_math_binary, gt, lt, mask_and, mask_or, BandMathOp};
pub use indices::{
    calc_vi, evi, ndvi, normalized_difference, EviParams, BAND_EVI, BAND_NDVI,
};
