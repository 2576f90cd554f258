//! Spectral vegetation indices
//!
//! NDVI and EVI computed from single-band rasters or directly from a
//! multi-band image with Sentinel-2 style band names.

use crate::imagery::band_math::{build_output, check_dimensions, is_nodata_f64};
use crate::maybe_rayon::*;
use verdis_core::raster::{Image, Raster};
use verdis_core::Result;

/// NDVI band name on derived images
pub const BAND_NDVI: &str = "NDVI";
/// EVI band name on derived images
pub const BAND_EVI: &str = "EVI";

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Result is in the range [-1, 1]. Pixels where the sum is zero or
/// either input is nodata become NaN.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let nodata_a = band_a.nodata();
    let nodata_b = band_b.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if is_nodata_f64(a, nodata_a) || is_nodata_f64(b, nodata_b) {
                    continue;
                }

                let sum = a + b;
                if sum.abs() < 1e-10 {
                    continue;
                }

                row_data[col] = (a - b) / sum;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// Dense vegetation sits around 0.6 to 0.9; bare soil near 0.1 to 0.2;
/// water and clouds at or below 0.
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

/// Parameters for EVI
#[derive(Debug, Clone)]
pub struct EviParams {
    /// Gain factor (default: 2.5)
    pub g: f64,
    /// Aerosol coefficient for the red band (default: 6.0)
    pub c1: f64,
    /// Aerosol coefficient for the blue band (default: 7.5)
    pub c2: f64,
    /// Canopy background adjustment (default: 1.0)
    pub l: f64,
}

impl Default for EviParams {
    fn default() -> Self {
        Self {
            g: 2.5,
            c1: 6.0,
            c2: 7.5,
            l: 1.0,
        }
    }
}

/// Enhanced Vegetation Index
///
/// `EVI = G * (NIR - Red) / (NIR + C1 * Red - C2 * Blue + L)`
///
/// Less sensitive than NDVI to atmospheric and soil background effects.
pub fn evi(
    nir: &Raster<f64>,
    red: &Raster<f64>,
    blue: &Raster<f64>,
    params: EviParams,
) -> Result<Raster<f64>> {
    check_dimensions(nir, red)?;
    check_dimensions(nir, blue)?;

    let (rows, cols) = nir.shape();
    let nodata_nir = nir.nodata();
    let nodata_red = red.nodata();
    let nodata_blue = blue.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let n = unsafe { nir.get_unchecked(row, col) };
                let r = unsafe { red.get_unchecked(row, col) };
                let b = unsafe { blue.get_unchecked(row, col) };

                if is_nodata_f64(n, nodata_nir)
                    || is_nodata_f64(r, nodata_red)
                    || is_nodata_f64(b, nodata_blue)
                {
                    continue;
                }

                let denom = n + params.c1 * r - params.c2 * b + params.l;
                if denom.abs() < 1e-10 {
                    continue;
                }

                row_data[col] = params.g * (n - r) / denom;
            }
            row_data
        })
        .collect();

    build_output(nir, rows, cols, data)
}

/// Derive NDVI and EVI bands from a Sentinel-2 style image.
///
/// Uses B8 (NIR), B4 (red) and B2 (blue). Returns a two-band image
/// carrying `NDVI` and `EVI`, with the source properties preserved.
pub fn calc_vi(image: &Image) -> Result<Image> {
    let nir = image.band("B8")?;
    let red = image.band("B4")?;
    let blue = image.band("B2")?;

    let ndvi_band = ndvi(nir, red)?;
    let evi_band = evi(nir, red, blue, EviParams::default())?;

    let out = image.select(|_| false);
    out.with_band(BAND_NDVI, ndvi_band)?
        .with_band(BAND_EVI, evi_band)
}
