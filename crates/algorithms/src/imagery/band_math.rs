//! Band math operations
//!
//! Raster algebra: elementwise functions over one or two bands, plus the
//! thresholding and boolean mask combinators the cloud masking pipeline
//! is built from. Masks are 0/1-valued `f64` rasters; NaN means the
//! pixel carries no observation and is treated as unflagged by the
//! boolean combinators.

use ndarray::Array2;

use crate::maybe_rayon::*;
use verdis_core::raster::Raster;
use verdis_core::{Error, Result};

/// Binary operations for band math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandMathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Min,
    Max,
}

/// Apply a unary function to every cell in a raster.
///
/// Nodata cells (NaN) are preserved.
pub fn band_math<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let val = unsafe { raster.get_unchecked(row, col) };
                if val.is_nan() || is_nodata_f64(val, nodata) {
                    continue;
                }
                row_data[col] = f(val);
            }
            row_data
        })
        .collect();

    build_output(raster, rows, cols, data)
}

/// Apply a binary operation between two rasters element-wise.
///
/// Both rasters must have the same dimensions. Nodata in either input
/// produces nodata in the output.
pub fn band_math_binary(a: &Raster<f64>, b: &Raster<f64>, op: BandMathOp) -> Result<Raster<f64>> {
    check_dimensions(a, b)?;

    let (rows, cols) = a.shape();
    let nodata_a = a.nodata();
    let nodata_b = b.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let va = unsafe { a.get_unchecked(row, col) };
                let vb = unsafe { b.get_unchecked(row, col) };

                if va.is_nan() || vb.is_nan() {
                    continue;
                }
                if is_nodata_f64(va, nodata_a) || is_nodata_f64(vb, nodata_b) {
                    continue;
                }

                row_data[col] = match op {
                    BandMathOp::Add => va + vb,
                    BandMathOp::Subtract => va - vb,
                    BandMathOp::Multiply => va * vb,
                    BandMathOp::Divide => {
                        if vb.abs() < 1e-10 {
                            f64::NAN
                        } else {
                            va / vb
                        }
                    }
                    BandMathOp::Min => va.min(vb),
                    BandMathOp::Max => va.max(vb),
                };
            }
            row_data
        })
        .collect();

    build_output(a, rows, cols, data)
}

/// Threshold: 1.0 where the value exceeds `threshold`, else 0.0.
/// NaN stays NaN.
pub fn gt(raster: &Raster<f64>, threshold: f64) -> Result<Raster<f64>> {
    band_math(raster, move |v| if v > threshold { 1.0 } else { 0.0 })
}

/// Threshold: 1.0 where the value is below `threshold`, else 0.0.
/// NaN stays NaN.
pub fn lt(raster: &Raster<f64>, threshold: f64) -> Result<Raster<f64>> {
    band_math(raster, move |v| if v < threshold { 1.0 } else { 0.0 })
}

/// Boolean AND of two 0/1 masks (pixel-wise multiplication).
/// NaN counts as unflagged.
pub fn mask_and(a: &Raster<f64>, b: &Raster<f64>) -> Result<Raster<f64>> {
    combine_masks(a, b, |fa, fb| fa && fb)
}

/// Boolean OR of two 0/1 masks (clamped pixel-wise sum).
/// NaN counts as unflagged, so combining can only grow the flagged set.
pub fn mask_or(a: &Raster<f64>, b: &Raster<f64>) -> Result<Raster<f64>> {
    combine_masks(a, b, |fa, fb| fa || fb)
}

fn combine_masks<F>(a: &Raster<f64>, b: &Raster<f64>, combine: F) -> Result<Raster<f64>>
where
    F: Fn(bool, bool) -> bool + Sync + Send,
{
    check_dimensions(a, b)?;

    let (rows, cols) = a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0; cols];
            for col in 0..cols {
                let va = unsafe { a.get_unchecked(row, col) };
                let vb = unsafe { b.get_unchecked(row, col) };

                let fa = !va.is_nan() && va != 0.0;
                let fb = !vb.is_nan() && vb != 0.0;
                if combine(fa, fb) {
                    row_data[col] = 1.0;
                }
            }
            row_data
        })
        .collect();

    build_output(a, rows, cols, data)
}

// Helpers shared by the imagery modules

pub(crate) fn is_nodata_f64(value: f64, nodata: Option<f64>) -> bool {
    match nodata {
        Some(nd) if !nd.is_nan() => (value - nd).abs() < f64::EPSILON,
        _ => value.is_nan(),
    }
}

pub(crate) fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

pub(crate) fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
