//! Directional cloud projection support
//!
//! The shadow step projects the cloud mask along the solar azimuth with a
//! directional distance transform, evaluated on a coarsened grid to bound
//! cost and binarized back onto the native grid.

use ndarray::Array2;

use crate::maybe_rayon::*;
use verdis_core::raster::Raster;
use verdis_core::{Error, Result};

/// Directional distance transform of a 0/1 mask.
///
/// For every pixel, walks up to `max_steps` pixels along `azimuth_deg`
/// (math convention: degrees counterclockwise from +x/east, with +y
/// north) and records the step count to the first flagged pixel; a
/// flagged pixel itself records 0. Pixels with no flagged source within
/// range are NaN.
///
/// Flagged sources therefore cast along the opposite direction: a cloud
/// found by looking toward the sun marks this pixel as shadow-reachable.
pub fn directional_distance_transform(
    mask: &Raster<f64>,
    azimuth_deg: f64,
    max_steps: usize,
) -> Result<Raster<f64>> {
    let (rows, cols) = mask.shape();
    let theta = azimuth_deg.to_radians();
    let dx = theta.cos();
    // Row index grows southward while y grows northward
    let dr = -theta.sin();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                for k in 0..=max_steps {
                    let sr = (row as f64 + k as f64 * dr).round();
                    let sc = (col as f64 + k as f64 * dx).round();
                    if sr < 0.0 || sc < 0.0 || sr >= rows as f64 || sc >= cols as f64 {
                        break;
                    }

                    let v = unsafe { mask.get_unchecked(sr as usize, sc as usize) };
                    if !v.is_nan() && v > 0.0 {
                        row_data[col] = k as f64;
                        break;
                    }
                }
            }
            row_data
        })
        .collect();

    build_raster(mask, rows, cols, data)
}

/// 1.0 where the input is finite, 0.0 where it is NaN.
///
/// Turns a distance raster into a flat 0/1 flag band.
pub fn flag_finite(raster: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();
    let data: Vec<f64> = raster
        .data()
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { 1.0 })
        .collect();
    build_raster(raster, rows, cols, data)
}

/// Block-maximum downsampling by an integer factor.
///
/// Edge blocks may be partial. NaN cells are skipped; an all-NaN block is
/// NaN. On 0/1 masks this preserves every flag, it never drops one.
pub fn downsample_max(raster: &Raster<f64>, factor: usize) -> Result<Raster<f64>> {
    if factor == 0 {
        return Err(Error::InvalidParameter {
            name: "factor",
            value: "0".to_string(),
            reason: "downsampling factor must be at least 1".to_string(),
        });
    }

    let (rows, cols) = raster.shape();
    let out_rows = rows.div_ceil(factor);
    let out_cols = cols.div_ceil(factor);

    let mut output: Raster<f64> = raster.with_same_meta(out_rows, out_cols);
    output.set_transform(raster.transform().scaled(factor as f64));
    output.set_nodata(Some(f64::NAN));

    for out_row in 0..out_rows {
        for out_col in 0..out_cols {
            let mut max_val = f64::NAN;
            for row in (out_row * factor)..((out_row + 1) * factor).min(rows) {
                for col in (out_col * factor)..((out_col + 1) * factor).min(cols) {
                    let v = unsafe { raster.get_unchecked(row, col) };
                    if v.is_nan() {
                        continue;
                    }
                    if max_val.is_nan() || v > max_val {
                        max_val = v;
                    }
                }
            }
            output.set(out_row, out_col, max_val)?;
        }
    }

    Ok(output)
}

/// Nearest-neighbor upsampling of a coarse raster back onto a fine grid.
///
/// `template` supplies the target shape and georeferencing; `factor` is
/// the same integer factor the coarse raster was downsampled by.
pub fn upsample_nearest(
    coarse: &Raster<f64>,
    template: &Raster<f64>,
    factor: usize,
) -> Result<Raster<f64>> {
    if factor == 0 {
        return Err(Error::InvalidParameter {
            name: "factor",
            value: "0".to_string(),
            reason: "upsampling factor must be at least 1".to_string(),
        });
    }

    let (rows, cols) = template.shape();
    let (crows, ccols) = coarse.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let cr = (row / factor).min(crows.saturating_sub(1));
            for (col, out) in row_data.iter_mut().enumerate() {
                let cc = (col / factor).min(ccols.saturating_sub(1));
                *out = unsafe { coarse.get_unchecked(cr, cc) };
            }
            row_data
        })
        .collect();

    build_raster(template, rows, cols, data)
}

fn build_raster(
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

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_flag(rows: usize, cols: usize, at: (usize, usize)) -> Raster<f64> {
        let mut m = Raster::filled(rows, cols, 0.0);
        m.set(at.0, at.1, 1.0).unwrap();
        m
    }

    #[test]
    fn test_ddt_looks_east() {
        // Cloud at (2, 4); azimuth 0 looks toward +x, so pixels west of
        // the cloud find it
        let mask = mask_with_flag(5, 7, (2, 4));
        let dist = directional_distance_transform(&mask, 0.0, 3).unwrap();

        assert_eq!(dist.get(2, 2).unwrap(), 2.0);
        assert_eq!(dist.get(2, 4).unwrap(), 0.0);
        // East of the cloud there is nothing along +x
        assert!(dist.get(2, 5).unwrap().is_nan());
        // Beyond max distance
        assert!(dist.get(2, 0).unwrap().is_nan());
    }

    #[test]
    fn test_ddt_looks_north() {
        // Azimuth 90 looks toward +y (decreasing row)
        let mask = mask_with_flag(6, 5, (1, 2));
        let dist = directional_distance_transform(&mask, 90.0, 4).unwrap();

        assert_eq!(dist.get(4, 2).unwrap(), 3.0);
        assert!(dist.get(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_flag_finite() {
        let mask = mask_with_flag(3, 3, (1, 1));
        let dist = directional_distance_transform(&mask, 0.0, 2).unwrap();
        let flag = flag_finite(&dist).unwrap();

        assert_eq!(flag.get(1, 1).unwrap(), 1.0);
        assert_eq!(flag.get(1, 0).unwrap(), 1.0);
        assert_eq!(flag.get(1, 2).unwrap(), 0.0);
    }

    #[test]
    fn test_downsample_max_keeps_flags() {
        let mask = mask_with_flag(4, 4, (3, 3));
        let coarse = downsample_max(&mask, 2).unwrap();

        assert_eq!(coarse.shape(), (2, 2));
        assert_eq!(coarse.get(1, 1).unwrap(), 1.0);
        assert_eq!(coarse.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_downsample_partial_edge_blocks() {
        let mask = mask_with_flag(5, 5, (4, 4));
        let coarse = downsample_max(&mask, 2).unwrap();

        assert_eq!(coarse.shape(), (3, 3));
        assert_eq!(coarse.get(2, 2).unwrap(), 1.0);
    }

    #[test]
    fn test_upsample_roundtrip_shape() {
        let template: Raster<f64> = Raster::filled(5, 5, 0.0);
        let mask = mask_with_flag(5, 5, (4, 4));
        let coarse = downsample_max(&mask, 2).unwrap();
        let fine = upsample_nearest(&coarse, &template, 2).unwrap();

        assert_eq!(fine.shape(), (5, 5));
        // The whole coarse block is flagged after the roundtrip
        assert_eq!(fine.get(4, 4).unwrap(), 1.0);
        assert_eq!(fine.get(0, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_downsample_scales_transform() {
        let mask = mask_with_flag(4, 4, (0, 0));
        let coarse = downsample_max(&mask, 2).unwrap();
        assert_eq!(coarse.cell_size(), 2.0);
    }
}
