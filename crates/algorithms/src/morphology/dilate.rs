//! Morphological dilation (maximum filter)
//!
//! Replaces each pixel with the maximum value in its structuring element
//! neighborhood. On 0/1 masks this grows the flagged set outward, which
//! is how the cloud mask buffer is realized.
//!
//! The kernel is clamped to the grid at the edges and NaN neighbors are
//! skipped, so a flag at the image border survives dilation. A pixel
//! whose whole clamped neighborhood is NaN stays NaN.

use ndarray::Array2;

use crate::maybe_rayon::*;
use verdis_core::raster::Raster;
use verdis_core::{Algorithm, Error, Result};

use super::element::StructuringElement;

/// Parameters for morphological dilation
#[derive(Debug, Clone, Default)]
pub struct DilateParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Dilation algorithm
#[derive(Debug, Clone, Default)]
pub struct Dilate;

impl Algorithm for Dilate {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = DilateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Dilate"
    }

    fn description(&self) -> &'static str {
        "Morphological dilation (maximum filter over structuring element)"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        dilate(&input, &params.element)
    }
}

/// Perform morphological dilation on a raster
///
/// # Arguments
/// * `raster` - Input raster
/// * `element` - Structuring element defining the neighborhood shape
pub fn dilate(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    focal_extreme(raster, element, true)
}

/// Shared focal min/max kernel loop used by erode and dilate
pub(super) fn focal_extreme(
    raster: &Raster<f64>,
    element: &StructuringElement,
    take_max: bool,
) -> Result<Raster<f64>> {
    element.validate()?;

    let (rows, cols) = raster.shape();
    let nodata = raster.nodata();
    let offsets = element.offsets();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let mut extreme = f64::NAN;

                for &(dr, dc) in &offsets {
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;
                    if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                        continue;
                    }

                    let v = unsafe { raster.get_unchecked(nr as usize, nc as usize) };
                    if v.is_nan() || is_nodata_val(v, nodata) {
                        continue;
                    }

                    if extreme.is_nan()
                        || (take_max && v > extreme)
                        || (!take_max && v < extreme)
                    {
                        extreme = v;
                    }
                }

                *out = extreme;
            }

            row_data
        })
        .collect();

    build_output(raster, rows, cols, output_data)
}

pub(super) fn is_nodata_val(value: f64, nodata: Option<f64>) -> bool {
    match nodata {
        Some(nd) if !nd.is_nan() => (value - nd).abs() < f64::EPSILON,
        _ => false,
    }
}

pub(super) fn build_output(
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

    fn make_raster(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        Raster::filled(rows, cols, value)
    }

    #[test]
    fn test_dilate_uniform() {
        let raster = make_raster(7, 7, 5.0);
        let result = dilate(&raster, &StructuringElement::Square(1)).unwrap();
        assert_eq!(result.get(3, 3).unwrap(), 5.0);
    }

    #[test]
    fn test_dilate_picks_maximum() {
        let mut raster = make_raster(7, 7, 5.0);
        raster.set(3, 4, 20.0).unwrap();

        let result = dilate(&raster, &StructuringElement::Square(1)).unwrap();
        assert_eq!(result.get(3, 3).unwrap(), 20.0);
        assert_eq!(result.get(3, 5).unwrap(), 20.0);
        // Out of kernel reach
        assert_eq!(result.get(3, 6).unwrap(), 5.0);
    }

    #[test]
    fn test_dilate_clamps_at_edges() {
        let mut raster = make_raster(5, 5, 0.0);
        raster.set(0, 0, 1.0).unwrap();

        let result = dilate(&raster, &StructuringElement::Square(1)).unwrap();
        // Corner flag survives and grows inward
        assert_eq!(result.get(0, 0).unwrap(), 1.0);
        assert_eq!(result.get(1, 1).unwrap(), 1.0);
        assert_eq!(result.get(0, 4).unwrap(), 0.0);
    }

    #[test]
    fn test_dilate_skips_nan_neighbors() {
        let mut raster = make_raster(5, 5, 5.0);
        raster.set(2, 2, f64::NAN).unwrap();

        let result = dilate(&raster, &StructuringElement::Square(1)).unwrap();
        // NaN neighbor is ignored, not propagated
        assert_eq!(result.get(2, 1).unwrap(), 5.0);
        // NaN center is filled from its valid neighbors
        assert_eq!(result.get(2, 2).unwrap(), 5.0);
    }

    #[test]
    fn test_dilate_cross_excludes_diagonal() {
        let mut raster = make_raster(7, 7, 5.0);
        raster.set(2, 2, 99.0).unwrap();

        let result = dilate(&raster, &StructuringElement::Cross(1)).unwrap();
        assert_eq!(result.get(3, 3).unwrap(), 5.0);
    }
}
