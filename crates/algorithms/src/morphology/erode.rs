//! Morphological erosion (minimum filter)
//!
//! Replaces each pixel with the minimum value in its structuring element
//! neighborhood. On 0/1 masks this removes flagged regions thinner than
//! the element (speckle), the first step of the cloud mask cleanup.
//!
//! Edge handling matches `dilate`: the kernel is clamped to the grid and
//! NaN neighbors are skipped.

use verdis_core::raster::Raster;
use verdis_core::{Algorithm, Error, Result};

use super::dilate::focal_extreme;
use super::element::StructuringElement;

/// Parameters for morphological erosion
#[derive(Debug, Clone, Default)]
pub struct ErodeParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Erosion algorithm
#[derive(Debug, Clone, Default)]
pub struct Erode;

impl Algorithm for Erode {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ErodeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Erode"
    }

    fn description(&self) -> &'static str {
        "Morphological erosion (minimum filter over structuring element)"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        erode(&input, &params.element)
    }
}

/// Perform morphological erosion on a raster
///
/// # Arguments
/// * `raster` - Input raster
/// * `element` - Structuring element defining the neighborhood shape
pub fn erode(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    focal_extreme(raster, element, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raster(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        Raster::filled(rows, cols, value)
    }

    #[test]
    fn test_erode_uniform() {
        let raster = make_raster(7, 7, 5.0);
        let result = erode(&raster, &StructuringElement::Square(1)).unwrap();
        assert_eq!(result.get(3, 3).unwrap(), 5.0);
    }

    #[test]
    fn test_erode_removes_isolated_flag() {
        let mut mask = make_raster(7, 7, 0.0);
        mask.set(3, 3, 1.0).unwrap();

        let result = erode(&mask, &StructuringElement::Square(1)).unwrap();
        assert_eq!(result.get(3, 3).unwrap(), 0.0);
    }

    #[test]
    fn test_erode_keeps_large_region_core() {
        let mut mask = make_raster(9, 9, 0.0);
        for r in 2..7 {
            for c in 2..7 {
                mask.set(r, c, 1.0).unwrap();
            }
        }

        let result = erode(&mask, &StructuringElement::Square(1)).unwrap();
        assert_eq!(result.get(4, 4).unwrap(), 1.0);
        // Region boundary is eaten away
        assert_eq!(result.get(2, 2).unwrap(), 0.0);
    }

    #[test]
    fn test_erode_edge_clamped() {
        let raster = make_raster(5, 5, 5.0);
        let result = erode(&raster, &StructuringElement::Square(1)).unwrap();
        // No NaN border: the kernel clamps to the grid
        assert_eq!(result.get(0, 0).unwrap(), 5.0);
    }
}
