//! Zonal statistics over vector regions
//!
//! Reduces one value band over every region geometry in a set,
//! independently, producing mean/max/min of the unmasked pixels whose
//! centers fall inside the region.

use crate::maybe_rayon::*;
use verdis_core::raster::Raster;
use verdis_core::vector::{Region, RegionSet};
use verdis_core::Result;

/// Parameters for a region reduction
#[derive(Debug, Clone)]
pub struct ReduceParams {
    /// Analysis scale (ground sampling distance). Pixels are sampled at
    /// this spacing; `None` uses the native cell size.
    pub scale: Option<f64>,
    /// Computational tiling granularity: the number of sampled rows per
    /// parallel work unit. Affects execution only, never the results.
    pub tile_scale: usize,
}

impl Default for ReduceParams {
    fn default() -> Self {
        Self {
            scale: None,
            tile_scale: 4,
        }
    }
}

/// Statistics of one region for one reduction.
///
/// A region with zero valid pixels carries `None` for every statistic;
/// missing values are never coerced to zero.
#[derive(Debug, Clone)]
pub struct RegionStat {
    pub region: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

/// Running accumulator merged across row chunks
#[derive(Debug, Clone, Copy, Default)]
struct Accum {
    sum: f64,
    count: usize,
    min: f64,
    max: f64,
}

impl Accum {
    fn push(&mut self, v: f64) {
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            if v < self.min {
                self.min = v;
            }
            if v > self.max {
                self.max = v;
            }
        }
        self.sum += v;
        self.count += 1;
    }

    fn merge(mut self, other: Accum) -> Accum {
        if other.count == 0 {
            return self;
        }
        if self.count == 0 {
            return other;
        }
        self.sum += other.sum;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self
    }
}

/// Reduce a value band over every region in a set.
///
/// Results are returned in region order. Pixels are sampled on a stride
/// derived from `params.scale`; only non-NaN pixels inside the region
/// geometry contribute.
pub fn reduce_regions(
    values: &Raster<f64>,
    regions: &RegionSet,
    params: &ReduceParams,
) -> Result<Vec<RegionStat>> {
    let stats = regions
        .iter()
        .map(|region| reduce_region(values, region, params))
        .collect();
    Ok(stats)
}

/// Reduce a value band over a single region
pub fn reduce_region(values: &Raster<f64>, region: &Region, params: &ReduceParams) -> RegionStat {
    let (rows, cols) = values.shape();
    let cell = values.cell_size();
    let stride = match params.scale {
        Some(scale) if cell > 0.0 => ((scale / cell).round() as usize).max(1),
        _ => 1,
    };
    let chunk_rows = params.tile_scale.max(1);

    // Restrict the scan to the pixel envelope of the region
    let (row_range, col_range) = match pixel_envelope(values, region, rows, cols) {
        Some(ranges) => ranges,
        None => {
            return RegionStat {
                region: region.name.clone(),
                count: 0,
                mean: None,
                max: None,
                min: None,
            }
        }
    };

    let sampled_rows: Vec<usize> = row_range.step_by(stride).collect();

    let partials: Vec<Accum> = sampled_rows
        .chunks(chunk_rows)
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|chunk| {
            let mut acc = Accum::default();
            for &row in chunk {
                for col in col_range.clone().step_by(stride) {
                    let v = unsafe { values.get_unchecked(row, col) };
                    if v.is_nan() {
                        continue;
                    }
                    let (x, y) = values.pixel_to_geo(col, row);
                    if region.contains(x, y) {
                        acc.push(v);
                    }
                }
            }
            acc
        })
        .collect();

    let acc = partials.into_iter().fold(Accum::default(), Accum::merge);

    if acc.count == 0 {
        RegionStat {
            region: region.name.clone(),
            count: 0,
            mean: None,
            max: None,
            min: None,
        }
    } else {
        RegionStat {
            region: region.name.clone(),
            count: acc.count,
            mean: Some(acc.sum / acc.count as f64),
            max: Some(acc.max),
            min: Some(acc.min),
        }
    }
}

/// Pixel index ranges covering the region's bounding box, clamped to the
/// grid. None when the region lies entirely outside the raster.
fn pixel_envelope(
    values: &Raster<f64>,
    region: &Region,
    rows: usize,
    cols: usize,
) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
    let bbox = region.bounding_box()?;

    let (c0, r0) = values.geo_to_pixel(bbox.min_x, bbox.max_y);
    let (c1, r1) = values.geo_to_pixel(bbox.max_x, bbox.min_y);

    let row_start = r0.floor().max(0.0) as usize;
    let row_end = (r1.ceil() as isize).clamp(0, rows as isize) as usize;
    let col_start = c0.floor().max(0.0) as usize;
    let col_end = (c1.ceil() as isize).clamp(0, cols as isize) as usize;

    if row_start >= row_end || col_start >= col_end {
        return None;
    }

    Some((row_start..row_end, col_start..col_end))
}
