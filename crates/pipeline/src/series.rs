//! Time-series assembly
//!
//! Drives the per-window pipeline (query, filter, join, mask, mosaic,
//! index, reduce) across all windows of a configured source and collects
//! one output row per (window, region).
//!
//! Windows are processed in chronological order and are independent of
//! each other: a failure inside one window is logged and reported as
//! missing values for that window's regions, never aborting the rest of
//! the run. Only a provider failure is fatal.

use geo_types::Geometry;
use tracing::warn;

use verdis_algorithms::imagery::ndvi;
use verdis_algorithms::masking::CloudMaskConfig;
use verdis_algorithms::statistics::{reduce_regions, ReduceParams, RegionStat};
use verdis_core::raster::Raster;
use verdis_core::vector::RegionSet;
use verdis_core::{Error, Result};

use crate::mosaic::masked_composite;
use crate::provider::ImageryProvider;
use crate::windows::{round3, DateWindow};

/// How the vegetation index band is obtained from a window's composite
#[derive(Debug, Clone)]
pub enum IndexSource {
    /// The collection already carries the index band (derived products)
    Precomputed(String),
    /// Compute NDVI from the composite's NIR and red reflectance bands
    Ndvi { nir: String, red: String },
}

impl IndexSource {
    /// NDVI from the standard Sentinel-2 band names
    pub fn ndvi_default() -> Self {
        IndexSource::Ndvi {
            nir: "B8".to_string(),
            red: "B4".to_string(),
        }
    }
}

/// One configured (collection, region set) series
#[derive(Debug, Clone)]
pub struct SeriesSource {
    /// Catalog identifier of the primary collection
    pub catalog: String,
    /// Companion cloud-probability catalog; when set, images are joined
    /// and cloud/shadow masked before mosaicking
    pub cloud_catalog: Option<String>,
    /// Vegetation index derivation
    pub index: IndexSource,
    /// Reduction domains
    pub regions: RegionSet,
    /// Zonal reduction parameters (analysis scale, tiling)
    pub reduce: ReduceParams,
}

/// One output row: the statistics of one region in one window
#[derive(Debug, Clone)]
pub struct SeriesRow {
    pub month: String,
    pub years_since_epoch: f64,
    pub region: String,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub min: Option<f64>,
}

/// Assemble the full time series for one source.
///
/// Emits rows in window order, then region order within each window.
/// Every window contributes a schema-complete set of rows even when its
/// collection is empty or its processing fails.
pub fn assemble(
    provider: &dyn ImageryProvider,
    bounds: &Geometry<f64>,
    windows: &[DateWindow],
    source: &SeriesSource,
    cfg: &CloudMaskConfig,
) -> Result<Vec<SeriesRow>> {
    let mut rows = Vec::with_capacity(windows.len() * source.regions.len());

    for window in windows {
        let stats = match window_stats(provider, bounds, window, source, cfg) {
            Ok(stats) => stats,
            Err(err @ Error::ProviderUnavailable(_)) => return Err(err),
            Err(err) => {
                warn!(
                    window = %window.label(),
                    catalog = %source.catalog,
                    error = %err,
                    "window failed, emitting missing values"
                );
                missing_stats(&source.regions)
            }
        };

        let month = window.label();
        let t = window.years_since_epoch();
        for stat in stats {
            rows.push(SeriesRow {
                month: month.clone(),
                years_since_epoch: t,
                region: stat.region,
                max: stat.max.map(round3),
                mean: stat.mean.map(round3),
                min: stat.min.map(round3),
            });
        }
    }

    Ok(rows)
}

/// Assemble several independently configured sources over the same
/// windows and area of interest.
///
/// Each source produces its own table, in input order; the tables are
/// independent and never cross-joined.
pub fn assemble_all(
    provider: &dyn ImageryProvider,
    bounds: &Geometry<f64>,
    windows: &[DateWindow],
    sources: &[SeriesSource],
    cfg: &CloudMaskConfig,
) -> Result<Vec<Vec<SeriesRow>>> {
    sources
        .iter()
        .map(|source| assemble(provider, bounds, windows, source, cfg))
        .collect()
}

/// Compute one window's per-region statistics
fn window_stats(
    provider: &dyn ImageryProvider,
    bounds: &Geometry<f64>,
    window: &DateWindow,
    source: &SeriesSource,
    cfg: &CloudMaskConfig,
) -> Result<Vec<RegionStat>> {
    let collection = provider.query_collection(&source.catalog, bounds, window.start, window.end)?;

    let composite = match &source.cloud_catalog {
        Some(cloud_catalog) => {
            let clouds =
                provider.query_collection(cloud_catalog, bounds, window.start, window.end)?;
            masked_composite(&collection, &clouds, cfg)?
        }
        None => collection.mosaic()?,
    };

    // An empty window still reports every region, as missing
    let Some(composite) = composite else {
        return Ok(missing_stats(&source.regions));
    };

    let index_band: Raster<f64> = match &source.index {
        IndexSource::Precomputed(band) => composite.band(band)?.clone(),
        IndexSource::Ndvi { nir, red } => ndvi(composite.band(nir)?, composite.band(red)?)?,
    };

    reduce_regions(&index_band, &source.regions, &source.reduce)
}

fn missing_stats(regions: &RegionSet) -> Vec<RegionStat> {
    regions
        .iter()
        .map(|r| RegionStat {
            region: r.name.clone(),
            count: 0,
            mean: None,
            max: None,
            min: None,
        })
        .collect()
}
