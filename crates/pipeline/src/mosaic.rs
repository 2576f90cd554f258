//! Per-window composite construction
//!
//! Turns a window's filtered collections into one composite image:
//! scene-level cloudiness filter, first-match join against the cloud
//! probability collection, per-image masking, then the mosaic.

use verdis_algorithms::masking::{
    add_cloud_shadow_mask, apply_cloud_shadow_mask, CloudMaskConfig, BAND_PROBABILITY,
};
use verdis_core::raster::{Image, PROP_CLOUDY_PIXEL_PERCENTAGE, PROP_SYSTEM_INDEX};
use verdis_core::{ImageCollection, Result};

/// Build a cloud/shadow-free composite for one window.
///
/// Primary images above the scene cloudiness limit are filtered out;
/// the rest are joined to their probability companions by acquisition
/// index (images without a companion are dropped), masked independently
/// and mosaicked in collection order. Returns `Ok(None)` when nothing
/// survives filtering and joining.
pub fn masked_composite(
    primary: &ImageCollection,
    clouds: &ImageCollection,
    cfg: &CloudMaskConfig,
) -> Result<Option<Image>> {
    let filtered = primary.filter_property_lte(PROP_CLOUDY_PIXEL_PERCENTAGE, cfg.cloud_filter);
    let pairs = filtered.join_first(clouds, PROP_SYSTEM_INDEX);

    let mut masked = Vec::with_capacity(pairs.len());
    for (image, companion) in pairs {
        let probability = companion.band(BAND_PROBABILITY)?;
        let with_mask = add_cloud_shadow_mask(image, probability, cfg)?;
        masked.push(apply_cloud_shadow_mask(&with_mask)?);
    }

    ImageCollection::from_images(masked).mosaic()
}
