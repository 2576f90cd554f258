//! Cloud and shadow mask construction
//!
//! Builds a per-pixel cloud-or-shadow flag band for a single image from a
//! co-registered cloud probability band:
//!
//! 1. `clouds`: probability above threshold
//! 2. `dark_pixels`: low NIR reflectance, water excluded
//! 3. `cloud_transform`: clouds projected along the solar azimuth on a
//!    coarsened grid
//! 4. `shadows`: projected clouds that are also dark
//! 5. `cloudmask`: clouds or shadows, despeckled and buffered outward
//!
//! Intermediate bands are retained on the returned image for inspection.

use verdis_core::raster::{Image, Raster, PROP_MEAN_SOLAR_AZIMUTH};
use verdis_core::{Algorithm, Error, Result};

use crate::imagery::{gt, lt, mask_and, mask_or};
use crate::morphology::{dilate, erode, StructuringElement};

use super::config::CloudMaskConfig;
use super::projection::{
    directional_distance_transform, downsample_max, flag_finite, upsample_nearest,
};

/// Cloud probability band attached during masking
pub const BAND_PROBABILITY: &str = "probability";
/// Thresholded cloud flag band
pub const BAND_CLOUDS: &str = "clouds";
/// Shadow candidate (dark, non-water) flag band
pub const BAND_DARK_PIXELS: &str = "dark_pixels";
/// Projected cloud flag band
pub const BAND_CLOUD_TRANSFORM: &str = "cloud_transform";
/// Confirmed shadow flag band
pub const BAND_SHADOWS: &str = "shadows";
/// Final combined and buffered flag band
pub const BAND_CLOUDMASK: &str = "cloudmask";

/// Scene classification band expected on the input image
pub const BAND_SCL: &str = "SCL";
/// NIR band used for the dark-pixel test
pub const BAND_NIR: &str = "B8";

/// Attach `probability` and the thresholded `clouds` band.
pub fn add_cloud_bands(
    img: &Image,
    probability: &Raster<f64>,
    cfg: &CloudMaskConfig,
) -> Result<Image> {
    let clouds = gt(probability, cfg.cloud_prob_threshold)?;

    img.with_band(BAND_PROBABILITY, probability.clone())?
        .with_band(BAND_CLOUDS, clouds)
}

/// Attach `dark_pixels`, `cloud_transform` and `shadows` bands.
///
/// Requires the `clouds` band (see [`add_cloud_bands`]), the `B8` and
/// `SCL` bands, and the mean solar azimuth property.
pub fn add_shadow_bands(img: &Image, cfg: &CloudMaskConfig) -> Result<Image> {
    let scl = img.band(BAND_SCL)?;
    let nir = img.band(BAND_NIR)?;
    let clouds = img.band(BAND_CLOUDS)?;

    // Dark but not water
    let water = cfg.water_class;
    let not_water = crate::imagery::band_math(scl, move |v| {
        if (v - water).abs() < f64::EPSILON {
            0.0
        } else {
            1.0
        }
    })?;
    let dark = mask_and(&lt(nir, cfg.nir_dark_threshold_dn())?, &not_water)?;

    // Direction from a pixel toward the sun; clouds found along it cast
    // shadow back onto the pixel
    let shadow_azimuth = 90.0 - img.property_f64(PROP_MEAN_SOLAR_AZIMUTH)?;

    // Project on a coarsened grid to bound cost, then binarize back onto
    // the native grid
    let cell = clouds.cell_size();
    let factor = (cfg.projection_scale / cell).round().max(1.0) as usize;
    let max_steps = (cfg.proj_distance_px() / factor as f64).ceil() as usize;

    let cloud_transform = if factor > 1 {
        let coarse = downsample_max(clouds, factor)?;
        let dist = directional_distance_transform(&coarse, shadow_azimuth, max_steps)?;
        upsample_nearest(&flag_finite(&dist)?, clouds, factor)?
    } else {
        let dist = directional_distance_transform(clouds, shadow_azimuth, max_steps)?;
        flag_finite(&dist)?
    };

    let shadows = mask_and(&cloud_transform, &dark)?;

    img.with_band(BAND_DARK_PIXELS, dark)?
        .with_band(BAND_CLOUD_TRANSFORM, cloud_transform)?
        .with_band(BAND_SHADOWS, shadows)
}

/// Run the full masking pipeline and attach the final `cloudmask` band.
///
/// The combined clouds-or-shadows flag is despeckled by erosion, grown
/// outward by the buffer dilation and coarsened to the output scale. The
/// raw combined flag is folded back in, so a pixel flagged as cloud or
/// shadow is always flagged in `cloudmask`: buffering only ever grows
/// the excluded set.
pub fn add_cloud_shadow_mask(
    img: &Image,
    probability: &Raster<f64>,
    cfg: &CloudMaskConfig,
) -> Result<Image> {
    let img = add_cloud_bands(img, probability, cfg)?;
    let img = add_shadow_bands(&img, cfg)?;

    let combined = mask_or(img.band(BAND_CLOUDS)?, img.band(BAND_SHADOWS)?)?;

    let opened = erode(
        &combined,
        &StructuringElement::Disk(cfg.speckle_radius_px()),
    )?;
    let buffered = dilate(&opened, &StructuringElement::Disk(cfg.buffer_radius_px()))?;
    let grown = mask_or(&combined, &buffered)?;

    let cell = grown.cell_size();
    let factor = (cfg.output_scale / cell).round().max(1.0) as usize;
    let cloudmask = if factor > 1 {
        let coarse = downsample_max(&grown, factor)?;
        upsample_nearest(&coarse, &grown, factor)?
    } else {
        grown
    };

    img.with_band(BAND_CLOUDMASK, cloudmask)
}

/// Apply a previously built `cloudmask`: keep only the reflectance bands
/// (`B<number>`) and null out every flagged pixel.
pub fn apply_cloud_shadow_mask(img: &Image) -> Result<Image> {
    let mask = img.band(BAND_CLOUDMASK)?.clone();
    let reflectance = img.select_reflectance();
    if reflectance.band_count() == 0 {
        return Err(Error::Algorithm(
            "image has no reflectance bands to mask".to_string(),
        ));
    }
    reflectance.mask_out(&mask)
}

/// Cloud/shadow masking as an [`Algorithm`]: input is the image paired
/// with its cloud probability band.
#[derive(Debug, Clone, Default)]
pub struct CloudShadowMask;

impl Algorithm for CloudShadowMask {
    type Input = (Image, Raster<f64>);
    type Output = Image;
    type Params = CloudMaskConfig;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CloudShadowMask"
    }

    fn description(&self) -> &'static str {
        "Flag cloud and cloud-shadow pixels from a cloud probability band"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (img, probability) = input;
        add_cloud_shadow_mask(&img, &probability, &params)
    }
}
