//! Cloud and cloud-shadow masking

mod config;
mod mask;
mod projection;

pub use config::CloudMaskConfig;
pub use mask::{
    add_cloud_bands, add_cloud_shadow_mask, add_shadow_bands, apply_cloud_shadow_mask,
    CloudShadowMask, BAND_CLOUDMASK, BAND_CLOUDS, BAND_CLOUD_TRANSFORM, BAND_DARK_PIXELS,
    BAND_NIR, BAND_PROBABILITY, BAND_SCL, BAND_SHADOWS,
};
pub use projection::{
    directional_distance_transform, downsample_max, flag_finite, upsample_nearest,
};
