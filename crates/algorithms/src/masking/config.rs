//! Cloud masking configuration

/// Thresholds and scales for the cloud/shadow masking pipeline.
///
/// One immutable value is passed to every masking operation, so callers
/// and tests can vary thresholds without any shared state.
#[derive(Debug, Clone)]
pub struct CloudMaskConfig {
    /// Scene-level maximum cloudy pixel percentage; scenes above this are
    /// filtered out before masking
    pub cloud_filter: f64,
    /// Cloud probability (%) above which a pixel is flagged as cloud
    pub cloud_prob_threshold: f64,
    /// NIR reflectance below which a non-water pixel is a shadow
    /// candidate, on the unit reflectance scale
    pub nir_dark_threshold: f64,
    /// Maximum cloud-to-shadow projection distance, in units of 10 pixels
    pub cloud_proj_distance: f64,
    /// Buffer distance in meters grown around the combined mask
    pub buffer: f64,
    /// Grid scale in meters at which the shadow projection is evaluated
    pub projection_scale: f64,
    /// Grid scale in meters of the final cloudmask band
    pub output_scale: f64,
    /// Reflectance scaling of the input bands (digital number per unit
    /// reflectance)
    pub reflectance_scale: f64,
    /// Scene classification value that marks water, excluded from the
    /// dark-pixel test
    pub water_class: f64,
}

impl Default for CloudMaskConfig {
    fn default() -> Self {
        Self {
            cloud_filter: 60.0,
            cloud_prob_threshold: 50.0,
            nir_dark_threshold: 0.15,
            cloud_proj_distance: 2.0,
            buffer: 100.0,
            projection_scale: 100.0,
            output_scale: 20.0,
            reflectance_scale: 1.0e4,
            water_class: 6.0,
        }
    }
}

impl CloudMaskConfig {
    /// Maximum shadow projection distance in native pixels
    pub fn proj_distance_px(&self) -> f64 {
        self.cloud_proj_distance * 10.0
    }

    /// Dark-pixel threshold on the scaled digital-number range
    pub fn nir_dark_threshold_dn(&self) -> f64 {
        self.nir_dark_threshold * self.reflectance_scale
    }

    /// Dilation radius in pixels for the mask buffer
    pub fn buffer_radius_px(&self) -> usize {
        (self.buffer * 2.0 / 20.0).round().max(1.0) as usize
    }

    /// Erosion radius in pixels for the speckle cleanup
    pub fn speckle_radius_px(&self) -> usize {
        2
    }
}
