//! Display specification for the visualization collaborator
//!
//! The pipeline itself renders nothing; it hands a composite image plus
//! a style specification to whatever map front end is in use. The
//! renderer is a capability implemented once, not an extension method
//! injected into a third-party map type.

use verdis_core::raster::Image;

/// Style specification for one raster overlay layer
#[derive(Debug, Clone)]
pub struct LayerSpec {
    /// Bands to render, in display order (one for palettes, three for RGB)
    pub bands: Vec<String>,
    /// Value mapped to the bottom of the display range
    pub min: f64,
    /// Value mapped to the top of the display range
    pub max: f64,
    /// Color ramp for single-band layers
    pub palette: Vec<String>,
    /// Layer opacity in [0, 1]
    pub opacity: f64,
}

impl LayerSpec {
    /// True-color composite from Sentinel-2 style reflectance bands
    pub fn true_color() -> Self {
        Self {
            bands: vec!["B4".to_string(), "B3".to_string(), "B2".to_string()],
            min: 0.0,
            max: 2500.0,
            palette: Vec::new(),
            opacity: 1.0,
        }
    }

    /// Single-band NDVI ramp from bare ground to dense vegetation
    pub fn ndvi_ramp() -> Self {
        Self {
            bands: vec!["NDVI".to_string()],
            min: 0.0,
            max: 1.0,
            palette: vec![
                "white".to_string(),
                "yellow".to_string(),
                "green".to_string(),
            ],
            opacity: 1.0,
        }
    }
}

/// Map rendering capability exposed by the visualization collaborator
pub trait MapRenderer {
    /// Add a raster overlay layer under the given name
    fn add_layer(&mut self, image: &Image, spec: &LayerSpec, name: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdis_core::raster::Raster;

    /// Renderer double that records what it was handed
    #[derive(Default)]
    struct RecordingRenderer {
        layers: Vec<(String, Vec<String>)>,
    }

    impl MapRenderer for RecordingRenderer {
        fn add_layer(&mut self, _image: &Image, spec: &LayerSpec, name: &str) {
            self.layers.push((name.to_string(), spec.bands.clone()));
        }
    }

    #[test]
    fn test_add_layer_capability() {
        let image = Image::from_band("NDVI", Raster::filled(2, 2, 0.5));
        let mut renderer = RecordingRenderer::default();

        renderer.add_layer(&image, &LayerSpec::ndvi_ramp(), "January NDVI");

        assert_eq!(renderer.layers.len(), 1);
        assert_eq!(renderer.layers[0].0, "January NDVI");
        assert_eq!(renderer.layers[0].1, vec!["NDVI"]);
    }

    #[test]
    fn test_true_color_spec() {
        let spec = LayerSpec::true_color();
        assert_eq!(spec.bands.len(), 3);
        assert!(spec.palette.is_empty());
    }
}
