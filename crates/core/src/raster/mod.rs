//! Raster data structures

mod element;
mod geotransform;
mod grid;
mod image;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use image::{
    is_reflectance_band, Image, PropertyValue, PROP_CLOUDY_PIXEL_PERCENTAGE, PROP_DATE,
    PROP_MEAN_SOLAR_AZIMUTH, PROP_SYSTEM_INDEX,
};
