//! Multi-band image type
//!
//! An `Image` is an ordered set of uniquely named bands sharing one grid,
//! plus scalar metadata (acquisition date, solar geometry, scene-level
//! cloud statistics). All operations follow value semantics: adding a
//! band, selecting bands or applying a mask returns a new `Image` and
//! leaves the receiver untouched.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::raster::Raster;

/// Per-acquisition identity key used for collection joins
pub const PROP_SYSTEM_INDEX: &str = "system:index";
/// Acquisition date
pub const PROP_DATE: &str = "system:date";
/// Scene-level cloudy pixel percentage
pub const PROP_CLOUDY_PIXEL_PERCENTAGE: &str = "CLOUDY_PIXEL_PERCENTAGE";
/// Mean solar azimuth angle in degrees, used for shadow projection
pub const PROP_MEAN_SOLAR_AZIMUTH: &str = "MEAN_SOLAR_AZIMUTH_ANGLE";

/// Scalar metadata attached to an image
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Float(f64),
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            PropertyValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// A multi-band raster image with named bands and scalar properties
#[derive(Debug, Clone, Default)]
pub struct Image {
    bands: Vec<(String, Raster<f64>)>,
    properties: BTreeMap<String, PropertyValue>,
}

impl Image {
    /// Create an empty image with no bands
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an image with a single band
    pub fn from_band(name: impl Into<String>, band: Raster<f64>) -> Self {
        Self {
            bands: vec![(name.into(), band)],
            properties: BTreeMap::new(),
        }
    }

    // Bands

    /// Add or replace a band, returning the new image.
    ///
    /// A band with the same name is replaced in place, keeping its
    /// position; this makes derived-band pipelines idempotent under
    /// re-application. The band must match the shape of any existing
    /// bands.
    pub fn with_band(&self, name: impl Into<String>, band: Raster<f64>) -> Result<Self> {
        let name = name.into();

        if let Some((rows, cols)) = self.shape() {
            if band.shape() != (rows, cols) {
                return Err(Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar: band.rows(),
                    ac: band.cols(),
                });
            }
        }

        let mut out = self.clone();
        match out.bands.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = band,
            None => out.bands.push((name, band)),
        }
        Ok(out)
    }

    /// Get a band by name
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
            .ok_or_else(|| Error::BandNotFound(name.to_string()))
    }

    /// Whether a band with this name exists
    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|(n, _)| n == name)
    }

    /// Band names in image order
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of bands
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Grid shape shared by all bands, None for an empty image
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.bands.first().map(|(_, b)| b.shape())
    }

    /// New image keeping only the bands for which `keep` returns true.
    /// Properties are carried over.
    pub fn select<F>(&self, keep: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        Self {
            bands: self
                .bands
                .iter()
                .filter(|(n, _)| keep(n))
                .cloned()
                .collect(),
            properties: self.properties.clone(),
        }
    }

    /// New image keeping only the named bands, in the given order
    pub fn select_named(&self, names: &[&str]) -> Result<Self> {
        let mut bands = Vec::with_capacity(names.len());
        for name in names {
            let band = self.band(name)?.clone();
            bands.push((name.to_string(), band));
        }
        Ok(Self {
            bands,
            properties: self.properties.clone(),
        })
    }

    /// New image keeping only the reflectance bands (names of the form
    /// `B<number>`, e.g. B2, B4, B8)
    pub fn select_reflectance(&self) -> Self {
        self.select(is_reflectance_band)
    }

    /// New image with every band masked out wherever `flag` is nonzero.
    ///
    /// Masked pixels become NaN. Zero and NaN flag pixels leave the
    /// underlying value untouched, so flags are monotone: re-applying a
    /// mask can only grow the excluded set.
    pub fn mask_out(&self, flag: &Raster<f64>) -> Result<Self> {
        if let Some((rows, cols)) = self.shape() {
            if flag.shape() != (rows, cols) {
                return Err(Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar: flag.rows(),
                    ac: flag.cols(),
                });
            }
        }

        let mut out = self.clone();
        for (_, band) in out.bands.iter_mut() {
            let (rows, cols) = band.shape();
            for row in 0..rows {
                for col in 0..cols {
                    let f = unsafe { flag.get_unchecked(row, col) };
                    if f.is_nan() || f == 0.0 {
                        continue;
                    }
                    band.set(row, col, f64::NAN)?;
                }
            }
        }
        Ok(out)
    }

    // Properties

    /// New image with the given property set
    pub fn with_property(&self, key: impl Into<String>, value: PropertyValue) -> Self {
        let mut out = self.clone();
        out.properties.insert(key.into(), value);
        out
    }

    /// Get a property by name
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Get a numeric property, erroring if absent or non-numeric
    pub fn property_f64(&self, key: &str) -> Result<f64> {
        let value = self
            .property(key)
            .ok_or_else(|| Error::MissingProperty(key.to_string()))?;
        value.as_f64().ok_or(Error::PropertyType {
            name: key.to_string(),
            expected: "number",
        })
    }

    /// Get a text property, erroring if absent or non-text
    pub fn property_text(&self, key: &str) -> Result<&str> {
        let value = self
            .property(key)
            .ok_or_else(|| Error::MissingProperty(key.to_string()))?;
        value.as_text().ok_or(Error::PropertyType {
            name: key.to_string(),
            expected: "text",
        })
    }

    /// Acquisition date, if recorded
    pub fn acquisition_date(&self) -> Option<NaiveDate> {
        self.property(PROP_DATE).and_then(|p| p.as_date())
    }

    /// New image with the acquisition date set
    pub fn with_date(&self, date: NaiveDate) -> Self {
        self.with_property(PROP_DATE, PropertyValue::Date(date))
    }

    /// Geographic bounds of the image grid, None for an empty image
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.bands.first().map(|(_, b)| b.bounds())
    }
}

/// Whether a band name denotes a reflectance band (`B` followed by digits)
pub fn is_reflectance_band(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('B')
        && !name[1..].is_empty()
        && name[1..].chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        Raster::filled(rows, cols, value)
    }

    #[test]
    fn test_with_band_appends_and_replaces() {
        let img = Image::from_band("B4", band(3, 3, 0.1));
        let img = img.with_band("B8", band(3, 3, 0.5)).unwrap();
        assert_eq!(img.band_names(), vec!["B4", "B8"]);

        // Same name replaces in place, preserving order
        let img = img.with_band("B4", band(3, 3, 0.2)).unwrap();
        assert_eq!(img.band_names(), vec!["B4", "B8"]);
        assert_eq!(img.band("B4").unwrap().get(0, 0).unwrap(), 0.2);
    }

    #[test]
    fn test_with_band_shape_mismatch() {
        let img = Image::from_band("B4", band(3, 3, 0.1));
        assert!(img.with_band("B8", band(4, 4, 0.5)).is_err());
    }

    #[test]
    fn test_reflectance_band_pattern() {
        assert!(is_reflectance_band("B2"));
        assert!(is_reflectance_band("B12"));
        assert!(!is_reflectance_band("B"));
        assert!(!is_reflectance_band("B8A"));
        assert!(!is_reflectance_band("SCL"));
        assert!(!is_reflectance_band("probability"));
    }

    #[test]
    fn test_select_reflectance_drops_others() {
        let img = Image::from_band("B4", band(2, 2, 0.1));
        let img = img.with_band("SCL", band(2, 2, 4.0)).unwrap();
        let img = img.with_band("B8", band(2, 2, 0.5)).unwrap();

        let selected = img.select_reflectance();
        assert_eq!(selected.band_names(), vec!["B4", "B8"]);
    }

    #[test]
    fn test_mask_out() {
        let img = Image::from_band("B4", band(2, 2, 0.1));
        let mut flag = Raster::new(2, 2);
        flag.set(0, 0, 1.0).unwrap();
        flag.set(1, 1, f64::NAN).unwrap();

        let masked = img.mask_out(&flag).unwrap();
        let b = masked.band("B4").unwrap();
        assert!(b.get(0, 0).unwrap().is_nan());
        assert_eq!(b.get(0, 1).unwrap(), 0.1);
        // NaN flag leaves the pixel untouched
        assert_eq!(b.get(1, 1).unwrap(), 0.1);
        // Value semantics: original untouched
        assert_eq!(img.band("B4").unwrap().get(0, 0).unwrap(), 0.1);
    }

    #[test]
    fn test_properties() {
        let img = Image::new()
            .with_property(PROP_MEAN_SOLAR_AZIMUTH, PropertyValue::Float(133.2))
            .with_date(NaiveDate::from_ymd_opt(2022, 1, 7).unwrap());

        assert_eq!(img.property_f64(PROP_MEAN_SOLAR_AZIMUTH).unwrap(), 133.2);
        assert_eq!(
            img.acquisition_date().unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 7).unwrap()
        );
        assert!(img.property_f64("missing").is_err());
    }
}
