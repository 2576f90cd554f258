//! Ordered image collections: filtering, joining and mosaicking

use chrono::NaiveDate;
use geo_types::Geometry;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::raster::Image;
use crate::vector::bounding_box;

/// Comparison operator for property filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
}

impl CompareOp {
    fn matches(self, value: f64, threshold: f64) -> bool {
        match self {
            CompareOp::Lt => value < threshold,
            CompareOp::Lte => value <= threshold,
            CompareOp::Eq => (value - threshold).abs() < f64::EPSILON,
            CompareOp::Gte => value >= threshold,
            CompareOp::Gt => value > threshold,
        }
    }
}

/// An ordered sequence of images from one catalog.
///
/// Order is significant: the mosaic composite fills each pixel from the
/// first image that has an unmasked value there, so earlier images take
/// precedence over later ones.
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    images: Vec<Image>,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_images(images: Vec<Image>) -> Self {
        Self { images }
    }

    pub fn push(&mut self, image: Image) {
        self.images.push(image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Image> {
        self.images.iter()
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn into_images(self) -> Vec<Image> {
        self.images
    }

    // Filters

    /// Keep images acquired in the half-open range `[start, end)`.
    /// Images without an acquisition date are dropped.
    pub fn filter_date(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let images = self
            .images
            .iter()
            .filter(|img| match img.acquisition_date() {
                Some(d) => d >= start && d < end,
                None => false,
            })
            .cloned()
            .collect();
        Self { images }
    }

    /// Keep images whose footprint intersects the bounding box of the
    /// given geometry
    pub fn filter_bounds(&self, geometry: &Geometry<f64>) -> Self {
        let Some(target) = bounding_box(geometry) else {
            return Self::new();
        };

        let images = self
            .images
            .iter()
            .filter(|img| match img.bounds() {
                Some((min_x, min_y, max_x, max_y)) => {
                    let bbox =
                        crate::vector::BoundingBox::new(min_x, min_y, max_x, max_y);
                    bbox.intersects(&target)
                }
                None => false,
            })
            .cloned()
            .collect();
        Self { images }
    }

    /// Keep images whose numeric property compares against `threshold`
    /// under the given operator. Images missing the property are dropped.
    pub fn filter_property(&self, name: &str, op: CompareOp, threshold: f64) -> Self {
        let images = self
            .images
            .iter()
            .filter(|img| match img.property_f64(name) {
                Ok(v) => op.matches(v, threshold),
                Err(_) => false,
            })
            .cloned()
            .collect();
        Self { images }
    }

    /// Keep images whose numeric property is at most `threshold`
    pub fn filter_property_lte(&self, name: &str, threshold: f64) -> Self {
        self.filter_property(name, CompareOp::Lte, threshold)
    }

    // Join

    /// Inner join against an auxiliary collection by a shared identity
    /// property, with first-match semantics.
    ///
    /// The auxiliary key map is built once; when several auxiliary images
    /// share a key, the first in collection order wins and the rest are
    /// ignored. Primary images without a partner are dropped, so every
    /// returned pair has a companion.
    pub fn join_first<'a>(
        &'a self,
        aux: &'a ImageCollection,
        key: &str,
    ) -> Vec<(&'a Image, &'a Image)> {
        let mut lookup: HashMap<&str, &Image> = HashMap::new();
        for img in aux.iter() {
            if let Ok(k) = img.property_text(key) {
                lookup.entry(k).or_insert(img);
            }
        }

        self.images
            .iter()
            .filter_map(|img| {
                let k = img.property_text(key).ok()?;
                lookup.get(k).map(|companion| (img, *companion))
            })
            .collect()
    }

    // Mosaic

    /// Collapse the collection into one composite image.
    ///
    /// Per pixel and band, the value comes from the first image in
    /// collection order with an unmasked (non-NaN) value there; later
    /// images only fill gaps. The band list of the first image defines
    /// the output bands. Returns `Ok(None)` for an empty collection.
    /// All contributing bands must share the grid shape.
    pub fn mosaic(&self) -> Result<Option<Image>> {
        let Some(first) = self.images.first() else {
            return Ok(None);
        };

        let mut out = first.clone();
        let Some((rows, cols)) = out.shape() else {
            return Ok(Some(out));
        };

        for name in first.band_names() {
            let mut composite = first.band(name)?.clone();

            for img in self.images.iter().skip(1) {
                if !img.has_band(name) {
                    continue;
                }
                let band = img.band(name)?;
                if band.shape() != (rows, cols) {
                    return Err(Error::SizeMismatch {
                        er: rows,
                        ec: cols,
                        ar: band.rows(),
                        ac: band.cols(),
                    });
                }

                for row in 0..rows {
                    for col in 0..cols {
                        let current = unsafe { composite.get_unchecked(row, col) };
                        if !current.is_nan() {
                            continue;
                        }
                        let candidate = unsafe { band.get_unchecked(row, col) };
                        if !candidate.is_nan() {
                            composite.set(row, col, candidate)?;
                        }
                    }
                }
            }

            out = out.with_band(name, composite)?;
        }

        Ok(Some(out))
    }
}

impl IntoIterator for ImageCollection {
    type Item = Image;
    type IntoIter = std::vec::IntoIter<Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Image, PropertyValue, Raster, PROP_SYSTEM_INDEX};
    use crate::vector::rect_polygon;

    fn image_with_index(idx: &str, value: f64) -> Image {
        Image::from_band("B4", Raster::filled(2, 2, value)).with_property(
            PROP_SYSTEM_INDEX,
            PropertyValue::Text(idx.to_string()),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filter_date_half_open() {
        let col = ImageCollection::from_images(vec![
            image_with_index("a", 1.0).with_date(date(2022, 1, 1)),
            image_with_index("b", 2.0).with_date(date(2022, 1, 31)),
            image_with_index("c", 3.0).with_date(date(2022, 2, 1)),
        ]);

        let filtered = col.filter_date(date(2022, 1, 1), date(2022, 2, 1));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_date_drops_undated() {
        let col = ImageCollection::from_images(vec![image_with_index("a", 1.0)]);
        assert!(col.filter_date(date(2022, 1, 1), date(2022, 2, 1)).is_empty());
    }

    #[test]
    fn test_filter_property_lte() {
        let col = ImageCollection::from_images(vec![
            image_with_index("a", 1.0).with_property(
                "CLOUDY_PIXEL_PERCENTAGE",
                PropertyValue::Float(30.0),
            ),
            image_with_index("b", 2.0).with_property(
                "CLOUDY_PIXEL_PERCENTAGE",
                PropertyValue::Float(80.0),
            ),
            // missing property: dropped
            image_with_index("c", 3.0),
        ]);

        let filtered = col.filter_property_lte("CLOUDY_PIXEL_PERCENTAGE", 60.0);
        assert_eq!(filtered.len(), 1);

        let gt = col.filter_property("CLOUDY_PIXEL_PERCENTAGE", CompareOp::Gt, 60.0);
        assert_eq!(gt.len(), 1);
    }

    #[test]
    fn test_filter_bounds() {
        let col = ImageCollection::from_images(vec![image_with_index("a", 1.0)]);
        // Band grid is 2x2 with the default transform: x in [0,2], y in [-2,0]
        let inside = Geometry::Polygon(rect_polygon(0.5, -1.5, 1.5, -0.5));
        let outside = Geometry::Polygon(rect_polygon(10.0, 10.0, 20.0, 20.0));

        assert_eq!(col.filter_bounds(&inside).len(), 1);
        assert!(col.filter_bounds(&outside).is_empty());
    }

    #[test]
    fn test_join_first_match_and_drop() {
        let primary = ImageCollection::from_images(vec![
            image_with_index("k1", 1.0),
            image_with_index("k2", 2.0),
        ]);
        let aux = ImageCollection::from_images(vec![
            image_with_index("k1", 10.0),
            // duplicate key: first occurrence wins
            image_with_index("k1", 99.0),
        ]);

        let joined = primary.join_first(&aux, PROP_SYSTEM_INDEX);
        assert_eq!(joined.len(), 1);
        let (p, c) = joined[0];
        assert_eq!(p.band("B4").unwrap().get(0, 0).unwrap(), 1.0);
        assert_eq!(c.band("B4").unwrap().get(0, 0).unwrap(), 10.0);
    }

    #[test]
    fn test_mosaic_first_unmasked_wins() {
        let mut first = Raster::filled(2, 2, 1.0);
        first.set(0, 0, f64::NAN).unwrap();
        first.set(1, 1, f64::NAN).unwrap();
        let second = Raster::filled(2, 2, 2.0);

        let col = ImageCollection::from_images(vec![
            Image::from_band("B4", first),
            Image::from_band("B4", second),
        ]);

        let mosaic = col.mosaic().unwrap().unwrap();
        let b = mosaic.band("B4").unwrap();
        // Gaps filled by the later image
        assert_eq!(b.get(0, 0).unwrap(), 2.0);
        assert_eq!(b.get(1, 1).unwrap(), 2.0);
        // Existing values keep precedence
        assert_eq!(b.get(0, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_mosaic_empty_collection() {
        let col = ImageCollection::new();
        assert!(col.mosaic().unwrap().is_none());
    }

    #[test]
    fn test_mosaic_shape_mismatch() {
        // Co-registration is part of the provider contract; a mismatch is
        // an error even when the first image has no gaps to fill
        let col = ImageCollection::from_images(vec![
            Image::from_band("B4", Raster::filled(2, 2, 1.0)),
            Image::from_band("B4", Raster::filled(3, 3, 2.0)),
        ]);
        assert!(col.mosaic().is_err());
    }
}
