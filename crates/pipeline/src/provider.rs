//! Imagery provider abstraction
//!
//! The imagery catalog is an external collaborator: the pipeline only
//! needs time- and region-filtered collections back from it. Provider
//! failures are fatal to a run; there is no retry logic here.

use chrono::NaiveDate;
use geo_types::Geometry;
use std::collections::HashMap;

use verdis_core::{Error, ImageCollection, Result};

/// Source of filtered image collections
pub trait ImageryProvider {
    /// Query a catalog for imagery intersecting `bounds` and acquired in
    /// the half-open range `[start, end)`.
    fn query_collection(
        &self,
        catalog_id: &str,
        bounds: &Geometry<f64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ImageCollection>;
}

/// In-memory provider backed by preloaded collections.
///
/// Serves demo runs and tests; a real deployment implements
/// [`ImageryProvider`] against an actual catalog service.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    catalogs: HashMap<String, ImageCollection>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog under an identifier
    pub fn insert(&mut self, catalog_id: impl Into<String>, collection: ImageCollection) {
        self.catalogs.insert(catalog_id.into(), collection);
    }
}

impl ImageryProvider for MemoryProvider {
    fn query_collection(
        &self,
        catalog_id: &str,
        bounds: &Geometry<f64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ImageCollection> {
        let collection = self
            .catalogs
            .get(catalog_id)
            .ok_or_else(|| Error::ProviderUnavailable(format!("unknown catalog {catalog_id}")))?;

        Ok(collection.filter_bounds(bounds).filter_date(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdis_core::raster::{Image, Raster};
    use verdis_core::vector::rect_polygon;

    fn aoi() -> Geometry<f64> {
        Geometry::Polygon(rect_polygon(0.0, -4.0, 4.0, 0.0))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_unknown_catalog_is_provider_failure() {
        let provider = MemoryProvider::new();
        let err = provider
            .query_collection("missing", &aoi(), date(2022, 1, 1), date(2022, 2, 1))
            .unwrap_err();
        assert!(matches!(err, Error::ProviderUnavailable(_)));
    }

    #[test]
    fn test_query_applies_filters() {
        let mut provider = MemoryProvider::new();
        let img = Image::from_band("B4", Raster::filled(4, 4, 1.0)).with_date(date(2022, 1, 10));
        let stale = Image::from_band("B4", Raster::filled(4, 4, 2.0)).with_date(date(2021, 6, 1));
        provider.insert("s2", ImageCollection::from_images(vec![img, stale]));

        let result = provider
            .query_collection("s2", &aoi(), date(2022, 1, 1), date(2022, 2, 1))
            .unwrap();
        assert_eq!(result.len(), 1);
    }
}
