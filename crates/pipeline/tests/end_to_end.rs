//! End-to-end pipeline scenarios over an in-memory provider

use chrono::NaiveDate;
use geo_types::Geometry;

use verdis_algorithms::masking::{CloudMaskConfig, BAND_PROBABILITY};
use verdis_algorithms::statistics::ReduceParams;
use verdis_core::raster::{
    Image, PropertyValue, Raster, PROP_CLOUDY_PIXEL_PERCENTAGE, PROP_MEAN_SOLAR_AZIMUTH,
    PROP_SYSTEM_INDEX,
};
use verdis_core::vector::{rect_polygon, Region, RegionSet};
use verdis_core::ImageCollection;
use verdis_pipeline::{
    assemble, monthly_windows, write_table_to, IndexSource, MemoryProvider, SeriesSource,
};

const N: usize = 8;

fn aoi() -> Geometry<f64> {
    Geometry::Polygon(rect_polygon(0.0, -(N as f64), N as f64, 0.0))
}

fn two_regions() -> RegionSet {
    RegionSet::from_regions(
        "parks",
        vec![
            Region::from_rect("west", 0.0, -(N as f64), N as f64 / 2.0, 0.0),
            Region::from_rect("east", N as f64 / 2.0, -(N as f64), N as f64, 0.0),
        ],
    )
}

/// A cloud-free Sentinel-2 style scene and its probability companion
fn clear_scene(date: NaiveDate) -> (Image, Image) {
    let img = Image::from_band("B8", Raster::filled(N, N, 5000.0));
    let img = img.with_band("B4", Raster::filled(N, N, 1000.0)).unwrap();
    let img = img.with_band("B2", Raster::filled(N, N, 500.0)).unwrap();
    let img = img.with_band("SCL", Raster::filled(N, N, 4.0)).unwrap();
    let img = img
        .with_date(date)
        .with_property(PROP_SYSTEM_INDEX, PropertyValue::Text("scene-1".to_string()))
        .with_property(PROP_CLOUDY_PIXEL_PERCENTAGE, PropertyValue::Float(2.0))
        .with_property(PROP_MEAN_SOLAR_AZIMUTH, PropertyValue::Float(133.0));

    let companion = Image::from_band(BAND_PROBABILITY, Raster::filled(N, N, 0.0))
        .with_date(date)
        .with_property(PROP_SYSTEM_INDEX, PropertyValue::Text("scene-1".to_string()));

    (img, companion)
}

fn masked_source() -> SeriesSource {
    SeriesSource {
        catalog: "s2-sr".to_string(),
        cloud_catalog: Some("s2-cloud-probability".to_string()),
        index: IndexSource::ndvi_default(),
        regions: two_regions(),
        reduce: ReduceParams::default(),
    }
}

#[test]
fn cloud_free_scene_gives_consistent_stats() {
    let windows = monthly_windows(&[2022, 2023]).unwrap();
    let (scene, companion) = clear_scene(NaiveDate::from_ymd_opt(2022, 1, 10).unwrap());

    let mut provider = MemoryProvider::new();
    provider.insert("s2-sr", ImageCollection::from_images(vec![scene]));
    provider.insert(
        "s2-cloud-probability",
        ImageCollection::from_images(vec![companion]),
    );

    let rows = assemble(
        &provider,
        &aoi(),
        &windows[..1],
        &masked_source(),
        &CloudMaskConfig::default(),
    )
    .unwrap();

    // One window, two regions
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].region, "west");
    assert_eq!(rows[1].region, "east");

    for row in &rows {
        // Uniform unmasked input: the three statistics agree
        let (max, mean, min) = (
            row.max.expect("max present"),
            row.mean.expect("mean present"),
            row.min.expect("min present"),
        );
        assert_eq!(max, mean);
        assert_eq!(mean, min);
        assert!(max >= mean && mean >= min);

        // NDVI of (5000, 1000) is 0.667 after rounding
        assert!((mean - 0.667).abs() < 1e-9);

        assert_eq!(row.month, "01/22");
        assert!((row.years_since_epoch - 52.038).abs() < 1e-9);
    }
}

#[test]
fn empty_and_failing_windows_stay_schema_complete() {
    let windows = monthly_windows(&[2022, 2023]).unwrap();
    let (scene, companion) = clear_scene(NaiveDate::from_ymd_opt(2022, 1, 10).unwrap());

    let mut provider = MemoryProvider::new();
    provider.insert("s2-sr", ImageCollection::from_images(vec![scene]));
    provider.insert(
        "s2-cloud-probability",
        ImageCollection::from_images(vec![companion]),
    );

    // Three windows; only January has imagery
    let rows = assemble(
        &provider,
        &aoi(),
        &windows[..3],
        &masked_source(),
        &CloudMaskConfig::default(),
    )
    .unwrap();

    assert_eq!(rows.len(), 6);
    assert!(rows[0].mean.is_some());
    for row in &rows[2..] {
        assert!(row.mean.is_none());
        assert!(row.max.is_none());
        assert!(row.min.is_none());
    }

    // Every row still renders into the fixed CSV schema
    let mut buf = Vec::new();
    write_table_to(&rows, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 7);
    assert!(text
        .lines()
        .next()
        .unwrap()
        .starts_with("Month,Years Since Epoch (t),Region"));
}

#[test]
fn missing_catalog_aborts_the_run() {
    let windows = monthly_windows(&[2022, 2023]).unwrap();
    let provider = MemoryProvider::new();

    let result = assemble(
        &provider,
        &aoi(),
        &windows[..1],
        &masked_source(),
        &CloudMaskConfig::default(),
    );
    assert!(result.is_err());
}

#[test]
fn partly_cloudy_scene_masks_only_flagged_region() {
    // Left half of the scene is cloudy; the west region's statistics come
    // from nothing (fully masked), the east region stays intact
    let windows = monthly_windows(&[2022, 2023]).unwrap();
    let date = NaiveDate::from_ymd_opt(2022, 1, 10).unwrap();
    let (scene, _) = clear_scene(date);

    let mut probability = Raster::filled(N, N, 0.0);
    for row in 0..N {
        for col in 0..N / 2 {
            probability.set(row, col, 95.0).unwrap();
        }
    }
    let companion = Image::from_band(BAND_PROBABILITY, probability)
        .with_date(date)
        .with_property(PROP_SYSTEM_INDEX, PropertyValue::Text("scene-1".to_string()));

    let mut provider = MemoryProvider::new();
    provider.insert("s2-sr", ImageCollection::from_images(vec![scene]));
    provider.insert(
        "s2-cloud-probability",
        ImageCollection::from_images(vec![companion]),
    );

    // Keep all morphology at native scale and drop the buffer to the
    // minimum so the cloud edge stays sharp on this tiny grid
    let cfg = CloudMaskConfig {
        projection_scale: 1.0,
        output_scale: 1.0,
        buffer: 10.0,
        ..CloudMaskConfig::default()
    };

    let rows = assemble(&provider, &aoi(), &windows[..1], &masked_source(), &cfg).unwrap();

    assert_eq!(rows.len(), 2);
    let west = &rows[0];
    let east = &rows[1];

    // West region: every pixel masked, missing values (never zeros)
    assert!(west.mean.is_none());

    // East region: untouched, consistent statistics
    let mean = east.mean.expect("east mean present");
    assert!((mean - 0.667).abs() < 1e-9);
}
