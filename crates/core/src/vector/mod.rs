//! Vector regions used as spatial filters and reduction domains

use geo::{BoundingRect, Centroid, Contains};
use geo_types::{Geometry, LineString, Point, Polygon};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Compute the bounding box of a geometry
pub fn bounding_box(geom: &Geometry<f64>) -> Option<BoundingBox> {
    geom.bounding_rect().map(|rect| BoundingBox {
        min_x: rect.min().x,
        min_y: rect.min().y,
        max_x: rect.max().x,
        max_y: rect.max().y,
    })
}

/// Build a rectangular polygon from corner coordinates.
///
/// Corners may be given in any order; the rectangle is normalized.
pub fn rect_polygon(x1: f64, y1: f64, x2: f64, y2: f64) -> Polygon<f64> {
    let (min_x, max_x) = (x1.min(x2), x1.max(x2));
    let (min_y, max_y) = (y1.min(y2), y1.max(y2));

    Polygon::new(
        LineString::from(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]),
        vec![],
    )
}

/// A named vector region: the reduction domain for zonal statistics
#[derive(Debug, Clone)]
pub struct Region {
    /// Region name carried into output rows
    pub name: String,
    /// Region geometry
    pub geometry: Geometry<f64>,
}

impl Region {
    pub fn new(name: impl Into<String>, geometry: Geometry<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// Rectangular region from corner coordinates
    pub fn from_rect(name: impl Into<String>, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(name, Geometry::Polygon(rect_polygon(x1, y1, x2, y2)))
    }

    /// Centroid of the region geometry
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }

    /// Bounding box of the region geometry
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        bounding_box(&self.geometry)
    }

    /// Whether a geographic point falls inside the region
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.geometry.contains(&Point::new(x, y))
    }
}

/// A named, ordered set of regions (e.g. administrative districts or
/// protected areas). Iteration order is the order regions were added and
/// determines output row order within a time window.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    name: String,
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: Vec::new(),
        }
    }

    pub fn from_regions(name: impl Into<String>, regions: Vec<Region>) -> Self {
        Self {
            name: name.into(),
            regions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

impl IntoIterator for RegionSet {
    type Item = Region;
    type IntoIter = std::vec::IntoIter<Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}
