//! Core types for geometry classification and bounds accumulation.

use std::fmt;

/// Coarse rendering class of a feature collection.
///
/// GeoJSON distinguishes seven geometry types; for styling purposes only
/// three classes matter, since the engine renders everything as circles,
/// lines, or fills. Multi-variants collapse into the same class as their
/// singular counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryClass {
    /// Point and MultiPoint geometries, rendered as circles.
    Point,
    /// LineString and MultiLineString geometries, rendered as lines.
    Line,
    /// Polygon and MultiPolygon geometries, rendered as fills.
    Polygon,
}

impl GeometryClass {
    /// Short lowercase name, used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryClass::Point => "point",
            GeometryClass::Line => "line",
            GeometryClass::Polygon => "polygon",
        }
    }
}

impl fmt::Display for GeometryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned (longitude, latitude) bounding box accumulator.
///
/// Starts empty; once any coordinate has been folded in via [`extend`],
/// the box is the minimal rectangle covering all folded coordinates.
/// An empty box signals "no geographic extent to frame".
///
/// Coordinates are degrees. No antimeridian correction is performed: a
/// collection straddling ±180° longitude produces a box that may overstate
/// its extent.
///
/// [`extend`]: LngLatBounds::extend
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LngLatBounds {
    extent: Option<Extent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl LngLatBounds {
    /// Create an empty bounding box.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no coordinate has been folded in yet.
    pub fn is_empty(&self) -> bool {
        self.extent.is_none()
    }

    /// Fold a (longitude, latitude) pair into the box.
    pub fn extend(&mut self, lon: f64, lat: f64) {
        match &mut self.extent {
            Some(e) => {
                e.min_lon = e.min_lon.min(lon);
                e.min_lat = e.min_lat.min(lat);
                e.max_lon = e.max_lon.max(lon);
                e.max_lat = e.max_lat.max(lat);
            }
            None => {
                self.extent = Some(Extent {
                    min_lon: lon,
                    min_lat: lat,
                    max_lon: lon,
                    max_lat: lat,
                });
            }
        }
    }

    /// Fold another box into this one.
    pub fn extend_bounds(&mut self, other: &LngLatBounds) {
        if let Some(e) = other.extent {
            self.extend(e.min_lon, e.min_lat);
            self.extend(e.max_lon, e.max_lat);
        }
    }

    /// Southwest and northeast corners as ((min_lon, min_lat), (max_lon, max_lat)).
    pub fn corners(&self) -> Option<((f64, f64), (f64, f64))> {
        self.extent
            .map(|e| ((e.min_lon, e.min_lat), (e.max_lon, e.max_lat)))
    }

    /// Center point of the box as (longitude, latitude).
    pub fn center(&self) -> Option<(f64, f64)> {
        self.extent.map(|e| {
            (
                (e.min_lon + e.max_lon) / 2.0,
                (e.min_lat + e.max_lat) / 2.0,
            )
        })
    }

    /// Width of the box in degrees of longitude. Zero when empty.
    pub fn width(&self) -> f64 {
        self.extent.map_or(0.0, |e| e.max_lon - e.min_lon)
    }

    /// Height of the box in degrees of latitude. Zero when empty.
    pub fn height(&self) -> f64 {
        self.extent.map_or(0.0, |e| e.max_lat - e.min_lat)
    }

    /// True if the (lon, lat) pair lies within the box (inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.extent.is_some_and(|e| {
            lon >= e.min_lon && lon <= e.max_lon && lat >= e.min_lat && lat <= e.max_lat
        })
    }
}

impl fmt::Display for LngLatBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.extent {
            Some(e) => write!(
                f,
                "[{:.6}, {:.6}] .. [{:.6}, {:.6}]",
                e.min_lon, e.min_lat, e.max_lon, e.max_lat
            ),
            None => f.write_str("(empty)"),
        }
    }
}
