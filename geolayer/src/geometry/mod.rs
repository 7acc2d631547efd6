//! Geometry classification and bounding-box accumulation.
//!
//! Provides the two pure operations the reconciler needs from a GeoJSON
//! feature collection: a coarse geometry class used to pick a render
//! primitive, and the collection's contribution to a running
//! (longitude, latitude) bounding box used for camera framing.

mod types;

pub use types::{GeometryClass, LngLatBounds};

use geojson::{Feature, FeatureCollection, Value};

/// Determine the rendering class of a feature collection.
///
/// Only the first feature's declared geometry type is read: collections are
/// assumed geometrically homogeneous, and a mixed collection is styled per
/// its first feature. This is a documented limitation, not an error.
///
/// Returns `None` for an empty collection, a leading feature without a
/// geometry, or a leading geometry type with no rendering class
/// (e.g. `GeometryCollection`). Such collections contribute no styling and
/// must not abort reconciliation of other layers.
pub fn classify(collection: &FeatureCollection) -> Option<GeometryClass> {
    let geometry = collection.features.first()?.geometry.as_ref()?;
    match geometry.value {
        Value::Point(_) | Value::MultiPoint(_) => Some(GeometryClass::Point),
        Value::LineString(_) | Value::MultiLineString(_) => Some(GeometryClass::Line),
        Value::Polygon(_) | Value::MultiPolygon(_) => Some(GeometryClass::Polygon),
        Value::GeometryCollection(_) => None,
    }
}

/// Fold every coordinate of every feature into `bounds`.
///
/// Unlike [`classify`], accumulation walks the whole collection regardless
/// of homogeneity:
///
/// - Point: the single coordinate pair
/// - MultiPoint, LineString: every vertex
/// - MultiLineString: every vertex of every line
/// - Polygon: outer ring only (holes are bounded by the outer ring)
/// - MultiPolygon: every vertex of every ring of every member
///
/// Features without a geometry and `GeometryCollection` members are
/// skipped silently.
pub fn accumulate(bounds: &mut LngLatBounds, collection: &FeatureCollection) {
    for feature in &collection.features {
        accumulate_feature(bounds, feature);
    }
}

fn accumulate_feature(bounds: &mut LngLatBounds, feature: &Feature) {
    let Some(geometry) = feature.geometry.as_ref() else {
        return;
    };
    match &geometry.value {
        Value::Point(position) => extend_position(bounds, position),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            extend_positions(bounds, positions);
        }
        Value::MultiLineString(lines) => {
            for line in lines {
                extend_positions(bounds, line);
            }
        }
        Value::Polygon(rings) => {
            // Outer ring bounds the shape; holes cannot extend it.
            if let Some(outer) = rings.first() {
                extend_positions(bounds, outer);
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                for ring in rings {
                    extend_positions(bounds, ring);
                }
            }
        }
        Value::GeometryCollection(_) => {}
    }
}

fn extend_positions(bounds: &mut LngLatBounds, positions: &[Vec<f64>]) {
    for position in positions {
        extend_position(bounds, position);
    }
}

fn extend_position(bounds: &mut LngLatBounds, position: &[f64]) {
    // GeoJSON positions are [lon, lat, ...]; shorter arrays are malformed
    // and contribute nothing.
    if let [lon, lat, ..] = position {
        bounds.extend(*lon, *lat);
    }
}
