//! CLI command implementations.

pub mod inspect;
pub mod render;

use std::fs;
use std::path::Path;

use geojson::{FeatureCollection, GeoJson};

use crate::error::CliError;

/// Load a GeoJSON file as a feature collection.
///
/// Accepts a bare `FeatureCollection` document; a single `Feature` or
/// `Geometry` document is wrapped into a one-feature collection so small
/// hand-written files work too.
pub fn load_feature_collection(path: &Path) -> Result<FeatureCollection, CliError> {
    let display = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: display.clone(),
        error,
    })?;

    let geojson: GeoJson = contents.parse().map_err(|e: geojson::Error| CliError::Parse {
        path: display.clone(),
        message: e.to_string(),
    })?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(feature) => Ok(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }),
        GeoJson::Geometry(geometry) => Ok(FeatureCollection {
            bbox: None,
            features: vec![geojson::Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        }),
    }
}

/// Derive a layer id from a file path: the file stem, or the full file
/// name if there is no stem.
pub fn layer_id_for_path(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layer".to_string())
}
