//! Inspect command: classify a GeoJSON file and report its extent.

use std::path::PathBuf;

use clap::Args;

use geolayer::geometry::{self, LngLatBounds};
use geolayer::style_for;

use crate::error::CliError;

use super::load_feature_collection;

/// Arguments for the inspect command.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// GeoJSON file to inspect
    pub file: PathBuf,
}

/// Run the inspect command.
pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let collection = load_feature_collection(&args.file)?;

    println!("File:     {}", args.file.display());
    println!("Features: {}", collection.features.len());

    match geometry::classify(&collection) {
        Some(class) => {
            println!("Class:    {}", class);
            println!("Style:    {}", style_for(class));
        }
        None => println!("Class:    none (no recognizable geometry)"),
    }

    let mut bounds = LngLatBounds::new();
    geometry::accumulate(&mut bounds, &collection);
    println!("Bounds:   {}", bounds);
    if let Some((lon, lat)) = bounds.center() {
        println!("Center:   [{:.6}, {:.6}]", lon, lat);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_inspect_polygon_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "geometry": {{"type": "Polygon", "coordinates":
                    [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]]]}}, "properties": {{}}}}
            ]}}"#
        )
        .unwrap();

        let args = InspectArgs {
            file: file.path().to_path_buf(),
        };
        run(args).unwrap();
    }

    #[test]
    fn test_inspect_empty_collection() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "FeatureCollection", "features": []}}"#).unwrap();

        let args = InspectArgs {
            file: file.path().to_path_buf(),
        };
        run(args).unwrap();
    }
}
