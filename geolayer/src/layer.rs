//! Caller-facing layer descriptions and engine id derivation.
//!
//! A [`LayerSpec`] is the unit of desired state: one overlay layer with a
//! caller-chosen id, its GeoJSON payload, and a visibility flag. Engine ids
//! are derived by prefixing, which keeps overlay layers disjoint from the
//! base style's own layer ids and makes stale overlays recognizable when
//! sweeping the engine's layer list.

use std::fmt;

use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

/// Prefix that namespaces overlay layers within the engine.
///
/// Base styles never use this prefix, so a prefixed id found in the engine
/// is always one of ours.
pub const OVERLAY_PREFIX: &str = "geojson-layer-";

/// Desired state of one overlay layer.
///
/// Caller-owned: each reconciliation pass receives a fresh list and the
/// previous one is discarded. Ids must be unique within a desired list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Caller-chosen layer id, unique within the desired list.
    pub id: String,

    /// GeoJSON payload. Treated as opaque except for geometry-type
    /// inspection and coordinate traversal.
    pub data: FeatureCollection,

    /// Whether the layer should be rendered. Invisible layers keep their
    /// engine objects but contribute nothing to camera framing.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl LayerSpec {
    /// Create a visible layer.
    pub fn new(id: impl Into<String>, data: FeatureCollection) -> Self {
        Self {
            id: id.into(),
            data,
            visible: true,
        }
    }

    /// Set the visibility flag.
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// The engine id this layer reconciles under.
    pub fn engine_id(&self) -> EngineLayerId {
        EngineLayerId::for_layer(&self.id)
    }
}

/// Engine-namespaced identifier of an overlay layer.
///
/// Derived deterministically from a [`LayerSpec`] id by prefixing with
/// [`OVERLAY_PREFIX`]. The mapping is a total bijection: distinct layer ids
/// never collide, and the same layer id always derives the same engine id.
/// The same id names both the layer and its backing source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineLayerId(String);

impl EngineLayerId {
    /// Derive the engine id for a caller-chosen layer id.
    pub fn for_layer(layer_id: &str) -> Self {
        Self(format!("{}{}", OVERLAY_PREFIX, layer_id))
    }

    /// Reconstruct from an id reported by the engine, if it carries the
    /// overlay prefix. Base-style layer ids return `None`.
    pub fn from_engine_id(engine_id: &str) -> Option<Self> {
        engine_id
            .starts_with(OVERLAY_PREFIX)
            .then(|| Self(engine_id.to_string()))
    }

    /// The full engine-side id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EngineLayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_id_is_prefixed() {
        let id = EngineLayerId::for_layer("rivers");
        assert_eq!(id.as_str(), "geojson-layer-rivers");
    }

    #[test]
    fn test_engine_id_roundtrip() {
        let id = EngineLayerId::for_layer("parcels");
        assert_eq!(
            EngineLayerId::from_engine_id(id.as_str()),
            Some(id.clone())
        );
    }

    #[test]
    fn test_base_style_ids_rejected() {
        assert_eq!(EngineLayerId::from_engine_id("water"), None);
        assert_eq!(EngineLayerId::from_engine_id("background"), None);
    }

    #[test]
    fn test_distinct_layer_ids_never_collide() {
        let a = EngineLayerId::for_layer("a");
        let b = EngineLayerId::for_layer("b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_layer_id_is_stable() {
        assert_eq!(
            EngineLayerId::for_layer("zones"),
            EngineLayerId::for_layer("zones")
        );
    }

    #[test]
    fn test_layer_spec_deserializes_with_default_visibility() {
        let spec: LayerSpec = serde_json::from_str(
            r#"{
                "id": "pts",
                "data": {"type": "FeatureCollection", "features": []}
            }"#,
        )
        .unwrap();
        assert!(spec.visible, "visibility should default to true");
        assert_eq!(spec.engine_id().as_str(), "geojson-layer-pts");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_mapping_is_injective(
                a in "[a-z0-9_-]{1,16}",
                b in "[a-z0-9_-]{1,16}",
            ) {
                prop_assume!(a != b);
                prop_assert_ne!(
                    EngineLayerId::for_layer(&a),
                    EngineLayerId::for_layer(&b)
                );
            }

            #[test]
            fn test_derived_ids_always_recognized(
                id in "[a-z0-9_-]{1,16}",
            ) {
                let engine_id = EngineLayerId::for_layer(&id);
                prop_assert_eq!(
                    EngineLayerId::from_engine_id(engine_id.as_str()),
                    Some(engine_id.clone())
                );
            }
        }
    }
}
