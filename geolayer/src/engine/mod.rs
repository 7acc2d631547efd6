//! Map engine capability surface.
//!
//! The rendering engine is an external collaborator; this module defines
//! the minimal interface the overlay core drives it through. The two
//! suspension points in the system — waiting for initial readiness and
//! waiting for post-style-switch data — are modeled as explicit one-shot
//! async operations rather than registered callbacks, so a style
//! transition's replay step is the continuation of the wait, not a
//! listener left dangling after use.
//!
//! # Dyn Compatibility
//!
//! The trait uses `Pin<Box<dyn Future>>` for its async methods so the
//! controller can hold an `Arc<dyn MapEngine>` handle passed in by the
//! caller. One engine instance is driven by one controller; all mutation
//! is serialized onto it.

mod headless;

pub use headless::{CameraCall, EngineOp, HeadlessEngine};

use std::future::Future;
use std::pin::Pin;

use geojson::FeatureCollection;
use thiserror::Error;

use crate::geometry::LngLatBounds;
use crate::layer::EngineLayerId;
use crate::style::RenderSpec;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Easing curve for camera transitions, mapping t in [0, 1] to progress.
pub type EasingFn = fn(f64) -> f64;

/// Linear easing, used for the reset-to-default-zoom transition.
pub fn linear(t: f64) -> f64 {
    t
}

/// Errors reported by a map engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine rejected a style identifier.
    #[error("invalid style identifier: {0:?}")]
    InvalidStyle(String),

    /// A source id was not found.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// A layer id was not found.
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    /// A source or layer id already exists.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// The engine instance has been destroyed.
    #[error("engine instance disposed")]
    Disposed,
}

/// Minimal capability surface of the rendering engine.
///
/// Sources hold feature data; layers reference a source and a render
/// primitive. A style switch discards every non-base source and layer, so
/// callers must be prepared to re-create overlay state after
/// [`wait_style_data`] resolves.
///
/// Camera methods are fire-and-forget: the engine animates on its own and
/// the caller never awaits completion.
///
/// [`wait_style_data`]: MapEngine::wait_style_data
pub trait MapEngine: Send + Sync {
    /// Resolve once the engine has finished constructing its initial
    /// style. Fires once per engine instance.
    fn wait_ready(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Resolve once the data for the most recently requested style is
    /// ready. Fires once per `set_style` call.
    fn wait_style_data(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Add a named feature-collection source.
    fn add_source(
        &self,
        id: &EngineLayerId,
        data: &FeatureCollection,
    ) -> Result<(), EngineError>;

    /// Replace the feature collection of an existing source in place.
    fn update_source_data(
        &self,
        id: &EngineLayerId,
        data: &FeatureCollection,
    ) -> Result<(), EngineError>;

    /// Remove a source. The engine requires layers referencing it to be
    /// removed first.
    fn remove_source(&self, id: &EngineLayerId) -> Result<(), EngineError>;

    /// Add a layer rendering `source` with the given spec.
    fn add_layer(
        &self,
        id: &EngineLayerId,
        source: &EngineLayerId,
        spec: RenderSpec,
    ) -> Result<(), EngineError>;

    /// Remove a layer.
    fn remove_layer(&self, id: &EngineLayerId) -> Result<(), EngineError>;

    /// Show or hide a layer.
    fn set_layer_visibility(&self, id: &EngineLayerId, visible: bool) -> Result<(), EngineError>;

    /// Request a basemap style change. On success the engine will discard
    /// all non-base state and eventually signal [`MapEngine::wait_style_data`].
    fn set_style(&self, style_id: &str) -> Result<(), EngineError>;

    /// Animate the camera to frame `bounds` with the given padding.
    fn fit_bounds(&self, bounds: &LngLatBounds, padding_px: f64, duration_ms: u64);

    /// Animate the camera back to a default zoom level.
    fn ease_to_default(&self, zoom: f64, duration_ms: u64, easing: EasingFn);

    /// Ids of every layer the engine currently knows, base style included.
    fn list_layer_ids(&self) -> Vec<String>;

    /// Tear the instance down. Subsequent mutations fail with
    /// [`EngineError::Disposed`].
    fn destroy(&self);
}
