//! In-memory engine implementation.
//!
//! `HeadlessEngine` stands in for a real rendering engine: it keeps
//! sources, layers, and camera requests in memory and records every
//! mutation in an operation log. The CLI drives it to preview
//! reconciliation results, and tests assert against the log — e.g. that a
//! style-transition replay re-creates layers through fresh adds rather
//! than updates.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use geojson::FeatureCollection;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::geometry::LngLatBounds;
use crate::layer::EngineLayerId;
use crate::style::RenderSpec;

use super::{BoxFuture, EasingFn, EngineError, MapEngine};

/// Base-style layer ids present in every style.
///
/// A real engine swaps these for the new style's own set on a style
/// change; two stable ids are enough to exercise the overlay-prefix
/// filtering of the stale-id sweep.
const BASE_LAYERS: [&str; 2] = ["background", "land"];

/// One recorded engine mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOp {
    AddSource(String),
    UpdateSource(String),
    RemoveSource(String),
    AddLayer(String, RenderSpec),
    RemoveLayer(String),
    SetVisibility(String, bool),
    SetStyle(String),
    FitBounds(LngLatBounds),
    EaseToDefault(f64),
}

/// Last camera request the engine received.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraCall {
    /// fit_bounds(bounds, padding_px, duration_ms)
    FitBounds {
        bounds: LngLatBounds,
        padding_px: f64,
        duration_ms: u64,
    },
    /// ease_to_default(zoom, duration_ms, _)
    EaseToDefault { zoom: f64, duration_ms: u64 },
}

#[derive(Debug, Clone)]
struct LayerEntry {
    source: String,
    spec: RenderSpec,
    visible: bool,
}

#[derive(Debug, Default)]
struct EngineState {
    style: String,
    sources: BTreeMap<String, FeatureCollection>,
    layers: BTreeMap<String, LayerEntry>,
    ops: Vec<EngineOp>,
    camera: Option<CameraCall>,
    destroyed: bool,
}

/// One-shot async signal in the Notify-then-check idiom.
#[derive(Default)]
struct Signal {
    notify: Notify,
    armed: AtomicBool,
}

impl Signal {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.armed.swap(false, Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

/// In-memory [`MapEngine`] with an operation log.
pub struct HeadlessEngine {
    state: Mutex<EngineState>,
    ready: Signal,
    style_data: Signal,
}

impl HeadlessEngine {
    /// Construct an instance with the given initial style. The readiness
    /// signal is armed immediately; a headless engine has no tiles to
    /// fetch.
    pub fn new(initial_style: impl Into<String>) -> Arc<Self> {
        let engine = Arc::new(Self {
            state: Mutex::new(EngineState {
                style: initial_style.into(),
                ..EngineState::default()
            }),
            ready: Signal::default(),
            style_data: Signal::default(),
        });
        engine.ready.arm();
        engine
    }

    /// Current style id.
    pub fn style(&self) -> String {
        self.state.lock().style.clone()
    }

    /// Ids of all sources, in sorted order.
    pub fn source_ids(&self) -> Vec<String> {
        self.state.lock().sources.keys().cloned().collect()
    }

    /// Data of a source, if present.
    pub fn source_data(&self, id: &EngineLayerId) -> Option<FeatureCollection> {
        self.state.lock().sources.get(id.as_str()).cloned()
    }

    /// Render spec of a layer, if present.
    pub fn render_spec(&self, id: &EngineLayerId) -> Option<RenderSpec> {
        self.state.lock().layers.get(id.as_str()).map(|l| l.spec)
    }

    /// Visibility of a layer, if present.
    pub fn layer_visibility(&self, id: &EngineLayerId) -> Option<bool> {
        self.state
            .lock()
            .layers
            .get(id.as_str())
            .map(|l| l.visible)
    }

    /// Snapshot of the operation log.
    pub fn ops(&self) -> Vec<EngineOp> {
        self.state.lock().ops.clone()
    }

    /// Drop all recorded operations, keeping sources and layers.
    pub fn clear_ops(&self) {
        self.state.lock().ops.clear();
    }

    /// Last camera request, if any.
    pub fn camera(&self) -> Option<CameraCall> {
        self.state.lock().camera.clone()
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut EngineState) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut state = self.state.lock();
        if state.destroyed {
            return Err(EngineError::Disposed);
        }
        f(&mut state)
    }
}

impl MapEngine for HeadlessEngine {
    fn wait_ready(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(async move {
            self.ready.wait().await;
            Ok(())
        })
    }

    fn wait_style_data(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(async move {
            self.style_data.wait().await;
            Ok(())
        })
    }

    fn add_source(
        &self,
        id: &EngineLayerId,
        data: &FeatureCollection,
    ) -> Result<(), EngineError> {
        self.mutate(|state| {
            if state.sources.contains_key(id.as_str()) {
                return Err(EngineError::DuplicateId(id.to_string()));
            }
            state.sources.insert(id.to_string(), data.clone());
            state.ops.push(EngineOp::AddSource(id.to_string()));
            Ok(())
        })
    }

    fn update_source_data(
        &self,
        id: &EngineLayerId,
        data: &FeatureCollection,
    ) -> Result<(), EngineError> {
        self.mutate(|state| {
            let Some(entry) = state.sources.get_mut(id.as_str()) else {
                return Err(EngineError::UnknownSource(id.to_string()));
            };
            *entry = data.clone();
            state.ops.push(EngineOp::UpdateSource(id.to_string()));
            Ok(())
        })
    }

    fn remove_source(&self, id: &EngineLayerId) -> Result<(), EngineError> {
        self.mutate(|state| {
            if state.sources.remove(id.as_str()).is_none() {
                return Err(EngineError::UnknownSource(id.to_string()));
            }
            state.ops.push(EngineOp::RemoveSource(id.to_string()));
            Ok(())
        })
    }

    fn add_layer(
        &self,
        id: &EngineLayerId,
        source: &EngineLayerId,
        spec: RenderSpec,
    ) -> Result<(), EngineError> {
        self.mutate(|state| {
            if state.layers.contains_key(id.as_str()) {
                return Err(EngineError::DuplicateId(id.to_string()));
            }
            if !state.sources.contains_key(source.as_str()) {
                return Err(EngineError::UnknownSource(source.to_string()));
            }
            state.layers.insert(
                id.to_string(),
                LayerEntry {
                    source: source.to_string(),
                    spec,
                    visible: true,
                },
            );
            state.ops.push(EngineOp::AddLayer(id.to_string(), spec));
            Ok(())
        })
    }

    fn remove_layer(&self, id: &EngineLayerId) -> Result<(), EngineError> {
        self.mutate(|state| {
            if state.layers.remove(id.as_str()).is_none() {
                return Err(EngineError::UnknownLayer(id.to_string()));
            }
            state.ops.push(EngineOp::RemoveLayer(id.to_string()));
            Ok(())
        })
    }

    fn set_layer_visibility(&self, id: &EngineLayerId, visible: bool) -> Result<(), EngineError> {
        self.mutate(|state| {
            let Some(entry) = state.layers.get_mut(id.as_str()) else {
                return Err(EngineError::UnknownLayer(id.to_string()));
            };
            entry.visible = visible;
            state
                .ops
                .push(EngineOp::SetVisibility(id.to_string(), visible));
            Ok(())
        })
    }

    fn set_style(&self, style_id: &str) -> Result<(), EngineError> {
        self.mutate(|state| {
            if style_id.trim().is_empty() {
                return Err(EngineError::InvalidStyle(style_id.to_string()));
            }
            state.style = style_id.to_string();
            // A style swap discards all non-base rendering state.
            state.sources.clear();
            state.layers.clear();
            state.ops.push(EngineOp::SetStyle(style_id.to_string()));
            Ok(())
        })?;
        self.style_data.arm();
        Ok(())
    }

    fn fit_bounds(&self, bounds: &LngLatBounds, padding_px: f64, duration_ms: u64) {
        let mut state = self.state.lock();
        if state.destroyed {
            return;
        }
        state.ops.push(EngineOp::FitBounds(*bounds));
        state.camera = Some(CameraCall::FitBounds {
            bounds: *bounds,
            padding_px,
            duration_ms,
        });
    }

    fn ease_to_default(&self, zoom: f64, duration_ms: u64, _easing: EasingFn) {
        let mut state = self.state.lock();
        if state.destroyed {
            return;
        }
        state.ops.push(EngineOp::EaseToDefault(zoom));
        state.camera = Some(CameraCall::EaseToDefault { zoom, duration_ms });
    }

    fn list_layer_ids(&self) -> Vec<String> {
        let state = self.state.lock();
        if state.destroyed {
            return Vec::new();
        }
        BASE_LAYERS
            .iter()
            .map(|s| s.to_string())
            .chain(state.layers.keys().cloned())
            .collect()
    }

    fn destroy(&self) {
        let mut state = self.state.lock();
        state.destroyed = true;
        state.sources.clear();
        state.layers.clear();
        state.camera = None;
    }
}
