//! Map lifecycle control and plan application.
//!
//! `OverlayController` owns the single engine handle — passed in
//! explicitly, never looked up from ambient state — and everything needed
//! to keep overlays consistent with a desired list: the lifecycle state
//! machine, the orthogonal style-switching flag, and the authoritative
//! bookkeeping of which overlay holds which data and visibility. The
//! engine is never asked what render state an id has; the bookkeeping is
//! the source of truth, and the engine's layer list is consulted only as a
//! stale-id consistency sweep.
//!
//! All mutation of one engine instance funnels through one controller.
//! Callers needing cross-task access should drive it through
//! [`crate::service::OverlayService`], which serializes commands onto a
//! single owning task.

use std::collections::BTreeMap;
use std::sync::Arc;

use geojson::FeatureCollection;
use tracing::{debug, info, warn};

use crate::config::CameraConfig;
use crate::engine::{linear, EngineError, MapEngine};
use crate::layer::{EngineLayerId, LayerSpec};
use crate::reconcile::{self, LayerAction};

/// Lifecycle of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No engine instance is live.
    Uninitialized,
    /// Engine constructed, waiting for its first-ready signal.
    Initializing,
    /// Accepting reconciliation and style-transition requests.
    Ready,
}

/// Bookkeeping record for one overlay layer known to exist in the engine.
#[derive(Debug, Clone)]
pub(crate) struct LayerRecord {
    pub(crate) data: FeatureCollection,
    pub(crate) visible: bool,
    /// False when the layer's collection had no recognizable geometry and
    /// only a source was created. Visibility cannot apply to it.
    pub(crate) has_layer: bool,
}

/// Owns one engine instance and keeps overlays consistent with the
/// caller's desired list.
pub struct OverlayController {
    engine: Arc<dyn MapEngine>,
    camera: CameraConfig,
    state: LifecycleState,
    style_switching: bool,
    records: BTreeMap<EngineLayerId, LayerRecord>,
}

impl OverlayController {
    /// Wrap an engine handle. The controller starts `Uninitialized`;
    /// call [`initialize`] before reconciling.
    ///
    /// [`initialize`]: OverlayController::initialize
    pub fn new(engine: Arc<dyn MapEngine>, camera: CameraConfig) -> Self {
        Self {
            engine,
            camera,
            state: LifecycleState::Uninitialized,
            style_switching: false,
            records: BTreeMap::new(),
        }
    }

    /// Await the engine's one-shot ready signal.
    ///
    /// Transitions `Uninitialized → Initializing → Ready`. Re-entrant
    /// calls are no-ops once an instance is past `Uninitialized`.
    pub async fn initialize(&mut self) -> Result<(), EngineError> {
        if self.state != LifecycleState::Uninitialized {
            debug!(state = ?self.state, "initialize called on live instance, ignoring");
            return Ok(());
        }
        self.state = LifecycleState::Initializing;
        self.engine.wait_ready().await?;
        self.state = LifecycleState::Ready;
        info!("map engine ready");
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// True when a style transition is in flight.
    pub fn is_style_switching(&self) -> bool {
        self.style_switching
    }

    /// True when reconciliation requests will be honored.
    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    /// Number of overlays currently tracked in the engine.
    pub fn overlay_count(&self) -> usize {
        self.records.len()
    }

    /// Reconcile the engine's overlay set against `desired`.
    ///
    /// Requests arriving before the engine is ready, or while a style
    /// transition is in flight, are dropped silently; the next pass picks
    /// up the then-current desired list, so data is deferred, not lost.
    ///
    /// Application order: removals, then adds/updates in desired-list
    /// order, then visibility, then camera framing. A failure on one
    /// layer is logged and isolated; the pass continues with the rest.
    pub fn reconcile(&mut self, desired: &[LayerSpec]) {
        if self.state != LifecycleState::Ready {
            debug!(state = ?self.state, "dropping reconciliation request, engine not ready");
            return;
        }
        if self.style_switching {
            debug!("dropping reconciliation request mid style switch");
            return;
        }

        let engine_ids = self.engine_overlay_ids();
        let plan = reconcile::plan(desired, &engine_ids);
        debug!(
            desired = desired.len(),
            removals = plan.to_remove.len(),
            "applying reconciliation plan"
        );

        // Removals first: reusing an id with different content within the
        // same pass must not collide with its stale predecessor.
        for id in &plan.to_remove {
            self.remove_overlay(id);
        }

        for op in &plan.ops {
            match op.action {
                LayerAction::Add(spec) => {
                    if let Err(e) = self.engine.add_source(&op.engine_id, &op.layer.data) {
                        warn!(layer_id = %op.engine_id, error = %e, "failed to add source");
                        continue;
                    }
                    let mut has_layer = false;
                    match spec {
                        Some(spec) => {
                            match self.engine.add_layer(&op.engine_id, &op.engine_id, spec) {
                                Ok(()) => has_layer = true,
                                Err(e) => {
                                    warn!(layer_id = %op.engine_id, error = %e, "failed to add layer");
                                }
                            }
                        }
                        None => {
                            debug!(
                                layer_id = %op.engine_id,
                                "no recognizable geometry, source added without layer"
                            );
                        }
                    }
                    self.records.insert(
                        op.engine_id.clone(),
                        LayerRecord {
                            data: op.layer.data.clone(),
                            visible: op.layer.visible,
                            has_layer,
                        },
                    );
                }
                LayerAction::UpdateData => {
                    if let Err(e) = self.engine.update_source_data(&op.engine_id, &op.layer.data)
                    {
                        warn!(layer_id = %op.engine_id, error = %e, "failed to update source");
                        continue;
                    }
                    if let Some(record) = self.records.get_mut(&op.engine_id) {
                        record.data = op.layer.data.clone();
                    }
                }
            }
        }

        // Visibility applies on every pass, independent of the add/update
        // classification above.
        for op in &plan.ops {
            let Some(record) = self.records.get_mut(&op.engine_id) else {
                continue;
            };
            if record.has_layer {
                match self
                    .engine
                    .set_layer_visibility(&op.engine_id, op.layer.visible)
                {
                    Ok(()) => record.visible = op.layer.visible,
                    Err(e) => {
                        warn!(layer_id = %op.engine_id, error = %e, "failed to set visibility");
                    }
                }
            } else {
                record.visible = op.layer.visible;
            }
        }

        self.frame_camera(&plan.bounds);
    }

    /// Dispose the engine instance and return to `Uninitialized`.
    ///
    /// Valid from any state.
    pub fn teardown(&mut self) {
        self.engine.destroy();
        self.records.clear();
        self.style_switching = false;
        self.state = LifecycleState::Uninitialized;
        info!("map engine torn down");
    }

    /// Remove an overlay's layer and source together; removing one
    /// without the other is invalid engine state.
    fn remove_overlay(&mut self, id: &EngineLayerId) {
        let had_layer = self
            .records
            .get(id)
            .map_or(true, |record| record.has_layer);
        if had_layer {
            if let Err(e) = self.engine.remove_layer(id) {
                debug!(layer_id = %id, error = %e, "remove_layer on stale id");
            }
        }
        if let Err(e) = self.engine.remove_source(id) {
            debug!(layer_id = %id, error = %e, "remove_source on stale id");
        }
        self.records.remove(id);
    }

    /// Overlay ids currently in the engine: the bookkeeping keys, unioned
    /// with overlay-prefixed ids from the engine's own layer list. The
    /// sweep catches overlays that drifted from bookkeeping (e.g. a layer
    /// surviving from before this controller owned the instance).
    fn engine_overlay_ids(&self) -> std::collections::BTreeSet<EngineLayerId> {
        let mut ids: std::collections::BTreeSet<EngineLayerId> =
            self.records.keys().cloned().collect();
        for engine_id in self.engine.list_layer_ids() {
            if let Some(id) = EngineLayerId::from_engine_id(&engine_id) {
                ids.insert(id);
            }
        }
        ids
    }

    fn frame_camera(&self, bounds: &crate::geometry::LngLatBounds) {
        if bounds.is_empty() {
            self.engine.ease_to_default(
                self.camera.default_zoom,
                self.camera.reset_duration_ms,
                linear,
            );
        } else {
            self.engine
                .fit_bounds(bounds, self.camera.fit_padding_px, self.camera.fit_duration_ms);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Style-transition support (used by crate::transition)
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn engine(&self) -> &Arc<dyn MapEngine> {
        &self.engine
    }

    pub(crate) fn set_style_switching(&mut self, switching: bool) {
        self.style_switching = switching;
    }

    pub(crate) fn records(&self) -> &BTreeMap<EngineLayerId, LayerRecord> {
        &self.records
    }

    pub(crate) fn clear_records(&mut self) {
        self.records.clear();
    }

    pub(crate) fn insert_record(&mut self, id: EngineLayerId, record: LayerRecord) {
        self.records.insert(id, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CameraCall, EngineOp, HeadlessEngine};
    use geojson::{Feature, FeatureCollection, Geometry, Value};

    fn point_collection(lon: f64, lat: f64) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        }
    }

    fn empty_collection() -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: vec![],
            foreign_members: None,
        }
    }

    async fn ready_controller() -> (Arc<HeadlessEngine>, OverlayController) {
        let engine = HeadlessEngine::new("streets-v11");
        let mut controller =
            OverlayController::new(engine.clone(), CameraConfig::default());
        controller.initialize().await.unwrap();
        (engine, controller)
    }

    #[tokio::test]
    async fn test_initialize_reaches_ready() {
        let (_engine, controller) = ready_controller().await;
        assert_eq!(controller.state(), LifecycleState::Ready);
    }

    #[tokio::test]
    async fn test_initialize_is_reentrant() {
        let (_engine, mut controller) = ready_controller().await;
        controller.initialize().await.unwrap();
        assert_eq!(controller.state(), LifecycleState::Ready);
    }

    #[test]
    fn test_reconcile_before_ready_is_dropped() {
        let engine = HeadlessEngine::new("streets-v11");
        let mut controller =
            OverlayController::new(engine.clone(), CameraConfig::default());

        controller.reconcile(&[LayerSpec::new("a", point_collection(1.0, 2.0))]);

        assert!(engine.ops().is_empty(), "no engine mutation before ready");
        assert_eq!(controller.overlay_count(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_adds_layer_and_frames_bounds() {
        let (engine, mut controller) = ready_controller().await;
        let id = EngineLayerId::for_layer("a");

        controller.reconcile(&[LayerSpec::new("a", point_collection(10.0, 20.0))]);

        assert_eq!(engine.source_ids(), vec![id.as_str().to_string()]);
        assert_eq!(engine.layer_visibility(&id), Some(true));
        match engine.camera() {
            Some(CameraCall::FitBounds {
                bounds,
                padding_px,
                duration_ms,
            }) => {
                assert_eq!(bounds.corners(), Some(((10.0, 20.0), (10.0, 20.0))));
                assert_eq!(padding_px, 20.0);
                assert_eq!(duration_ms, 1000);
            }
            other => panic!("expected fit_bounds, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invisible_layer_takes_default_zoom_path() {
        let (engine, mut controller) = ready_controller().await;

        controller.reconcile(&[
            LayerSpec::new("a", point_collection(10.0, 20.0)).with_visibility(false)
        ]);

        match engine.camera() {
            Some(CameraCall::EaseToDefault { zoom, duration_ms }) => {
                assert_eq!(zoom, 1.0);
                assert_eq!(duration_ms, 1000);
            }
            other => panic!("expected ease_to_default, got {:?}", other),
        }
        let id = EngineLayerId::for_layer("a");
        assert_eq!(engine.layer_visibility(&id), Some(false));
    }

    #[tokio::test]
    async fn test_stale_layers_removed_before_adds() {
        let (engine, mut controller) = ready_controller().await;

        controller.reconcile(&[
            LayerSpec::new("a", point_collection(0.0, 0.0)),
            LayerSpec::new("b", point_collection(1.0, 1.0)),
        ]);
        engine.clear_ops();

        controller.reconcile(&[LayerSpec::new("b", point_collection(2.0, 2.0))]);

        let a = EngineLayerId::for_layer("a");
        let ops = engine.ops();
        assert!(ops.contains(&EngineOp::RemoveLayer(a.to_string())));
        assert!(ops.contains(&EngineOp::RemoveSource(a.to_string())));
        assert_eq!(controller.overlay_count(), 1);

        // Removals precede the update of the surviving layer.
        let remove_pos = ops
            .iter()
            .position(|op| matches!(op, EngineOp::RemoveSource(_)))
            .unwrap();
        let update_pos = ops
            .iter()
            .position(|op| matches!(op, EngineOp::UpdateSource(_)))
            .unwrap();
        assert!(remove_pos < update_pos);
    }

    #[tokio::test]
    async fn test_existing_layer_updated_not_readded() {
        let (engine, mut controller) = ready_controller().await;
        let desired = vec![LayerSpec::new("a", point_collection(0.0, 0.0))];

        controller.reconcile(&desired);
        engine.clear_ops();
        controller.reconcile(&[LayerSpec::new("a", point_collection(5.0, 5.0))]);

        let ops = engine.ops();
        assert!(
            !ops.iter().any(|op| matches!(op, EngineOp::AddSource(_))),
            "second pass must not re-add"
        );
        assert!(ops
            .iter()
            .any(|op| matches!(op, EngineOp::UpdateSource(_))));

        let id = EngineLayerId::for_layer("a");
        let data = engine.source_data(&id).unwrap();
        assert_eq!(
            data.features[0].geometry.as_ref().unwrap().value,
            Value::Point(vec![5.0, 5.0])
        );
    }

    #[tokio::test]
    async fn test_visibility_change_applied_with_unchanged_data() {
        let (engine, mut controller) = ready_controller().await;
        let data = point_collection(0.0, 0.0);

        controller.reconcile(&[LayerSpec::new("a", data.clone())]);
        controller.reconcile(&[LayerSpec::new("a", data).with_visibility(false)]);

        let id = EngineLayerId::for_layer("a");
        assert_eq!(engine.layer_visibility(&id), Some(false));
    }

    #[tokio::test]
    async fn test_malformed_layer_isolated_from_siblings() {
        let (engine, mut controller) = ready_controller().await;

        controller.reconcile(&[
            LayerSpec::new("bad", empty_collection()),
            LayerSpec::new("good", point_collection(7.0, 8.0)),
        ]);

        let bad = EngineLayerId::for_layer("bad");
        let good = EngineLayerId::for_layer("good");
        // Malformed layer exists as a source without a layer object.
        assert!(engine.source_data(&bad).is_some());
        assert_eq!(engine.render_spec(&bad), None);
        // The valid sibling reconciled normally and drives the camera.
        assert_eq!(engine.layer_visibility(&good), Some(true));
        match engine.camera() {
            Some(CameraCall::FitBounds { bounds, .. }) => {
                assert_eq!(bounds.corners(), Some(((7.0, 8.0), (7.0, 8.0))));
            }
            other => panic!("expected fit_bounds, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sweep_removes_untracked_overlay() {
        let (engine, mut controller) = ready_controller().await;

        // An overlay-prefixed layer the controller never created, e.g.
        // left over from a previous owner of the instance.
        let stray = EngineLayerId::for_layer("stray");
        engine.add_source(&stray, &empty_collection()).unwrap();
        engine
            .add_layer(&stray, &stray, crate::style::style_for(crate::geometry::GeometryClass::Point))
            .unwrap();

        controller.reconcile(&[LayerSpec::new("a", point_collection(0.0, 0.0))]);

        assert!(engine.source_data(&stray).is_none(), "stray overlay swept");
        assert_eq!(controller.overlay_count(), 1);
    }

    #[tokio::test]
    async fn test_teardown_returns_to_uninitialized() {
        let (engine, mut controller) = ready_controller().await;
        controller.reconcile(&[LayerSpec::new("a", point_collection(0.0, 0.0))]);

        controller.teardown();

        assert_eq!(controller.state(), LifecycleState::Uninitialized);
        assert_eq!(controller.overlay_count(), 0);
        assert!(engine.source_ids().is_empty());
    }
}
