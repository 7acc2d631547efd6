//! Style-transition recovery protocol.
//!
//! A basemap style change destroys every non-base source and layer in the
//! engine, so the overlay set must be snapshotted before the swap and
//! replayed after the engine signals the new style's data is ready. The
//! snapshot is taken from the controller's own bookkeeping — never re-read
//! from the engine, which is about to discard that state — and replay goes
//! through the same classify-and-style path as a fresh add, because the
//! new style may define conflicting layer ids and the prior render
//! primitive cannot be trusted to carry over.
//!
//! The protocol is split into [`begin`], the style-data wait, and
//! [`replay`]/[`abort`] so the service actor can keep receiving commands
//! while the swap is in flight. [`switch_style`] composes the pieces for
//! direct use.

use tracing::{debug, info, warn};

use crate::controller::{LayerRecord, OverlayController};
use crate::engine::EngineError;
use crate::geometry;
use crate::layer::EngineLayerId;
use crate::style::style_for;

/// Overlay state captured at the moment a transition begins.
///
/// Owned by the transition for its duration; discarded once replay
/// completes.
#[derive(Debug)]
pub struct OverlaySnapshot {
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug)]
struct SnapshotEntry {
    id: EngineLayerId,
    record: LayerRecord,
}

impl OverlaySnapshot {
    /// Number of overlays captured.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn capture(controller: &OverlayController) -> Self {
        Self {
            entries: controller
                .records()
                .iter()
                .map(|(id, record)| SnapshotEntry {
                    id: id.clone(),
                    record: record.clone(),
                })
                .collect(),
        }
    }
}

/// Outcome of [`begin`].
#[derive(Debug)]
pub enum BeginOutcome {
    /// The controller is not ready, or a transition is already in flight;
    /// the request was dropped.
    NotStarted,
    /// The style change was issued; await the engine's style-data signal,
    /// then call [`replay`] (or [`abort`] if the wait fails).
    Started(OverlaySnapshot),
}

/// Snapshot the overlay set and issue the style change.
///
/// On engine rejection of the style id the transition is aborted before it
/// starts: the switching flag is cleared, the snapshot is discarded, and
/// the engine's overlay state — which the rejected call did not touch —
/// stays consistent with bookkeeping.
pub fn begin(
    controller: &mut OverlayController,
    style_id: &str,
) -> Result<BeginOutcome, EngineError> {
    if !controller.is_ready() {
        debug!(style_id, "dropping style switch, engine not ready");
        return Ok(BeginOutcome::NotStarted);
    }
    if controller.is_style_switching() {
        debug!(style_id, "style switch already in flight");
        return Ok(BeginOutcome::NotStarted);
    }

    let snapshot = OverlaySnapshot::capture(controller);
    controller.set_style_switching(true);

    if let Err(e) = controller.engine().set_style(style_id) {
        controller.set_style_switching(false);
        warn!(style_id, error = %e, "engine rejected style, transition aborted");
        return Err(e);
    }

    info!(style_id, overlays = snapshot.len(), "style switch issued");
    Ok(BeginOutcome::Started(snapshot))
}

/// Re-create every snapshotted overlay after the style-data signal.
///
/// Each entry goes through the fresh-add path: classify, look up the
/// render spec, create source and layer, then restore visibility. A
/// failure on one entry is isolated and the rest still replay.
pub fn replay(controller: &mut OverlayController, snapshot: OverlaySnapshot) {
    controller.clear_records();

    for entry in snapshot.entries {
        let engine = controller.engine().clone();
        if let Err(e) = engine.add_source(&entry.id, &entry.record.data) {
            warn!(layer_id = %entry.id, error = %e, "replay: failed to add source");
            continue;
        }

        let mut has_layer = false;
        if let Some(spec) = geometry::classify(&entry.record.data).map(style_for) {
            match engine.add_layer(&entry.id, &entry.id, spec) {
                Ok(()) => {
                    has_layer = true;
                    if let Err(e) =
                        engine.set_layer_visibility(&entry.id, entry.record.visible)
                    {
                        warn!(layer_id = %entry.id, error = %e, "replay: failed to set visibility");
                    }
                }
                Err(e) => {
                    warn!(layer_id = %entry.id, error = %e, "replay: failed to add layer");
                }
            }
        }

        controller.insert_record(
            entry.id,
            LayerRecord {
                data: entry.record.data,
                visible: entry.record.visible,
                has_layer,
            },
        );
    }

    controller.set_style_switching(false);
    info!(overlays = controller.overlay_count(), "style transition replay complete");
}

/// Abandon a transition whose style-data wait failed.
///
/// The engine accepted the style change, so its overlay state was wiped;
/// bookkeeping is cleared to match and the snapshot is discarded. No
/// rollback to the prior style is attempted — the engine exposes no
/// pre-swap state to restore to.
pub fn abort(controller: &mut OverlayController, snapshot: OverlaySnapshot) {
    warn!(
        overlays = snapshot.len(),
        "style transition abandoned, overlay snapshot discarded"
    );
    drop(snapshot);
    controller.clear_records();
    controller.set_style_switching(false);
}

/// Run a complete style transition: snapshot, swap, wait, replay.
///
/// Returns the engine error when the style id is rejected or the
/// style-data wait fails; either way the transition is fatal only to
/// itself and the controller accepts new requests afterwards.
pub async fn switch_style(
    controller: &mut OverlayController,
    style_id: &str,
) -> Result<(), EngineError> {
    let snapshot = match begin(controller, style_id)? {
        BeginOutcome::NotStarted => return Ok(()),
        BeginOutcome::Started(snapshot) => snapshot,
    };

    let wait = {
        let engine = controller.engine().clone();
        async move { engine.wait_style_data().await }
    };
    match wait.await {
        Ok(()) => {
            replay(controller, snapshot);
            Ok(())
        }
        Err(e) => {
            abort(controller, snapshot);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::engine::{EngineOp, HeadlessEngine};
    use crate::layer::LayerSpec;
    use geojson::{Feature, FeatureCollection, Geometry, Value};
    use std::sync::Arc;

    fn polygon_collection() -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![vec![
                    vec![0.0, 0.0],
                    vec![1.0, 0.0],
                    vec![1.0, 1.0],
                    vec![0.0, 0.0],
                ]]))),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        }
    }

    async fn controller_with_layer(
    ) -> (Arc<HeadlessEngine>, OverlayController, EngineLayerId) {
        let engine = HeadlessEngine::new("streets-v11");
        let mut controller =
            OverlayController::new(engine.clone(), CameraConfig::default());
        controller.initialize().await.unwrap();
        controller.reconcile(&[LayerSpec::new("x", polygon_collection())]);
        (engine, controller, EngineLayerId::for_layer("x"))
    }

    #[tokio::test]
    async fn test_replay_restores_overlay_via_fresh_adds() {
        let (engine, mut controller, id) = controller_with_layer().await;
        let original = engine.source_data(&id).unwrap();
        engine.clear_ops();

        switch_style(&mut controller, "dark-v11").await.unwrap();

        assert_eq!(engine.style(), "dark-v11");
        assert_eq!(engine.source_data(&id), Some(original));
        assert_eq!(engine.layer_visibility(&id), Some(true));
        assert!(!controller.is_style_switching());

        // Replay must go through the add path; the old layer is gone and
        // an update would have nothing to update.
        let ops = engine.ops();
        assert!(ops
            .iter()
            .any(|op| matches!(op, EngineOp::AddSource(s) if s == id.as_str())));
        assert!(!ops
            .iter()
            .any(|op| matches!(op, EngineOp::UpdateSource(_))));
    }

    #[tokio::test]
    async fn test_replay_restores_visibility_from_snapshot() {
        let engine = HeadlessEngine::new("streets-v11");
        let mut controller =
            OverlayController::new(engine.clone(), CameraConfig::default());
        controller.initialize().await.unwrap();
        controller
            .reconcile(&[LayerSpec::new("x", polygon_collection()).with_visibility(false)]);

        switch_style(&mut controller, "dark-v11").await.unwrap();

        let id = EngineLayerId::for_layer("x");
        assert_eq!(engine.layer_visibility(&id), Some(false));
    }

    #[tokio::test]
    async fn test_rejected_style_aborts_transition_only() {
        let (engine, mut controller, id) = controller_with_layer().await;

        let err = switch_style(&mut controller, "").await.unwrap_err();

        assert!(matches!(err, EngineError::InvalidStyle(_)));
        assert!(!controller.is_style_switching());
        // The rejected call touched nothing; overlay and bookkeeping agree.
        assert_eq!(engine.style(), "streets-v11");
        assert!(engine.source_data(&id).is_some());
        assert_eq!(controller.overlay_count(), 1);

        // The controller still accepts subsequent requests.
        switch_style(&mut controller, "dark-v11").await.unwrap();
        assert_eq!(engine.style(), "dark-v11");
    }

    #[tokio::test]
    async fn test_switch_before_ready_is_dropped() {
        let engine = HeadlessEngine::new("streets-v11");
        let mut controller =
            OverlayController::new(engine.clone(), CameraConfig::default());

        switch_style(&mut controller, "dark-v11").await.unwrap();

        assert_eq!(engine.style(), "streets-v11", "request dropped before ready");
    }

    #[tokio::test]
    async fn test_replay_preserves_bookkeeping_for_next_pass() {
        let (engine, mut controller, id) = controller_with_layer().await;
        switch_style(&mut controller, "dark-v11").await.unwrap();
        engine.clear_ops();

        // A follow-up pass with the same desired list sees the replayed
        // overlay as existing and only updates data.
        controller.reconcile(&[LayerSpec::new("x", polygon_collection())]);
        let ops = engine.ops();
        assert!(!ops
            .iter()
            .any(|op| matches!(op, EngineOp::AddSource(s) if s == id.as_str())));
        assert!(ops
            .iter()
            .any(|op| matches!(op, EngineOp::UpdateSource(s) if s == id.as_str())));
    }
}
