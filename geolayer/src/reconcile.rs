//! Reconciliation planning: desired layers vs. engine-visible overlays.
//!
//! [`plan`] is a pure function from a desired [`LayerSpec`] list and the
//! set of overlay ids currently in the engine to a minimal mutation plan:
//! stale overlays to remove, ordered add/update operations, and the
//! combined bounding box of the visible layers for camera framing.
//! Applying the plan against an engine is the controller's job.

use std::collections::BTreeSet;

use crate::geometry::{self, LngLatBounds};
use crate::layer::{EngineLayerId, LayerSpec};
use crate::style::{style_for, RenderSpec};

/// Mutation scheduled for one desired layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerAction {
    /// Create source and layer. `None` when the collection has no
    /// recognizable geometry: the source is still created (so a later data
    /// update can populate it) but no layer object exists to render it.
    Add(Option<RenderSpec>),

    /// Replace the source's feature collection in place. The render
    /// primitive and paint are never re-derived for an existing layer,
    /// even if the new data implies a different geometry class; changing
    /// class for a live id requires removal and re-add by the caller.
    UpdateData,
}

/// One desired layer with its derived engine id and scheduled action.
#[derive(Debug)]
pub struct PlannedOp<'a> {
    /// Engine id the layer reconciles under.
    pub engine_id: EngineLayerId,
    /// The desired layer, borrowed from the caller's list.
    pub layer: &'a LayerSpec,
    /// What to do with it.
    pub action: LayerAction,
}

/// Result of diffing a desired list against engine state.
///
/// Ephemeral: computed and consumed within a single reconciliation pass.
/// Application order is removals, then `ops` in desired-list order, then
/// visibility, then camera framing.
#[derive(Debug)]
pub struct ReconciliationPlan<'a> {
    /// Overlay ids present in the engine but absent from the desired list.
    /// Layer and source are always removed together.
    pub to_remove: BTreeSet<EngineLayerId>,

    /// Add/update operations, ordered as the desired list.
    pub ops: Vec<PlannedOp<'a>>,

    /// Combined bounds of visible desired layers. Empty when nothing
    /// visible has coordinates, which selects the default-zoom camera
    /// path.
    pub bounds: LngLatBounds,
}

impl ReconciliationPlan<'_> {
    /// True if the plan would not change engine contents (no removals and
    /// no adds; data updates and visibility are still applied every pass).
    pub fn is_structurally_empty(&self) -> bool {
        self.to_remove.is_empty()
            && self
                .ops
                .iter()
                .all(|op| matches!(op.action, LayerAction::UpdateData))
    }
}

/// Diff `desired` against the overlay ids currently in the engine.
///
/// Every desired layer produces exactly one op: an add (classify, then
/// look up the render spec) when its engine id is absent, or a data-only
/// update when present. Bounds are folded only from layers marked
/// visible; an invisible layer keeps its engine objects but contributes
/// nothing to framing. A malformed collection yields a source-only add
/// and no bounds contribution — it never aborts the pass for other
/// layers.
pub fn plan<'a>(
    desired: &'a [LayerSpec],
    engine_overlay_ids: &BTreeSet<EngineLayerId>,
) -> ReconciliationPlan<'a> {
    let desired_ids: BTreeSet<EngineLayerId> =
        desired.iter().map(|layer| layer.engine_id()).collect();

    let to_remove: BTreeSet<EngineLayerId> = engine_overlay_ids
        .difference(&desired_ids)
        .cloned()
        .collect();

    let mut bounds = LngLatBounds::new();
    let mut ops = Vec::with_capacity(desired.len());

    for layer in desired {
        let engine_id = layer.engine_id();
        let action = if engine_overlay_ids.contains(&engine_id) {
            LayerAction::UpdateData
        } else {
            LayerAction::Add(geometry::classify(&layer.data).map(style_for))
        };

        if layer.visible {
            geometry::accumulate(&mut bounds, &layer.data);
        }

        ops.push(PlannedOp {
            engine_id,
            layer,
            action,
        });
    }

    ReconciliationPlan {
        to_remove,
        ops,
        bounds,
    }
}
