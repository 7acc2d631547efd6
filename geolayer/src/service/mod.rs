//! Overlay service: the caller-facing surface.
//!
//! One driver task owns the [`OverlayController`], so every engine
//! mutation — reconciliation passes and style transitions alike — is
//! serialized onto one instance. Callers hold a cloneable
//! [`OverlayHandle`] exposing exactly the two public operations of the
//! system: `set_desired_layers` and `set_theme`.
//!
//! # Ordering
//!
//! Commands apply in arrival order, with one exception: while a style
//! transition is awaiting the engine's style-data signal, incoming
//! desired lists supersede each other and only the most recent survives,
//! to be reconciled immediately after replay. Superseding rather than
//! queuing bounds memory; a dropped list is not lost data, since the
//! caller's next update carries the then-current state.
//!
//! # Shutdown
//!
//! Dropping every handle (or calling [`OverlayService::shutdown`]) closes
//! the command channel; the driver drains what was already queued, tears
//! the engine down, and exits. [`OverlayService::abort`] cancels
//! immediately without draining.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::CameraConfig;
use crate::controller::OverlayController;
use crate::engine::MapEngine;
use crate::layer::LayerSpec;
use crate::transition::{self, BeginOutcome};

/// Capacity of the command channel. Commands are coarse (whole desired
/// lists), so a small buffer suffices; senders await when it fills.
const COMMAND_BUFFER: usize = 16;

/// Errors surfaced to handle callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The driver task has exited and no longer accepts commands.
    #[error("overlay service is shut down")]
    ShutDown,
}

enum Command {
    SetDesiredLayers(Vec<LayerSpec>),
    SetTheme(String),
}

/// Cloneable handle to a running overlay service.
#[derive(Clone)]
pub struct OverlayHandle {
    tx: mpsc::Sender<Command>,
}

impl OverlayHandle {
    /// Replace the desired overlay set; triggers a reconciliation pass.
    pub async fn set_desired_layers(&self, layers: Vec<LayerSpec>) -> Result<(), ServiceError> {
        self.tx
            .send(Command::SetDesiredLayers(layers))
            .await
            .map_err(|_| ServiceError::ShutDown)
    }

    /// Switch the basemap style; overlays are replayed after the swap.
    pub async fn set_theme(&self, style_id: impl Into<String>) -> Result<(), ServiceError> {
        self.tx
            .send(Command::SetTheme(style_id.into()))
            .await
            .map_err(|_| ServiceError::ShutDown)
    }
}

/// Owns the driver task of one engine instance.
pub struct OverlayService {
    tx: Option<mpsc::Sender<Command>>,
    cancellation: CancellationToken,
    task: JoinHandle<()>,
}

impl OverlayService {
    /// Spawn the driver task for `engine` on the current tokio runtime.
    ///
    /// The driver awaits engine readiness before processing commands;
    /// requests arriving earlier simply wait in the channel.
    pub fn spawn(engine: Arc<dyn MapEngine>, camera: CameraConfig) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let cancellation = CancellationToken::new();
        let controller = OverlayController::new(engine, camera);

        let task_cancellation = cancellation.clone();
        let task = tokio::spawn(async move {
            drive(controller, rx, task_cancellation).await;
        });

        Self {
            tx: Some(tx),
            cancellation,
            task,
        }
    }

    /// A new handle onto the service.
    pub fn handle(&self) -> OverlayHandle {
        OverlayHandle {
            tx: self
                .tx
                .as_ref()
                .expect("sender lives until shutdown consumes the service")
                .clone(),
        }
    }

    /// Graceful shutdown: close the channel, let the driver drain queued
    /// commands, tear down the engine, and exit.
    ///
    /// Handles still held by other tasks keep the channel open; the
    /// driver exits once the last one is dropped.
    pub async fn shutdown(mut self) {
        self.tx.take();
        let _ = (&mut self.task).await;
        info!("overlay service shut down");
    }

    /// Abort without draining queued commands.
    pub async fn abort(mut self) {
        self.cancellation.cancel();
        self.tx.take();
        let _ = (&mut self.task).await;
        info!("overlay service aborted");
    }
}

async fn drive(
    mut controller: OverlayController,
    mut rx: mpsc::Receiver<Command>,
    cancellation: CancellationToken,
) {
    if let Err(e) = controller.initialize().await {
        error!(error = %e, "engine failed to become ready, overlay service inert");
        // Drain and drop commands until shutdown; the silent-drop policy
        // for a not-ready engine applies to everything that follows.
        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                cmd = rx.recv() => if cmd.is_none() { break },
            }
        }
        controller.teardown();
        return;
    }

    loop {
        tokio::select! {
            biased;

            _ = cancellation.cancelled() => {
                debug!("overlay service cancelled");
                break;
            }

            cmd = rx.recv() => match cmd {
                None => break,
                Some(Command::SetDesiredLayers(layers)) => {
                    controller.reconcile(&layers);
                }
                Some(Command::SetTheme(style_id)) => {
                    run_transitions(&mut controller, &mut rx, &cancellation, style_id).await;
                }
            }
        }
    }

    controller.teardown();
}

/// Run a style transition, superseding commands that arrive while the
/// engine swaps styles, then apply whatever superseded state remains.
///
/// A theme request arriving mid-transition replaces any earlier pending
/// theme and runs after the current transition (and after the pending
/// desired list, so the layers it replays are current).
async fn run_transitions(
    controller: &mut OverlayController,
    rx: &mut mpsc::Receiver<Command>,
    cancellation: &CancellationToken,
    style_id: String,
) {
    let mut next_theme = Some(style_id);

    while let Some(style_id) = next_theme.take() {
        let snapshot = match transition::begin(controller, &style_id) {
            Ok(BeginOutcome::Started(snapshot)) => snapshot,
            Ok(BeginOutcome::NotStarted) => return,
            Err(_) => return, // logged by begin; fatal to this transition only
        };

        let engine = controller.engine().clone();
        let mut style_ready = engine.wait_style_data();
        let mut pending_layers: Option<Vec<LayerSpec>> = None;

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => {
                    transition::abort(controller, snapshot);
                    return;
                }

                result = &mut style_ready => {
                    match result {
                        Ok(()) => transition::replay(controller, snapshot),
                        Err(e) => {
                            debug!(error = %e, "style-data wait failed");
                            transition::abort(controller, snapshot);
                        }
                    }
                    break;
                }

                cmd = rx.recv() => match cmd {
                    // Latest state wins while the swap is in flight.
                    Some(Command::SetDesiredLayers(layers)) => {
                        debug!("desired list superseded mid style switch");
                        pending_layers = Some(layers);
                    }
                    Some(Command::SetTheme(style_id)) => {
                        debug!(style_id, "theme superseded mid style switch");
                        next_theme = Some(style_id);
                    }
                    None => {
                        // All handles dropped; finish the swap before
                        // exiting so the engine is not left mid-transition.
                        match (&mut style_ready).await {
                            Ok(()) => transition::replay(controller, snapshot),
                            Err(_) => transition::abort(controller, snapshot),
                        }
                        break;
                    }
                }
            }
        }

        if let Some(layers) = pending_layers.take() {
            controller.reconcile(&layers);
        }
    }
}
