//! Render command: drive a reconciliation pass against the headless engine.

use std::path::PathBuf;

use clap::Args;

use geolayer::engine::CameraCall;
use geolayer::{CameraConfig, HeadlessEngine, LayerSpec, OverlayService, DEFAULT_STYLE};

use crate::error::CliError;

use super::{layer_id_for_path, load_feature_collection};

/// Arguments for the render command.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// GeoJSON files to overlay, one layer per file (layer id = file stem)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Layer ids to add as hidden (still created, excluded from framing)
    #[arg(long)]
    pub hidden: Vec<String>,

    /// Basemap style to start from
    #[arg(long, default_value = DEFAULT_STYLE)]
    pub style: String,

    /// Switch to this theme after the initial pass, exercising the
    /// snapshot-and-replay transition
    #[arg(long)]
    pub theme: Option<String>,
}

/// Run the render command.
pub async fn run(args: RenderArgs) -> Result<(), CliError> {
    let mut layers = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let id = layer_id_for_path(path);
        let data = load_feature_collection(path)?;
        let visible = !args.hidden.contains(&id);
        layers.push(LayerSpec::new(id, data).with_visibility(visible));
    }

    let engine = HeadlessEngine::new(args.style.as_str());
    let service = OverlayService::spawn(engine.clone(), CameraConfig::default());
    let handle = service.handle();

    handle.set_desired_layers(layers.clone()).await?;
    if let Some(theme) = &args.theme {
        handle.set_theme(theme.clone()).await?;
    }
    drop(handle);

    // Shutdown drains the queued commands; teardown clears live engine
    // state, so the summary below reads the op log.
    service.shutdown().await;

    println!("Style: {}", engine.style());
    println!("Layers:");
    for layer in &layers {
        let id = layer.engine_id();
        let visibility = if layer.visible { "visible" } else { "hidden" };
        match geolayer::geometry::classify(&layer.data) {
            Some(class) => println!(
                "  {} ({}, {}, {})",
                id,
                class,
                geolayer::style_for(class),
                visibility
            ),
            None => println!("  {} (no recognizable geometry, source only)", id),
        }
    }

    match last_camera(&engine) {
        Some(CameraCall::FitBounds {
            bounds,
            padding_px,
            duration_ms,
        }) => println!(
            "Camera: fit {} (padding {}px, {}ms)",
            bounds, padding_px, duration_ms
        ),
        Some(CameraCall::EaseToDefault { zoom, duration_ms }) => {
            println!("Camera: reset to zoom {} ({}ms)", zoom, duration_ms)
        }
        None => println!("Camera: untouched"),
    }

    Ok(())
}

/// The last camera request recorded before teardown cleared live state.
fn last_camera(engine: &HeadlessEngine) -> Option<CameraCall> {
    use geolayer::engine::EngineOp;

    engine.ops().iter().rev().find_map(|op| match op {
        EngineOp::FitBounds(bounds) => Some(CameraCall::FitBounds {
            bounds: *bounds,
            padding_px: CameraConfig::default().fit_padding_px,
            duration_ms: CameraConfig::default().fit_duration_ms,
        }),
        EngineOp::EaseToDefault(zoom) => Some(CameraCall::EaseToDefault {
            zoom: *zoom,
            duration_ms: CameraConfig::default().reset_duration_ms,
        }),
        _ => None,
    })
}
