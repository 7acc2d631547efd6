//! GeoLayer - GeoJSON overlay reconciliation for styled basemaps
//!
//! This library keeps a rendering engine's overlay layers consistent with
//! an externally supplied desired-state list, and survives basemap style
//! changes that destroy all non-base rendering state.
//!
//! # Architecture
//!
//! ```text
//! caller ──► OverlayService ──► OverlayController ──► MapEngine
//!            (serializes        (lifecycle, plan       (external
//!             commands)          application,           renderer)
//!                                bookkeeping)
//!                │                    │
//!                └── transition ──────┘
//!                    (snapshot + replay across style swaps)
//!
//! reconcile::plan  — pure diff of desired vs. engine overlay state
//! geometry         — classification + bounding-box accumulation
//! style            — geometry class → render primitive + paint
//! ```
//!
//! # Example
//!
//! ```ignore
//! use geolayer::config::CameraConfig;
//! use geolayer::engine::HeadlessEngine;
//! use geolayer::layer::LayerSpec;
//! use geolayer::service::OverlayService;
//!
//! let engine = HeadlessEngine::new("streets-v11");
//! let service = OverlayService::spawn(engine.clone(), CameraConfig::default());
//! let handle = service.handle();
//!
//! handle.set_desired_layers(vec![LayerSpec::new("rivers", rivers_fc)]).await?;
//! handle.set_theme("dark-v11").await?;
//!
//! service.shutdown().await;
//! ```

pub mod config;
pub mod controller;
pub mod engine;
pub mod geometry;
pub mod layer;
pub mod logging;
pub mod reconcile;
pub mod service;
pub mod style;
pub mod transition;

pub use config::{CameraConfig, MapConfig, DEFAULT_STYLE};
pub use controller::{LifecycleState, OverlayController};
pub use engine::{EngineError, HeadlessEngine, MapEngine};
pub use geometry::{GeometryClass, LngLatBounds};
pub use layer::{EngineLayerId, LayerSpec};
pub use reconcile::{plan, ReconciliationPlan};
pub use service::{OverlayHandle, OverlayService, ServiceError};
pub use style::{style_for, RenderSpec};
