//! Map and camera configuration.

/// Default basemap style id used when the caller does not pick one.
pub const DEFAULT_STYLE: &str = "streets-v11";

/// Camera framing parameters applied after each reconciliation pass.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Padding in pixels around the fitted bounds.
    pub fit_padding_px: f64,

    /// Animation duration of a fit-to-bounds transition in milliseconds.
    pub fit_duration_ms: u64,

    /// Zoom level to ease back to when no visible layer has an extent.
    pub default_zoom: f64,

    /// Animation duration of the reset transition in milliseconds.
    pub reset_duration_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fit_padding_px: 20.0,
            fit_duration_ms: 1000,
            default_zoom: 1.0,
            reset_duration_ms: 1000,
        }
    }
}

impl CameraConfig {
    /// Set the fit padding.
    pub fn with_fit_padding_px(mut self, padding: f64) -> Self {
        self.fit_padding_px = padding;
        self
    }

    /// Set the fit animation duration.
    pub fn with_fit_duration_ms(mut self, duration: u64) -> Self {
        self.fit_duration_ms = duration;
        self
    }

    /// Set the default zoom used when there is nothing to frame.
    pub fn with_default_zoom(mut self, zoom: f64) -> Self {
        self.default_zoom = zoom;
        self
    }
}

/// Top-level configuration for driving one map instance.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Style id the engine is constructed with.
    pub initial_style: String,

    /// Camera framing parameters.
    pub camera: CameraConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_style: DEFAULT_STYLE.to_string(),
            camera: CameraConfig::default(),
        }
    }
}

impl MapConfig {
    /// Set the initial style id.
    pub fn with_initial_style(mut self, style: impl Into<String>) -> Self {
        self.initial_style = style.into();
        self
    }

    /// Set the camera configuration.
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }
}
