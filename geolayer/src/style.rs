//! Default styling rules for overlay layers.
//!
//! Maps a [`GeometryClass`] to the render primitive and paint parameters
//! the engine should use for it. Both the initial-add path and the
//! post-style-transition replay path consult this table, so a paint
//! default is defined in exactly one place.

use std::fmt;

use crate::geometry::GeometryClass;

/// Render primitive plus its default paint parameters.
///
/// The variants mirror the engine's primitive vocabulary: circles for
/// points, lines for linework, fills for areas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderSpec {
    /// Circle markers for point geometry.
    Circle {
        /// CSS hex color of the circle.
        color: &'static str,
        /// Circle radius in pixels.
        radius: f64,
    },
    /// Stroked lines for linework.
    Line {
        /// CSS hex color of the stroke.
        color: &'static str,
        /// Stroke width in pixels.
        width: f64,
    },
    /// Filled areas for polygons.
    Fill {
        /// CSS hex color of the fill.
        color: &'static str,
        /// Fill opacity in [0, 1].
        opacity: f64,
    },
}

impl RenderSpec {
    /// Engine primitive name ("circle", "line", "fill").
    pub fn primitive(&self) -> &'static str {
        match self {
            RenderSpec::Circle { .. } => "circle",
            RenderSpec::Line { .. } => "line",
            RenderSpec::Fill { .. } => "fill",
        }
    }
}

impl fmt::Display for RenderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderSpec::Circle { color, radius } => {
                write!(f, "circle(color={}, radius={})", color, radius)
            }
            RenderSpec::Line { color, width } => {
                write!(f, "line(color={}, width={})", color, width)
            }
            RenderSpec::Fill { color, opacity } => {
                write!(f, "fill(color={}, opacity={})", color, opacity)
            }
        }
    }
}

/// Look up the default render spec for a geometry class.
///
/// Total over the three classes; there is no fallback arm because the
/// classifier never produces anything else.
pub fn style_for(class: GeometryClass) -> RenderSpec {
    match class {
        GeometryClass::Point => RenderSpec::Circle {
            color: "#FF0000",
            radius: 5.0,
        },
        GeometryClass::Line => RenderSpec::Line {
            color: "#0000FF",
            width: 2.0,
        },
        GeometryClass::Polygon => RenderSpec::Fill {
            color: "#00FF00",
            opacity: 0.5,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_styles_as_circle() {
        let spec = style_for(GeometryClass::Point);
        assert_eq!(spec.primitive(), "circle");
        assert_eq!(
            spec,
            RenderSpec::Circle {
                color: "#FF0000",
                radius: 5.0
            }
        );
    }

    #[test]
    fn test_line_styles_as_line() {
        let spec = style_for(GeometryClass::Line);
        assert_eq!(spec.primitive(), "line");
        assert_eq!(
            spec,
            RenderSpec::Line {
                color: "#0000FF",
                width: 2.0
            }
        );
    }

    #[test]
    fn test_polygon_styles_as_fill() {
        let spec = style_for(GeometryClass::Polygon);
        assert_eq!(spec.primitive(), "fill");
        assert_eq!(
            spec,
            RenderSpec::Fill {
                color: "#00FF00",
                opacity: 0.5
            }
        );
    }
}
