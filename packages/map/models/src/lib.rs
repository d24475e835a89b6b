#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Map view, point sample, and heat rendering configuration types.
//!
//! These are the shapes that flow between the data layer and the rendering
//! backend. A fetch cycle produces a `Vec<PointSample>`; the overlay
//! controller pairs it with a [`RenderConfig`] derived from the user's
//! intensity setting.

use serde::{Deserialize, Serialize};

/// Lower bound of the user-adjustable intensity scalar.
pub const INTENSITY_MIN: f64 = 0.1;

/// Upper bound of the user-adjustable intensity scalar.
pub const INTENSITY_MAX: f64 = 2.0;

/// Heat point radius in pixels at unit intensity.
const BASE_RADIUS: f64 = 25.0;

/// Heat point blur in pixels at unit intensity.
const BASE_BLUR: f64 = 15.0;

/// Fixed color ramp breakpoints, ascending by threshold.
///
/// Thresholds are fractions of `max_weight`; the renderer interpolates
/// between adjacent stops.
const COLOR_RAMP: &[(f64, &str)] = &[
    (0.1, "#2b83ba"),
    (0.3, "#00bcd4"),
    (0.5, "#7fff00"),
    (0.7, "#ffd700"),
    (0.9, "#ff8c00"),
    (1.0, "#d7191c"),
];

/// One geocoded measurement with a weight used for heat-density rendering.
///
/// Weights are normalized to `[0,1]`; the data layer clamps on load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSample {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Normalized measurement intensity in `[0,1]`.
    pub weight: f64,
}

impl PointSample {
    /// Creates a new point sample.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, weight: f64) -> Self {
        Self {
            latitude,
            longitude,
            weight,
        }
    }
}

/// Initial center and zoom for a map instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// Center latitude (WGS84).
    pub center_lat: f64,
    /// Center longitude (WGS84).
    pub center_lng: f64,
    /// Zoom level.
    pub zoom: f64,
}

impl MapView {
    /// Creates a new map view.
    #[must_use]
    pub const fn new(center_lat: f64, center_lng: f64, zoom: f64) -> Self {
        Self {
            center_lat,
            center_lng,
            zoom,
        }
    }
}

/// One breakpoint of the heat color ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Fraction of `max_weight` at which this color applies.
    pub threshold: f64,
    /// CSS hex color.
    pub color: String,
}

/// Rendering configuration for the heat overlay.
///
/// Pure configuration: recomputed from the intensity scalar on every style
/// change, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Heat point radius in pixels.
    pub radius: f64,
    /// Heat point blur in pixels.
    pub blur: f64,
    /// Weight value that maps to the hottest color.
    pub max_weight: f64,
    /// Color breakpoints in ascending threshold order.
    pub color_stops: Vec<ColorStop>,
}

impl RenderConfig {
    /// Derives the rendering configuration for an intensity scalar.
    ///
    /// The scalar is clamped to `[INTENSITY_MIN, INTENSITY_MAX]`. Radius and
    /// blur scale linearly with intensity; `max_weight` scales inversely so
    /// that raising intensity saturates hot spots sooner. The color ramp
    /// itself is fixed.
    #[must_use]
    pub fn for_intensity(intensity: f64) -> Self {
        let intensity = intensity.clamp(INTENSITY_MIN, INTENSITY_MAX);
        Self {
            radius: BASE_RADIUS * intensity,
            blur: BASE_BLUR * intensity,
            max_weight: 1.0 / intensity,
            color_stops: COLOR_RAMP
                .iter()
                .map(|&(threshold, color)| ColorStop {
                    threshold,
                    color: color.to_owned(),
                })
                .collect(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::for_intensity(1.0)
    }
}
