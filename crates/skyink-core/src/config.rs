//! Editor configuration and per-session tool settings.

use crate::color::Argb;
use crate::scene::BodyKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for the editor engine.
///
/// All distances are world units unless the field name ends in `_dp`, in
/// which case the value is in density-independent screen pixels and is
/// converted with [`EditorConfig::dp`] and the current zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of the fixed world rectangle.
    pub world_width: f64,
    /// Height of the fixed world rectangle.
    pub world_height: f64,
    /// Maximum zoom factor.
    pub max_scale: f64,
    /// Screen pixels per dp.
    pub density: f64,

    pub sun_hit_radius_dp: f64,
    pub moon_hit_radius_dp: f64,
    pub star_hit_radius_dp: f64,
    /// Planet hit radius as a multiple of its drawn half size.
    pub planet_hit_factor: f64,

    /// Spacing of interpolated brush stamps along a pointer segment.
    pub brush_step: f64,
    /// Blur width of the dust glow edge.
    pub dust_glow_blur: f64,

    /// Bodies closer than this to the focus are pushed outward.
    pub orbit_min_radius: f64,
    /// Extra push-out distance per planet index.
    pub orbit_spacing: f64,
    /// Radius floor used when deriving angular speed.
    pub orbit_radius_floor: f64,
    /// Radius at which a planet turns at `orbit_base_speed`.
    pub orbit_reference_radius: f64,
    /// Angular speed at the reference radius, rad/s.
    pub orbit_base_speed: f64,
    pub orbit_min_speed: f64,
    pub orbit_max_speed: f64,
    pub orbit_wobble_dp: f64,
    pub idle_drift_dp: f64,

    /// Upper bound on a single frame's delta time, in seconds.
    pub max_frame_delta: f64,
    /// Number of decorative background stars.
    pub background_stars: usize,
    /// Seed for brush jitter and animation phases.
    pub seed: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            world_width: 2200.0,
            world_height: 3800.0,
            max_scale: 4.0,
            density: 1.0,
            sun_hit_radius_dp: 150.0,
            moon_hit_radius_dp: 145.0,
            star_hit_radius_dp: 70.0,
            planet_hit_factor: 1.15,
            brush_step: 18.0,
            dust_glow_blur: 10.0,
            orbit_min_radius: 150.0,
            orbit_spacing: 70.0,
            orbit_radius_floor: 180.0,
            orbit_reference_radius: 280.0,
            orbit_base_speed: 0.75,
            orbit_min_speed: 0.10,
            orbit_max_speed: 0.90,
            orbit_wobble_dp: 6.0,
            idle_drift_dp: 12.0,
            max_frame_delta: 0.05,
            background_stars: 170,
            seed: 0x5EED_51C1,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert dp to screen pixels.
    pub fn dp(&self, value: f64) -> f64 {
        value * self.density
    }

    /// Drawn half size of a body, in dp.
    pub fn body_half_size_dp(&self, kind: BodyKind) -> f64 {
        match kind {
            BodyKind::Sun => 135.0,
            BodyKind::Moon => 125.0,
            BodyKind::Mercury => 32.0,
            BodyKind::Venus => 40.0,
            BodyKind::Earth => 42.0,
            BodyKind::Mars => 36.0,
            BodyKind::Jupiter => 62.0,
            BodyKind::Saturn => 58.0,
            BodyKind::Uranus => 52.0,
            BodyKind::Neptune => 50.0,
        }
    }

    /// Drawn half size of a star, in dp.
    pub fn star_half_size_dp(&self) -> f64 {
        34.0
    }
}

/// Interaction mode selected by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolMode {
    /// Drag bodies and stars, pan on empty space.
    #[default]
    Move,
    /// Place stars and link them by tapping.
    StarEdit,
    /// Paint dust strokes.
    Paint,
    /// Erase painted dust.
    Erase,
    /// Place the selected body on release.
    PlaceBody,
}

/// Brush size bounds accepted from the host.
pub const MIN_BRUSH_SIZE: u8 = 5;
pub const MAX_BRUSH_SIZE: u8 = 100;

/// Tool state supplied by the host and threaded through gesture handling.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub mode: ToolMode,
    pub ink_color: Argb,
    /// Brush size progress, 5..=100.
    pub brush_size: u8,
    /// Body placed by [`ToolMode::PlaceBody`].
    pub selected_body: BodyKind,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            mode: ToolMode::default(),
            ink_color: Argb::from_rgb(0xBF, 0xD6, 0xFF),
            brush_size: 35,
            selected_body: BodyKind::Mercury,
        }
    }
}

impl ToolSettings {
    /// Set the brush size, clamped to the accepted range.
    pub fn set_brush_size(&mut self, progress: i64) {
        self.brush_size = progress.clamp(MIN_BRUSH_SIZE as i64, MAX_BRUSH_SIZE as i64) as u8;
    }
}
