//! Canvas: the host-facing editor facade.
//!
//! Owns the editor, the camera, gesture routing, tool settings and the
//! animation clock. Everything runs on the caller's thread; the host feeds
//! pointer events and frame ticks and reads state back for drawing.

use crate::camera::Camera;
use crate::codec::{CodecResult, SceneDocument};
use crate::color::Argb;
use crate::config::{EditorConfig, ToolMode, ToolSettings};
use crate::editor::SceneEditor;
use crate::gesture::{DragTarget, GestureRouter, PointerEvent};
use crate::history::Edit;
use crate::orbit::{AnimationClock, AnimationFrame, MOON_SWAY, SUN_SWAY};
use crate::scene::{BodyKind, Scene};
use crate::starfield::Starfield;
use crate::storage::{Storage, StorageResult};
use kurbo::{Point, Size};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// The interactive sky canvas.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// Scene, strokes and undo log.
    pub editor: SceneEditor,
    /// View transform.
    pub camera: Camera,
    gestures: GestureRouter,
    settings: ToolSettings,
    starfield: Starfield,
    clock: AnimationClock,
    /// When [`Canvas::tick`] last ran.
    last_tick: Option<Instant>,
}

impl Canvas {
    pub fn new(config: EditorConfig) -> Self {
        let world = Size::new(config.world_width, config.world_height);
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(2));
        Self {
            camera: Camera::new(world, config.max_scale),
            gestures: GestureRouter::new(),
            settings: ToolSettings::default(),
            starfield: Starfield::new(config.background_stars, world, &mut rng),
            clock: AnimationClock::new(&mut rng),
            last_tick: None,
            editor: SceneEditor::new(config),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        self.editor.config()
    }

    pub fn scene(&self) -> &Scene {
        self.editor.scene()
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn starfield(&self) -> &Starfield {
        &self.starfield
    }

    /// Star waiting for a second tap to be linked.
    pub fn selected_star(&self) -> Option<usize> {
        self.gestures.selected_star()
    }

    /// Animation time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.clock.time
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.camera.set_viewport_size(width, height);
    }

    /// Route a pointer event. Returns true if a redraw is needed.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) -> bool {
        self.gestures
            .handle_event(event, &mut self.camera, &mut self.editor, &self.settings)
    }

    /// Switch tool mode. Any gesture in progress is abandoned.
    pub fn set_tool(&mut self, mode: ToolMode) {
        if self.settings.mode != mode {
            self.gestures.reset(&mut self.editor);
            self.gestures.clear_selection();
            self.settings.mode = mode;
            log::debug!("Tool changed to {mode:?}");
        }
    }

    pub fn set_ink_color(&mut self, color: Argb) {
        self.settings.ink_color = color.with_alpha(0xFF);
    }

    /// Set the brush size, clamped to 5..=100.
    pub fn set_brush_size(&mut self, progress: i64) {
        self.settings.set_brush_size(progress);
    }

    pub fn set_selected_body(&mut self, kind: BodyKind) {
        self.settings.selected_body = kind;
    }

    pub fn set_orbit_animation(&mut self, enabled: bool) {
        self.editor.set_orbit_animation(enabled);
    }

    /// Undo the last logged edit.
    pub fn undo(&mut self) -> bool {
        self.gestures.reset(&mut self.editor);
        self.gestures.clear_selection();
        self.editor.undo()
    }

    /// Remove all bodies, stars and links. Undoable.
    pub fn clear_objects(&mut self) -> bool {
        self.gestures.reset(&mut self.editor);
        self.gestures.clear_selection();
        self.editor.apply(Edit::ClearObjects)
    }

    /// Remove all objects and strokes. Undoable.
    pub fn clear_all(&mut self) -> bool {
        self.gestures.reset(&mut self.editor);
        self.gestures.clear_selection();
        self.editor.apply(Edit::ClearAll)
    }

    /// Advance animation by a host-measured `dt` in seconds.
    ///
    /// The delta is clamped to the configured maximum. Returns the delta
    /// actually applied.
    pub fn advance(&mut self, dt: f64) -> f64 {
        let dt = self.clock.tick(dt, self.config().max_frame_delta);
        let held = self.gestures.held_planet();
        self.editor.advance(dt, held);
        self.starfield.update(dt, self.clock.time);
        dt
    }

    /// Advance animation by the wall time since the previous tick.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_tick = Some(now);
        self.advance(dt)
    }

    /// Per-frame animation amplitudes at the current zoom.
    pub fn animation_frame(&self) -> AnimationFrame {
        AnimationFrame::new(self.clock.time, self.camera.scale, self.config())
    }

    /// World units per dp at the current zoom.
    fn dp_unit(&self) -> f64 {
        self.config().dp(1.0) / self.camera.scale
    }

    fn is_dragging(&self, target: DragTarget) -> bool {
        self.gestures.drag_target() == Some(target)
    }

    /// Where the sun is drawn this frame.
    pub fn sun_pose(&self) -> Option<Point> {
        let sun = self.scene().sun?;
        if self.is_dragging(DragTarget::Sun) {
            return Some(sun);
        }
        Some(sun + SUN_SWAY.offset(self.clock.sun_phase, self.clock.time, self.dp_unit()))
    }

    /// Where the moon is drawn this frame.
    pub fn moon_pose(&self) -> Option<Point> {
        let moon = self.scene().moon?;
        if self.is_dragging(DragTarget::Moon) {
            return Some(moon);
        }
        Some(moon + MOON_SWAY.offset(self.clock.moon_phase, self.clock.time, self.dp_unit()))
    }

    /// Where the planet at `index` is drawn this frame.
    pub fn planet_pose(&self, index: usize) -> Option<Point> {
        let planet = self.scene().planets.get(index)?;
        if self.gestures.held_planet() == Some(index) {
            return Some(planet.position);
        }
        Some(planet.animator().animate(planet.position, &self.animation_frame()))
    }

    /// Pulsing glow alpha of the sun and moon this frame.
    pub fn glow_alphas(&self) -> (u8, u8) {
        (
            SUN_SWAY.glow_alpha(self.clock.sun_phase, self.clock.time),
            MOON_SWAY.glow_alpha(self.clock.moon_phase, self.clock.time),
        )
    }

    /// Capture the current state as a document.
    pub fn document(&self) -> SceneDocument {
        SceneDocument::capture(self.scene(), self.editor.strokes().strokes(), &self.settings)
    }

    /// Serialize the scene, strokes and tool settings.
    pub fn export_state_json(&self) -> CodecResult<String> {
        self.document().to_json()
    }

    /// Replace all state from a document string.
    ///
    /// The document is fully parsed before anything changes, so a failure
    /// leaves the canvas untouched. A successful import clears the undo log.
    pub fn import_state_json(&mut self, json: &str) -> CodecResult<()> {
        let document = SceneDocument::from_json(json)?;
        self.apply_document(&document);
        Ok(())
    }

    /// Replace all state from a parsed document.
    pub fn apply_document(&mut self, document: &SceneDocument) {
        self.gestures.reset(&mut self.editor);
        self.gestures.clear_selection();
        if let Some(ink) = document.ink_color {
            self.set_ink_color(ink);
        }
        if let Some(progress) = document.marker_size_progress {
            self.set_brush_size(progress);
        }
        self.editor.load_document(document);
    }

    /// Save the current state under `id`.
    pub async fn save_to(&self, storage: &dyn Storage, id: &str) -> StorageResult<()> {
        storage.save(id, &self.document()).await
    }

    /// Load the state saved under `id`. On error nothing changes.
    pub async fn load_from(&mut self, storage: &dyn Storage, id: &str) -> StorageResult<()> {
        let document = storage.load(id).await?;
        self.apply_document(&document);
        Ok(())
    }
}
