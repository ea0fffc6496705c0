//! Scene editor: the entity store, stroke layer, undo log and orbits wired
//! together so every logged mutation and its undo record happen as one step.

use crate::codec::SceneDocument;
use crate::config::{EditorConfig, ToolSettings};
use crate::history::{Edit, History, Snapshot, UndoEntry};
use crate::orbit::{DriftPhase, OrbitIntegrator, attach_orbit, orbit_focus};
use crate::scene::{Planet, Scene};
use crate::strokes::{Stroke, StrokeLayer};
use kurbo::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Editable scene state with undo.
#[derive(Debug, Clone)]
pub struct SceneEditor {
    /// Bodies, stars and links.
    scene: Scene,
    /// Painted strokes and their raster.
    strokes: StrokeLayer,
    /// Undo log.
    history: History,
    /// Orbit animation state.
    orbits: OrbitIntegrator,
    /// Source of drift and orbit phases.
    rng: StdRng,
    config: EditorConfig,
}

impl SceneEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            scene: Scene::new(),
            strokes: StrokeLayer::new(&config),
            history: History::new(),
            orbits: OrbitIntegrator::default(),
            // Offset so phases do not mirror the brush sequence.
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn strokes(&self) -> &StrokeLayer {
        &self.strokes
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn orbits_enabled(&self) -> bool {
        self.orbits.is_enabled()
    }

    /// Perform a logged mutation and record how to undo it.
    ///
    /// Returns false, with nothing recorded, when the edit changes nothing.
    pub fn apply(&mut self, edit: Edit) -> bool {
        let entry = match edit {
            Edit::AddStar(position) => UndoEntry::AddStar {
                index: self.scene.add_star(position),
            },
            Edit::AddLink(a, b) => match self.scene.add_link(a, b) {
                Some(index) => UndoEntry::AddLink { index },
                None => return false,
            },
            Edit::SetSun(position) => {
                let previous = self.scene.set_sun(Some(position));
                self.orbits.reinit_all(&mut self.scene, &self.config, &mut self.rng);
                UndoEntry::SetSun { previous }
            }
            Edit::SetMoon(position) => UndoEntry::SetMoon {
                previous: self.scene.set_moon(Some(position)),
            },
            Edit::AddPlanet(kind, position) => {
                if !kind.is_planet() {
                    log::warn!("{} is not a planet; ignoring placement", kind.name());
                    return false;
                }
                let mut planet = Planet::new(kind, position, DriftPhase::random(&mut self.rng));
                let index = self.scene.planets.len();
                if self.orbits.is_enabled() {
                    let focus = orbit_focus(&self.scene);
                    attach_orbit(&mut planet, focus, index, &self.config, &mut self.rng);
                }
                UndoEntry::AddPlanet {
                    index: self.scene.add_planet(planet),
                }
            }
            Edit::BeginStroke { is_erase } => {
                self.strokes.begin_stroke(is_erase);
                UndoEntry::AddStroke
            }
            Edit::ClearObjects => {
                if self.scene.is_empty() {
                    return false;
                }
                let snapshot = Box::new(self.snapshot());
                self.scene.clear();
                log::info!("Cleared all objects");
                UndoEntry::ClearObjects(snapshot)
            }
            Edit::ClearAll => {
                if self.scene.is_empty() && self.strokes.strokes().is_empty() {
                    return false;
                }
                let snapshot = Box::new(self.snapshot());
                self.scene.clear();
                self.strokes.clear();
                log::info!("Cleared all objects and strokes");
                UndoEntry::ClearAll(snapshot)
            }
        };
        log::debug!("Applied {}", entry.label());
        self.history.push(entry);
        true
    }

    /// Reverse the most recent logged edit. Returns false if the log is empty.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.pop() else {
            return false;
        };
        log::debug!("Undoing {}", entry.label());
        match entry {
            UndoEntry::AddStar { index } => {
                self.scene.remove_star_cascading_links(index);
            }
            UndoEntry::AddLink { index } => {
                self.scene.remove_link_at(index);
            }
            UndoEntry::SetSun { previous } => {
                self.scene.set_sun(previous);
                self.orbits.reinit_all(&mut self.scene, &self.config, &mut self.rng);
            }
            UndoEntry::SetMoon { previous } => {
                self.scene.set_moon(previous);
            }
            UndoEntry::AddPlanet { index } => {
                self.scene.remove_planet_at(index);
            }
            UndoEntry::AddStroke => {
                self.strokes.pop_stroke();
            }
            UndoEntry::ClearObjects(snapshot) | UndoEntry::ClearAll(snapshot) => {
                self.restore(*snapshot);
            }
        }
        true
    }

    /// Deep copy of the scene and strokes, without orbit state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            scene: self.scene.without_orbits(),
            strokes: self.strokes.strokes().to_vec(),
        }
    }

    /// Replace the scene and strokes wholesale and rebuild the raster.
    ///
    /// Orbits are rebuilt lazily on the next [`SceneEditor::advance`].
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.scene = snapshot.scene.without_orbits();
        self.strokes.replace_strokes(snapshot.strokes);
    }

    /// Replace all state from a loaded document and forget the undo log.
    pub fn reset(&mut self, scene: Scene, strokes: Vec<Stroke>) {
        self.restore(Snapshot { scene, strokes });
        self.history.clear();
        self.orbits.reinit_all(&mut self.scene, &self.config, &mut self.rng);
    }

    /// Replace all state with a parsed document and forget the undo log.
    pub fn load_document(&mut self, document: &SceneDocument) {
        let (scene, strokes) = document.to_scene(&mut self.rng);
        log::info!(
            "Loaded scene: {} planets, {} stars, {} links, {} strokes",
            scene.planets.len(),
            scene.stars.len(),
            scene.links.len(),
            strokes.len()
        );
        self.reset(scene, strokes);
    }

    /// Move the sun without logging. Orbits follow the new focus.
    pub fn drag_sun(&mut self, position: Point) -> bool {
        if self.scene.sun.is_none() {
            return false;
        }
        self.scene.sun = Some(position);
        self.orbits.recenter(&mut self.scene);
        true
    }

    /// Move the moon without logging.
    pub fn drag_moon(&mut self, position: Point) -> bool {
        if self.scene.moon.is_none() {
            return false;
        }
        self.scene.moon = Some(position);
        true
    }

    /// Move a star without logging.
    pub fn drag_star(&mut self, index: usize, position: Point) -> bool {
        self.scene.move_star(index, position)
    }

    /// Move a planet without logging. Its orbit restarts from the drop point.
    pub fn drag_planet(&mut self, index: usize, position: Point) -> bool {
        self.scene.move_planet(index, position)
    }

    /// Toggle orbit animation for every planet.
    pub fn set_orbit_animation(&mut self, enabled: bool) {
        self.orbits
            .set_enabled(enabled, &mut self.scene, &self.config, &mut self.rng);
    }

    /// Step orbits by `dt` seconds, leaving the `held` planet in place.
    pub fn advance(&mut self, dt: f64, held: Option<usize>) {
        self.orbits
            .advance(&mut self.scene, dt, held, &self.config, &mut self.rng);
    }

    /// Paint a stamp, opening a logged paint stroke first if needed.
    pub fn stamp_paint(&mut self, point: Point, settings: &ToolSettings, heavier: bool) -> usize {
        if self.strokes.active_kind() != Some(false) {
            self.apply(Edit::BeginStroke { is_erase: false });
        }
        self.strokes.stamp_paint(point, settings, heavier)
    }

    /// Erase a stamp, opening a logged erase stroke first if needed.
    pub fn stamp_erase(&mut self, point: Point, settings: &ToolSettings, heavier: bool) -> bool {
        if self.strokes.active_kind() != Some(true) {
            self.apply(Edit::BeginStroke { is_erase: true });
        }
        self.strokes.stamp_erase(point, settings, heavier)
    }

    /// Interpolated stamps toward `point` on the active stroke.
    pub fn continue_stroke(&mut self, point: Point, settings: &ToolSettings) -> usize {
        self.strokes.continue_stroke(point, settings)
    }

    /// Close the active stroke.
    pub fn end_stroke(&mut self) {
        self.strokes.end_stroke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::BodyKind;

    fn editor() -> SceneEditor {
        SceneEditor::new(EditorConfig {
            world_width: 300.0,
            world_height: 300.0,
            ..EditorConfig::default()
        })
    }

    #[test]
    fn test_add_star_undo() {
        let mut editor = editor();
        assert!(editor.apply(Edit::AddStar(Point::new(1.0, 2.0))));
        assert_eq!(editor.scene().stars.len(), 1);
        assert!(editor.undo());
        assert!(editor.scene().stars.is_empty());
        assert!(!editor.undo());
    }

    #[test]
    fn test_duplicate_link_not_logged() {
        let mut editor = editor();
        editor.apply(Edit::AddStar(Point::ZERO));
        editor.apply(Edit::AddStar(Point::new(50.0, 0.0)));
        assert!(editor.apply(Edit::AddLink(0, 1)));
        assert!(!editor.apply(Edit::AddLink(1, 0)));
        assert_eq!(editor.history().len(), 3);
        editor.undo();
        assert!(editor.scene().links.is_empty());
        assert_eq!(editor.scene().stars.len(), 2);
    }

    #[test]
    fn test_set_sun_undo_restores_previous() {
        let mut editor = editor();
        editor.apply(Edit::SetSun(Point::new(1.0, 1.0)));
        editor.apply(Edit::SetSun(Point::new(2.0, 2.0)));
        editor.undo();
        assert_eq!(editor.scene().sun, Some(Point::new(1.0, 1.0)));
        editor.undo();
        assert_eq!(editor.scene().sun, None);
    }

    #[test]
    fn test_set_moon_undo() {
        let mut editor = editor();
        editor.apply(Edit::SetMoon(Point::new(3.0, 4.0)));
        editor.undo();
        assert_eq!(editor.scene().moon, None);
    }

    #[test]
    fn test_add_planet_rejects_singletons() {
        let mut editor = editor();
        assert!(!editor.apply(Edit::AddPlanet(BodyKind::Sun, Point::ZERO)));
        assert!(editor.apply(Edit::AddPlanet(BodyKind::Jupiter, Point::ZERO)));
        assert_eq!(editor.scene().planets.len(), 1);
        editor.undo();
        assert!(editor.scene().planets.is_empty());
    }

    #[test]
    fn test_planet_gets_orbit_when_animating() {
        let mut editor = editor();
        editor.set_orbit_animation(true);
        editor.apply(Edit::AddPlanet(BodyKind::Earth, Point::new(200.0, 0.0)));
        assert!(editor.scene().planets[0].orbit.is_some());
    }

    #[test]
    fn test_planet_near_sun_pushed_out() {
        let mut editor = editor();
        editor.apply(Edit::SetSun(Point::ZERO));
        editor.set_orbit_animation(true);
        editor.apply(Edit::AddPlanet(BodyKind::Earth, Point::new(10.0, 0.0)));
        let orbiting = editor.scene().planets[0].current_position();
        assert!((orbiting.x - 150.0).abs() < 1e-9);

        editor.set_orbit_animation(false);
        let planet = &editor.scene().planets[0];
        assert!((planet.position - orbiting).hypot() < 1e-9);
        assert!((planet.current_position() - orbiting).hypot() < 1e-9);
    }

    #[test]
    fn test_set_sun_undo_recenters_orbits() {
        let mut editor = editor();
        editor.set_orbit_animation(true);
        editor.apply(Edit::AddPlanet(BodyKind::Mars, Point::new(400.0, 0.0)));
        editor.apply(Edit::AddPlanet(BodyKind::Venus, Point::new(0.0, -500.0)));
        editor.apply(Edit::SetSun(Point::new(30.0, 40.0)));
        editor.apply(Edit::SetSun(Point::new(-60.0, 10.0)));
        for planet in &editor.scene().planets {
            assert_eq!(planet.orbit.as_ref().map(|o| o.center), Some(Point::new(-60.0, 10.0)));
        }

        editor.undo();
        for planet in &editor.scene().planets {
            assert_eq!(planet.orbit.as_ref().map(|o| o.center), Some(Point::new(30.0, 40.0)));
        }

        editor.undo();
        for planet in &editor.scene().planets {
            assert_eq!(planet.orbit.as_ref().map(|o| o.center), Some(Point::ZERO));
        }
    }

    #[test]
    fn test_clear_undo_rebuilds_orbits_lazily() {
        for edit in [Edit::ClearAll, Edit::ClearObjects] {
            let mut editor = editor();
            editor.apply(Edit::SetSun(Point::ZERO));
            editor.set_orbit_animation(true);
            editor.apply(Edit::AddPlanet(BodyKind::Jupiter, Point::new(300.0, 0.0)));
            editor.apply(Edit::AddPlanet(BodyKind::Saturn, Point::new(-250.0, 100.0)));
            editor.advance(0.05, None);
            assert!(editor.apply(edit));
            assert!(editor.scene().planets.is_empty());

            assert!(editor.undo());
            assert_eq!(editor.scene().planets.len(), 2);
            assert!(editor.scene().planets.iter().all(|p| p.orbit.is_none()));
            assert_eq!(editor.scene().planets[0].position, Point::new(300.0, 0.0));

            editor.advance(0.0, None);
            for planet in &editor.scene().planets {
                assert_eq!(planet.orbit.as_ref().map(|o| o.center), Some(Point::ZERO));
                assert!((planet.current_position() - planet.position).hypot() < 1e-9);
            }
        }
    }

    #[test]
    fn test_clear_objects_keeps_strokes() {
        let mut editor = editor();
        let settings = ToolSettings::default();
        editor.apply(Edit::AddStar(Point::ZERO));
        editor.stamp_paint(Point::ZERO, &settings, true);
        editor.end_stroke();
        assert!(editor.apply(Edit::ClearObjects));
        assert!(editor.scene().stars.is_empty());
        assert_eq!(editor.strokes().strokes().len(), 1);
        editor.undo();
        assert_eq!(editor.scene().stars.len(), 1);
    }

    #[test]
    fn test_clear_on_empty_is_noop() {
        let mut editor = editor();
        assert!(!editor.apply(Edit::ClearObjects));
        assert!(!editor.apply(Edit::ClearAll));
        assert!(editor.history().is_empty());
    }

    #[test]
    fn test_stamp_opens_logged_stroke() {
        let mut editor = editor();
        let settings = ToolSettings::default();
        assert!(editor.stamp_paint(Point::ZERO, &settings, true) > 0);
        assert_eq!(editor.history().len(), 1);
        editor.stamp_paint(Point::new(5.0, 0.0), &settings, false);
        assert_eq!(editor.strokes().strokes().len(), 1);
        // Switching kind opens a second stroke.
        editor.stamp_erase(Point::ZERO, &settings, false);
        assert_eq!(editor.strokes().strokes().len(), 2);
        editor.undo();
        editor.undo();
        assert!(editor.strokes().raster().is_blank());
    }

    #[test]
    fn test_drags_not_logged() {
        let mut editor = editor();
        editor.apply(Edit::AddStar(Point::ZERO));
        editor.apply(Edit::SetSun(Point::ZERO));
        assert!(editor.drag_star(0, Point::new(9.0, 9.0)));
        assert!(editor.drag_sun(Point::new(5.0, 5.0)));
        assert!(!editor.drag_moon(Point::ZERO));
        assert!(!editor.drag_planet(3, Point::ZERO));
        assert_eq!(editor.history().len(), 2);
        assert_eq!(editor.scene().stars[0], Point::new(9.0, 9.0));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut editor = editor();
        editor.apply(Edit::AddStar(Point::ZERO));
        let mut scene = Scene::new();
        scene.add_star(Point::new(1.0, 1.0));
        scene.add_star(Point::new(2.0, 2.0));
        editor.reset(scene, Vec::new());
        assert!(!editor.history().can_undo());
        assert_eq!(editor.scene().stars.len(), 2);
    }
}
