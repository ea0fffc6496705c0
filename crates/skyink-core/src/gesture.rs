//! Pointer gesture routing.
//!
//! Turns a stream of pointer events into exactly one of: viewport pan,
//! pinch zoom, entity drag, paint or erase stroke, or a tap that places
//! something. Two contacts always mean pinch, and once a pinch starts no
//! other gesture begins until every contact has lifted.

use crate::camera::Camera;
use crate::config::{ToolMode, ToolSettings};
use crate::editor::SceneEditor;
use crate::history::Edit;
use crate::scene::{BodyHit, BodyKind};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Identifies one contact (finger or mouse button) for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub u32);

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { pointer: PointerId, position: Point },
    Move { pointer: PointerId, position: Point },
    Up { pointer: PointerId, position: Point },
    /// The platform took the contact away; nothing is committed.
    Cancel { pointer: PointerId },
}

impl PointerEvent {
    pub fn pointer(&self) -> PointerId {
        match self {
            PointerEvent::Down { pointer, .. }
            | PointerEvent::Move { pointer, .. }
            | PointerEvent::Up { pointer, .. }
            | PointerEvent::Cancel { pointer } => *pointer,
        }
    }
}

/// Screen distance a tap may wander before it becomes a pan, in dp.
const TAP_SLOP_DP: f64 = 10.0;

/// What a drag gesture is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Sun,
    Moon,
    Planet(usize),
    Star(usize),
}

/// Gesture in progress.
#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    Pan {
        last: Point,
    },
    Drag {
        target: DragTarget,
        /// Entity position minus the world point under the finger.
        grab: Vec2,
    },
    Stroke,
    /// Possible tap in a placement mode; pans if it wanders.
    Tap {
        start: Point,
        last: Point,
        wandered: bool,
    },
    Pinch {
        distance: f64,
    },
    /// A pinch ended but contacts remain down.
    Suppressed,
}

/// Gesture state machine.
#[derive(Debug, Clone)]
pub struct GestureRouter {
    /// Contacts currently down, in press order.
    contacts: Vec<(PointerId, Point)>,
    gesture: Gesture,
    selected_star: Option<usize>,
}

impl Default for GestureRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRouter {
    pub fn new() -> Self {
        Self {
            contacts: Vec::new(),
            gesture: Gesture::Idle,
            selected_star: None,
        }
    }

    /// Star waiting for a second tap to be linked.
    pub fn selected_star(&self) -> Option<usize> {
        self.selected_star
    }

    pub fn clear_selection(&mut self) {
        self.selected_star = None;
    }

    /// Planet currently held by a drag.
    pub fn held_planet(&self) -> Option<usize> {
        match self.gesture {
            Gesture::Drag {
                target: DragTarget::Planet(index),
                ..
            } => Some(index),
            _ => None,
        }
    }

    /// Entity currently being dragged.
    pub fn drag_target(&self) -> Option<DragTarget> {
        match self.gesture {
            Gesture::Drag { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.gesture, Gesture::Pinch { .. })
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle && self.contacts.is_empty()
    }

    /// Abandon any gesture, closing an open stroke.
    pub fn reset(&mut self, editor: &mut SceneEditor) {
        if self.gesture == Gesture::Stroke {
            editor.end_stroke();
        }
        self.contacts.clear();
        self.gesture = Gesture::Idle;
    }

    /// Route one pointer event. Returns true if anything visible changed.
    pub fn handle_event(
        &mut self,
        event: &PointerEvent,
        camera: &mut Camera,
        editor: &mut SceneEditor,
        settings: &ToolSettings,
    ) -> bool {
        match *event {
            PointerEvent::Down { pointer, position } => {
                self.contacts.retain(|(id, _)| *id != pointer);
                self.contacts.push((pointer, position));
                match self.contacts.len() {
                    1 => self.begin(position, camera, editor, settings),
                    2 => {
                        self.begin_pinch(editor);
                        false
                    }
                    _ => false,
                }
            }
            PointerEvent::Move { pointer, position } => {
                let Some(slot) = self.contacts.iter_mut().find(|(id, _)| *id == pointer) else {
                    return false;
                };
                slot.1 = position;
                if self.is_primary(pointer) || self.is_pinching() {
                    self.update(position, camera, editor, settings)
                } else {
                    false
                }
            }
            PointerEvent::Up { pointer, position } => {
                let primary = self.is_primary(pointer);
                self.contacts.retain(|(id, _)| *id != pointer);
                self.finish(primary.then_some(position), camera, editor, settings)
            }
            PointerEvent::Cancel { pointer } => {
                self.contacts.retain(|(id, _)| *id != pointer);
                self.finish(None, camera, editor, settings)
            }
        }
    }

    fn is_primary(&self, pointer: PointerId) -> bool {
        self.contacts.first().is_some_and(|(id, _)| *id == pointer)
    }

    fn begin(&mut self, screen: Point, camera: &Camera, editor: &mut SceneEditor, settings: &ToolSettings) -> bool {
        let world = camera.screen_to_world(screen);
        self.gesture = match settings.mode {
            ToolMode::Move => match self.hit_entity(world, camera, editor) {
                Some((target, position)) => {
                    log::debug!("Dragging {target:?}");
                    Gesture::Drag {
                        target,
                        grab: position - world,
                    }
                }
                None => Gesture::Pan { last: screen },
            },
            ToolMode::Paint => {
                editor.apply(Edit::BeginStroke { is_erase: false });
                editor.stamp_paint(world, settings, true);
                Gesture::Stroke
            }
            ToolMode::Erase => {
                editor.apply(Edit::BeginStroke { is_erase: true });
                editor.stamp_erase(world, settings, true);
                Gesture::Stroke
            }
            ToolMode::StarEdit | ToolMode::PlaceBody => Gesture::Tap {
                start: screen,
                last: screen,
                wandered: false,
            },
        };
        self.gesture == Gesture::Stroke
    }

    /// Body, then planet, then star under a world point, with its position.
    fn hit_entity(&self, world: Point, camera: &Camera, editor: &SceneEditor) -> Option<(DragTarget, Point)> {
        let scene = editor.scene();
        let config = editor.config();
        match scene.hit_test_body(world, camera.scale, config) {
            Some(BodyHit::Sun) => return scene.sun.map(|p| (DragTarget::Sun, p)),
            Some(BodyHit::Moon) => return scene.moon.map(|p| (DragTarget::Moon, p)),
            Some(BodyHit::Planet(index)) => {
                return scene
                    .planets
                    .get(index)
                    .map(|planet| (DragTarget::Planet(index), planet.current_position()));
            }
            None => {}
        }
        let radius = camera.world_units(config.dp(config.star_hit_radius_dp));
        scene
            .hit_test_star(world, radius)
            .map(|index| (DragTarget::Star(index), scene.stars[index]))
    }

    fn begin_pinch(&mut self, editor: &mut SceneEditor) {
        if self.gesture == Gesture::Stroke {
            editor.end_stroke();
        }
        let distance = self.contact_distance().unwrap_or(0.0);
        log::debug!("Pinch started at span {distance:.1}");
        self.gesture = Gesture::Pinch { distance };
    }

    fn contact_distance(&self) -> Option<f64> {
        match self.contacts.as_slice() {
            [(_, a), (_, b), ..] => Some((*a - *b).hypot()),
            _ => None,
        }
    }

    fn contact_midpoint(&self) -> Option<Point> {
        match self.contacts.as_slice() {
            [(_, a), (_, b), ..] => Some(a.midpoint(*b)),
            _ => None,
        }
    }

    fn update(&mut self, screen: Point, camera: &mut Camera, editor: &mut SceneEditor, settings: &ToolSettings) -> bool {
        let world = camera.screen_to_world(screen);
        match &mut self.gesture {
            Gesture::Idle | Gesture::Suppressed => false,
            Gesture::Pan { last } => {
                camera.pan(screen - *last);
                *last = screen;
                true
            }
            Gesture::Tap { start, last, wandered } => {
                camera.pan(screen - *last);
                *last = screen;
                let slop = editor.config().dp(TAP_SLOP_DP);
                if (screen - *start).hypot() > slop {
                    *wandered = true;
                }
                true
            }
            Gesture::Drag { target, grab } => {
                let at = world + *grab;
                match *target {
                    DragTarget::Sun => editor.drag_sun(at),
                    DragTarget::Moon => editor.drag_moon(at),
                    DragTarget::Planet(index) => editor.drag_planet(index, at),
                    DragTarget::Star(index) => editor.drag_star(index, at),
                }
            }
            Gesture::Stroke => editor.continue_stroke(world, settings) > 0,
            Gesture::Pinch { distance } => {
                let previous = *distance;
                let (Some(current), Some(focal)) = (self.contact_distance(), self.contact_midpoint()) else {
                    return false;
                };
                if let Gesture::Pinch { distance } = &mut self.gesture {
                    *distance = current;
                }
                if previous <= f64::EPSILON || current <= f64::EPSILON {
                    return false;
                }
                camera.zoom_at(focal, current / previous);
                true
            }
        }
    }

    /// End of a contact. `release` is the lift point when the primary
    /// contact lifted normally.
    fn finish(
        &mut self,
        release: Option<Point>,
        camera: &Camera,
        editor: &mut SceneEditor,
        settings: &ToolSettings,
    ) -> bool {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        let changed = match gesture {
            Gesture::Pinch { .. } | Gesture::Suppressed => {
                if !self.contacts.is_empty() {
                    self.gesture = Gesture::Suppressed;
                }
                false
            }
            Gesture::Stroke => {
                editor.end_stroke();
                true
            }
            Gesture::Tap { wandered: false, .. } => match release {
                Some(screen) => self.commit_tap(camera.screen_to_world(screen), camera, editor, settings),
                None => false,
            },
            Gesture::Tap { .. } | Gesture::Pan { .. } | Gesture::Drag { .. } | Gesture::Idle => false,
        };
        if !self.contacts.is_empty() && self.gesture == Gesture::Idle {
            // A secondary contact outlived the primary one.
            self.gesture = Gesture::Suppressed;
        }
        changed
    }

    fn commit_tap(&mut self, world: Point, camera: &Camera, editor: &mut SceneEditor, settings: &ToolSettings) -> bool {
        match settings.mode {
            ToolMode::StarEdit => {
                let config = editor.config();
                let radius = camera.world_units(config.dp(config.star_hit_radius_dp));
                match editor.scene().hit_test_star(world, radius) {
                    Some(index) => {
                        self.tap_star(index, editor);
                        true
                    }
                    None => editor.apply(Edit::AddStar(world)),
                }
            }
            ToolMode::PlaceBody => match settings.selected_body {
                BodyKind::Sun => editor.apply(Edit::SetSun(world)),
                BodyKind::Moon => editor.apply(Edit::SetMoon(world)),
                kind => editor.apply(Edit::AddPlanet(kind, world)),
            },
            ToolMode::Move | ToolMode::Paint | ToolMode::Erase => false,
        }
    }

    /// Select, deselect or link on a star tap.
    fn tap_star(&mut self, index: usize, editor: &mut SceneEditor) {
        self.selected_star = match self.selected_star {
            None => Some(index),
            Some(selected) if selected == index => None,
            Some(selected) => {
                if editor.apply(Edit::AddLink(selected, index)) {
                    log::debug!("Linked stars {selected} and {index}");
                }
                None
            }
        };
    }
}
