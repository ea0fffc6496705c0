//! Scene entities: bodies, stars and the links between stars.
//!
//! The scene is a plain data container. Its mutators never record undo
//! information; [`crate::editor::SceneEditor::apply`] pairs each logged
//! mutation with its undo entry. Index-based operations ignore bad indices.

use crate::config::EditorConfig;
use crate::orbit::{DriftPhase, OrbitState, PositionAnimator};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Kinds of celestial body that can be placed in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyKind {
    /// The single primary body; orbits revolve around it.
    Sun,
    /// The single secondary body.
    Moon,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl BodyKind {
    /// The kinds that form the ordered planet collection.
    pub const PLANETS: [BodyKind; 8] = [
        BodyKind::Mercury,
        BodyKind::Venus,
        BodyKind::Earth,
        BodyKind::Mars,
        BodyKind::Jupiter,
        BodyKind::Saturn,
        BodyKind::Uranus,
        BodyKind::Neptune,
    ];

    /// Document name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            BodyKind::Sun => "SUN",
            BodyKind::Moon => "MOON",
            BodyKind::Mercury => "MERCURY",
            BodyKind::Venus => "VENUS",
            BodyKind::Earth => "EARTH",
            BodyKind::Mars => "MARS",
            BodyKind::Jupiter => "JUPITER",
            BodyKind::Saturn => "SATURN",
            BodyKind::Uranus => "URANUS",
            BodyKind::Neptune => "NEPTUNE",
        }
    }

    /// Parse a document name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        [BodyKind::Sun, BodyKind::Moon]
            .into_iter()
            .chain(Self::PLANETS)
            .find(|kind| kind.name() == name)
    }

    /// Whether this kind lives in the planet collection.
    pub fn is_planet(self) -> bool {
        !matches!(self, BodyKind::Sun | BodyKind::Moon)
    }
}

/// A placed planet.
#[derive(Debug, Clone)]
pub struct Planet {
    pub kind: BodyKind,
    /// Position the user placed or dropped the planet at.
    pub position: Point,
    /// Phases of the idle drift.
    pub drift: DriftPhase,
    /// Orbit parameters while orbit animation is enabled.
    pub orbit: Option<OrbitState>,
}

impl Planet {
    pub fn new(kind: BodyKind, position: Point, drift: DriftPhase) -> Self {
        Self {
            kind,
            position,
            drift,
            orbit: None,
        }
    }

    /// Where the planet currently is, ignoring cosmetic wobble.
    pub fn current_position(&self) -> Point {
        self.orbit
            .as_ref()
            .map(OrbitState::position)
            .unwrap_or(self.position)
    }

    /// The motion applied when drawing: the orbit if any, else idle drift.
    pub fn animator(&self) -> &dyn PositionAnimator {
        match &self.orbit {
            Some(orbit) => orbit,
            None => &self.drift,
        }
    }
}

/// An undirected link between two star indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub a: usize,
    pub b: usize,
}

impl Link {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// Whether the link joins `a` and `b` in either direction.
    pub fn connects(&self, a: usize, b: usize) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }

    /// Whether either end is `index`.
    pub fn touches(&self, index: usize) -> bool {
        self.a == index || self.b == index
    }
}

/// Result of a body hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyHit {
    Sun,
    Moon,
    Planet(usize),
}

/// All addressable objects of a scene.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub sun: Option<Point>,
    pub moon: Option<Point>,
    pub planets: Vec<Planet>,
    pub stars: Vec<Point>,
    pub links: Vec<Link>,
}

fn within(a: Point, b: Point, radius: f64) -> bool {
    (a - b).hypot2() <= radius * radius
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the scene holds no objects at all.
    pub fn is_empty(&self) -> bool {
        self.sun.is_none()
            && self.moon.is_none()
            && self.planets.is_empty()
            && self.stars.is_empty()
            && self.links.is_empty()
    }

    /// Find the body under a world point.
    ///
    /// Hit radii are fixed in screen space and divided by `scale`, so the
    /// touch target does not shrink when zooming out. The sun wins over the
    /// moon, which wins over planets; among planets the newest wins.
    pub fn hit_test_body(&self, point: Point, scale: f64, config: &EditorConfig) -> Option<BodyHit> {
        if let Some(sun) = self.sun {
            if within(point, sun, config.dp(config.sun_hit_radius_dp) / scale) {
                return Some(BodyHit::Sun);
            }
        }
        if let Some(moon) = self.moon {
            if within(point, moon, config.dp(config.moon_hit_radius_dp) / scale) {
                return Some(BodyHit::Moon);
            }
        }
        self.planets
            .iter()
            .enumerate()
            .rev()
            .find(|(_, planet)| {
                let radius = config.dp(config.body_half_size_dp(planet.kind)) / scale
                    * config.planet_hit_factor;
                within(point, planet.current_position(), radius)
            })
            .map(|(index, _)| BodyHit::Planet(index))
    }

    /// Find the newest star within `radius` world units of a point.
    pub fn hit_test_star(&self, point: Point, radius: f64) -> Option<usize> {
        self.stars
            .iter()
            .rposition(|&star| within(point, star, radius))
    }

    /// Append a star and return its index.
    pub fn add_star(&mut self, position: Point) -> usize {
        self.stars.push(position);
        self.stars.len() - 1
    }

    /// Move a star. Returns false for a bad index.
    pub fn move_star(&mut self, index: usize, position: Point) -> bool {
        match self.stars.get_mut(index) {
            Some(star) => {
                *star = position;
                true
            }
            None => false,
        }
    }

    /// Remove a star together with every link touching it.
    ///
    /// Link indices above the removed one shift down by one.
    pub fn remove_star_cascading_links(&mut self, index: usize) -> Option<Point> {
        if index >= self.stars.len() {
            return None;
        }
        self.links.retain(|link| !link.touches(index));
        for link in &mut self.links {
            if link.a > index {
                link.a -= 1;
            }
            if link.b > index {
                link.b -= 1;
            }
        }
        Some(self.stars.remove(index))
    }

    /// Whether `a` and `b` are linked in either direction.
    pub fn link_exists(&self, a: usize, b: usize) -> bool {
        self.links.iter().any(|link| link.connects(a, b))
    }

    /// Link two stars and return the link index.
    ///
    /// Returns `None` without changing anything when `a == b`, either index
    /// is out of range, or the stars are already linked.
    pub fn add_link(&mut self, a: usize, b: usize) -> Option<usize> {
        if a == b || a >= self.stars.len() || b >= self.stars.len() || self.link_exists(a, b) {
            return None;
        }
        self.links.push(Link::new(a, b));
        Some(self.links.len() - 1)
    }

    /// Remove a link. Returns `None` for a bad index.
    pub fn remove_link_at(&mut self, index: usize) -> Option<Link> {
        (index < self.links.len()).then(|| self.links.remove(index))
    }

    /// Place or remove the sun, returning the previous position.
    pub fn set_sun(&mut self, position: Option<Point>) -> Option<Point> {
        std::mem::replace(&mut self.sun, position)
    }

    /// Place or remove the moon, returning the previous position.
    pub fn set_moon(&mut self, position: Option<Point>) -> Option<Point> {
        std::mem::replace(&mut self.moon, position)
    }

    /// Append a planet and return its index.
    pub fn add_planet(&mut self, planet: Planet) -> usize {
        self.planets.push(planet);
        self.planets.len() - 1
    }

    /// Move a planet's stored position. Its orbit is discarded so it is
    /// rebuilt from the new position.
    pub fn move_planet(&mut self, index: usize, position: Point) -> bool {
        match self.planets.get_mut(index) {
            Some(planet) => {
                planet.position = position;
                planet.orbit = None;
                true
            }
            None => false,
        }
    }

    /// Remove a planet, dropping its orbit with it.
    pub fn remove_planet_at(&mut self, index: usize) -> Option<Planet> {
        (index < self.planets.len()).then(|| self.planets.remove(index))
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Copy of the scene with all orbit state discarded.
    pub fn without_orbits(&self) -> Self {
        let mut copy = self.clone();
        for planet in &mut copy.planets {
            planet.orbit = None;
        }
        copy
    }
}
