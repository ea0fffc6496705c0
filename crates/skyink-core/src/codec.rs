//! Scene document encoding.
//!
//! Writing is a straight serde mirror of the document layout. Reading is
//! lenient field by field: a missing or mistyped field falls back to its
//! default instead of failing the whole document, unknown body names are
//! skipped, and links that do not join two distinct existing stars are
//! dropped.

use crate::color::Argb;
use crate::config::ToolSettings;
use crate::orbit::DriftPhase;
use crate::scene::{BodyKind, Planet, Scene};
use crate::strokes::{Dust, EraseMark, Stroke};
use kurbo::Point;
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from reading or writing scene documents.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Failed to encode scene: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Invalid scene document: {0}")]
    Invalid(String),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocPoint {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for DocPoint {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<DocPoint> for Point {
    fn from(p: DocPoint) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocPlanet {
    /// Body name, e.g. `"EARTH"`.
    pub body: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocLink {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocDust {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub core_color: Argb,
    pub glow_color: Argb,
    pub core_alpha: i64,
    pub glow_alpha: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocEraser {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocStroke {
    pub is_erase: bool,
    pub dust: Vec<DocDust>,
    pub erasers: Vec<DocEraser>,
}

/// The persisted form of a scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    /// Absent on read means "keep the current ink".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ink_color: Option<Argb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_size_progress: Option<i64>,
    pub sun: Option<DocPoint>,
    pub moon: Option<DocPoint>,
    pub planets: Vec<DocPlanet>,
    pub stars: Vec<DocPoint>,
    pub links: Vec<DocLink>,
    pub strokes: Vec<DocStroke>,
}

/// Lenient typed access to JSON object fields.
trait FieldExt {
    fn f64_or(&self, key: &str, default: f64) -> f64;
    fn i64_or(&self, key: &str, default: i64) -> i64;
    fn bool_or(&self, key: &str, default: bool) -> bool;
    fn opt_i64(&self, key: &str) -> Option<i64>;
    fn opt_object(&self, key: &str) -> Option<&Map<String, Value>>;
    fn objects(&self, key: &str) -> Vec<&Map<String, Value>>;
}

impl FieldExt for Map<String, Value> {
    fn f64_or(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
        .unwrap_or(default)
    }

    fn i64_or(&self, key: &str, default: i64) -> i64 {
        self.opt_i64(key).unwrap_or(default)
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
            _ => default,
        }
    }

    fn opt_i64(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn opt_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    fn objects(&self, key: &str) -> Vec<&Map<String, Value>> {
        let Some(items) = self.get(key).and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| {
                let object = item.as_object();
                if object.is_none() {
                    log::warn!("Skipping non-object entry in \"{key}\"");
                }
                object
            })
            .collect()
    }
}

fn read_point(object: &Map<String, Value>) -> DocPoint {
    DocPoint {
        x: object.f64_or("x", 0.0),
        y: object.f64_or("y", 0.0),
    }
}

fn read_stroke(object: &Map<String, Value>) -> DocStroke {
    DocStroke {
        is_erase: object.bool_or("isErase", false),
        dust: object
            .objects("dust")
            .into_iter()
            .map(|d| DocDust {
                x: d.f64_or("x", 0.0),
                y: d.f64_or("y", 0.0),
                radius: d.f64_or("radius", 0.0),
                core_color: d.opt_i64("coreColor").map_or(Argb::WHITE, Argb::from_i64),
                glow_color: d.opt_i64("glowColor").map_or(Argb::WHITE, Argb::from_i64),
                core_alpha: d.i64_or("coreAlpha", 20),
                glow_alpha: d.i64_or("glowAlpha", 10),
            })
            .collect(),
        erasers: object
            .objects("erasers")
            .into_iter()
            .map(|e| DocEraser {
                x: e.f64_or("x", 0.0),
                y: e.f64_or("y", 0.0),
                r: e.f64_or("r", 0.0),
            })
            .collect(),
    }
}

fn alpha(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}

impl SceneDocument {
    /// Capture the current scene, strokes and tool settings.
    ///
    /// Planets are saved at their stored positions, not their animated pose.
    pub fn capture(scene: &Scene, strokes: &[Stroke], settings: &ToolSettings) -> Self {
        Self {
            ink_color: Some(settings.ink_color),
            marker_size_progress: Some(settings.brush_size as i64),
            sun: scene.sun.map(DocPoint::from),
            moon: scene.moon.map(DocPoint::from),
            planets: scene
                .planets
                .iter()
                .map(|p| DocPlanet {
                    body: p.kind.name().to_string(),
                    x: p.position.x,
                    y: p.position.y,
                })
                .collect(),
            stars: scene.stars.iter().copied().map(DocPoint::from).collect(),
            links: scene
                .links
                .iter()
                .map(|l| DocLink {
                    a: l.a as i64,
                    b: l.b as i64,
                })
                .collect(),
            strokes: strokes
                .iter()
                .map(|s| DocStroke {
                    is_erase: s.is_erase,
                    dust: s
                        .dust
                        .iter()
                        .map(|d| DocDust {
                            x: d.position.x,
                            y: d.position.y,
                            radius: d.radius,
                            core_color: d.core_color,
                            glow_color: d.glow_color,
                            core_alpha: d.core_alpha as i64,
                            glow_alpha: d.glow_alpha as i64,
                        })
                        .collect(),
                    erasers: s
                        .erasers
                        .iter()
                        .map(|e| DocEraser {
                            x: e.position.x,
                            y: e.position.y,
                            r: e.radius,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> CodecResult<String> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }

    pub fn to_json_pretty(&self) -> CodecResult<String> {
        serde_json::to_string_pretty(self).map_err(CodecError::Encode)
    }

    /// Parse a document. Only malformed JSON or a non-object root fails.
    pub fn from_json(json: &str) -> CodecResult<Self> {
        let value: Value = serde_json::from_str(json).map_err(CodecError::Parse)?;
        let root = value
            .as_object()
            .ok_or_else(|| CodecError::Invalid("root is not an object".to_string()))?;

        Ok(Self {
            ink_color: root.opt_i64("inkColor").map(Argb::from_i64),
            marker_size_progress: root.opt_i64("markerSizeProgress"),
            sun: root.opt_object("sun").map(read_point),
            moon: root.opt_object("moon").map(read_point),
            planets: root
                .objects("planets")
                .into_iter()
                .map(|p| DocPlanet {
                    body: p.get("body").and_then(Value::as_str).unwrap_or_default().to_string(),
                    x: p.f64_or("x", 0.0),
                    y: p.f64_or("y", 0.0),
                })
                .collect(),
            stars: root.objects("stars").into_iter().map(read_point).collect(),
            links: root
                .objects("links")
                .into_iter()
                .map(|l| DocLink {
                    a: l.i64_or("a", 0),
                    b: l.i64_or("b", 0),
                })
                .collect(),
            strokes: root.objects("strokes").into_iter().map(read_stroke).collect(),
        })
    }

    /// Build live scene state. Drift phases are drawn from `rng`.
    pub fn to_scene<R: Rng + ?Sized>(&self, rng: &mut R) -> (Scene, Vec<Stroke>) {
        let mut scene = Scene::new();
        scene.sun = self.sun.map(Point::from);
        scene.moon = self.moon.map(Point::from);

        for planet in &self.planets {
            match BodyKind::from_name(&planet.body).filter(|kind| kind.is_planet()) {
                Some(kind) => {
                    scene.add_planet(Planet::new(kind, Point::new(planet.x, planet.y), DriftPhase::random(rng)));
                }
                None => log::warn!("Skipping planet with unknown body \"{}\"", planet.body),
            }
        }

        scene.stars = self.stars.iter().copied().map(Point::from).collect();

        for link in &self.links {
            let index = |v: i64| usize::try_from(v).ok();
            let added = match (index(link.a), index(link.b)) {
                (Some(a), Some(b)) => scene.add_link(a, b).is_some(),
                _ => false,
            };
            if !added {
                log::warn!("Dropping invalid link {} -> {}", link.a, link.b);
            }
        }

        let strokes = self
            .strokes
            .iter()
            .map(|s| Stroke {
                is_erase: s.is_erase,
                dust: s
                    .dust
                    .iter()
                    .map(|d| Dust {
                        position: Point::new(d.x, d.y),
                        radius: d.radius,
                        core_color: d.core_color,
                        glow_color: d.glow_color,
                        core_alpha: alpha(d.core_alpha),
                        glow_alpha: alpha(d.glow_alpha),
                    })
                    .collect(),
                erasers: s
                    .erasers
                    .iter()
                    .map(|e| EraseMark {
                        position: Point::new(e.x, e.y),
                        radius: e.r,
                    })
                    .collect(),
            })
            .collect();

        (scene, strokes)
    }
}
