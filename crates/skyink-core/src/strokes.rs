//! The stroke layer: painted dust and erase marks plus their raster cache.
//!
//! Strokes are the source of truth. The raster is a cache that
//! [`StrokeLayer::rebuild_raster`] can always reproduce from the stroke list.

use crate::color::{Argb, jitter_ink, to_hsv};
use crate::config::{EditorConfig, ToolSettings};
use crate::raster::{DustRaster, Edge};
use kurbo::{Point, Size};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Glow disc radius relative to the core radius.
const GLOW_RADIUS_FACTOR: f64 = 1.35;

/// One soft particle of a paint stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Dust {
    pub position: Point,
    pub radius: f64,
    pub core_color: Argb,
    pub glow_color: Argb,
    pub core_alpha: u8,
    pub glow_alpha: u8,
}

impl Dust {
    /// Glow first, then the core on top.
    pub fn composite(&self, raster: &mut DustRaster, glow_blur: f64) {
        raster.fill_disc(
            self.position,
            self.radius * GLOW_RADIUS_FACTOR,
            self.glow_color.with_alpha(self.glow_alpha),
            Edge::Blurred(glow_blur),
        );
        raster.fill_disc(
            self.position,
            self.radius,
            self.core_color.with_alpha(self.core_alpha),
            Edge::Sharp,
        );
    }
}

/// One circular clear of an erase stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraseMark {
    pub position: Point,
    pub radius: f64,
}

impl EraseMark {
    pub fn apply(&self, raster: &mut DustRaster) {
        raster.erase_disc(self.position, self.radius);
    }
}

/// One continuous paint or erase gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stroke {
    pub is_erase: bool,
    pub dust: Vec<Dust>,
    pub erasers: Vec<EraseMark>,
}

impl Stroke {
    pub fn new(is_erase: bool) -> Self {
        Self {
            is_erase,
            ..Self::default()
        }
    }

    /// Replay this stroke onto a raster.
    pub fn replay(&self, raster: &mut DustRaster, glow_blur: f64) {
        for dust in &self.dust {
            dust.composite(raster, glow_blur);
        }
        for mark in &self.erasers {
            mark.apply(raster);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dust.is_empty() && self.erasers.is_empty()
    }
}

/// Paint size multiplier for a brush progress of 0..=100.
pub fn paint_size_multiplier(progress: f64) -> f64 {
    0.45 + progress / 100.0 * 1.35
}

/// Erase size multiplier for a brush progress of 0..=100.
pub fn erase_size_multiplier(progress: f64) -> f64 {
    0.55 + progress / 100.0 * 1.65
}

/// Number of dust particles in one paint stamp.
pub fn dust_count(size_multiplier: f64, heavier: bool) -> usize {
    let base = if heavier { 70.0 } else { 35.0 };
    (base * (0.75 + size_multiplier * 0.55)) as usize
}

/// Radius of one erase mark.
pub fn erase_radius(size_multiplier: f64, heavier: bool) -> f64 {
    (if heavier { 55.0 } else { 38.0 }) * size_multiplier
}

/// Ordered strokes plus the raster they composite into.
#[derive(Debug, Clone)]
pub struct StrokeLayer {
    strokes: Vec<Stroke>,
    raster: DustRaster,
    rng: StdRng,
    /// Whether the last stroke still accepts stamps.
    open: bool,
    /// Last point a stamp landed on, for interpolation.
    last_stamp: Option<Point>,
    brush_step: f64,
    glow_blur: f64,
}

impl StrokeLayer {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            strokes: Vec::new(),
            raster: DustRaster::new(Size::new(config.world_width, config.world_height)),
            rng: StdRng::seed_from_u64(config.seed),
            open: false,
            last_stamp: None,
            brush_step: config.brush_step,
            glow_blur: config.dust_glow_blur,
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn raster(&self) -> &DustRaster {
        &self.raster
    }

    /// Kind of the stroke currently accepting stamps, if any.
    pub fn active_kind(&self) -> Option<bool> {
        if self.open {
            self.strokes.last().map(|stroke| stroke.is_erase)
        } else {
            None
        }
    }

    /// Append a new stroke and make it the stamp target.
    pub fn begin_stroke(&mut self, is_erase: bool) -> &Stroke {
        self.open = true;
        self.last_stamp = None;
        self.strokes.push(Stroke::new(is_erase));
        log::debug!("Began {} stroke #{}", if is_erase { "erase" } else { "paint" }, self.strokes.len());
        &self.strokes[self.strokes.len() - 1]
    }

    /// Close the active stroke. Later stamps need a new stroke.
    pub fn end_stroke(&mut self) {
        self.open = false;
        self.last_stamp = None;
    }

    fn active_stroke(&mut self) -> Option<&mut Stroke> {
        if self.open { self.strokes.last_mut() } else { None }
    }

    /// Scatter a cloud of dust around `point` into the active paint stroke.
    ///
    /// Returns how many particles were added; zero without an open paint
    /// stroke.
    pub fn stamp_paint(&mut self, point: Point, settings: &ToolSettings, heavier: bool) -> usize {
        if self.active_kind() != Some(false) {
            return 0;
        }
        let size = paint_size_multiplier(settings.brush_size as f64);
        let base = 55.0 * size;
        let spread = if heavier { 1.2 } else { 1.0 };
        let max_radius_jitter = if heavier { 20.0 } else { 14.0 };
        let ink = to_hsv(settings.ink_color);
        let count = dust_count(size, heavier);

        let mut stamp = Vec::with_capacity(count);
        for _ in 0..count {
            let gx: f64 = self.rng.sample(StandardNormal);
            let gy: f64 = self.rng.sample(StandardNormal);
            let offset_x = gx * base * spread;
            let offset_y = gy * base * 0.55 * spread;
            let radius = (6.0 + self.rng.r#gen::<f64>() * max_radius_jitter) * size;
            let tint = jitter_ink(ink, &mut self.rng);
            let core_alpha = 18 + self.rng.gen_range(0..40u8);
            let glow_alpha = 10 + self.rng.gen_range(0..22u8);
            stamp.push(Dust {
                position: Point::new(point.x + offset_x, point.y + offset_y),
                radius,
                core_color: tint.core,
                glow_color: tint.glow,
                core_alpha,
                glow_alpha,
            });
        }

        for dust in &stamp {
            dust.composite(&mut self.raster, self.glow_blur);
        }
        if let Some(stroke) = self.active_stroke() {
            stroke.dust.extend(stamp);
        }
        self.last_stamp = Some(point);
        count
    }

    /// Clear a disc around `point` into the active erase stroke.
    pub fn stamp_erase(&mut self, point: Point, settings: &ToolSettings, heavier: bool) -> bool {
        if self.active_kind() != Some(true) {
            return false;
        }
        let mark = EraseMark {
            position: point,
            radius: erase_radius(erase_size_multiplier(settings.brush_size as f64), heavier),
        };
        mark.apply(&mut self.raster);
        if let Some(stroke) = self.active_stroke() {
            stroke.erasers.push(mark);
        }
        self.last_stamp = Some(point);
        true
    }

    /// Stamp evenly along the segment from the last stamp to `point`.
    ///
    /// Stamps land every `brush_step` world units; the remainder carries over
    /// to the next call so slow drags still stamp. Returns the stamp count.
    pub fn continue_stroke(&mut self, point: Point, settings: &ToolSettings) -> usize {
        let Some(is_erase) = self.active_kind() else {
            return 0;
        };
        let Some(from) = self.last_stamp else {
            return usize::from(self.stamp(point, settings, is_erase));
        };
        let segment = point - from;
        let length = segment.hypot();
        if self.brush_step <= 0.0 || length < self.brush_step {
            return 0;
        }
        let direction = segment / length;
        let steps = (length / self.brush_step).floor() as usize;
        let mut stamped = 0;
        for i in 1..=steps {
            let at = from + direction * (self.brush_step * i as f64);
            if self.stamp(at, settings, is_erase) {
                stamped += 1;
            }
        }
        stamped
    }

    fn stamp(&mut self, point: Point, settings: &ToolSettings, is_erase: bool) -> bool {
        if is_erase {
            self.stamp_erase(point, settings, false)
        } else {
            self.stamp_paint(point, settings, false) > 0
        }
    }

    /// Clear the raster and replay every stroke in order.
    pub fn rebuild_raster(&mut self) {
        self.raster.clear();
        for stroke in &self.strokes {
            stroke.replay(&mut self.raster, self.glow_blur);
        }
        log::debug!("Rebuilt dust raster from {} strokes", self.strokes.len());
    }

    /// Remove the newest stroke and rebuild the raster.
    pub fn pop_stroke(&mut self) -> Option<Stroke> {
        let stroke = self.strokes.pop();
        self.end_stroke();
        self.rebuild_raster();
        stroke
    }

    /// Replace the whole stroke list and rebuild the raster.
    pub fn replace_strokes(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes;
        self.end_stroke();
        self.rebuild_raster();
    }

    /// Remove every stroke and blank the raster.
    pub fn clear(&mut self) {
        self.replace_strokes(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EditorConfig {
        EditorConfig {
            world_width: 400.0,
            world_height: 400.0,
            ..EditorConfig::default()
        }
    }

    fn layer() -> StrokeLayer {
        StrokeLayer::new(&small_config())
    }

    #[test]
    fn test_stamp_requires_open_stroke() {
        let mut layer = layer();
        let settings = ToolSettings::default();
        assert_eq!(layer.stamp_paint(Point::ZERO, &settings, true), 0);
        assert!(!layer.stamp_erase(Point::ZERO, &settings, true));
        layer.begin_stroke(true);
        assert_eq!(layer.stamp_paint(Point::ZERO, &settings, true), 0);
        assert!(layer.raster().is_blank());
    }

    #[test]
    fn test_paint_stamp_counts() {
        let mut layer = layer();
        let settings = ToolSettings::default();
        layer.begin_stroke(false);
        let heavy = layer.stamp_paint(Point::ZERO, &settings, true);
        let light = layer.stamp_paint(Point::ZERO, &settings, false);
        let size = paint_size_multiplier(35.0);
        assert_eq!(heavy, dust_count(size, true));
        assert_eq!(light, dust_count(size, false));
        assert!(heavy > light);
        assert_eq!(layer.strokes()[0].dust.len(), heavy + light);
        assert!(!layer.raster().is_blank());
    }

    #[test]
    fn test_dust_properties_bounded() {
        let mut layer = layer();
        let mut settings = ToolSettings::default();
        settings.set_brush_size(100);
        layer.begin_stroke(false);
        layer.stamp_paint(Point::ZERO, &settings, false);
        let size = paint_size_multiplier(100.0);
        for dust in &layer.strokes()[0].dust {
            assert!(dust.radius >= 6.0 * size && dust.radius <= 20.0 * size);
            assert!((18..58).contains(&dust.core_alpha));
            assert!((10..32).contains(&dust.glow_alpha));
        }
    }

    #[test]
    fn test_erase_radius() {
        let mut layer = layer();
        let settings = ToolSettings::default();
        layer.begin_stroke(true);
        assert!(layer.stamp_erase(Point::new(5.0, 5.0), &settings, true));
        let mark = layer.strokes()[0].erasers[0];
        assert!((mark.radius - 55.0 * erase_size_multiplier(35.0)).abs() < 1e-12);
        assert_eq!(mark.position, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_continue_interpolates_evenly() {
        let mut layer = layer();
        let settings = ToolSettings::default();
        layer.begin_stroke(true);
        layer.stamp_erase(Point::ZERO, &settings, true);
        assert_eq!(layer.continue_stroke(Point::new(100.0, 0.0), &settings), 5);
        let xs: Vec<f64> = layer.strokes()[0].erasers.iter().map(|m| m.position.x).collect();
        for (i, x) in xs.iter().enumerate() {
            assert!((x - 18.0 * i as f64).abs() < 1e-9);
        }
        // The leftover 10 units carry into the next move.
        assert_eq!(layer.continue_stroke(Point::new(110.0, 0.0), &settings), 1);
        assert_eq!(layer.continue_stroke(Point::new(112.0, 0.0), &settings), 0);
    }

    #[test]
    fn test_rebuild_reproduces_raster() {
        let mut layer = layer();
        let settings = ToolSettings::default();
        layer.begin_stroke(false);
        layer.stamp_paint(Point::new(-20.0, 10.0), &settings, true);
        layer.continue_stroke(Point::new(60.0, 40.0), &settings);
        layer.end_stroke();
        layer.begin_stroke(true);
        layer.stamp_erase(Point::new(0.0, 0.0), &settings, false);
        layer.end_stroke();

        let live = layer.raster().clone();
        layer.rebuild_raster();
        assert_eq!(layer.raster(), &live);
    }

    #[test]
    fn test_pop_stroke_rolls_back_raster() {
        let mut layer = layer();
        let settings = ToolSettings::default();
        layer.begin_stroke(false);
        layer.stamp_paint(Point::ZERO, &settings, true);
        layer.end_stroke();
        let before = layer.raster().clone();

        layer.begin_stroke(true);
        layer.stamp_erase(Point::ZERO, &settings, true);
        layer.end_stroke();
        assert_ne!(layer.raster(), &before);

        assert!(layer.pop_stroke().is_some_and(|s| s.is_erase));
        assert_eq!(layer.raster(), &before);
    }

    #[test]
    fn test_end_stroke_closes() {
        let mut layer = layer();
        layer.begin_stroke(false);
        assert_eq!(layer.active_kind(), Some(false));
        layer.end_stroke();
        assert_eq!(layer.active_kind(), None);
        assert_eq!(layer.continue_stroke(Point::new(50.0, 0.0), &ToolSettings::default()), 0);
    }
}
