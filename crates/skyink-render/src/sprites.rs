//! Body and star artwork.
//!
//! Artwork is optional per kind: anything missing is simply not drawn.

use image::{Rgba, RgbaImage};
use kurbo::Point;
use skyink_core::raster::Edge;
use skyink_core::scene::BodyKind;
use std::collections::HashMap;
use std::path::Path;

/// Alpha at or below which a pixel counts as empty when trimming.
const TRIM_ALPHA_THRESHOLD: u8 = 10;

/// Side length of generated sprites.
const PROCEDURAL_SIZE: u32 = 128;

const EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

/// Artwork for each body kind plus the constellation star.
#[derive(Debug, Clone, Default)]
pub struct SpriteSet {
    bodies: HashMap<BodyKind, RgbaImage>,
    star: Option<RgbaImage>,
}

fn all_kinds() -> impl Iterator<Item = BodyKind> {
    [BodyKind::Sun, BodyKind::Moon].into_iter().chain(BodyKind::PLANETS)
}

impl SpriteSet {
    /// A set with no artwork at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `<name>.png` (or webp/jpg) for every body plus `star` from `dir`.
    ///
    /// Missing or undecodable files leave that kind without artwork.
    pub fn load_dir(dir: &Path) -> Self {
        let mut set = Self::empty();
        for kind in all_kinds() {
            let name = kind.name().to_ascii_lowercase();
            if let Some(image) = load_named(dir, &name) {
                set.bodies.insert(kind, image);
            }
        }
        set.star = load_named(dir, "star").map(|image| trim_transparent(&image));
        log::info!(
            "Loaded {} body sprites from {} (star: {})",
            set.bodies.len(),
            dir.display(),
            set.star.is_some()
        );
        set
    }

    /// Plain shaded discs for every body and a glowing star.
    pub fn procedural() -> Self {
        let mut set = Self::empty();
        for kind in all_kinds() {
            set.bodies.insert(kind, shaded_disc(body_tint(kind)));
        }
        set.star = Some(sparkle());
        set
    }

    pub fn body(&self, kind: BodyKind) -> Option<&RgbaImage> {
        self.bodies.get(&kind)
    }

    pub fn star(&self) -> Option<&RgbaImage> {
        self.star.as_ref()
    }

    pub fn set_body(&mut self, kind: BodyKind, image: RgbaImage) {
        self.bodies.insert(kind, image);
    }

    pub fn set_star(&mut self, image: RgbaImage) {
        self.star = Some(trim_transparent(&image));
    }
}

fn load_named(dir: &Path, name: &str) -> Option<RgbaImage> {
    let path = EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|path| path.exists());
    let Some(path) = path else {
        log::warn!("No artwork for {name} in {}", dir.display());
        return None;
    };
    match image::open(&path) {
        Ok(image) => Some(image.to_rgba8()),
        Err(e) => {
            log::warn!("Failed to decode {}: {e}", path.display());
            None
        }
    }
}

/// Crop fully transparent margins. Images with no visible pixel are
/// returned unchanged.
pub fn trim_transparent(image: &RgbaImage) -> RgbaImage {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[3] > TRIM_ALPHA_THRESHOLD {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    match bounds {
        Some((x0, y0, x1, y1)) => {
            image::imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
        }
        None => image.clone(),
    }
}

fn body_tint(kind: BodyKind) -> [u8; 3] {
    match kind {
        BodyKind::Sun => [255, 196, 92],
        BodyKind::Moon => [220, 224, 236],
        BodyKind::Mercury => [168, 160, 152],
        BodyKind::Venus => [232, 200, 142],
        BodyKind::Earth => [82, 140, 220],
        BodyKind::Mars => [212, 102, 62],
        BodyKind::Jupiter => [216, 176, 132],
        BodyKind::Saturn => [226, 202, 150],
        BodyKind::Uranus => [152, 216, 226],
        BodyKind::Neptune => [82, 112, 222],
    }
}

/// Disc lit from the upper left.
fn shaded_disc(tint: [u8; 3]) -> RgbaImage {
    let size = PROCEDURAL_SIZE as f64;
    let radius = size * 0.5 - 1.0;
    let center = Point::new(size * 0.5, size * 0.5);
    let light = Point::new(size * 0.35, size * 0.35);
    RgbaImage::from_fn(PROCEDURAL_SIZE, PROCEDURAL_SIZE, |x, y| {
        let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
        let coverage = Edge::Sharp.coverage(radius, (p - center).hypot());
        let shade = (1.0 - (p - light).hypot() / (size * 1.1)).clamp(0.35, 1.0);
        let [r, g, b] = tint.map(|c| (c as f64 * shade).round() as u8);
        Rgba([r, g, b, (coverage * 255.0).round() as u8])
    })
}

/// Soft white point with a four-way glint.
fn sparkle() -> RgbaImage {
    let size = PROCEDURAL_SIZE as f64;
    let center = Point::new(size * 0.5, size * 0.5);
    RgbaImage::from_fn(PROCEDURAL_SIZE, PROCEDURAL_SIZE, |x, y| {
        let d = Point::new(x as f64 + 0.5, y as f64 + 0.5) - center;
        let core = Edge::Blurred(size * 0.2).coverage(size * 0.12, d.hypot());
        let arm = |along: f64, across: f64| {
            let reach = (1.0 - along.abs() / (size * 0.5)).max(0.0);
            (1.0 - across.abs() / 3.0).max(0.0) * reach
        };
        let glint = arm(d.x, d.y).max(arm(d.y, d.x));
        let alpha = core.max(glint).clamp(0.0, 1.0);
        Rgba([255, 255, 240, (alpha * 255.0).round() as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_procedural_covers_every_kind() {
        let set = SpriteSet::procedural();
        for kind in all_kinds() {
            let sprite = set.body(kind).unwrap();
            assert_eq!(sprite.get_pixel(64, 64).0[3], 255);
            assert_eq!(sprite.get_pixel(0, 0).0[3], 0);
        }
        assert!(set.star().is_some());
    }

    #[test]
    fn test_trim_transparent() {
        let mut image = RgbaImage::new(10, 8);
        image.put_pixel(3, 2, Rgba([255, 255, 255, 255]));
        image.put_pixel(6, 5, Rgba([255, 255, 255, 200]));
        image.put_pixel(9, 7, Rgba([255, 255, 255, 5]));
        let trimmed = trim_transparent(&image);
        assert_eq!(trimmed.dimensions(), (4, 4));

        let blank = RgbaImage::new(3, 3);
        assert_eq!(trim_transparent(&blank).dimensions(), (3, 3));
    }

    #[test]
    fn test_load_dir_skips_missing_and_corrupt() {
        let dir = tempdir().unwrap();
        RgbaImage::from_pixel(4, 4, Rgba([200, 60, 40, 255]))
            .save(dir.path().join("mars.png"))
            .unwrap();
        let mut star = RgbaImage::new(6, 6);
        star.put_pixel(2, 2, Rgba([255, 255, 255, 255]));
        star.save(dir.path().join("star.png")).unwrap();
        std::fs::write(dir.path().join("venus.png"), b"not an image").unwrap();

        let set = SpriteSet::load_dir(dir.path());
        assert_eq!(set.body(BodyKind::Mars).map(|s| s.dimensions()), Some((4, 4)));
        assert!(set.body(BodyKind::Venus).is_none());
        assert!(set.body(BodyKind::Sun).is_none());
        assert_eq!(set.star().map(|s| s.dimensions()), Some((1, 1)));
    }
}
