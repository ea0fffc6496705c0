//! World-sized RGBA raster that painted dust is composited into.
//!
//! Pixel `(0, 0)` covers the world's top-left corner and one pixel spans one
//! world unit. Colours are stored with straight alpha and all compositing is
//! plain arithmetic, so replaying the same stamps always yields the same
//! bytes.

use crate::color::Argb;
use image::{Rgba, RgbaImage};
use kurbo::{Point, Size};

/// How the rim of a disc fades out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    /// One-pixel anti-aliased rim.
    Sharp,
    /// Soft rim of the given width, centred on the radius.
    Blurred(f64),
}

impl Edge {
    /// Fraction of a pixel at `distance` from the centre covered by a disc.
    pub fn coverage(self, radius: f64, distance: f64) -> f64 {
        match self {
            Edge::Sharp => (radius + 0.5 - distance).clamp(0.0, 1.0),
            Edge::Blurred(width) if width > 0.0 => {
                let t = ((radius + width * 0.5 - distance) / width).clamp(0.0, 1.0);
                t * t * (3.0 - 2.0 * t)
            }
            Edge::Blurred(_) => Edge::Sharp.coverage(radius, distance),
        }
    }

    /// How far past the radius coverage can be non-zero.
    pub fn reach(self) -> f64 {
        match self {
            Edge::Sharp => 1.0,
            Edge::Blurred(width) => width.max(0.0) * 0.5 + 1.0,
        }
    }
}

/// Dust raster covering the world rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct DustRaster {
    image: RgbaImage,
    origin: Point,
}

impl DustRaster {
    /// Transparent raster for a world of the given size.
    pub fn new(world: Size) -> Self {
        let width = world.width.ceil().max(1.0) as u32;
        let height = world.height.ceil().max(1.0) as u32;
        Self {
            image: RgbaImage::new(width, height),
            origin: Point::new(-world.width * 0.5, -world.height * 0.5),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// World coordinate of the raster's top-left corner.
    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Pixel at a world point, if it lies on the raster.
    pub fn pixel_at(&self, world: Point) -> Option<Argb> {
        let x = (world.x - self.origin.x).floor();
        let y = (world.y - self.origin.y).floor();
        if x < 0.0 || y < 0.0 || x >= self.width() as f64 || y >= self.height() as f64 {
            return None;
        }
        let Rgba([r, g, b, a]) = *self.image.get_pixel(x as u32, y as u32);
        Some(Argb::new(a, r, g, b))
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    /// Reset to fully transparent.
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Visit every pixel whose centre lies within reach of a disc.
    fn for_disc(&mut self, center: Point, radius: f64, edge: Edge, mut visit: impl FnMut(&mut Rgba<u8>, f64)) {
        if radius.is_nan() || radius <= 0.0 || !center.x.is_finite() || !center.y.is_finite() {
            return;
        }
        let reach = radius + edge.reach();
        let cx = center.x - self.origin.x;
        let cy = center.y - self.origin.y;
        let x0 = (cx - reach).floor().max(0.0) as u32;
        let y0 = (cy - reach).floor().max(0.0) as u32;
        let x1 = ((cx + reach).ceil().max(0.0) as u32).min(self.width());
        let y1 = ((cy + reach).ceil().max(0.0) as u32).min(self.height());

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let coverage = edge.coverage(radius, (dx * dx + dy * dy).sqrt());
                if coverage > 0.0 {
                    visit(self.image.get_pixel_mut(x, y), coverage);
                }
            }
        }
    }

    /// Composite a disc of `color` source-over onto the raster.
    pub fn fill_disc(&mut self, center: Point, radius: f64, color: Argb, edge: Edge) {
        let source_alpha = color.a() as f64 / 255.0;
        if source_alpha <= 0.0 {
            return;
        }
        let source = [color.r() as f64, color.g() as f64, color.b() as f64];
        self.for_disc(center, radius, edge, |pixel, coverage| {
            let sa = source_alpha * coverage;
            let da = pixel.0[3] as f64 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                return;
            }
            for (channel, &sc) in source.iter().enumerate() {
                let dc = pixel.0[channel] as f64;
                let value = (sc * sa + dc * da * (1.0 - sa)) / out_a;
                pixel.0[channel] = value.round().clamp(0.0, 255.0) as u8;
            }
            pixel.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        });
    }

    /// Scale down destination alpha inside a disc, proportional to coverage.
    pub fn erase_disc(&mut self, center: Point, radius: f64) {
        self.for_disc(center, radius, Edge::Sharp, |pixel, coverage| {
            let alpha = pixel.0[3] as f64 * (1.0 - coverage);
            pixel.0[3] = alpha.round().clamp(0.0, 255.0) as u8;
        });
    }
}
