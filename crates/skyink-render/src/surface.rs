//! Pixel-level drawing onto an RGBA image in screen space.

use image::{Rgba, RgbaImage};
use kurbo::{Point, Rect};
use skyink_core::camera::Camera;
use skyink_core::color::Argb;
use skyink_core::raster::{DustRaster, Edge};

/// A screen-sized RGBA target.
pub(crate) struct Surface {
    image: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Pixel index range covering `rect`, clipped to the image.
    fn span(&self, rect: Rect) -> (u32, u32, u32, u32) {
        let clip = |v: f64, max: u32| (v.max(0.0) as u32).min(max);
        (
            clip(rect.x0.floor(), self.image.width()),
            clip(rect.y0.floor(), self.image.height()),
            clip(rect.x1.ceil(), self.image.width()),
            clip(rect.y1.ceil(), self.image.height()),
        )
    }

    /// Source-over blend with straight alpha.
    fn blend(&mut self, x: u32, y: u32, color: Argb, coverage: f64) {
        let sa = color.a() as f64 / 255.0 * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x, y);
        let da = pixel.0[3] as f64 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let source = [color.r(), color.g(), color.b()];
        for (channel, &sc) in source.iter().enumerate() {
            let dc = pixel.0[channel] as f64;
            let value = (sc as f64 * sa + dc * da * (1.0 - sa)) / out_a;
            pixel.0[channel] = value.round().clamp(0.0, 255.0) as u8;
        }
        pixel.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    /// Opaque vertical gradient over the whole image.
    pub fn fill_vertical_gradient(&mut self, top: Argb, bottom: Argb) {
        let height = self.image.height().max(1) as f64;
        let lerp = |a: u8, b: u8, t: f64| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        for (_, y, pixel) in self.image.enumerate_pixels_mut() {
            let t = (y as f64 + 0.5) / height;
            *pixel = Rgba([
                lerp(top.r(), bottom.r(), t),
                lerp(top.g(), bottom.g(), t),
                lerp(top.b(), bottom.b(), t),
                255,
            ]);
        }
    }

    /// Filled disc centred on a screen point.
    pub fn fill_disc(&mut self, center: Point, radius: f64, color: Argb, edge: Edge) {
        if radius.is_nan() || radius <= 0.0 || !center.x.is_finite() || !center.y.is_finite() {
            return;
        }
        let reach = radius + edge.reach();
        let (x0, y0, x1, y1) = self.span(Rect::from_center_size(center, (reach * 2.0, reach * 2.0)));
        for y in y0..y1 {
            for x in x0..x1 {
                let d = (Point::new(x as f64 + 0.5, y as f64 + 0.5) - center).hypot();
                let coverage = edge.coverage(radius, d);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    /// Line segment with round caps.
    pub fn stroke_segment(&mut self, a: Point, b: Point, width: f64, color: Argb) {
        let half = width * 0.5;
        if half.is_nan() || half <= 0.0 {
            return;
        }
        let bounds = Rect::from_points(a, b).inflate(half + 1.0, half + 1.0);
        let (x0, y0, x1, y1) = self.span(bounds);
        let ab = b - a;
        let length2 = ab.hypot2();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let t = if length2 > 0.0 { ((p - a).dot(ab) / length2).clamp(0.0, 1.0) } else { 0.0 };
                let d = (p - (a + ab * t)).hypot();
                let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    /// Circle outline.
    pub fn stroke_ring(&mut self, center: Point, radius: f64, width: f64, color: Argb) {
        let half = width * 0.5;
        if radius.is_nan() || radius <= 0.0 || half.is_nan() || half <= 0.0 {
            return;
        }
        let reach = radius + half + 1.0;
        let (x0, y0, x1, y1) = self.span(Rect::from_center_size(center, (reach * 2.0, reach * 2.0)));
        for y in y0..y1 {
            for x in x0..x1 {
                let d = (Point::new(x as f64 + 0.5, y as f64 + 0.5) - center).hypot();
                let coverage = (half + 0.5 - (d - radius).abs()).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    /// Draw `sprite` centred on `center`, its longer side spanning
    /// `2 * half_size` pixels, aspect kept.
    pub fn draw_sprite(&mut self, sprite: &RgbaImage, center: Point, half_size: f64) {
        let (sw, sh) = sprite.dimensions();
        if sw == 0 || sh == 0 || half_size.is_nan() || half_size <= 0.0 {
            return;
        }
        let aspect = sw as f64 / sh as f64;
        let (half_w, half_h) = if aspect >= 1.0 {
            (half_size, half_size / aspect)
        } else {
            (half_size * aspect, half_size)
        };
        let dest = Rect::new(center.x - half_w, center.y - half_h, center.x + half_w, center.y + half_h);
        let (x0, y0, x1, y1) = self.span(dest);
        for y in y0..y1 {
            for x in x0..x1 {
                let u = (x as f64 + 0.5 - dest.x0) / dest.width() * sw as f64 - 0.5;
                let v = (y as f64 + 0.5 - dest.y0) / dest.height() * sh as f64 - 0.5;
                if let Some(color) = sample_bilinear(sprite, u, v) {
                    self.blend(x, y, color, 1.0);
                }
            }
        }
    }

    /// Composite the world dust raster as seen through `camera`.
    pub fn draw_layer(&mut self, raster: &DustRaster, camera: &Camera) {
        let to_world = camera.inverse_transform();
        for y in 0..self.image.height() {
            for x in 0..self.image.width() {
                let world = to_world * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if let Some(color) = raster.pixel_at(world) {
                    if color.a() > 0 {
                        self.blend(x, y, color, 1.0);
                    }
                }
            }
        }
    }
}

/// Bilinear sample at continuous pixel coordinates, interpolating
/// premultiplied colour. `None` where the sample is fully transparent.
fn sample_bilinear(image: &RgbaImage, u: f64, v: f64) -> Option<Argb> {
    let (w, h) = image.dimensions();
    let u = u.clamp(0.0, (w - 1) as f64);
    let v = v.clamp(0.0, (h - 1) as f64);
    let (ux, vy) = (u.floor(), v.floor());
    let (fx, fy) = (u - ux, v - vy);
    let (x0, y0) = (ux as u32, vy as u32);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));

    let mut acc = [0.0f64; 4];
    for (x, y, weight) in [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ] {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let alpha = a as f64 / 255.0 * weight;
        acc[0] += r as f64 * alpha;
        acc[1] += g as f64 * alpha;
        acc[2] += b as f64 * alpha;
        acc[3] += alpha;
    }
    if acc[3] <= 1.0 / 512.0 {
        return None;
    }
    let channel = |c: f64| (c / acc[3]).round().clamp(0.0, 255.0) as u8;
    Some(Argb::new(
        (acc[3] * 255.0).round().clamp(0.0, 255.0) as u8,
        channel(acc[0]),
        channel(acc[1]),
        channel(acc[2]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        let mut surface = Surface::new(40, 40);
        surface.fill_vertical_gradient(Argb::from_rgb(0, 0, 0), Argb::from_rgb(0, 0, 0));
        surface
    }

    fn pixel(surface: &Surface, x: u32, y: u32) -> [u8; 4] {
        surface.image.get_pixel(x, y).0
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut surface = Surface::new(4, 100);
        surface.fill_vertical_gradient(Argb::from_rgb(0, 0, 0), Argb::from_rgb(200, 100, 0));
        let top = pixel(&surface, 0, 0);
        let bottom = pixel(&surface, 3, 99);
        assert!(top[0] <= 2 && top[3] == 255);
        assert!(bottom[0] >= 198 && bottom[1] >= 98);
    }

    #[test]
    fn test_disc_is_clipped() {
        let mut surface = surface();
        surface.fill_disc(Point::new(0.0, 0.0), 10.0, Argb::WHITE, Edge::Sharp);
        assert_eq!(pixel(&surface, 2, 2), [255, 255, 255, 255]);
        assert_eq!(pixel(&surface, 30, 30), [0, 0, 0, 255]);
    }

    #[test]
    fn test_segment_covers_midpoint() {
        let mut surface = surface();
        surface.stroke_segment(Point::new(5.0, 20.0), Point::new(35.0, 20.0), 3.0, Argb::WHITE);
        assert_eq!(pixel(&surface, 20, 19), [255, 255, 255, 255]);
        assert_eq!(pixel(&surface, 20, 10), [0, 0, 0, 255]);
    }

    #[test]
    fn test_ring_is_hollow() {
        let mut surface = surface();
        surface.stroke_ring(Point::new(20.0, 20.0), 10.0, 2.0, Argb::WHITE);
        assert_eq!(pixel(&surface, 20, 20), [0, 0, 0, 255]);
        assert!(pixel(&surface, 29, 19)[0] > 128);
    }

    #[test]
    fn test_sprite_keeps_aspect() {
        let mut surface = surface();
        let sprite = RgbaImage::from_pixel(20, 10, Rgba([255, 0, 0, 255]));
        surface.draw_sprite(&sprite, Point::new(20.0, 20.0), 10.0);
        assert_eq!(pixel(&surface, 11, 20), [255, 0, 0, 255]);
        assert_eq!(pixel(&surface, 20, 12), [0, 0, 0, 255]);
    }
}
