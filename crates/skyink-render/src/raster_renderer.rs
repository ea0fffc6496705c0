//! CPU renderer producing RGBA images of the sky.

use crate::renderer::{RenderContext, Renderer, RendererError, RenderResult};
use crate::sprites::SpriteSet;
use crate::surface::Surface;
use image::RgbaImage;
use kurbo::Point;
use skyink_core::color::{Argb, soften_toward_white};
use skyink_core::raster::Edge;
use skyink_core::scene::BodyKind;

/// Largest accepted output side, in pixels.
const MAX_SIDE: f64 = 16384.0;

/// Link line width, in dp at scale 1.
const LINK_WIDTH_DP: f64 = 2.2;
const LINK_ALPHA: u8 = 220;
const RING_WIDTH_DP: f64 = 2.0;
/// Blur radius of the sun and moon glow, in dp.
const GLOW_BLUR_DP: f64 = 38.0;

/// Glow drawn behind a singleton body.
struct Halo {
    inner: [u8; 3],
    outer: [u8; 3],
    /// Inner radius relative to the body half size.
    radius: f64,
    /// Outer radius relative to the inner one.
    spread: f64,
    /// Outer alpha relative to the inner one.
    falloff: f64,
}

const SUN_HALO: Halo = Halo {
    inner: [255, 185, 90],
    outer: [255, 170, 70],
    radius: 0.55,
    spread: 1.35,
    falloff: 0.5,
};

const MOON_HALO: Halo = Halo {
    inner: [140, 170, 255],
    outer: [100, 140, 240],
    radius: 0.50,
    spread: 1.25,
    falloff: 0.45,
};

/// Software renderer drawing the full scene into an image.
pub struct RasterRenderer {
    sprites: SpriteSet,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new(SpriteSet::procedural())
    }
}

impl RasterRenderer {
    pub fn new(sprites: SpriteSet) -> Self {
        Self { sprites }
    }

    pub fn sprites(&self) -> &SpriteSet {
        &self.sprites
    }

    fn draw_singleton(&self, surface: &mut Surface, kind: BodyKind, center: Point, half: f64, glow: u8, blur: f64) {
        let Some(sprite) = self.sprites.body(kind) else {
            return;
        };
        let halo = if kind == BodyKind::Sun { &SUN_HALO } else { &MOON_HALO };
        let [r, g, b] = halo.inner;
        let radius = half * halo.radius;
        surface.fill_disc(center, radius, Argb::new(glow, r, g, b), Edge::Blurred(blur));
        let [r, g, b] = halo.outer;
        let outer_alpha = (glow as f64 * halo.falloff) as u8;
        surface.fill_disc(center, radius * halo.spread, Argb::new(outer_alpha, r, g, b), Edge::Blurred(blur));
        surface.draw_sprite(sprite, center, half);
    }
}

impl Renderer for RasterRenderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<RgbaImage> {
        let size = ctx.viewport_size();
        let valid = |side: f64| side.is_finite() && side >= 1.0 && side <= MAX_SIDE;
        if !valid(size.width) || !valid(size.height) {
            return Err(RendererError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }

        let canvas = ctx.canvas;
        let scene = canvas.scene();
        let config = canvas.config();
        let camera = &ctx.camera;
        let to_screen = camera.transform();

        let mut surface = Surface::new(size.width.round() as u32, size.height.round() as u32);
        surface.fill_vertical_gradient(ctx.background_top.into(), ctx.background_bottom.into());

        for star in canvas.starfield().stars() {
            let color = Argb::WHITE.with_alpha(star.alpha);
            surface.fill_disc(to_screen * star.position, star.radius, color, Edge::Sharp);
        }

        surface.draw_layer(canvas.editor.strokes().raster(), camera);

        let link_color =
            soften_toward_white(canvas.settings().ink_color, ctx.link_softening).with_alpha(LINK_ALPHA);
        let link_width = config.dp(LINK_WIDTH_DP) * camera.scale;
        for link in &scene.links {
            if let (Some(&a), Some(&b)) = (scene.stars.get(link.a), scene.stars.get(link.b)) {
                surface.stroke_segment(to_screen * a, to_screen * b, link_width, link_color);
            }
        }

        let star_half = config.dp(config.star_half_size_dp());
        let selected = canvas.selected_star();
        for (index, &star) in scene.stars.iter().enumerate() {
            let center = to_screen * star;
            if let Some(sprite) = self.sprites.star() {
                surface.draw_sprite(sprite, center, star_half);
            }
            if selected == Some(index) {
                let ring = ctx.selection_color.into();
                surface.stroke_ring(center, star_half * 0.95, config.dp(RING_WIDTH_DP), ring);
            }
        }

        for (index, planet) in scene.planets.iter().enumerate() {
            let (Some(sprite), Some(pose)) = (self.sprites.body(planet.kind), canvas.planet_pose(index)) else {
                continue;
            };
            surface.draw_sprite(sprite, to_screen * pose, config.dp(config.body_half_size_dp(planet.kind)));
        }

        let (sun_glow, moon_glow) = canvas.glow_alphas();
        let blur = config.dp(GLOW_BLUR_DP);
        if let Some(pose) = canvas.sun_pose() {
            let half = config.dp(config.body_half_size_dp(BodyKind::Sun));
            self.draw_singleton(&mut surface, BodyKind::Sun, to_screen * pose, half, sun_glow, blur);
        }
        if let Some(pose) = canvas.moon_pose() {
            let half = config.dp(config.body_half_size_dp(BodyKind::Moon));
            self.draw_singleton(&mut surface, BodyKind::Moon, to_screen * pose, half, moon_glow, blur);
        }

        Ok(surface.into_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyink_core::canvas::Canvas;
    use skyink_core::config::{EditorConfig, ToolMode};
    use skyink_core::gesture::{PointerEvent, PointerId};

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new(EditorConfig {
            world_width: 400.0,
            world_height: 400.0,
            background_stars: 0,
            ..EditorConfig::default()
        });
        canvas.set_viewport_size(200.0, 200.0);
        canvas
    }

    fn tap(canvas: &mut Canvas, x: f64, y: f64) {
        let position = Point::new(x, y);
        canvas.handle_pointer_event(&PointerEvent::Down { pointer: PointerId(0), position });
        canvas.handle_pointer_event(&PointerEvent::Up { pointer: PointerId(0), position });
    }

    #[test]
    fn test_empty_scene_is_gradient() {
        let canvas = canvas();
        let image = RasterRenderer::default().render(&RenderContext::new(&canvas)).unwrap();
        assert_eq!(image.dimensions(), (200, 200));
        let top = image.get_pixel(100, 0).0;
        let bottom = image.get_pixel(100, 199).0;
        assert!(top[2] <= 0x17 && top[3] == 255);
        assert!(bottom[2] >= 0x2F);
    }

    #[test]
    fn test_invalid_viewport() {
        let canvas = Canvas::new(EditorConfig::default());
        let result = RasterRenderer::default().render(&RenderContext::new(&canvas));
        assert!(matches!(result, Err(RendererError::InvalidSize { .. })));
    }

    #[test]
    fn test_star_drawn_only_with_artwork() {
        let mut canvas = canvas();
        canvas.set_tool(ToolMode::StarEdit);
        tap(&mut canvas, 100.0, 100.0);
        let ctx = RenderContext::new(&canvas);

        let with_art = RasterRenderer::default().render(&ctx).unwrap();
        let without_art = RasterRenderer::new(SpriteSet::empty()).render(&ctx).unwrap();
        let background = RasterRenderer::new(SpriteSet::empty())
            .render(&RenderContext::new(&self::canvas()))
            .unwrap();
        assert!(with_art.get_pixel(100, 100).0[0] > 200);
        assert_eq!(without_art, background);
    }

    #[test]
    fn test_selected_star_gets_ring() {
        let mut canvas = canvas();
        canvas.set_tool(ToolMode::StarEdit);
        tap(&mut canvas, 100.0, 100.0);
        let renderer = &mut RasterRenderer::new(SpriteSet::empty());
        let plain = renderer.render(&RenderContext::new(&canvas)).unwrap();
        tap(&mut canvas, 100.0, 100.0);
        assert_eq!(canvas.selected_star(), Some(0));
        let ringed = renderer.render(&RenderContext::new(&canvas)).unwrap();
        let ring_x = (100.0 + 34.0 * 0.95) as u32;
        assert!(ringed.get_pixel(ring_x, 100).0[0] > plain.get_pixel(ring_x, 100).0[0]);
    }

    #[test]
    fn test_painted_dust_visible() {
        let mut canvas = canvas();
        canvas.set_tool(ToolMode::Paint);
        let position = Point::new(100.0, 100.0);
        canvas.handle_pointer_event(&PointerEvent::Down { pointer: PointerId(0), position });
        canvas.handle_pointer_event(&PointerEvent::Up { pointer: PointerId(0), position });
        let image = RasterRenderer::new(SpriteSet::empty())
            .render(&RenderContext::new(&canvas))
            .unwrap();
        let background = RasterRenderer::new(SpriteSet::empty())
            .render(&RenderContext::new(&self::canvas()))
            .unwrap();
        assert_ne!(image, background);
    }

    #[test]
    fn test_full_scene_size() {
        let canvas = canvas();
        let image = RasterRenderer::default()
            .render(&RenderContext::new(&canvas).full_scene())
            .unwrap();
        assert_eq!(image.dimensions(), (400, 400));
    }
}
