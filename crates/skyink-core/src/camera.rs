//! Camera module mapping the fixed world rectangle onto the viewport.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Camera manages the view transform for the editor.
///
/// The world is a fixed rectangle centred on the origin. `offset` is the
/// world point shown at the centre of the viewport and `scale` is the number
/// of screen pixels per world unit. The camera never shows area outside the
/// world rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// World point at the centre of the viewport.
    pub offset: Point,
    /// Current zoom factor.
    pub scale: f64,
    /// Smallest scale at which the world still covers the viewport.
    pub min_scale: f64,
    /// Maximum allowed zoom factor.
    pub max_scale: f64,
    /// Viewport size in screen pixels.
    pub viewport: Size,
    /// Size of the world rectangle.
    pub world: Size,
}

impl Camera {
    /// Create a camera over a world of the given size.
    pub fn new(world: Size, max_scale: f64) -> Self {
        Self {
            offset: Point::ZERO,
            scale: 1.0,
            min_scale: 1.0,
            max_scale,
            viewport: Size::ZERO,
            world,
        }
    }

    /// Get the affine transform for rendering (world to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.viewport_center().to_vec2())
            * Affine::scale(self.scale)
            * Affine::translate(-self.offset.to_vec2())
    }

    /// Get the inverse transform for input handling (screen to world).
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(self.offset.to_vec2())
            * Affine::scale(1.0 / self.scale)
            * Affine::translate(-self.viewport_center().to_vec2())
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a screen-space length to world units at the current zoom.
    pub fn world_units(&self, screen_length: f64) -> f64 {
        screen_length / self.scale
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport.width * 0.5, self.viewport.height * 0.5)
    }

    fn has_viewport(&self) -> bool {
        self.viewport.width > 0.0 && self.viewport.height > 0.0
    }

    /// Update the viewport size and recompute the cover-fit minimum scale.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width.max(0.0), height.max(0.0));
        if !self.has_viewport() {
            return;
        }
        self.min_scale = (self.viewport.width / self.world.width)
            .max(self.viewport.height / self.world.height);
        if self.max_scale < self.min_scale {
            self.max_scale = self.min_scale;
        }
        if self.scale < self.min_scale {
            self.scale = self.min_scale;
        }
        self.clamp_offset();
    }

    /// Pan the camera by a delta in screen coordinates.
    ///
    /// Dragging content to the right moves the view centre to the left.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset -= delta / self.scale;
        self.clamp_offset();
    }

    /// Zoom the camera, keeping the world point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let before = self.screen_to_world(screen_point);
        self.scale = new_scale;
        let after = self.screen_to_world(screen_point);
        self.offset += before - after;

        self.clamp_offset();
    }

    /// Restrict the offset so the viewport stays inside the world rectangle.
    pub fn clamp_offset(&mut self) {
        if !self.has_viewport() {
            return;
        }
        let half_view_w = self.viewport.width * 0.5 / self.scale;
        let half_view_h = self.viewport.height * 0.5 / self.scale;
        let max_x = (self.world.width * 0.5 - half_view_w).max(0.0);
        let max_y = (self.world.height * 0.5 - half_view_h).max(0.0);
        self.offset.x = self.offset.x.clamp(-max_x, max_x);
        self.offset.y = self.offset.y.clamp(-max_y, max_y);
    }

    /// Camera showing the whole world at one pixel per world unit.
    pub fn fit_world(&self) -> Self {
        let mut camera = Self::new(self.world, 1.0);
        camera.set_viewport_size(self.world.width, self.world.height);
        camera.scale = 1.0;
        camera.offset = Point::ZERO;
        camera
    }
}
