//! Renderer trait abstraction.

use image::RgbaImage;
use kurbo::Size;
use peniko::Color;
use skyink_core::camera::Camera;
use skyink_core::canvas::Canvas;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid render size: {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Artwork unavailable: {0}")]
    Artwork(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a Canvas,
    /// View to render through. Defaults to the canvas camera.
    pub camera: Camera,
    /// Background gradient, top edge.
    pub background_top: Color,
    /// Background gradient, bottom edge.
    pub background_bottom: Color,
    /// How far link lines are blended from the ink toward white.
    pub link_softening: f64,
    /// Ring drawn around the star waiting to be linked.
    pub selection_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a render context that shows what the canvas camera sees.
    pub fn new(canvas: &'a Canvas) -> Self {
        Self {
            canvas,
            camera: canvas.camera.clone(),
            background_top: Color::from_rgba8(0x07, 0x07, 0x16, 255),
            background_bottom: Color::from_rgba8(0x1A, 0x10, 0x30, 255),
            link_softening: 0.78,
            selection_color: Color::from_rgba8(255, 255, 255, 230),
        }
    }

    /// Render through a different camera.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Render the whole world at one pixel per world unit.
    pub fn full_scene(self) -> Self {
        let camera = self.canvas.camera.fit_world();
        self.with_camera(camera)
    }

    /// Set the background gradient.
    pub fn with_background(mut self, top: Color, bottom: Color) -> Self {
        self.background_top = top;
        self.background_bottom = bottom;
        self
    }

    /// Set the selection ring colour.
    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// Output size in pixels.
    pub fn viewport_size(&self) -> Size {
        self.camera.viewport
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Draw one frame into a new image the size of the context viewport.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<RgbaImage>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_top
    }
}
