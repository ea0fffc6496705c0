//! SkyInk Render Library
//!
//! Renderer abstraction and a software implementation that draws a SkyInk
//! canvas into an RGBA image, plus PNG export.

mod export;
mod raster_renderer;
mod renderer;
mod sprites;
mod surface;

pub use export::{encode_png, export_png};
pub use raster_renderer::RasterRenderer;
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use sprites::{SpriteSet, trim_transparent};
