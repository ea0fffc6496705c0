//! PNG export.

use crate::renderer::{RenderContext, Renderer, RendererError, RenderResult};
use image::RgbaImage;
use skyink_core::canvas::Canvas;

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(image: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RendererError::Encode(format!("Failed to write PNG header: {e}")))?;
        writer
            .write_image_data(image.as_raw())
            .map_err(|e| RendererError::Encode(format!("Failed to write PNG data: {e}")))?;
    }
    Ok(png_data)
}

/// Render the whole world at full scene resolution and encode it as PNG.
pub fn export_png(renderer: &mut dyn Renderer, canvas: &Canvas) -> RenderResult<Vec<u8>> {
    let image = renderer.render(&RenderContext::new(canvas).full_scene())?;
    let png_data = encode_png(&image)?;
    log::info!(
        "PNG export complete: {}x{}, {} bytes",
        image.width(),
        image.height(),
        png_data.len()
    );
    Ok(png_data)
}
