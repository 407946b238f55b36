/// Rendering of rigs into images
///
/// Architecture:
/// - `color.rs` - sRGB/linear conversion and output encoding
/// - `raster.rs` - CPU triangle rasterizer with a depth buffer
///
/// Frames are rendered at a multiple of the target size and downscaled,
/// which smooths edges the way an antialiased GPU canvas would.

pub mod color;
pub mod raster;

use image::{imageops::FilterType, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

use crate::error::RenderError;
use crate::rig::RenderRig;
use color::ColorEncoding;

/// Side length of thumbnails and of the preview viewport (square)
pub const VIEW_SIZE: u32 = 200;

/// Clear color of the thumbnail rig
pub const THUMBNAIL_BACKGROUND: u32 = 0x444444;

/// Clear color of the interactive preview rig
pub const PREVIEW_BACKGROUND: u32 = 0x555555;

/// Supersampling factor per axis
const SUPERSAMPLE: u32 = 2;

/// How a rig is turned into pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub size: u32,
    pub background: u32,
    pub encoding: ColorEncoding,
}

impl RenderSettings {
    pub fn thumbnail(encoding: ColorEncoding) -> Self {
        Self {
            size: VIEW_SIZE,
            background: THUMBNAIL_BACKGROUND,
            encoding,
        }
    }

    pub fn preview(encoding: ColorEncoding) -> Self {
        Self {
            size: VIEW_SIZE,
            background: PREVIEW_BACKGROUND,
            encoding,
        }
    }
}

/// Render the rig's current model to an RGBA image
pub fn render(rig: &RenderRig, settings: &RenderSettings) -> RgbaImage {
    let large = raster::rasterize(
        rig,
        settings.size * SUPERSAMPLE,
        settings.background,
        settings.encoding,
    );
    image::imageops::resize(&large, settings.size, settings.size, FilterType::Triangle)
}

/// An encoded, immutable image (PNG bytes)
#[derive(Clone, PartialEq)]
pub struct ImageHandle {
    png: Arc<[u8]>,
}

impl ImageHandle {
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }
}

// Manual Debug implementation (PNG bytes are not useful in logs)
impl std::fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandle")
            .field("bytes", &self.png.len())
            .finish()
    }
}

/// Encode a rendered frame as PNG
pub fn encode_png(image: &RgbaImage) -> Result<ImageHandle, RenderError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    Ok(ImageHandle { png: bytes.into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::shading::Shading;
    use crate::scene::fixtures::box_graph;

    #[test]
    fn test_render_has_requested_size() {
        let mut rig = RenderRig::new(false, Shading::Flat);
        rig.frame(box_graph([1.0, 2.0, 1.0], [0.0, 0.0, 0.0]));

        let settings = RenderSettings::thumbnail(ColorEncoding::Srgb);
        let image = render(&rig, &settings);
        assert_eq!(image.dimensions(), (VIEW_SIZE, VIEW_SIZE));
    }

    #[test]
    fn test_encode_png_round_trips_dimensions() {
        let rig = RenderRig::new(false, Shading::Flat);
        let image = render(&rig, &RenderSettings::preview(ColorEncoding::Linear));

        let handle = encode_png(&image).expect("encode");
        assert!(handle.png_bytes().starts_with(b"\x89PNG"));

        let decoded = image::load_from_memory(handle.png_bytes()).expect("decode");
        assert_eq!(decoded.width(), image.width());
        assert_eq!(decoded.height(), image.height());
    }
}
