//! Raster surface: SVG decode, draw and lossless PNG encode.

use super::ExportError;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use std::io::Cursor;

/// A fixed-size RGBA drawing surface with an opaque background.
pub struct RasterSurface {
    pixmap: Pixmap,
}

impl RasterSurface {
    /// Allocate a `size`×`size` surface filled with `background`.
    ///
    /// Fails with `RenderingUnsupported` when the surface cannot be created.
    pub fn new(size: u32, background: [u8; 3]) -> Result<Self, ExportError> {
        let mut pixmap = Pixmap::new(size, size).ok_or(ExportError::RenderingUnsupported)?;
        pixmap.fill(Color::from_rgba8(background[0], background[1], background[2], 255));
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Decode SVG markup and draw it scaled to fill the whole surface.
    pub fn draw_svg(&mut self, svg_data: &[u8]) -> Result<(), ExportError> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_data(svg_data, &options)
            .map_err(|e| ExportError::DecodeFailed(e.to_string()))?;

        let size = tree.size();
        if size.width() <= 0.0 || size.height() <= 0.0 {
            return Err(ExportError::DecodeFailed("SVG has an empty size".to_string()));
        }

        // Stretch to the surface, like drawing an image into a canvas rect
        let transform = Transform::from_scale(
            self.pixmap.width() as f32 / size.width(),
            self.pixmap.height() as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut self.pixmap.as_mut());
        Ok(())
    }

    /// Encode the surface as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());

        // tiny-skia stores premultiplied RGBA; PNG wants straight alpha
        let mut rgba = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let image = image::RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            ExportError::Unknown("Surface buffer does not match its dimensions".to_string())
        })?;

        let mut png_bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
            .map_err(|e| ExportError::Unknown(format!("PNG encoding failed: {}", e)))?;

        Ok(png_bytes)
    }
}
