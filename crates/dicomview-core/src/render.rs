//! Rendering decoded frames into fixed-layout RGBA bitmaps.

use std::path::Path;

use crate::decode::DecodedFrame;
use crate::error::DicomViewError;

/// Bytes per pixel in a rendered bitmap (R, G, B, A).
pub const BYTES_PER_PIXEL: usize = 4;

/// An 8-bit RGBA bitmap with rows packed back to back.
///
/// `pixels.len()` is always `width * height * 4` and `stride` is `width * 4`.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedBitmap {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub pixels: Vec<u8>,
}

impl RenderedBitmap {
    /// RGBA value at (x, y), or `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        let px = self.pixels.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Write the bitmap as a PNG file.
    pub fn save_png(&self, path: &Path) -> Result<(), DicomViewError> {
        let buffer = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| {
                DicomViewError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "bitmap buffer does not match its dimensions",
                ))
            })?;
        buffer
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| DicomViewError::Io(std::io::Error::other(e)))?;
        tracing::info!("Wrote {}x{} PNG to {:?}", self.width, self.height, path);
        Ok(())
    }
}

impl std::fmt::Debug for RenderedBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Convert a decoded frame to RGBA, whatever its source color type.
///
/// Grayscale frames replicate the luma into R, G and B; alpha is opaque unless
/// the frame carries its own.
pub fn render_rgba(frame: &DecodedFrame) -> RenderedBitmap {
    let rgba = frame.image.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    let pixels = rgba.into_raw();
    debug_assert_eq!(pixels.len(), width as usize * height as usize * BYTES_PER_PIXEL);

    RenderedBitmap {
        width,
        height,
        stride: width as usize * BYTES_PER_PIXEL,
        pixels,
    }
}
