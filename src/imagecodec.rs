//! Image codec collaborator: encoded bytes in, premultiplied pixels out.
//!
//! The pipeline stores raster renditions as premultiplied BGRA8 (color) or
//! GA8 (grayscale); the codec produces that directly. JPEG inputs are not
//! decoded at all, they pass through into the rendition payload.

use crate::error::{CompileError, Result};
use acbuild_car::PixelFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Premultiplied rows, `width * bytes_per_pixel` bytes each.
    pub pixels: Vec<u8>,
}

pub trait ImageCodec {
    /// Decode PNG bytes to a premultiplied pixel buffer.
    fn decode_png(&self, bytes: &[u8]) -> Result<PixelBuffer>;
}

/// Codec backed by the `image` crate. Grayscale sources decode to GA8,
/// everything else to BGRA8, alpha premultiplied in both cases.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImageCodec;

impl ImageCodec for DefaultImageCodec {
    fn decode_png(&self, bytes: &[u8]) -> Result<PixelBuffer> {
        let decoded = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(|e| CompileError::Invalid(format!("png decode: {e}")))?;

        let grayscale = matches!(
            decoded.color(),
            image::ColorType::L8
                | image::ColorType::La8
                | image::ColorType::L16
                | image::ColorType::La16
        );

        if grayscale {
            let ga = decoded.to_luma_alpha8();
            let (width, height) = ga.dimensions();
            let mut pixels = ga.into_raw();
            premultiply_in_place(&mut pixels, 2);
            Ok(PixelBuffer {
                format: PixelFormat::Ga8,
                width,
                height,
                pixels,
            })
        } else {
            let rgba = decoded.to_rgba8();
            let (width, height) = rgba.dimensions();
            let mut pixels = rgba.into_raw();
            swap_red_blue(&mut pixels);
            premultiply_in_place(&mut pixels, 4);
            Ok(PixelBuffer {
                format: PixelFormat::Bgra8,
                width,
                height,
                pixels,
            })
        }
    }
}

fn swap_red_blue(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

/// Premultiply alpha in place. The alpha channel is the last byte of each
/// pixel for both BGRA8 and GA8.
fn premultiply_in_place(pixels: &mut [u8], bytes_per_pixel: usize) {
    for px in pixels.chunks_exact_mut(bytes_per_pixel) {
        let alpha = px[bytes_per_pixel - 1] as u16;
        if alpha == 255 {
            continue;
        }
        for channel in px.iter_mut().take(bytes_per_pixel - 1) {
            if alpha == 0 {
                *channel = 0;
            } else {
                *channel = ((*channel as u16 * alpha + 127) / 255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(rgba: Vec<u8>, width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn opaque_png_decodes_to_bgra() {
        let bytes = png_bytes(vec![10, 20, 30, 255], 1, 1);
        let buffer = DefaultImageCodec.decode_png(&bytes).unwrap();
        assert_eq!(buffer.format, PixelFormat::Bgra8);
        assert_eq!((buffer.width, buffer.height), (1, 1));
        assert_eq!(buffer.pixels, vec![30, 20, 10, 255]); // BGR swap
    }

    #[test]
    fn translucent_pixels_are_premultiplied() {
        let bytes = png_bytes(vec![255, 0, 0, 128], 1, 1);
        let buffer = DefaultImageCodec.decode_png(&bytes).unwrap();
        // red premultiplied by 128/255
        assert_eq!(buffer.pixels, vec![0, 0, 128, 128]);
    }

    #[test]
    fn fully_transparent_zeroes_color() {
        let bytes = png_bytes(vec![200, 200, 200, 0], 1, 1);
        let buffer = DefaultImageCodec.decode_png(&bytes).unwrap();
        assert_eq!(buffer.pixels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            DefaultImageCodec.decode_png(b"not a png"),
            Err(CompileError::Invalid(_))
        ));
    }
}
