//! Palette pixel blocks.
//!
//! Layout: u16 color count (little-endian), the palette entries (one pixel
//! each, in order of first appearance), then one u8 index per pixel.
//! Only images with at most 256 unique colors are eligible.

use crate::error::{CarError, Result};
use std::collections::{HashMap, HashSet};

pub const MAX_COLORS: usize = 256;

/// True when `pixels` holds at most 256 unique colors and splits evenly
/// into pixels of `bytes_per_pixel`.
pub fn eligible(pixels: &[u8], bytes_per_pixel: usize) -> bool {
    if bytes_per_pixel == 0 || pixels.len() % bytes_per_pixel != 0 {
        return false;
    }
    let mut seen = HashSet::new();
    for pixel in pixels.chunks_exact(bytes_per_pixel) {
        seen.insert(pixel);
        if seen.len() > MAX_COLORS {
            return false;
        }
    }
    true
}

pub fn compress(pixels: &[u8], bytes_per_pixel: usize) -> Result<Vec<u8>> {
    if bytes_per_pixel == 0 || pixels.len() % bytes_per_pixel != 0 {
        return Err(CarError::Invalid(format!(
            "pixel buffer of {} bytes does not split into {bytes_per_pixel}-byte pixels",
            pixels.len()
        )));
    }

    let mut palette: Vec<&[u8]> = Vec::new();
    let mut lookup: HashMap<&[u8], u8> = HashMap::new();
    let mut indices = Vec::with_capacity(pixels.len() / bytes_per_pixel);

    for pixel in pixels.chunks_exact(bytes_per_pixel) {
        let index = match lookup.get(pixel) {
            Some(&index) => index,
            None => {
                if palette.len() >= MAX_COLORS {
                    return Err(CarError::Invalid(
                        "more than 256 unique colors for palette block".into(),
                    ));
                }
                let index = palette.len() as u8;
                palette.push(pixel);
                lookup.insert(pixel, index);
                index
            }
        };
        indices.push(index);
    }

    let mut out = Vec::with_capacity(2 + palette.len() * bytes_per_pixel + indices.len());
    out.extend_from_slice(&(palette.len() as u16).to_le_bytes());
    for color in &palette {
        out.extend_from_slice(color);
    }
    out.extend_from_slice(&indices);
    Ok(out)
}

pub fn decompress(data: &[u8], bytes_per_pixel: usize) -> Result<Vec<u8>> {
    if bytes_per_pixel == 0 {
        return Err(CarError::Invalid("zero bytes per pixel".into()));
    }
    if data.len() < 2 {
        return Err(CarError::Corrupt("palette block too small".into()));
    }
    let count = u16::from_le_bytes(data[0..2].try_into().unwrap()) as usize;
    if count > MAX_COLORS {
        return Err(CarError::Corrupt(format!(
            "palette declares {count} colors"
        )));
    }

    let palette_len = count * bytes_per_pixel;
    let palette = data
        .get(2..2 + palette_len)
        .ok_or_else(|| CarError::Corrupt("palette table past end of block".into()))?;
    let indices = &data[2 + palette_len..];

    let mut out = Vec::with_capacity(indices.len() * bytes_per_pixel);
    for &index in indices {
        let index = index as usize;
        if index >= count {
            return Err(CarError::Corrupt(format!(
                "palette index {index} out of {count} colors"
            )));
        }
        let at = index * bytes_per_pixel;
        out.extend_from_slice(&palette[at..at + bytes_per_pixel]);
    }
    Ok(out)
}
