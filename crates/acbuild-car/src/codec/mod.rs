//! Pixel-block compression.
//!
//! The algorithm set is closed and part of the on-disk format. The encoder
//! only ever emits `None`, `Rle`, `Zlib`, `Palette`, or `Jpeg`; the other
//! members decode as `Unsupported` (they belong to hardware texture paths
//! this compiler does not produce).

pub mod palette;
pub mod rle;

use crate::error::{CarError, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Compression {
    None = 0,
    Rle = 1,
    Zlib = 2,
    Lzfse = 3,
    Lzvn = 4,
    Palette = 5,
    Jpeg = 6,
    Astc = 7,
    Dxt = 8,
}

impl Compression {
    pub fn from_u32(value: u32) -> Option<Self> {
        use Compression::*;
        match value {
            0 => Some(None),
            1 => Some(Rle),
            2 => Some(Zlib),
            3 => Some(Lzfse),
            4 => Some(Lzvn),
            5 => Some(Palette),
            6 => Some(Jpeg),
            7 => Some(Astc),
            8 => Some(Dxt),
            _ => Option::None,
        }
    }

    pub fn name(self) -> &'static str {
        use Compression::*;
        match self {
            None => "none",
            Rle => "rle",
            Zlib => "zlib",
            Lzfse => "lzfse",
            Lzvn => "lzvn",
            Palette => "palette",
            Jpeg => "jpeg",
            Astc => "astc",
            Dxt => "dxt",
        }
    }
}

/// Pick the encode algorithm for a raster pixel buffer: palette when the
/// image has at most 256 unique colors and `compress_pngs` is set, RLE of
/// per-row deltas otherwise. Everything here is lossless.
pub fn choose(pixels: &[u8], bytes_per_pixel: usize, compress_pngs: bool) -> Compression {
    if compress_pngs && palette::eligible(pixels, bytes_per_pixel) {
        return Compression::Palette;
    }
    Compression::Rle
}

pub fn compress(
    algorithm: Compression,
    data: &[u8],
    row_bytes: usize,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>> {
    match algorithm {
        Compression::None | Compression::Jpeg => Ok(data.to_vec()),
        Compression::Rle => Ok(rle::compress(data, row_bytes)),
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        Compression::Palette => palette::compress(data, bytes_per_pixel),
        other => Err(CarError::Unsupported(format!(
            "cannot encode {} pixel blocks",
            other.name()
        ))),
    }
}

pub fn decompress(
    algorithm: Compression,
    data: &[u8],
    uncompressed_len: usize,
    row_bytes: usize,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>> {
    let out = match algorithm {
        Compression::None | Compression::Jpeg => data.to_vec(),
        Compression::Rle => rle::decompress(data, row_bytes, uncompressed_len)?,
        Compression::Zlib => {
            let mut out = Vec::with_capacity(uncompressed_len);
            ZlibDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| CarError::Corrupt(format!("zlib stream: {e}")))?;
            out
        }
        Compression::Palette => palette::decompress(data, bytes_per_pixel)?,
        other => {
            return Err(CarError::Unsupported(format!(
                "{} pixel blocks",
                other.name()
            )))
        }
    };

    if out.len() != uncompressed_len {
        return Err(CarError::Corrupt(format!(
            "pixel block decompressed to {} bytes, declared {uncompressed_len}",
            out.len()
        )));
    }
    Ok(out)
}
