//! Rendition records: one concrete variant of a facet.
//!
//! A rendition payload is a typed sub-format: a fixed header, a list of
//! `(tag, length, bytes)` metadata blocks, then one or more pixel data
//! blocks each compressed with a declared algorithm. Multi-block payloads
//! concatenate in row order. All integers little-endian.

use crate::codec::{self, Compression};
use crate::error::{CarError, Result};

pub const RENDITION_MAGIC: [u8; 4] = *b"CTSI";
pub const RENDITION_VERSION: u32 = 1;
pub const RENDITION_HEADER_LEN: usize = 48;

/// Rendition flag bits.
pub mod flags {
    pub const IS_OPAQUE: u32 = 1 << 0;
    pub const IS_VECTOR: u32 = 1 << 1;
    pub const OPT_OUT_OF_THINNING: u32 = 1 << 2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Premultiplied BGRA, 4 bytes per pixel.
    Bgra8,
    /// Premultiplied gray + alpha, 2 bytes per pixel.
    Ga8,
    /// JPEG passthrough; the payload is the original file bytes.
    Jpeg,
    /// Opaque data blob (data sets).
    Data,
}

impl PixelFormat {
    pub fn fourcc(self) -> [u8; 4] {
        match self {
            PixelFormat::Bgra8 => *b"BGRA",
            PixelFormat::Ga8 => *b"GA8 ",
            PixelFormat::Jpeg => *b"JPEG",
            PixelFormat::Data => *b"DATA",
        }
    }

    pub fn from_fourcc(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"BGRA" => Some(PixelFormat::Bgra8),
            b"GA8 " => Some(PixelFormat::Ga8),
            b"JPEG" => Some(PixelFormat::Jpeg),
            b"DATA" => Some(PixelFormat::Data),
            _ => None,
        }
    }

    /// Bytes per pixel for raster formats, `None` for passthrough blobs.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Bgra8 => Some(4),
            PixelFormat::Ga8 => Some(2),
            PixelFormat::Jpeg | PixelFormat::Data => None,
        }
    }

    pub fn is_raster(self) -> bool {
        self.bytes_per_pixel().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Layout {
    OnePartFixed = 0,
    OnePartScale = 1,
    ThreePartHorizontalTile = 2,
    ThreePartHorizontalScale = 3,
    ThreePartVerticalTile = 4,
    ThreePartVerticalScale = 5,
    NinePartTile = 6,
    NinePartScale = 7,
    Gradient = 8,
    RawData = 9,
}

impl Layout {
    pub fn from_u16(value: u16) -> Option<Self> {
        use Layout::*;
        match value {
            0 => Some(OnePartFixed),
            1 => Some(OnePartScale),
            2 => Some(ThreePartHorizontalTile),
            3 => Some(ThreePartHorizontalScale),
            4 => Some(ThreePartVerticalTile),
            5 => Some(ThreePartVerticalScale),
            6 => Some(NinePartTile),
            7 => Some(NinePartScale),
            8 => Some(Gradient),
            9 => Some(RawData),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Typed metadata blocks. Unknown tags survive a decode/encode round trip
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    Slices(Vec<Rect>),
    HotSpot { x: u32, y: u32 },
    Insets { top: u32, left: u32, bottom: u32, right: u32 },
    ResizingMode(u32),
    Opacity(u32),
    ExifOrientation(u32),
    BlendMode(u32),
    TemplateIntent(u32),
    Uti(String),
    FileName(String),
    Unknown { tag: u32, bytes: Vec<u8> },
}

impl Metadata {
    pub fn tag(&self) -> u32 {
        match self {
            Metadata::Slices(_) => 1,
            Metadata::HotSpot { .. } => 2,
            Metadata::Insets { .. } => 3,
            Metadata::ResizingMode(_) => 4,
            Metadata::Opacity(_) => 5,
            Metadata::ExifOrientation(_) => 6,
            Metadata::BlendMode(_) => 7,
            Metadata::TemplateIntent(_) => 8,
            Metadata::Uti(_) => 9,
            Metadata::FileName(_) => 10,
            Metadata::Unknown { tag, .. } => *tag,
        }
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Metadata::Slices(rects) => {
                out.extend_from_slice(&(rects.len() as u32).to_le_bytes());
                for rect in rects {
                    out.extend_from_slice(&rect.x.to_le_bytes());
                    out.extend_from_slice(&rect.y.to_le_bytes());
                    out.extend_from_slice(&rect.width.to_le_bytes());
                    out.extend_from_slice(&rect.height.to_le_bytes());
                }
            }
            Metadata::HotSpot { x, y } => {
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            Metadata::Insets { top, left, bottom, right } => {
                for v in [top, left, bottom, right] {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            Metadata::ResizingMode(v)
            | Metadata::Opacity(v)
            | Metadata::ExifOrientation(v)
            | Metadata::BlendMode(v)
            | Metadata::TemplateIntent(v) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            Metadata::Uti(s) | Metadata::FileName(s) => {
                out.extend_from_slice(s.as_bytes());
            }
            Metadata::Unknown { bytes, .. } => {
                out.extend_from_slice(bytes);
            }
        }
        out
    }

    fn parse(tag: u32, bytes: &[u8]) -> Result<Self> {
        let corrupt = |what: &str| CarError::Corrupt(format!("metadata block {tag}: {what}"));
        let u32_at = |at: usize| -> Result<u32> {
            bytes
                .get(at..at + 4)
                .map(|b| u32::from_le_bytes(b.try_into().unwrap()))
                .ok_or_else(|| corrupt("truncated"))
        };
        let string = || -> Result<String> {
            String::from_utf8(bytes.to_vec()).map_err(|_| corrupt("not UTF-8"))
        };

        Ok(match tag {
            1 => {
                let count = u32_at(0)? as usize;
                if bytes.len() != 4 + count * 16 {
                    return Err(corrupt("slice table length"));
                }
                let mut rects = Vec::with_capacity(count);
                for i in 0..count {
                    let at = 4 + i * 16;
                    rects.push(Rect {
                        x: u32_at(at)?,
                        y: u32_at(at + 4)?,
                        width: u32_at(at + 8)?,
                        height: u32_at(at + 12)?,
                    });
                }
                Metadata::Slices(rects)
            }
            2 => Metadata::HotSpot {
                x: u32_at(0)?,
                y: u32_at(4)?,
            },
            3 => Metadata::Insets {
                top: u32_at(0)?,
                left: u32_at(4)?,
                bottom: u32_at(8)?,
                right: u32_at(12)?,
            },
            4 => Metadata::ResizingMode(u32_at(0)?),
            5 => Metadata::Opacity(u32_at(0)?),
            6 => Metadata::ExifOrientation(u32_at(0)?),
            7 => Metadata::BlendMode(u32_at(0)?),
            8 => Metadata::TemplateIntent(u32_at(0)?),
            9 => Metadata::Uti(string()?),
            10 => Metadata::FileName(string()?),
            _ => Metadata::Unknown {
                tag,
                bytes: bytes.to_vec(),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub flags: u32,
    pub pixel_format: PixelFormat,
    pub layout: Layout,
    pub width: u32,
    pub height: u32,
    /// Scale factor times 100 (100 = 1x, 200 = 2x). 0 means any scale.
    pub scale_percent: u32,
    pub color_space: u32,
    pub row_bytes: u32,
    pub metadata: Vec<Metadata>,
    /// Decompressed payload: raw pixel rows for raster formats, original
    /// bytes for JPEG/data passthrough.
    pub pixels: Vec<u8>,
}

impl Rendition {
    /// A raster rendition over premultiplied pixel rows. The buffer length
    /// must be exactly `height * width * bytes_per_pixel`.
    pub fn new_raster(
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        scale_percent: u32,
        pixels: Vec<u8>,
    ) -> Result<Self> {
        let bpp = pixel_format.bytes_per_pixel().ok_or_else(|| {
            CarError::Invalid("raster rendition needs a raster pixel format".into())
        })?;
        let row_bytes = width as usize * bpp;
        if pixels.len() != row_bytes * height as usize {
            return Err(CarError::Invalid(format!(
                "pixel buffer is {} bytes for {width}x{height} at {bpp} bytes per pixel",
                pixels.len()
            )));
        }
        Ok(Rendition {
            flags: 0,
            pixel_format,
            layout: Layout::OnePartFixed,
            width,
            height,
            scale_percent,
            color_space: 0,
            row_bytes: row_bytes as u32,
            metadata: Vec::new(),
            pixels,
        })
    }

    /// A JPEG passthrough rendition: the original file bytes, untouched.
    pub fn new_jpeg(width: u32, height: u32, scale_percent: u32, bytes: Vec<u8>) -> Self {
        Rendition {
            flags: 0,
            pixel_format: PixelFormat::Jpeg,
            layout: Layout::RawData,
            width,
            height,
            scale_percent,
            color_space: 0,
            row_bytes: 0,
            metadata: Vec::new(),
            pixels: bytes,
        }
    }

    /// An opaque data-blob rendition (data sets).
    pub fn new_data(bytes: Vec<u8>) -> Self {
        Rendition {
            flags: 0,
            pixel_format: PixelFormat::Data,
            layout: Layout::RawData,
            width: 0,
            height: 0,
            scale_percent: 0,
            color_space: 0,
            row_bytes: 0,
            metadata: Vec::new(),
            pixels: bytes,
        }
    }

    /// The scale slot value for key packing: whole multiplier, 0 = any.
    pub fn scale(&self) -> u16 {
        (self.scale_percent / 100) as u16
    }

    pub fn file_name(&self) -> Option<&str> {
        self.metadata.iter().find_map(|m| match m {
            Metadata::FileName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn is_opaque(&self) -> bool {
        self.flags & flags::IS_OPAQUE != 0
    }

    /// Serialize the record, compressing the payload with `algorithm`.
    pub fn encode(&self, algorithm: Compression) -> Result<Vec<u8>> {
        let bpp = self.pixel_format.bytes_per_pixel().unwrap_or(1);
        let stored = codec::compress(algorithm, &self.pixels, self.row_bytes as usize, bpp)?;

        let mut out = Vec::with_capacity(RENDITION_HEADER_LEN + stored.len() + 64);
        out.extend_from_slice(&RENDITION_MAGIC);
        out.extend_from_slice(&RENDITION_VERSION.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.pixel_format.fourcc());
        out.extend_from_slice(&(self.layout as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.scale_percent.to_le_bytes());
        out.extend_from_slice(&self.color_space.to_le_bytes());
        out.extend_from_slice(&self.row_bytes.to_le_bytes());
        out.extend_from_slice(&(self.metadata.len() as u32).to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes()); // block count

        for block in &self.metadata {
            let payload = block.payload();
            out.extend_from_slice(&block.tag().to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&payload);
        }

        out.extend_from_slice(&(algorithm as u32).to_le_bytes());
        out.extend_from_slice(&(self.pixels.len() as u32).to_le_bytes());
        out.extend_from_slice(&(stored.len() as u32).to_le_bytes());
        out.extend_from_slice(&stored);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < RENDITION_HEADER_LEN {
            return Err(CarError::Corrupt(format!(
                "rendition record is {} bytes",
                bytes.len()
            )));
        }
        if bytes[0..4] != RENDITION_MAGIC {
            return Err(CarError::Corrupt("bad rendition magic".into()));
        }

        let u16_at = |at: usize| u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap());
        let u32_at = |at: usize| u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());

        let version = u32_at(4);
        if version != RENDITION_VERSION {
            return Err(CarError::Unsupported(format!(
                "rendition version {version}"
            )));
        }
        let rendition_flags = u32_at(8);
        let fourcc: [u8; 4] = bytes[12..16].try_into().unwrap();
        let pixel_format = PixelFormat::from_fourcc(&fourcc).ok_or_else(|| {
            CarError::Unsupported(format!(
                "pixel format {:?}",
                String::from_utf8_lossy(&fourcc)
            ))
        })?;
        let layout = Layout::from_u16(u16_at(16))
            .ok_or_else(|| CarError::Corrupt(format!("unknown layout {}", u16_at(16))))?;
        let width = u32_at(20);
        let height = u32_at(24);
        let scale_percent = u32_at(28);
        let color_space = u32_at(32);
        let row_bytes = u32_at(36);
        let metadata_count = u32_at(40) as usize;
        let block_count = u32_at(44) as usize;
        if block_count == 0 {
            return Err(CarError::Corrupt("rendition has no pixel blocks".into()));
        }

        let mut at = RENDITION_HEADER_LEN;
        let mut metadata = Vec::with_capacity(metadata_count);
        for _ in 0..metadata_count {
            let header = bytes
                .get(at..at + 8)
                .ok_or_else(|| CarError::Corrupt("truncated metadata block".into()))?;
            let tag = u32::from_le_bytes(header[0..4].try_into().unwrap());
            let len = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
            let payload = bytes
                .get(at + 8..at + 8 + len)
                .ok_or_else(|| CarError::Corrupt("truncated metadata block".into()))?;
            metadata.push(Metadata::parse(tag, payload)?);
            at += 8 + len;
        }

        let bpp = pixel_format.bytes_per_pixel().unwrap_or(1);
        let mut pixels = Vec::new();
        for _ in 0..block_count {
            let header = bytes
                .get(at..at + 12)
                .ok_or_else(|| CarError::Corrupt("truncated pixel block".into()))?;
            let algorithm_code = u32::from_le_bytes(header[0..4].try_into().unwrap());
            let uncompressed_len = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
            let stored_len = u32::from_le_bytes(header[8..12].try_into().unwrap()) as usize;
            let stored = bytes
                .get(at + 12..at + 12 + stored_len)
                .ok_or_else(|| CarError::Corrupt("truncated pixel block".into()))?;

            let algorithm = Compression::from_u32(algorithm_code).ok_or_else(|| {
                CarError::Corrupt(format!("unknown compression code {algorithm_code}"))
            })?;
            let block = codec::decompress(
                algorithm,
                stored,
                uncompressed_len,
                row_bytes as usize,
                bpp,
            )?;
            pixels.extend_from_slice(&block);
            at += 12 + stored_len;
        }

        // The row-stride length invariant: raster payloads must hold
        // exactly height rows of row_bytes bytes.
        if pixel_format.is_raster() && pixels.len() != height as usize * row_bytes as usize {
            return Err(CarError::Corrupt(format!(
                "pixel data is {} bytes for {height} rows of {row_bytes}",
                pixels.len()
            )));
        }

        Ok(Rendition {
            flags: rendition_flags,
            pixel_format,
            layout,
            width,
            height,
            scale_percent,
            color_space,
            row_bytes,
            metadata,
            pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let on = (x + y) % 2 == 0;
                pixels.extend_from_slice(if on {
                    &[0, 0, 0, 255]
                } else {
                    &[255, 255, 255, 255]
                });
            }
        }
        pixels
    }

    #[test]
    fn raster_round_trip_rle() {
        let pixels = checker(8, 8);
        let mut rendition =
            Rendition::new_raster(PixelFormat::Bgra8, 8, 8, 100, pixels.clone()).unwrap();
        rendition.metadata.push(Metadata::FileName("check.png".into()));

        let bytes = rendition.encode(Compression::Rle).unwrap();
        let decoded = Rendition::decode(&bytes).unwrap();
        assert_eq!(decoded.pixels, pixels);
        assert_eq!(decoded.width, 8);
        assert_eq!(decoded.row_bytes, 32);
        assert_eq!(decoded.file_name(), Some("check.png"));
        assert_eq!(decoded, rendition);
    }

    #[test]
    fn raster_round_trip_palette_and_zlib() {
        let pixels = checker(16, 4);
        let rendition =
            Rendition::new_raster(PixelFormat::Bgra8, 16, 4, 200, pixels.clone()).unwrap();

        for algorithm in [Compression::Palette, Compression::Zlib, Compression::None] {
            let decoded = Rendition::decode(&rendition.encode(algorithm).unwrap()).unwrap();
            assert_eq!(decoded.pixels, pixels, "{}", algorithm.name());
            assert_eq!(decoded.scale_percent, 200);
        }
    }

    #[test]
    fn wrong_buffer_length_is_invalid() {
        assert!(matches!(
            Rendition::new_raster(PixelFormat::Bgra8, 10, 10, 100, vec![0; 11]),
            Err(CarError::Invalid(_))
        ));
    }

    #[test]
    fn metadata_round_trips() {
        let mut rendition =
            Rendition::new_raster(PixelFormat::Ga8, 4, 4, 100, vec![128; 32]).unwrap();
        rendition.layout = Layout::NinePartTile;
        rendition.metadata = vec![
            Metadata::Slices(vec![
                Rect { x: 0, y: 0, width: 1, height: 4 },
                Rect { x: 1, y: 0, width: 2, height: 4 },
                Rect { x: 3, y: 0, width: 1, height: 4 },
            ]),
            Metadata::Insets { top: 1, left: 1, bottom: 1, right: 1 },
            Metadata::Opacity(900),
            Metadata::Unknown { tag: 7777, bytes: vec![1, 2, 3] },
        ];

        let decoded = Rendition::decode(&rendition.encode(Compression::Rle).unwrap()).unwrap();
        assert_eq!(decoded, rendition);
    }

    #[test]
    fn jpeg_passthrough_skips_row_check() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3];
        let rendition = Rendition::new_jpeg(640, 480, 100, bytes.clone());
        let decoded = Rendition::decode(&rendition.encode(Compression::Jpeg).unwrap()).unwrap();
        assert_eq!(decoded.pixels, bytes);
        assert_eq!(decoded.pixel_format, PixelFormat::Jpeg);
    }

    #[test]
    fn stomped_row_bytes_is_corrupt() {
        let rendition =
            Rendition::new_raster(PixelFormat::Bgra8, 4, 4, 100, vec![7; 64]).unwrap();
        let mut bytes = rendition.encode(Compression::None).unwrap();
        bytes[36..40].copy_from_slice(&99u32.to_le_bytes()); // row_bytes field
        assert!(matches!(
            Rendition::decode(&bytes),
            Err(CarError::Corrupt(_))
        ));
    }

    #[test]
    fn unknown_pixel_format_is_unsupported() {
        let rendition =
            Rendition::new_raster(PixelFormat::Bgra8, 2, 2, 100, vec![1; 16]).unwrap();
        let mut bytes = rendition.encode(Compression::None).unwrap();
        bytes[12..16].copy_from_slice(b"WXYZ");
        assert!(matches!(
            Rendition::decode(&bytes),
            Err(CarError::Unsupported(_))
        ));
    }

    #[test]
    fn unknown_compression_code_is_corrupt() {
        let rendition =
            Rendition::new_raster(PixelFormat::Bgra8, 2, 2, 100, vec![1; 16]).unwrap();
        let mut bytes = rendition.encode(Compression::None).unwrap();
        // The single pixel block starts right after the 48-byte header.
        bytes[48..52].copy_from_slice(&250u32.to_le_bytes());
        assert!(matches!(
            Rendition::decode(&bytes),
            Err(CarError::Corrupt(_))
        ));
    }
}
