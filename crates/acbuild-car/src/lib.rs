//! Compiled asset archive schema over the BOM container.
//!
//! An archive holds two ordered trees (facets keyed by asset name,
//! renditions keyed by packed attribute tuples) plus a header, a key
//! format describing the packed key layout, and optional sidecar blobs.
//!
//! - [`ArchiveReader`] validates and iterates an existing archive.
//! - [`ArchiveWriter`] accumulates facets and renditions and writes the
//!   whole archive at commit.
//! - [`rendition`] is the payload codec for individual rendition records.

pub mod attributes;
pub mod codec;
pub mod error;
pub mod facet;
pub mod header;
pub mod keyformat;
pub mod reader;
pub mod rendition;
pub mod writer;

pub use attributes::{AttributeId, AttributeList};
pub use codec::Compression;
pub use error::{CarError, Result};
pub use facet::Facet;
pub use header::CarHeader;
pub use keyformat::KeyFormat;
pub use reader::ArchiveReader;
pub use rendition::{Layout, Metadata, PixelFormat, Rect, Rendition};
pub use writer::{ArchiveWriter, FIRST_IDENTIFIER};

/// Container variable names the schema uses.
pub const VAR_CARHEADER: &str = "CARHEADER";
pub const VAR_KEYFORMAT: &str = "KEYFORMAT";
pub const VAR_FACETKEYS: &str = "FACETKEYS";
pub const VAR_RENDITIONS: &str = "RENDITIONS";

/// Optional sidecar variable names; any may be absent.
pub const SIDECAR_NAMES: &[&str] = &[
    "APPEARANCEKEYS",
    "COLORS",
    "FONTS",
    "IMAGEDB",
    "CARGLYPHS",
    "BITMAPKEYS",
];
