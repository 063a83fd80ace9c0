//! Asset catalog compiler core.
//!
//! Compiles structured asset catalog trees into a single compressed
//! binary archive (`Assets.car`) built on two lower layers:
//!
//! - [`acbuild_bom`]: the paged indexed-blob container format.
//! - [`acbuild_car`]: the archive schema and rendition codec above it.
//!
//! This crate holds the asset model, the slot vocabulary, the compile
//! pipeline, and the thin/info tools, plus the three CLI binaries
//! (`acdriver`, `carthin`, `assetinfo`) that drive them.

pub mod asset;
pub mod compile;
pub mod diagnostics;
pub mod error;
pub mod filesystem;
pub mod imagecodec;
pub mod info;
pub mod slot;
pub mod thin;

pub use compile::{CompileOptions, CompileOutcome, Compiler, DEFAULT_KEY_FORMAT};
pub use diagnostics::{Diagnostic, Severity, StepReport};
pub use error::{CompileError, Result};
pub use filesystem::{DefaultFilesystem, Filesystem};
pub use imagecodec::{DefaultImageCodec, ImageCodec, PixelBuffer};
pub use info::{archive_info, InfoOptions};
pub use thin::{filter_archive, thin_archive, ThinOptions, ThinReport};
