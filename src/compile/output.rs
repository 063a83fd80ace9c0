//! Output format selection and the two output destinations.
//!
//! Targets older than the folder threshold get per-asset folders instead
//! of a compiled archive; everything else gets `Assets.car`.

use crate::error::{CompileError, Result};
use crate::filesystem::Filesystem;
use acbuild_car::ArchiveWriter;
use std::path::{Path, PathBuf};

/// Deployment-target major version below which folder output is emitted.
pub const FOLDER_FORMAT_BELOW_MAJOR: u64 = 7;

pub const ARCHIVE_FILE_NAME: &str = "Assets.car";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Compiled,
    Folder,
}

/// Parse a deployment target like `"9.0"` or `"6.1.2"` and pick the
/// output format. Missing target means compiled; unparseable is an error.
pub fn determine_output_format(minimum_deployment_target: Option<&str>) -> Result<OutputFormat> {
    let Some(target) = minimum_deployment_target else {
        return Ok(OutputFormat::Compiled);
    };
    let version = parse_deployment_target(target)?;
    if version.major < FOLDER_FORMAT_BELOW_MAJOR {
        Ok(OutputFormat::Folder)
    } else {
        Ok(OutputFormat::Compiled)
    }
}

/// Deployment targets drop trailing components ("9.0", even "9"); pad to
/// the full triple before handing to semver.
pub fn parse_deployment_target(target: &str) -> Result<semver::Version> {
    let components = target.split('.').count();
    let padded = match components {
        1 => format!("{target}.0.0"),
        2 => format!("{target}.0"),
        _ => target.to_string(),
    };
    semver::Version::parse(&padded)
        .map_err(|_| CompileError::Invalid(format!("minimum deployment target {target:?}")))
}

/// Where compiled output lands: a single archive writer, or a folder root
/// that selected files are copied under.
pub enum Destination {
    Archive(ArchiveWriter),
    Folder(PathBuf),
}

impl Destination {
    pub fn archive_mut(&mut self) -> Option<&mut ArchiveWriter> {
        match self {
            Destination::Archive(writer) => Some(writer),
            Destination::Folder(_) => None,
        }
    }
}

/// Copy one selected variant file into its per-asset folder.
pub fn copy_to_folder(
    filesystem: &dyn Filesystem,
    folder_root: &Path,
    asset_name: &str,
    source: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let asset_dir = folder_root.join(asset_name);
    filesystem.create_dir_all(&asset_dir)?;
    let destination = asset_dir.join(file_name);
    let bytes = filesystem.read(source)?;
    filesystem.write(&destination, &bytes)?;
    Ok(destination)
}
