//! Catalog loader: directory tree plus per-node `Contents.json` manifests
//! into an [`AssetCatalog`].
//!
//! This is the thin collaborator the pipeline consumes; it trusts the
//! manifests and records unknown slot strings as warnings rather than
//! failing the load.

use crate::asset::{
    AssetCatalog, AssetId, AssetKind, CapInsets, CenterMode, Resizing, ResizingMode, Variant,
};
use crate::diagnostics::StepReport;
use crate::error::{CompileError, Result};
use crate::filesystem::Filesystem;
use crate::slot::{
    Appearance, DeviceSubtype, GraphicsClass, Idiom, MemoryClass, Scale, SizeClass,
};
use serde::Deserialize;
use std::path::Path;

pub const CONTENTS_FILE: &str = "Contents.json";

#[derive(Debug, Deserialize, Default)]
struct Contents {
    #[serde(default)]
    images: Vec<ImageEntry>,
    #[serde(default)]
    data: Vec<DataEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct ImageEntry {
    filename: Option<String>,
    idiom: Option<String>,
    scale: Option<String>,
    subtype: Option<String>,
    memory: Option<String>,
    #[serde(rename = "graphics-feature-set")]
    graphics: Option<String>,
    #[serde(rename = "width-class")]
    width_class: Option<String>,
    #[serde(rename = "height-class")]
    height_class: Option<String>,
    #[serde(default)]
    appearances: Vec<AppearanceEntry>,
    resizing: Option<ResizingEntry>,
    #[serde(default)]
    unassigned: bool,
}

#[derive(Debug, Deserialize, Default)]
struct ResizingEntry {
    mode: Option<String>,
    center: Option<CenterEntry>,
    #[serde(rename = "cap-insets")]
    cap_insets: Option<InsetsEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct CenterEntry {
    mode: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct InsetsEntry {
    top: Option<f64>,
    left: Option<f64>,
    bottom: Option<f64>,
    right: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AppearanceEntry {
    appearance: String,
    value: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DataEntry {
    filename: Option<String>,
    idiom: Option<String>,
}

/// Load a catalog directory. Returns the tree and the loader's warnings.
pub fn load_catalog(
    filesystem: &dyn Filesystem,
    path: &Path,
) -> Result<(AssetCatalog, StepReport)> {
    if !filesystem.is_dir(path) {
        return Err(CompileError::NotFound(format!(
            "asset catalog {}",
            path.display()
        )));
    }

    let name = stem_of(path);
    let mut catalog = AssetCatalog::new(&name, path);
    let mut report = StepReport::new();
    let root = catalog.root();
    load_children(filesystem, path, &mut catalog, root, &mut report)?;
    Ok((catalog, report))
}

fn load_children(
    filesystem: &dyn Filesystem,
    dir: &Path,
    catalog: &mut AssetCatalog,
    parent: AssetId,
    report: &mut StepReport,
) -> Result<()> {
    for entry in filesystem.list_dir(dir)? {
        if !filesystem.is_dir(&entry) {
            continue;
        }
        let name = stem_of(&entry);
        let extension = entry
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        let kind = AssetKind::from_extension(&extension).unwrap_or(AssetKind::Group);
        let id = catalog.add_child(parent, &name, &entry, kind);

        if kind.emits_renditions() {
            let variants = load_variants(filesystem, &entry, report)?;
            catalog.node_mut(id).variants = variants;
        } else {
            load_children(filesystem, &entry, catalog, id, report)?;
        }
    }
    Ok(())
}

fn load_variants(
    filesystem: &dyn Filesystem,
    dir: &Path,
    report: &mut StepReport,
) -> Result<Vec<Variant>> {
    let manifest_path = dir.join(CONTENTS_FILE);
    if !filesystem.exists(&manifest_path) {
        return Ok(Vec::new());
    }

    let bytes = filesystem.read(&manifest_path)?;
    let contents: Contents = serde_json::from_slice(&bytes)
        .map_err(|e| CompileError::Invalid(format!("{}: {e}", manifest_path.display())))?;

    let mut variants = Vec::new();
    for entry in contents.images {
        variants.push(image_variant(entry, &manifest_path, report));
    }
    for entry in contents.data {
        variants.push(data_variant(entry, &manifest_path, report));
    }
    Ok(variants)
}

/// Parse one slot string, reporting unknown values as warnings and
/// leaving the slot unset.
fn parse_slot<T>(
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    what: &str,
    manifest: &Path,
    report: &mut StepReport,
) -> Option<T> {
    let value = value?;
    let parsed = parse(value);
    if parsed.is_none() {
        report.warning(format!("unknown {what} {value:?}"), Some(manifest));
    }
    parsed
}

fn resizing(entry: ResizingEntry, manifest: &Path, report: &mut StepReport) -> Resizing {
    let insets = entry.cap_insets.unwrap_or_default();
    Resizing {
        mode: parse_slot(
            entry.mode.as_deref(),
            ResizingMode::parse,
            "resizing mode",
            manifest,
            report,
        ),
        center: entry
            .center
            .and_then(|c| {
                parse_slot(c.mode.as_deref(), CenterMode::parse, "center mode", manifest, report)
            })
            .unwrap_or_default(),
        cap_insets: CapInsets {
            top: insets.top.unwrap_or(0.0),
            left: insets.left.unwrap_or(0.0),
            bottom: insets.bottom.unwrap_or(0.0),
            right: insets.right.unwrap_or(0.0),
        },
    }
}

fn image_variant(entry: ImageEntry, manifest: &Path, report: &mut StepReport) -> Variant {
    let appearance = entry
        .appearances
        .iter()
        .find(|a| a.appearance == "luminosity")
        .and_then(|a| {
            parse_slot(
                a.value.as_deref(),
                Appearance::parse,
                "appearance",
                manifest,
                report,
            )
        });

    Variant {
        file_name: entry.filename,
        idiom: parse_slot(entry.idiom.as_deref(), Idiom::parse, "idiom", manifest, report),
        scale: parse_slot(entry.scale.as_deref(), Scale::parse, "scale", manifest, report),
        appearance,
        subtype: parse_slot(
            entry.subtype.as_deref(),
            DeviceSubtype::parse,
            "subtype",
            manifest,
            report,
        ),
        memory: parse_slot(
            entry.memory.as_deref(),
            MemoryClass::parse,
            "memory class",
            manifest,
            report,
        ),
        graphics: parse_slot(
            entry.graphics.as_deref(),
            GraphicsClass::parse,
            "graphics class",
            manifest,
            report,
        ),
        size_class_horizontal: parse_slot(
            entry.width_class.as_deref(),
            SizeClass::parse,
            "width class",
            manifest,
            report,
        ),
        size_class_vertical: parse_slot(
            entry.height_class.as_deref(),
            SizeClass::parse,
            "height class",
            manifest,
            report,
        ),
        direction: None,
        resizing: entry.resizing.map(|r| resizing(r, manifest, report)),
        unassigned: entry.unassigned,
    }
}

fn data_variant(entry: DataEntry, manifest: &Path, report: &mut StepReport) -> Variant {
    Variant {
        file_name: entry.filename,
        idiom: parse_slot(entry.idiom.as_deref(), Idiom::parse, "idiom", manifest, report),
        ..Variant::default()
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
