//! Leaf compilation: turn a leaf asset's variants into rendition records.
//!
//! Variant selection, conflict resolution (later wins, with a warning),
//! source decode through the image-codec collaborator, and synthesis of
//! the rendition metadata: file name, nine-part/three-part slices from the
//! resizing declaration, cap insets.

use crate::asset::{AssetNode, CenterMode, Resizing, ResizingMode, Variant};
use crate::compile::CompileOptions;
use crate::diagnostics::StepReport;
use crate::filesystem::Filesystem;
use crate::imagecodec::ImageCodec;
use crate::slot::Idiom;
use acbuild_car::{codec, AttributeId, AttributeList, Compression, Layout, Metadata, Rect, Rendition};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// A rendition ready for the writer, minus the facet identifier (assigned
/// when the facet is created, after at least one rendition survives).
pub struct PendingRendition {
    pub attributes: AttributeList,
    pub rendition: Rendition,
    pub algorithm: Compression,
}

/// Compile a leaf's variants. Skipped variants are silent or warned per
/// cause; two variants producing the same packed attributes resolve
/// later-wins with a warning.
pub fn build_renditions(
    node: &AssetNode,
    options: &CompileOptions,
    filesystem: &dyn Filesystem,
    codec_impl: &dyn ImageCodec,
    report: &mut StepReport,
) -> Vec<PendingRendition> {
    let mut selected: BTreeMap<Vec<(u16, u16)>, PendingRendition> = BTreeMap::new();

    for variant in &node.variants {
        if variant.unassigned || variant.file_name.is_none() {
            continue;
        }
        let Some(idiom) = variant.idiom else {
            report.warning("variant has no idiom", Some(&node.path));
            continue;
        };
        if !options.targets_idiom(idiom) {
            debug!(asset = %node.name, idiom = idiom.as_str(), "variant outside target filter");
            continue;
        }

        let Some(pending) = build_one(node, variant, idiom, options, filesystem, codec_impl, report)
        else {
            continue;
        };

        let signature: Vec<(u16, u16)> = pending
            .attributes
            .iter()
            .map(|(id, value)| (id.code(), value))
            .collect();
        if selected.insert(signature, pending).is_some() {
            report.warning(
                format!("conflicting variants for {:?}; the later one wins", node.name),
                Some(&node.path),
            );
        }
    }

    selected.into_values().collect()
}

fn build_one(
    node: &AssetNode,
    variant: &Variant,
    idiom: Idiom,
    options: &CompileOptions,
    filesystem: &dyn Filesystem,
    codec_impl: &dyn ImageCodec,
    report: &mut StepReport,
) -> Option<PendingRendition> {
    let file_name = variant.file_name.as_deref()?;
    let source = node.path.join(file_name);
    let scale_percent = variant.scale.map(|s| s.percent()).unwrap_or(0);

    let contents = match filesystem.read(&source) {
        Ok(contents) => contents,
        Err(e) => {
            report.error(format!("unable to read {file_name:?}: {e}"), Some(&node.path));
            return None;
        }
    };

    let (mut rendition, algorithm) = if node.kind == crate::asset::AssetKind::DataSet {
        (Rendition::new_data(contents), Compression::None)
    } else if is_png(file_name) {
        let buffer = match codec_impl.decode_png(&contents) {
            Ok(buffer) => buffer,
            Err(e) => {
                report.error(format!("{file_name:?}: {e}"), Some(&node.path));
                return None;
            }
        };
        let bytes_per_pixel = buffer.format.bytes_per_pixel().unwrap_or(4);
        let algorithm = codec::choose(&buffer.pixels, bytes_per_pixel, options.compress_pngs);
        let rendition = match Rendition::new_raster(
            buffer.format,
            buffer.width,
            buffer.height,
            scale_percent,
            buffer.pixels,
        ) {
            Ok(rendition) => rendition,
            Err(e) => {
                report.error(format!("{file_name:?}: {e}"), Some(&node.path));
                return None;
            }
        };
        (rendition, algorithm)
    } else if is_jpeg(file_name) {
        (
            Rendition::new_jpeg(0, 0, scale_percent, contents),
            Compression::Jpeg,
        )
    } else {
        report.error(format!("unknown file type {file_name:?}"), Some(&node.path));
        return None;
    };

    rendition.metadata.push(Metadata::FileName(file_name.to_string()));
    if let Some(resizing) = &variant.resizing {
        apply_resizing(&mut rendition, resizing);
    }

    Some(PendingRendition {
        attributes: variant_attributes(variant, idiom),
        rendition,
        algorithm,
    })
}

/// The packed attributes a variant declares, identifier excluded.
fn variant_attributes(variant: &Variant, idiom: Idiom) -> AttributeList {
    let mut attributes = AttributeList::new();
    attributes.set(AttributeId::Idiom, idiom.code());
    if let Some(scale) = variant.scale {
        attributes.set(AttributeId::Scale, scale.code());
    }
    if let Some(appearance) = variant.appearance {
        attributes.set(AttributeId::Appearance, appearance.code());
    }
    if let Some(subtype) = variant.subtype {
        attributes.set(AttributeId::Subtype, subtype.code());
    }
    if let Some(memory) = variant.memory {
        attributes.set(AttributeId::MemoryClass, memory.code());
    }
    if let Some(graphics) = variant.graphics {
        attributes.set(AttributeId::GraphicsClass, graphics.code());
    }
    if let Some(size_class) = variant.size_class_horizontal {
        attributes.set(AttributeId::SizeClassHorizontal, size_class.code());
    }
    if let Some(size_class) = variant.size_class_vertical {
        attributes.set(AttributeId::SizeClassVertical, size_class.code());
    }
    if let Some(direction) = variant.direction {
        attributes.set(AttributeId::Direction, direction.code());
    }
    attributes
}

fn apply_resizing(rendition: &mut Rendition, resizing: &Resizing) {
    let Some(mode) = resizing.mode else {
        return;
    };
    rendition.layout = layout_for(mode, resizing.center);
    rendition.metadata.push(Metadata::Slices(slices_for(
        rendition.width,
        rendition.height,
        mode,
        resizing,
    )));
    rendition.metadata.push(Metadata::Insets {
        top: resizing.cap_insets.top as u32,
        left: resizing.cap_insets.left as u32,
        bottom: resizing.cap_insets.bottom as u32,
        right: resizing.cap_insets.right as u32,
    });
}

fn layout_for(mode: ResizingMode, center: CenterMode) -> Layout {
    match (mode, center) {
        (ResizingMode::ThreePartHorizontal, CenterMode::Tile) => Layout::ThreePartHorizontalTile,
        (ResizingMode::ThreePartHorizontal, CenterMode::Stretch) => {
            Layout::ThreePartHorizontalScale
        }
        (ResizingMode::ThreePartVertical, CenterMode::Tile) => Layout::ThreePartVerticalTile,
        (ResizingMode::ThreePartVertical, CenterMode::Stretch) => Layout::ThreePartVerticalScale,
        (ResizingMode::NinePart, CenterMode::Tile) => Layout::NinePartTile,
        (ResizingMode::NinePart, CenterMode::Stretch) => Layout::NinePartScale,
    }
}

/// Slice rectangles for a resizable image. The vertical origin is the
/// bottom edge.
fn slices_for(width: u32, height: u32, mode: ResizingMode, resizing: &Resizing) -> Vec<Rect> {
    let insets = &resizing.cap_insets;
    let left_width = insets.left as u32;
    let right_width = insets.right as u32;
    let center_width = width.saturating_sub(left_width + right_width);
    let top_height = insets.top as u32;
    let bottom_height = insets.bottom as u32;
    let center_height = height.saturating_sub(top_height + bottom_height);

    let top_y = height.saturating_sub(top_height);
    let center_y = bottom_height;
    let center_x = left_width;
    let right_x = width.saturating_sub(right_width);

    match mode {
        ResizingMode::ThreePartHorizontal => vec![
            Rect { x: 0, y: 0, width: left_width, height },
            Rect { x: center_x, y: 0, width: center_width, height },
            Rect { x: right_x, y: 0, width: right_width, height },
        ],
        ResizingMode::ThreePartVertical => vec![
            Rect { x: 0, y: top_y, width, height: top_height },
            Rect { x: 0, y: center_y, width, height: center_height },
            Rect { x: 0, y: 0, width, height: bottom_height },
        ],
        ResizingMode::NinePart => vec![
            Rect { x: 0, y: top_y, width: left_width, height: top_height },
            Rect { x: center_x, y: top_y, width: center_width, height: top_height },
            Rect { x: right_x, y: top_y, width: right_width, height: top_height },
            Rect { x: 0, y: center_y, width: left_width, height: center_height },
            Rect { x: center_x, y: center_y, width: center_width, height: center_height },
            Rect { x: right_x, y: center_y, width: right_width, height: center_height },
            Rect { x: 0, y: 0, width: left_width, height: bottom_height },
            Rect { x: center_x, y: 0, width: center_width, height: bottom_height },
            Rect { x: right_x, y: 0, width: right_width, height: bottom_height },
        ],
    }
}

pub(crate) fn is_png(file_name: &str) -> bool {
    has_extension(file_name, &["png"])
}

pub(crate) fn is_jpeg(file_name: &str) -> bool {
    has_extension(file_name, &["jpg", "jpeg"])
}

fn has_extension(file_name: &str, extensions: &[&str]) -> bool {
    Path::new(file_name)
        .extension()
        .map(|e| {
            let lower = e.to_string_lossy().to_lowercase();
            extensions.contains(&lower.as_str())
        })
        .unwrap_or(false)
}
