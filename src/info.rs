//! Archive introspection: one JSON entry per facet that passes the
//! idiom/scale filters, followed by one entry per rendition of that facet.

use crate::error::Result;
use crate::slot::Idiom;
use acbuild_car::{ArchiveReader, AttributeId, AttributeList, Rendition};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct InfoOptions {
    pub idiom: Option<String>,
    pub scale: Option<u16>,
}

#[derive(Serialize)]
struct FacetEntry {
    #[serde(rename = "AssetType")]
    asset_type: &'static str,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Idiom")]
    idiom: String,
    #[serde(rename = "Scale")]
    scale: u16,
    #[serde(rename = "Sizes")]
    sizes: Vec<String>,
}

#[derive(Serialize)]
struct RenditionEntry {
    #[serde(rename = "RenditionName")]
    rendition_name: String,
    #[serde(rename = "Idiom")]
    idiom: String,
    #[serde(rename = "AssetType")]
    asset_type: &'static str,
    #[serde(rename = "PixelHeight")]
    pixel_height: u32,
    #[serde(rename = "PixelWidth")]
    pixel_width: u32,
}

const ICON_PREFIX: &str = "Icon-";

/// Describe an archive as a JSON array.
pub fn archive_info(input: &Path, options: &InfoOptions) -> Result<Value> {
    let reader = ArchiveReader::open(input)?;

    // Decode every rendition once, grouped by facet identifier.
    let mut by_identifier: HashMap<u16, Vec<(AttributeList, Rendition)>> = HashMap::new();
    reader.rendition_iter(|attributes, rendition| {
        if let Some(identifier) = attributes.get(AttributeId::Identifier) {
            by_identifier
                .entry(identifier)
                .or_default()
                .push((attributes.clone(), rendition.clone()));
        }
    })?;

    let mut entries: Vec<Value> = Vec::new();
    for facet in reader.facets()? {
        let Some(identifier) = facet.identifier() else {
            continue;
        };
        let renditions = by_identifier.remove(&identifier).unwrap_or_default();

        // The facet's summary idiom and scale come from its last rendition.
        let mut facet_idiom = String::new();
        let mut facet_scale = 0u16;
        let mut sizes = Vec::with_capacity(renditions.len());
        for (index, (attributes, rendition)) in renditions.iter().enumerate() {
            facet_scale = attributes.get(AttributeId::Scale).unwrap_or(0);
            facet_idiom = idiom_string(attributes);
            sizes.push(format!(
                "{}x{} index:{} idiom:{}",
                rendition.width, rendition.height, index, facet_idiom
            ));
        }

        if let Some(wanted) = &options.idiom {
            if *wanted != facet_idiom {
                continue;
            }
        }
        if let Some(wanted) = options.scale {
            if wanted != facet_scale {
                continue;
            }
        }

        entries.push(serde_json::to_value(FacetEntry {
            asset_type: "MultiSized Image",
            name: facet.name().to_string(),
            idiom: facet_idiom,
            scale: facet_scale,
            sizes,
        })?);

        for (attributes, rendition) in &renditions {
            let rendition_name = rendition.file_name().unwrap_or_default().to_string();
            let asset_type = if rendition_name.starts_with(ICON_PREFIX) {
                "Icon Image"
            } else {
                "Image"
            };
            entries.push(serde_json::to_value(RenditionEntry {
                rendition_name,
                idiom: idiom_string(attributes),
                asset_type,
                pixel_height: rendition.height,
                pixel_width: rendition.width,
            })?);
        }
    }

    Ok(Value::Array(entries))
}

fn idiom_string(attributes: &AttributeList) -> String {
    attributes
        .get(AttributeId::Idiom)
        .and_then(Idiom::from_code)
        .map(|idiom| idiom.as_str().to_string())
        .unwrap_or_default()
}
