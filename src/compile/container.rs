//! Container records for interior kinds that appear in the archive
//! (brand assets, complication sets, Game Center art, image stacks,
//! sprite atlases).
//!
//! Each container compiles to a facet plus a single data rendition whose
//! payload names the kind and the container's children; the element
//! attribute carries the kind's record code.

use crate::asset::{AssetCatalog, AssetId, AssetKind};
use acbuild_car::{AttributeId, AttributeList, Compression, Rendition};
use serde::Serialize;

#[derive(Serialize)]
struct ContainerRecord<'a> {
    kind: &'a str,
    children: Vec<&'a str>,
}

/// Element-attribute codes for container records. The codes are part of
/// the emitted archive and stay stable.
pub fn record_code(kind: AssetKind) -> Option<u16> {
    match kind {
        AssetKind::BrandAssets => Some(101),
        AssetKind::ComplicationSet => Some(102),
        AssetKind::GcDashboardImage => Some(103),
        AssetKind::GcLeaderboard => Some(104),
        AssetKind::GcLeaderboardSet => Some(105),
        AssetKind::ImageStack => Some(106),
        AssetKind::ImageStackLayer => Some(107),
        AssetKind::SpriteAtlas => Some(108),
        _ => None,
    }
}

pub fn kind_name(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::BrandAssets => "brand-assets",
        AssetKind::ComplicationSet => "complication-set",
        AssetKind::GcDashboardImage => "gc-dashboard-image",
        AssetKind::GcLeaderboard => "gc-leaderboard",
        AssetKind::GcLeaderboardSet => "gc-leaderboard-set",
        AssetKind::ImageStack => "image-stack",
        AssetKind::ImageStackLayer => "image-stack-layer",
        AssetKind::SpriteAtlas => "sprite-atlas",
        AssetKind::Catalog => "catalog",
        AssetKind::Group => "group",
        AssetKind::AppIconSet => "app-icon-set",
        AssetKind::LaunchImage => "launch-image",
        AssetKind::ImageSet => "image-set",
        AssetKind::IconSet => "icon-set",
        AssetKind::DataSet => "data-set",
    }
}

/// Build the record rendition for a container node, when its kind has one.
pub fn build_record(
    catalog: &AssetCatalog,
    id: AssetId,
) -> Option<(AttributeList, Rendition, Compression)> {
    let node = catalog.node(id);
    let code = record_code(node.kind)?;

    let record = ContainerRecord {
        kind: kind_name(node.kind),
        children: catalog.child_names(id),
    };
    // Infallible for this struct shape.
    let payload = serde_json::to_vec(&record).unwrap_or_default();

    let mut attributes = AttributeList::new();
    attributes.set(AttributeId::Element, code);

    Some((attributes, Rendition::new_data(payload), Compression::None))
}
