//! In-memory asset tree.
//!
//! An arena owns every node by value; nodes address each other through
//! [`AssetId`] indices, with a parent index for upward lookups during
//! compile. No shared ownership, no cycles.

pub mod manifest;

use crate::slot::{
    Appearance, DeviceSubtype, Direction, GraphicsClass, Idiom, MemoryClass, Scale, SizeClass,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(u32);

impl AssetId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The closed set of asset kinds. Interior kinds carry children; leaf
/// kinds carry variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Catalog,
    Group,
    AppIconSet,
    LaunchImage,
    BrandAssets,
    ComplicationSet,
    GcDashboardImage,
    GcLeaderboard,
    GcLeaderboardSet,
    ImageSet,
    IconSet,
    DataSet,
    ImageStack,
    ImageStackLayer,
    SpriteAtlas,
}

impl AssetKind {
    /// Directory extension that marks a node of this kind, `None` for
    /// catalogs and plain groups.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "imageset" => Some(AssetKind::ImageSet),
            "appiconset" => Some(AssetKind::AppIconSet),
            "launchimage" => Some(AssetKind::LaunchImage),
            "iconset" => Some(AssetKind::IconSet),
            "dataset" => Some(AssetKind::DataSet),
            "brandassets" => Some(AssetKind::BrandAssets),
            "complicationset" => Some(AssetKind::ComplicationSet),
            "gcdashboardimage" => Some(AssetKind::GcDashboardImage),
            "gcleaderboard" => Some(AssetKind::GcLeaderboard),
            "gcleaderboardset" => Some(AssetKind::GcLeaderboardSet),
            "imagestack" => Some(AssetKind::ImageStack),
            "imagestacklayer" => Some(AssetKind::ImageStackLayer),
            "spriteatlas" => Some(AssetKind::SpriteAtlas),
            _ => None,
        }
    }

    /// Leaf kinds whose variants compile straight to renditions.
    pub fn emits_renditions(self) -> bool {
        matches!(
            self,
            AssetKind::ImageSet
                | AssetKind::IconSet
                | AssetKind::DataSet
                | AssetKind::AppIconSet
                | AssetKind::LaunchImage
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizingMode {
    ThreePartHorizontal,
    ThreePartVertical,
    NinePart,
}

impl ResizingMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "3-part-horizontal" => Some(ResizingMode::ThreePartHorizontal),
            "3-part-vertical" => Some(ResizingMode::ThreePartVertical),
            "9-part" => Some(ResizingMode::NinePart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CenterMode {
    #[default]
    Tile,
    Stretch,
}

impl CenterMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tile" => Some(CenterMode::Tile),
            "stretch" => Some(CenterMode::Stretch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CapInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resizing {
    pub mode: Option<ResizingMode>,
    pub center: CenterMode,
    pub cap_insets: CapInsets,
}

/// One variant of a leaf asset: slot attributes plus the on-disk file it
/// selects.
#[derive(Debug, Clone, Default)]
pub struct Variant {
    pub file_name: Option<String>,
    pub idiom: Option<Idiom>,
    pub scale: Option<Scale>,
    pub appearance: Option<Appearance>,
    pub subtype: Option<DeviceSubtype>,
    pub memory: Option<MemoryClass>,
    pub graphics: Option<GraphicsClass>,
    pub size_class_horizontal: Option<SizeClass>,
    pub size_class_vertical: Option<SizeClass>,
    pub direction: Option<Direction>,
    pub resizing: Option<Resizing>,
    pub unassigned: bool,
}

#[derive(Debug, Clone)]
pub struct AssetNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: AssetKind,
    pub variants: Vec<Variant>,
    parent: Option<AssetId>,
    children: Vec<AssetId>,
}

impl AssetNode {
    pub fn parent(&self) -> Option<AssetId> {
        self.parent
    }

    pub fn children(&self) -> &[AssetId] {
        &self.children
    }
}

/// The arena. The root node is always a `Catalog` at index 0.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    nodes: Vec<AssetNode>,
}

impl AssetCatalog {
    pub fn new(name: &str, path: &Path) -> Self {
        AssetCatalog {
            nodes: vec![AssetNode {
                name: name.to_string(),
                path: path.to_path_buf(),
                kind: AssetKind::Catalog,
                variants: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> AssetId {
        AssetId(0)
    }

    pub fn add_child(
        &mut self,
        parent: AssetId,
        name: &str,
        path: &Path,
        kind: AssetKind,
    ) -> AssetId {
        let id = AssetId(self.nodes.len() as u32);
        self.nodes.push(AssetNode {
            name: name.to_string(),
            path: path.to_path_buf(),
            kind,
            variants: Vec::new(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn node(&self, id: AssetId) -> &AssetNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: AssetId) -> &mut AssetNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Child names of a node, in insertion order.
    pub fn child_names(&self, id: AssetId) -> Vec<&str> {
        self.nodes[id.index()]
            .children
            .iter()
            .map(|&child| self.nodes[child.index()].name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_links_parents_and_children() {
        let mut catalog = AssetCatalog::new("Assets", Path::new("Assets.xcassets"));
        let root = catalog.root();
        let group = catalog.add_child(root, "Icons", Path::new("Assets.xcassets/Icons"), AssetKind::Group);
        let leaf = catalog.add_child(
            group,
            "Back",
            Path::new("Assets.xcassets/Icons/Back.imageset"),
            AssetKind::ImageSet,
        );

        assert_eq!(catalog.node(leaf).parent(), Some(group));
        assert_eq!(catalog.node(group).parent(), Some(root));
        assert_eq!(catalog.node(root).parent(), None);
        assert_eq!(catalog.child_names(group), vec!["Back"]);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn kinds_from_extension() {
        assert_eq!(AssetKind::from_extension("imageset"), Some(AssetKind::ImageSet));
        assert_eq!(AssetKind::from_extension("spriteatlas"), Some(AssetKind::SpriteAtlas));
        assert_eq!(AssetKind::from_extension("xcassets"), None);
        assert!(AssetKind::DataSet.emits_renditions());
        assert!(!AssetKind::SpriteAtlas.emits_renditions());
    }
}
