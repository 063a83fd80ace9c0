//! Compile pipeline: walk the asset tree, select matching variants, and
//! write the archive (or folder output for pre-archive targets).
//!
//! The walk is a single recursion with one dispatch over the asset kind.
//! Each step returns its own [`StepReport`]; a failing asset is recorded
//! and the walk continues, while container-level failures (I/O, corrupt
//! output) abort the run.

pub mod container;
pub mod image_set;
pub mod output;
pub mod sidecars;

use crate::asset::{AssetCatalog, AssetId, AssetKind};
use crate::diagnostics::StepReport;
use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::imagecodec::ImageCodec;
use crate::slot::Idiom;
use acbuild_bom as bom;
use acbuild_car::{ArchiveWriter, AttributeId, AttributeList, Facet};
use output::{copy_to_folder, determine_output_format, Destination, OutputFormat, ARCHIVE_FILE_NAME};
use std::path::PathBuf;
use tracing::{debug, info};

/// The attribute order every archive this compiler emits uses for its
/// packed rendition keys.
pub const DEFAULT_KEY_FORMAT: &[AttributeId] = &[
    AttributeId::Element,
    AttributeId::Idiom,
    AttributeId::Subtype,
    AttributeId::MemoryClass,
    AttributeId::GraphicsClass,
    AttributeId::SizeClassHorizontal,
    AttributeId::SizeClassVertical,
    AttributeId::Appearance,
    AttributeId::Direction,
    AttributeId::Scale,
    AttributeId::Identifier,
];

/// The build configuration, populated by the CLI driver.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub output: PathBuf,
    pub app_icon: Option<String>,
    pub launch_image: Option<String>,
    pub platform: Option<String>,
    pub target_device: Vec<String>,
    pub minimum_deployment_target: Option<String>,
    pub optimization: Option<String>,
    pub compress_pngs: bool,
    pub enable_on_demand_resources: bool,
    pub enable_incremental_distill: bool,
    pub target_name: Option<String>,
    pub filter_for_device_model: Option<String>,
    pub filter_for_device_os_version: Option<String>,
    pub output_partial_info_plist: Option<PathBuf>,
    pub export_dependency_info: Option<PathBuf>,
}

impl CompileOptions {
    /// Whether a variant with this idiom passes the target-device filter.
    /// Universal variants always pass; an empty filter passes everything.
    pub fn targets_idiom(&self, idiom: Idiom) -> bool {
        if self.target_device.is_empty() || idiom == Idiom::Universal {
            return true;
        }
        self.target_device
            .iter()
            .filter_map(|device| device_idiom(device))
            .any(|target| target == idiom)
    }
}

fn device_idiom(device: &str) -> Option<Idiom> {
    match device {
        "iphone" => Some(Idiom::Phone),
        "ipad" => Some(Idiom::Pad),
        "mac" => Some(Idiom::Desktop),
        "tv" | "appletv" => Some(Idiom::Tv),
        "watch" | "applewatch" => Some(Idiom::Watch),
        "carplay" => Some(Idiom::Car),
        _ => None,
    }
}

pub struct CompileOutcome {
    pub report: StepReport,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

pub struct Compiler<'a> {
    pub options: &'a CompileOptions,
    pub filesystem: &'a dyn Filesystem,
    pub codec: &'a dyn ImageCodec,
}

impl Compiler<'_> {
    /// Compile the given catalogs into the configured output directory.
    pub fn run(&self, catalogs: &[AssetCatalog]) -> Result<CompileOutcome> {
        let format = determine_output_format(self.options.minimum_deployment_target.as_deref())?;
        let mut report = StepReport::new();
        let mut outputs = Vec::new();

        if self.options.enable_incremental_distill {
            report.warning("incremental distill is accepted but not implemented", None);
        }

        self.filesystem.create_dir_all(&self.options.output)?;
        let mut destination = match format {
            OutputFormat::Compiled => {
                let path = self.options.output.join(ARCHIVE_FILE_NAME);
                let mut writer = ArchiveWriter::create(bom::Writer::create(&path)?);
                writer.set_keyformat(DEFAULT_KEY_FORMAT.to_vec())?;
                outputs.push(path);
                Destination::Archive(writer)
            }
            OutputFormat::Folder => {
                info!(output = %self.options.output.display(), "emitting folder-form output");
                Destination::Folder(self.options.output.clone())
            }
        };

        let mut inputs = Vec::new();
        for catalog in catalogs {
            inputs.push(catalog.node(catalog.root()).path.clone());
            let step = self.compile_node(catalog, catalog.root(), &mut destination);
            report.merge(step);
        }

        if let Destination::Archive(writer) = destination {
            writer.commit()?;
        }

        if let Some(path) = &self.options.output_partial_info_plist {
            sidecars::write_partial_info_plist(self.filesystem, path, self.options)?;
            outputs.push(path.clone());
        }
        if let Some(path) = &self.options.export_dependency_info {
            let input_refs: Vec<&std::path::Path> = inputs.iter().map(PathBuf::as_path).collect();
            let output_refs: Vec<&std::path::Path> = outputs.iter().map(PathBuf::as_path).collect();
            sidecars::write_dependency_info(self.filesystem, path, &input_refs, &output_refs)?;
        }

        Ok(CompileOutcome {
            report,
            inputs,
            outputs,
        })
    }

    /// One traversal step. The dispatch decides what the node emits and
    /// whether the walk descends into its children.
    fn compile_node(
        &self,
        catalog: &AssetCatalog,
        id: AssetId,
        destination: &mut Destination,
    ) -> StepReport {
        let node = catalog.node(id);
        let mut report = StepReport::new();

        match node.kind {
            AssetKind::Catalog | AssetKind::Group => {
                self.compile_children(catalog, id, destination, &mut report);
            }
            AssetKind::AppIconSet => {
                if Some(node.name.as_str()) == self.options.app_icon.as_deref() {
                    self.compile_leaf(catalog, id, destination, &mut report);
                }
            }
            AssetKind::LaunchImage => {
                if Some(node.name.as_str()) == self.options.launch_image.as_deref() {
                    self.compile_leaf(catalog, id, destination, &mut report);
                }
            }
            AssetKind::ImageSet | AssetKind::IconSet | AssetKind::DataSet => {
                self.compile_leaf(catalog, id, destination, &mut report);
            }
            AssetKind::BrandAssets
            | AssetKind::ComplicationSet
            | AssetKind::GcDashboardImage
            | AssetKind::GcLeaderboard
            | AssetKind::GcLeaderboardSet
            | AssetKind::ImageStack
            | AssetKind::SpriteAtlas => {
                self.emit_container_record(catalog, id, destination, &mut report);
                self.compile_children(catalog, id, destination, &mut report);
            }
            AssetKind::ImageStackLayer => {
                // Layer children stay uncompiled until layered images
                // carry content that needs them.
                self.emit_container_record(catalog, id, destination, &mut report);
            }
        }

        report
    }

    fn compile_children(
        &self,
        catalog: &AssetCatalog,
        id: AssetId,
        destination: &mut Destination,
        report: &mut StepReport,
    ) {
        for &child in catalog.node(id).children() {
            let step = self.compile_node(catalog, child, destination);
            report.merge(step);
        }
    }

    /// Emit renditions for a leaf, then its facet, provided at least one
    /// rendition survived selection.
    fn compile_leaf(
        &self,
        catalog: &AssetCatalog,
        id: AssetId,
        destination: &mut Destination,
        report: &mut StepReport,
    ) {
        let node = catalog.node(id);
        match destination {
            Destination::Archive(writer) => {
                let pending = image_set::build_renditions(
                    node,
                    self.options,
                    self.filesystem,
                    self.codec,
                    report,
                );
                if pending.is_empty() {
                    debug!(asset = %node.name, "no renditions selected");
                    return;
                }

                let facet = Facet::new(&node.name, AttributeList::new());
                let identifier = match writer.add_facet(facet) {
                    Ok(identifier) => identifier,
                    Err(e) => {
                        report.error(e.to_string(), Some(&node.path));
                        return;
                    }
                };
                report.facets_emitted += 1;

                for mut entry in pending {
                    entry.attributes.set(AttributeId::Identifier, identifier);
                    match writer.add_rendition(&entry.attributes, &entry.rendition, entry.algorithm)
                    {
                        Ok(()) => report.renditions_emitted += 1,
                        Err(e) => report.error(e.to_string(), Some(&node.path)),
                    }
                }
            }
            Destination::Folder(root) => {
                for variant in &node.variants {
                    let Some(file_name) = variant.file_name.as_deref() else {
                        continue;
                    };
                    if variant.unassigned {
                        continue;
                    }
                    match variant.idiom {
                        Some(idiom) if self.options.targets_idiom(idiom) => {}
                        _ => continue,
                    }
                    let source = node.path.join(file_name);
                    if let Err(e) =
                        copy_to_folder(self.filesystem, root, &node.name, &source, file_name)
                    {
                        report.error(e.to_string(), Some(&node.path));
                    }
                }
            }
        }
    }

    fn emit_container_record(
        &self,
        catalog: &AssetCatalog,
        id: AssetId,
        destination: &mut Destination,
        report: &mut StepReport,
    ) {
        let Some(writer) = destination.archive_mut() else {
            // Folder output predates container records.
            return;
        };
        let node = catalog.node(id);
        let Some((mut attributes, rendition, algorithm)) = container::build_record(catalog, id)
        else {
            return;
        };

        let facet = Facet::new(&node.name, AttributeList::new());
        match writer.add_facet(facet) {
            Ok(identifier) => {
                attributes.set(AttributeId::Identifier, identifier);
                match writer.add_rendition(&attributes, &rendition, algorithm) {
                    Ok(()) => {
                        report.facets_emitted += 1;
                        report.renditions_emitted += 1;
                    }
                    Err(e) => report.error(e.to_string(), Some(&node.path)),
                }
            }
            Err(e) => report.error(e.to_string(), Some(&node.path)),
        }
    }
}
