//! Archive thinning: a reader-to-writer pipeline that drops facets by
//! name and rendition variants by scale, copying survivors raw with no
//! re-encode.

use crate::error::{CompileError, Result};
use acbuild_bom as bom;
use acbuild_car::{ArchiveReader, ArchiveWriter, AttributeId};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Index slots a single-pass archive write needs: one each for the header
/// and key format, two per tree (root + leaf), and a key/value pair per
/// record.
pub fn reserved_index_count(facets: usize, renditions: usize) -> u32 {
    (6 + 2 * facets + 2 * renditions) as u32
}

#[derive(Debug, Clone, Default)]
pub struct ThinOptions {
    /// Facets whose name matches any of these patterns are dropped.
    pub remove_assets: Vec<String>,
    /// Renditions at these scales are dropped, unless that would leave
    /// their facet empty.
    pub remove_scales: Vec<u16>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ThinReport {
    pub facets_kept: usize,
    pub facets_dropped: usize,
    pub renditions_kept: usize,
    pub renditions_dropped: usize,
}

pub fn thin_archive(input: &Path, output: &Path, options: &ThinOptions) -> Result<ThinReport> {
    let filters = compile_filters(&options.remove_assets)?;
    let reader = ArchiveReader::open(input)?;
    let mut writer = start_copy(&reader, output)?;

    let identifier_at = reader.identifier_position()?;
    let scale_at = reader.keyformat().position(AttributeId::Scale);
    let mut by_identifier = group_renditions(&reader, identifier_at)?;

    let mut report = ThinReport::default();
    for facet in reader.facets()? {
        let Some(identifier) = facet.identifier() else {
            continue;
        };
        let all = by_identifier.remove(&identifier).unwrap_or_default();

        if filters.iter().any(|f| f.is_match(facet.name())) {
            report.facets_dropped += 1;
            report.renditions_dropped += all.len();
            continue;
        }

        let (mut kept, dropped): (Vec<_>, Vec<_>) = all.into_iter().partition(|(key, _)| {
            match scale_at.and_then(|at| reader.keyformat().slot_value(key, at)) {
                Some(scale) => !options.remove_scales.contains(&scale),
                None => true,
            }
        });
        // Scale thinning never empties a facet that had renditions.
        if kept.is_empty() && !dropped.is_empty() {
            debug!(facet = facet.name(), "scale filter would empty facet; keeping all");
            kept = dropped;
        } else {
            report.renditions_dropped += dropped.len();
        }

        writer.add_facet(facet)?;
        report.facets_kept += 1;
        for (key, value) in kept {
            writer.add_rendition_raw(&key, &value)?;
            report.renditions_kept += 1;
        }
    }

    writer.commit()?;
    Ok(report)
}

/// Keep only facets whose renditions match the given idiom and scale;
/// survivors copy raw with all their renditions. This is the info tool's
/// thinning mode.
pub fn filter_archive(
    input: &Path,
    output: &Path,
    idiom: Option<&str>,
    scale: Option<u16>,
) -> Result<ThinReport> {
    let reader = ArchiveReader::open(input)?;
    let mut writer = start_copy(&reader, output)?;

    let identifier_at = reader.identifier_position()?;
    let idiom_at = reader.keyformat().position(AttributeId::Idiom);
    let scale_at = reader.keyformat().position(AttributeId::Scale);
    let mut by_identifier = group_renditions(&reader, identifier_at)?;

    let mut report = ThinReport::default();
    for facet in reader.facets()? {
        let Some(identifier) = facet.identifier() else {
            continue;
        };
        let all = by_identifier.remove(&identifier).unwrap_or_default();

        // The facet's summary idiom and scale come from its last rendition.
        let last_key = all.last().map(|(key, _)| key.as_slice());
        let facet_idiom = last_key
            .and_then(|key| idiom_at.and_then(|at| reader.keyformat().slot_value(key, at)))
            .and_then(crate::slot::Idiom::from_code);
        let facet_scale =
            last_key.and_then(|key| scale_at.and_then(|at| reader.keyformat().slot_value(key, at)));

        let idiom_passes = match (idiom, facet_idiom) {
            (Some(wanted), Some(actual)) => wanted == actual.as_str(),
            (Some(_), None) => false,
            (None, _) => true,
        };
        let scale_passes = match (scale, facet_scale) {
            (Some(wanted), Some(actual)) => wanted == actual,
            (Some(_), None) => false,
            (None, _) => true,
        };
        if !idiom_passes || !scale_passes {
            report.facets_dropped += 1;
            report.renditions_dropped += all.len();
            continue;
        }

        writer.add_facet(facet)?;
        report.facets_kept += 1;
        for (key, value) in all {
            writer.add_rendition_raw(&key, &value)?;
            report.renditions_kept += 1;
        }
    }

    writer.commit()?;
    Ok(report)
}

fn compile_filters(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .map_err(|e| CompileError::Invalid(format!("pattern {pattern:?}: {e}")))
        })
        .collect()
}

fn start_copy(reader: &ArchiveReader, output: &Path) -> Result<ArchiveWriter> {
    let reserve = reserved_index_count(reader.facet_count(), reader.rendition_count());
    let bom_writer = bom::Writer::create_with_reserve(output, reserve)?;
    let mut writer = ArchiveWriter::with_header(bom_writer, reader.header().clone());
    writer.set_keyformat_from(reader.keyformat())?;
    Ok(writer)
}

/// All renditions as raw key/value copies, grouped by the identifier slot
/// of their key, preserving tree order within each group.
fn group_renditions(
    reader: &ArchiveReader,
    identifier_at: usize,
) -> Result<HashMap<u16, Vec<(Vec<u8>, Vec<u8>)>>> {
    let mut groups: HashMap<u16, Vec<(Vec<u8>, Vec<u8>)>> = HashMap::new();
    reader.rendition_fast_iter(|key, value| {
        if let Some(identifier) = reader.keyformat().slot_value(key, identifier_at) {
            groups
                .entry(identifier)
                .or_default()
                .push((key.to_vec(), value.to_vec()));
        }
    })?;
    Ok(groups)
}
