//! Thinning and info-tool scenarios over pre-built archives.

use acbuild::{archive_info, filter_archive, thin_archive, InfoOptions, ThinOptions};
use acbuild_bom as bom;
use acbuild_car::{
    ArchiveReader, ArchiveWriter, AttributeId, AttributeList, Compression, Facet, Metadata,
    PixelFormat, Rendition,
};
use std::path::Path;
use tempfile::NamedTempFile;

fn keyformat() -> Vec<AttributeId> {
    vec![AttributeId::Idiom, AttributeId::Scale, AttributeId::Identifier]
}

/// Build an archive of plain image facets: (name, [(idiom, scale)]).
fn build_archive(path: &Path, facets: &[(&str, &[(u16, u16)])]) {
    let mut writer = ArchiveWriter::create(bom::Writer::create(path).unwrap());
    writer.set_keyformat(keyformat()).unwrap();

    for (name, variants) in facets {
        let id = writer.add_facet(Facet::new(name, AttributeList::new())).unwrap();
        for (idiom, scale) in *variants {
            let attrs = AttributeList::from_pairs([
                (AttributeId::Idiom, *idiom),
                (AttributeId::Scale, *scale),
                (AttributeId::Identifier, id),
            ]);
            let size = 4 * u32::from(*scale).max(1);
            let mut rendition = Rendition::new_raster(
                PixelFormat::Bgra8,
                size,
                size,
                u32::from(*scale) * 100,
                vec![128; (size * size * 4) as usize],
            )
            .unwrap();
            rendition
                .metadata
                .push(Metadata::FileName(format!("{name}-{scale}x.png")));
            writer.add_rendition(&attrs, &rendition, Compression::Rle).unwrap();
        }
    }
    writer.commit().unwrap();
}

fn facet_names(path: &Path) -> Vec<String> {
    ArchiveReader::open(path)
        .unwrap()
        .facets()
        .unwrap()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

fn raw_records(path: &Path) -> Vec<(Vec<u8>, Vec<u8>)> {
    let reader = ArchiveReader::open(path).unwrap();
    let mut out = Vec::new();
    reader
        .rendition_fast_iter(|key, value| out.push((key.to_vec(), value.to_vec())))
        .unwrap();
    out
}

#[test]
fn thin_by_regex_drops_matching_facets() {
    let input = NamedTempFile::new().unwrap();
    build_archive(
        input.path(),
        &[
            ("Bar", &[(1, 1)]),
            ("Baz", &[(1, 1), (1, 2)]),
            ("Foo", &[(1, 1)]),
        ],
    );

    let output = NamedTempFile::new().unwrap();
    let options = ThinOptions {
        remove_assets: vec!["^Ba.*".into()],
        remove_scales: vec![],
    };
    let report = thin_archive(input.path(), output.path(), &options).unwrap();

    assert_eq!(facet_names(output.path()), vec!["Foo"]);
    assert_eq!(report.facets_dropped, 2);
    assert_eq!(report.renditions_dropped, 3);
    assert_eq!(ArchiveReader::open(output.path()).unwrap().rendition_count(), 1);
}

#[test]
fn thin_by_scale_keeps_last_rendition_per_facet() {
    let input = NamedTempFile::new().unwrap();
    build_archive(input.path(), &[("Bar", &[(1, 2)]), ("Foo", &[(1, 1), (1, 2)])]);

    let output = NamedTempFile::new().unwrap();
    let options = ThinOptions {
        remove_assets: vec![],
        remove_scales: vec![2],
    };
    thin_archive(input.path(), output.path(), &options).unwrap();

    let reader = ArchiveReader::open(output.path()).unwrap();
    assert_eq!(reader.facet_count(), 2);

    let facets = reader.facets().unwrap();
    for facet in &facets {
        let renditions = reader.lookup_renditions(facet).unwrap();
        match facet.name() {
            // Foo loses its 2x variant.
            "Foo" => {
                assert_eq!(renditions.len(), 1);
                assert_eq!(renditions[0].0.get(AttributeId::Scale), Some(1));
            }
            // Bar keeps its only rendition: the safety rule forbids
            // emptying the facet.
            "Bar" => {
                assert_eq!(renditions.len(), 1);
                assert_eq!(renditions[0].0.get(AttributeId::Scale), Some(2));
            }
            other => panic!("unexpected facet {other}"),
        }
    }
}

#[test]
fn thinning_twice_is_idempotent() {
    let input = NamedTempFile::new().unwrap();
    build_archive(
        input.path(),
        &[("Alpha", &[(1, 1), (1, 2), (1, 3)]), ("Beta", &[(1, 2)])],
    );

    let options = ThinOptions {
        remove_assets: vec!["^Nothing$".into()],
        remove_scales: vec![3],
    };
    let once = NamedTempFile::new().unwrap();
    thin_archive(input.path(), once.path(), &options).unwrap();
    let twice = NamedTempFile::new().unwrap();
    thin_archive(once.path(), twice.path(), &options).unwrap();

    assert_eq!(facet_names(once.path()), facet_names(twice.path()));
    assert_eq!(raw_records(once.path()), raw_records(twice.path()));
}

#[test]
fn filter_archive_keeps_matching_idiom_and_scale() {
    let input = NamedTempFile::new().unwrap();
    // phone=1, pad=2
    build_archive(input.path(), &[("PadOnly", &[(2, 2)]), ("PhoneOnly", &[(1, 2)])]);

    let output = NamedTempFile::new().unwrap();
    let report = filter_archive(input.path(), output.path(), Some("phone"), None).unwrap();
    assert_eq!(facet_names(output.path()), vec!["PhoneOnly"]);
    assert_eq!(report.facets_dropped, 1);

    let output2 = NamedTempFile::new().unwrap();
    filter_archive(input.path(), output2.path(), None, Some(2)).unwrap();
    assert_eq!(facet_names(output2.path()), vec!["PadOnly", "PhoneOnly"]);
}

#[test]
fn info_lists_facets_and_renditions() {
    let input = NamedTempFile::new().unwrap();
    build_archive(input.path(), &[("Logo", &[(1, 1), (1, 2)])]);

    let value = archive_info(input.path(), &InfoOptions::default()).unwrap();
    let entries = value.as_array().unwrap();
    // One facet entry plus two rendition entries.
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[0]["AssetType"], "MultiSized Image");
    assert_eq!(entries[0]["Name"], "Logo");
    assert_eq!(entries[0]["Idiom"], "phone");
    assert_eq!(entries[0]["Scale"], 2); // last rendition's scale
    assert_eq!(entries[0]["Sizes"].as_array().unwrap().len(), 2);

    assert_eq!(entries[1]["AssetType"], "Image");
    assert_eq!(entries[1]["RenditionName"], "Logo-1x.png");
    assert_eq!(entries[1]["PixelWidth"], 4);
    assert_eq!(entries[2]["PixelWidth"], 8);
}

#[test]
fn info_marks_icon_files() {
    let input = NamedTempFile::new().unwrap();
    let mut writer = ArchiveWriter::create(bom::Writer::create(input.path()).unwrap());
    writer.set_keyformat(keyformat()).unwrap();
    let id = writer.add_facet(Facet::new("Home", AttributeList::new())).unwrap();
    let attrs = AttributeList::from_pairs([
        (AttributeId::Idiom, 0),
        (AttributeId::Scale, 1),
        (AttributeId::Identifier, id),
    ]);
    let mut rendition =
        Rendition::new_raster(PixelFormat::Bgra8, 2, 2, 100, vec![0; 16]).unwrap();
    rendition.metadata.push(Metadata::FileName("Icon-Home.png".into()));
    writer.add_rendition(&attrs, &rendition, Compression::None).unwrap();
    writer.commit().unwrap();

    let value = archive_info(input.path(), &InfoOptions::default()).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries[1]["AssetType"], "Icon Image");
}

#[test]
fn info_filters_by_idiom() {
    let input = NamedTempFile::new().unwrap();
    build_archive(input.path(), &[("PadThing", &[(2, 1)]), ("PhoneThing", &[(1, 1)])]);

    let options = InfoOptions {
        idiom: Some("pad".into()),
        scale: None,
    };
    let value = archive_info(input.path(), &options).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 2); // facet + its one rendition
    assert_eq!(entries[0]["Name"], "PadThing");
}
