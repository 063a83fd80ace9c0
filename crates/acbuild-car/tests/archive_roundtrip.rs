//! Archive-level round trips and invariant checks.

use acbuild_bom as bom;
use acbuild_car::{
    ArchiveReader, ArchiveWriter, AttributeId, AttributeList, CarError, Compression, Facet,
    PixelFormat, Rendition,
};
use tempfile::NamedTempFile;

fn keyformat() -> Vec<AttributeId> {
    vec![
        AttributeId::Idiom,
        AttributeId::Subtype,
        AttributeId::Scale,
        AttributeId::Identifier,
    ]
}

fn gradient(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::new();
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x * 8) as u8, (y * 8) as u8, 0, 255]);
        }
    }
    pixels
}

fn write_sample(path: &std::path::Path) {
    let mut writer = ArchiveWriter::create(bom::Writer::create(path).unwrap());
    writer.set_keyformat(keyformat()).unwrap();

    for (name, scales) in [("Back", vec![1u16, 2]), ("Logo", vec![1]), ("Spinner", vec![2, 3])] {
        let id = writer.add_facet(Facet::new(name, AttributeList::new())).unwrap();
        for scale in scales {
            let attrs = AttributeList::from_pairs([
                (AttributeId::Idiom, 1),
                (AttributeId::Scale, scale),
                (AttributeId::Identifier, id),
            ]);
            let size = 4 * scale as u32;
            let rendition = Rendition::new_raster(
                PixelFormat::Bgra8,
                size,
                size,
                100 * scale as u32,
                gradient(size, size),
            )
            .unwrap();
            writer
                .add_rendition(&attrs, &rendition, Compression::Rle)
                .unwrap();
        }
    }
    writer.commit().unwrap();
}

#[test]
fn facets_iterate_in_name_order() {
    let temp = NamedTempFile::new().unwrap();
    write_sample(temp.path());

    let reader = ArchiveReader::open(temp.path()).unwrap();
    assert_eq!(reader.facet_count(), 3);
    assert_eq!(reader.rendition_count(), 5);

    let mut names = Vec::new();
    reader
        .facet_iter(|facet| names.push(facet.name().to_string()))
        .unwrap();
    assert_eq!(names, vec!["Back", "Logo", "Spinner"]);
}

#[test]
fn every_rendition_links_to_exactly_one_facet() {
    let temp = NamedTempFile::new().unwrap();
    write_sample(temp.path());

    let reader = ArchiveReader::open(temp.path()).unwrap();
    let facets = reader.facets().unwrap();

    let mut total = 0;
    for facet in &facets {
        let renditions = reader.lookup_renditions(facet).unwrap();
        assert!(!renditions.is_empty(), "facet {} has no renditions", facet.name());
        for (attrs, _) in &renditions {
            assert_eq!(attrs.get(AttributeId::Identifier), facet.identifier());
        }
        total += renditions.len();
    }
    assert_eq!(total, reader.rendition_count());
}

#[test]
fn key_width_matches_key_format() {
    let temp = NamedTempFile::new().unwrap();
    write_sample(temp.path());

    let reader = ArchiveReader::open(temp.path()).unwrap();
    let expected = reader.keyformat().key_len();
    reader
        .rendition_fast_iter(|key, value| {
            assert_eq!(key.len(), expected);
            assert!(!value.is_empty());
        })
        .unwrap();
}

#[test]
fn raw_copy_preserves_logical_records() {
    let source = NamedTempFile::new().unwrap();
    write_sample(source.path());
    let reader = ArchiveReader::open(source.path()).unwrap();

    let copy = NamedTempFile::new().unwrap();
    let mut writer = ArchiveWriter::create(bom::Writer::create(copy.path()).unwrap());
    writer.set_keyformat_from(reader.keyformat()).unwrap();
    reader
        .facet_iter(|facet| {
            writer.add_facet(facet.clone()).unwrap();
        })
        .unwrap();
    let mut raw: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    reader
        .rendition_fast_iter(|key, value| raw.push((key.to_vec(), value.to_vec())))
        .unwrap();
    for (key, value) in &raw {
        writer.add_rendition_raw(key, value).unwrap();
    }
    writer.commit().unwrap();

    let copied = ArchiveReader::open(copy.path()).unwrap();
    assert_eq!(copied.keyformat(), reader.keyformat());
    assert_eq!(copied.facet_count(), reader.facet_count());
    assert_eq!(copied.rendition_count(), reader.rendition_count());

    let mut copied_raw: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    copied
        .rendition_fast_iter(|key, value| copied_raw.push((key.to_vec(), value.to_vec())))
        .unwrap();
    assert_eq!(copied_raw, raw);
}

#[test]
fn sidecars_survive_round_trip() {
    let temp = NamedTempFile::new().unwrap();
    let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
    writer.set_keyformat(keyformat()).unwrap();
    let id = writer.add_facet(Facet::new("X", AttributeList::new())).unwrap();
    let attrs = AttributeList::from_pairs([(AttributeId::Identifier, id), (AttributeId::Scale, 1)]);
    let rendition =
        Rendition::new_raster(PixelFormat::Bgra8, 1, 1, 100, vec![0, 0, 0, 255]).unwrap();
    writer.add_rendition(&attrs, &rendition, Compression::None).unwrap();
    writer.add_sidecar("COLORS", b"color table bytes").unwrap();
    writer.commit().unwrap();

    let reader = ArchiveReader::open(temp.path()).unwrap();
    assert_eq!(reader.sidecar_names(), vec!["COLORS"]);
    assert_eq!(reader.sidecar("COLORS").unwrap(), Some(b"color table bytes".as_slice()));
    assert_eq!(reader.sidecar("FONTS").unwrap(), None);
    assert!(matches!(
        reader.sidecar("NOTASIDECAR"),
        Err(CarError::Invalid(_))
    ));
}

#[test]
fn container_without_carheader_is_not_an_archive() {
    let temp = NamedTempFile::new().unwrap();
    let mut bom_writer = bom::Writer::create(temp.path()).unwrap();
    let blob = bom_writer.add_blob(b"unrelated");
    bom_writer.set_variable("SOMETHING", blob).unwrap();
    bom_writer.commit().unwrap();

    assert!(matches!(
        ArchiveReader::open(temp.path()),
        Err(CarError::NotFound(_))
    ));
}
