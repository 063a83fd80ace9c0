//! Property tests: tree ordering, key width, facet/rendition linkage,
//! and raw round-trip equality.

use acbuild_bom as bom;
use acbuild_car::{
    ArchiveReader, ArchiveWriter, AttributeId, AttributeList, Compression, Facet, PixelFormat,
    Rendition,
};
use proptest::collection::{btree_map, btree_set, vec as pvec};
use proptest::prelude::*;
use tempfile::NamedTempFile;

proptest! {
    /// Keys read back strictly ascending in byte order, whatever was
    /// inserted and whatever the fanout.
    #[test]
    fn tree_keys_ascend(
        entries in btree_map(pvec(any::<u8>(), 1..24), pvec(any::<u8>(), 0..16), 0..120),
        fanout in 1usize..12,
    ) {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = bom::Writer::create(temp.path()).unwrap();
        let mut builder = bom::TreeBuilder::with_fanout(fanout);
        for (key, value) in &entries {
            builder.insert(key, value).unwrap();
        }
        let root = builder.finish(&mut writer).unwrap();
        writer.set_variable("TREE", root).unwrap();
        writer.commit().unwrap();

        let reader = bom::Reader::open(temp.path()).unwrap();
        let tree = reader.tree(reader.variable("TREE").unwrap()).unwrap();
        prop_assert_eq!(tree.len(), entries.len());

        let mut previous: Option<Vec<u8>> = None;
        for (key, value) in tree.iter() {
            if let Some(p) = &previous {
                prop_assert!(p < &key);
            }
            prop_assert_eq!(Some(&value), entries.get(&key));
            previous = Some(key);
        }
    }

    /// Build an arbitrary logical archive, copy it raw, and check key
    /// width, linkage, and logical equality.
    #[test]
    fn archive_raw_copy_preserves_logical_records(
        facets in btree_map(
            "[A-Za-z][A-Za-z0-9]{0,11}",
            btree_set((0u16..4, 1u16..4), 1..4),
            1..10,
        ),
    ) {
        let keyformat = vec![AttributeId::Idiom, AttributeId::Scale, AttributeId::Identifier];

        let source = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(source.path()).unwrap());
        writer.set_keyformat(keyformat).unwrap();
        for (name, variants) in &facets {
            let id = writer.add_facet(Facet::new(name, AttributeList::new())).unwrap();
            for (idiom, scale) in variants {
                let attrs = AttributeList::from_pairs([
                    (AttributeId::Idiom, *idiom),
                    (AttributeId::Scale, *scale),
                    (AttributeId::Identifier, id),
                ]);
                let rendition = Rendition::new_raster(
                    PixelFormat::Bgra8,
                    2,
                    2,
                    u32::from(*scale) * 100,
                    vec![*idiom as u8; 16],
                ).unwrap();
                writer.add_rendition(&attrs, &rendition, Compression::Rle).unwrap();
            }
        }
        writer.commit().unwrap();

        let reader = ArchiveReader::open(source.path()).unwrap();

        // Every key is exactly one u16 per key-format entry.
        let key_len = reader.keyformat().key_len();
        reader.rendition_fast_iter(|key, _| assert_eq!(key.len(), key_len)).unwrap();

        // Every rendition links to exactly one facet, every facet to at
        // least one rendition.
        let loaded = reader.facets().unwrap();
        prop_assert_eq!(loaded.len(), facets.len());
        let mut linked = 0usize;
        for facet in &loaded {
            let renditions = reader.lookup_renditions(facet).unwrap();
            prop_assert!(!renditions.is_empty());
            linked += renditions.len();
        }
        prop_assert_eq!(linked, reader.rendition_count());

        // Raw copy into a fresh archive keeps the same logical records.
        let copy = NamedTempFile::new().unwrap();
        let mut copier = ArchiveWriter::create(bom::Writer::create(copy.path()).unwrap());
        copier.set_keyformat_from(reader.keyformat()).unwrap();
        for facet in &loaded {
            copier.add_facet(facet.clone()).unwrap();
        }
        let mut records: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        reader.rendition_fast_iter(|key, value| records.push((key.to_vec(), value.to_vec()))).unwrap();
        for (key, value) in &records {
            copier.add_rendition_raw(key, value).unwrap();
        }
        copier.commit().unwrap();

        let copied = ArchiveReader::open(copy.path()).unwrap();
        prop_assert_eq!(copied.facet_count(), reader.facet_count());
        let mut copied_records: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        copied.rendition_fast_iter(|key, value| copied_records.push((key.to_vec(), value.to_vec()))).unwrap();
        prop_assert_eq!(copied_records, records);
    }

    /// Rendition payloads round-trip through every encoder the compiler
    /// emits.
    #[test]
    fn rendition_codec_round_trips(
        width in 1u32..24,
        height in 1u32..24,
        seed in any::<u8>(),
        algorithm in prop::sample::select(vec![
            Compression::None,
            Compression::Rle,
            Compression::Zlib,
            Compression::Palette,
        ]),
    ) {
        let pixels: Vec<u8> = (0..(width * height * 4) as usize)
            .map(|i| seed.wrapping_add((i % 7) as u8))
            .collect();
        let rendition = Rendition::new_raster(
            PixelFormat::Bgra8, width, height, 100, pixels.clone(),
        ).unwrap();

        let decoded = Rendition::decode(&rendition.encode(algorithm).unwrap()).unwrap();
        prop_assert_eq!(decoded.pixels, pixels);
        prop_assert_eq!(decoded.width, width);
        prop_assert_eq!(decoded.height, height);
    }
}
