//! Container integrity tests: build, reopen, and corrupt on purpose.

use acbuild_bom::{BomError, Reader, TreeBuilder, Writer};
use tempfile::NamedTempFile;

#[test]
fn build_and_reopen_with_reserved_slots() {
    let temp = NamedTempFile::new().unwrap();
    let mut writer = Writer::create_with_reserve(temp.path(), 64).unwrap();

    let blob = writer.add_blob(b"header-ish bytes");
    writer.set_variable("HEADER", blob).unwrap();

    let mut builder = TreeBuilder::new();
    for i in 0..20u32 {
        builder
            .insert(format!("asset{i:03}").as_bytes(), &i.to_le_bytes())
            .unwrap();
    }
    let root = builder.finish(&mut writer).unwrap();
    writer.set_variable("TREE", root).unwrap();
    writer.commit().unwrap();

    let reader = Reader::open(temp.path()).unwrap();
    assert_eq!(reader.blob(reader.variable("HEADER").unwrap()).unwrap(), b"header-ish bytes");

    let tree = reader.tree(reader.variable("TREE").unwrap()).unwrap();
    assert_eq!(tree.len(), 20);

    let names: Vec<String> = reader.variable_names().map(String::from).collect();
    assert_eq!(names, vec!["HEADER", "TREE"]);
}

#[test]
fn fast_iter_borrows_without_copying() {
    let temp = NamedTempFile::new().unwrap();
    let mut writer = Writer::create(temp.path()).unwrap();
    let mut builder = TreeBuilder::new();
    builder.insert(b"key", b"value").unwrap();
    let root = builder.finish(&mut writer).unwrap();
    writer.set_variable("TREE", root).unwrap();
    writer.commit().unwrap();

    let reader = Reader::open(temp.path()).unwrap();
    let tree = reader.tree(reader.variable("TREE").unwrap()).unwrap();
    let collected: Vec<(&[u8], &[u8])> = tree.fast_iter().collect();
    assert_eq!(collected, vec![(b"key".as_slice(), b"value".as_slice())]);
}

#[test]
fn truncated_file_is_corrupt() {
    let temp = NamedTempFile::new().unwrap();
    let mut writer = Writer::create(temp.path()).unwrap();
    writer.add_blob(b"some payload to make the file non-trivial");
    writer.commit().unwrap();

    let mut bytes = std::fs::read(temp.path()).unwrap();
    bytes.truncate(bytes.len() - 8);
    assert!(matches!(
        Reader::from_bytes(bytes),
        Err(BomError::Corrupt(_))
    ));
}

#[test]
fn blob_slot_outside_payload_is_corrupt() {
    let temp = NamedTempFile::new().unwrap();
    let mut writer = Writer::create(temp.path()).unwrap();
    let slot = writer.add_blob(b"0123456789");
    writer.set_variable("B", slot).unwrap();
    writer.commit().unwrap();

    let mut bytes = std::fs::read(temp.path()).unwrap();
    // The index region starts right after the 10-byte payload at offset 32.
    // Slot 1's length field lives 8 + 4 bytes into the region; stomp it to
    // reach past the end of the file.
    let index_offset = u32::from_be_bytes(bytes[16..20].try_into().unwrap()) as usize;
    let length_at = index_offset + 8 + 4;
    bytes[length_at..length_at + 4].copy_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
    assert!(matches!(
        Reader::from_bytes(bytes),
        Err(BomError::Corrupt(_))
    ));
}

#[test]
fn empty_container_round_trips() {
    let temp = NamedTempFile::new().unwrap();
    let writer = Writer::create(temp.path()).unwrap();
    writer.commit().unwrap();

    let reader = Reader::open(temp.path()).unwrap();
    assert_eq!(reader.slot_count(), 1); // null slot only
    assert!(matches!(reader.variable("X"), Err(BomError::NotFound(_))));
}
