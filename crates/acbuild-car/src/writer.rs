//! Archive writer.
//!
//! Facets and renditions accumulate in memory and the whole archive is
//! written in one pass at `commit` through the container writer, which is
//! the single point at which on-disk state becomes visible.

use crate::attributes::{AttributeId, AttributeList};
use crate::codec::Compression;
use crate::error::{CarError, Result};
use crate::facet::Facet;
use crate::header::CarHeader;
use crate::keyformat::KeyFormat;
use crate::rendition::Rendition;
use crate::{SIDECAR_NAMES, VAR_CARHEADER, VAR_FACETKEYS, VAR_KEYFORMAT, VAR_RENDITIONS};
use acbuild_bom as bom;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Facet identifiers are assigned monotonically from here, skipping any
/// identifier observed on explicit-id input.
pub const FIRST_IDENTIFIER: u16 = 128;

pub struct ArchiveWriter {
    bom: bom::Writer,
    header: CarHeader,
    keyformat: Option<KeyFormat>,
    facets: BTreeMap<String, Facet>,
    renditions: BTreeMap<Vec<u8>, Vec<u8>>,
    used_identifiers: HashSet<u16>,
    next_identifier: u16,
    sidecars: Vec<(String, Vec<u8>)>,
}

impl ArchiveWriter {
    pub fn create(bom: bom::Writer) -> Self {
        Self::with_header(bom, CarHeader::new("acbuild"))
    }

    pub fn with_header(bom: bom::Writer, header: CarHeader) -> Self {
        ArchiveWriter {
            bom,
            header,
            keyformat: None,
            facets: BTreeMap::new(),
            renditions: BTreeMap::new(),
            used_identifiers: HashSet::new(),
            next_identifier: FIRST_IDENTIFIER,
            sidecars: Vec::new(),
        }
    }

    /// Set the key format. Must happen before any rendition is added and
    /// may only happen once; the identifier attribute is mandatory since
    /// every rendition key links to its facet through it.
    pub fn set_keyformat(&mut self, identifiers: Vec<AttributeId>) -> Result<()> {
        self.install_keyformat(KeyFormat::new(identifiers)?)
    }

    /// Adopt an existing key format unchanged (the thin tool's round-trip
    /// path; order is preserved byte-exact).
    pub fn set_keyformat_from(&mut self, keyformat: &KeyFormat) -> Result<()> {
        self.install_keyformat(keyformat.clone())
    }

    fn install_keyformat(&mut self, keyformat: KeyFormat) -> Result<()> {
        if self.keyformat.is_some() {
            return Err(CarError::Invalid("key format may only be set once".into()));
        }
        if keyformat.position(AttributeId::Identifier).is_none() {
            return Err(CarError::Invalid(
                "key format must include the identifier attribute".into(),
            ));
        }
        self.keyformat = Some(keyformat);
        Ok(())
    }

    pub fn keyformat(&self) -> Option<&KeyFormat> {
        self.keyformat.as_ref()
    }

    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    pub fn rendition_count(&self) -> usize {
        self.renditions.len()
    }

    /// Add a facet, assigning an identifier when the input carries none and
    /// respecting (and reserving) an explicit one. Duplicate names error.
    pub fn add_facet(&mut self, mut facet: Facet) -> Result<u16> {
        if self.facets.contains_key(facet.name()) {
            return Err(CarError::Conflict(format!(
                "duplicate facet name {:?}",
                facet.name()
            )));
        }

        let identifier = match facet.identifier() {
            Some(explicit) => {
                if !self.used_identifiers.insert(explicit) {
                    return Err(CarError::Conflict(format!(
                        "facet identifier {explicit} already in use"
                    )));
                }
                explicit
            }
            None => {
                while self.used_identifiers.contains(&self.next_identifier) {
                    self.next_identifier += 1;
                }
                let assigned = self.next_identifier;
                self.used_identifiers.insert(assigned);
                self.next_identifier += 1;
                facet.set_identifier(assigned);
                assigned
            }
        };

        self.facets.insert(facet.name().to_string(), facet);
        Ok(identifier)
    }

    /// Encode and add a rendition under the packed key for `attributes`.
    pub fn add_rendition(
        &mut self,
        attributes: &AttributeList,
        rendition: &Rendition,
        algorithm: Compression,
    ) -> Result<()> {
        let keyformat = self.require_keyformat()?;
        let key = keyformat.pack(attributes);
        let value = rendition.encode(algorithm)?;
        self.insert_rendition(key, value)
    }

    /// Add an already-encoded rendition record under a pre-packed key. The
    /// key must match the key format's width.
    pub fn add_rendition_raw(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let keyformat = self.require_keyformat()?;
        if key.len() != keyformat.key_len() {
            return Err(CarError::Invalid(format!(
                "rendition key is {} bytes, format expects {}",
                key.len(),
                keyformat.key_len()
            )));
        }
        self.insert_rendition(key.to_vec(), value.to_vec())
    }

    fn insert_rendition(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        if self.renditions.contains_key(&key) {
            return Err(CarError::Conflict("duplicate rendition key".into()));
        }
        self.renditions.insert(key, value);
        Ok(())
    }

    pub fn add_sidecar(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        if !SIDECAR_NAMES.contains(&name) {
            return Err(CarError::Invalid(format!("{name:?} is not a sidecar name")));
        }
        self.sidecars.push((name.to_string(), bytes.to_vec()));
        Ok(())
    }

    fn require_keyformat(&self) -> Result<&KeyFormat> {
        self.keyformat
            .as_ref()
            .ok_or_else(|| CarError::Invalid("key format must be set first".into()))
    }

    /// Write the header, key format, both trees, and any sidecars, then
    /// commit the container.
    pub fn commit(mut self) -> Result<()> {
        let keyformat = self
            .keyformat
            .take()
            .ok_or_else(|| CarError::Invalid("key format must be set before commit".into()))?;
        let identifier_at = keyformat
            .position(AttributeId::Identifier)
            .ok_or_else(|| CarError::Corrupt("key format lacks the identifier attribute".into()))?;

        // Facet/rendition linkage: every rendition must resolve to a facet;
        // a facet with no renditions is not emitted.
        let facet_identifiers: HashSet<u16> = self
            .facets
            .values()
            .filter_map(|f| f.identifier())
            .collect();
        let mut live_identifiers = HashSet::new();
        for key in self.renditions.keys() {
            let identifier = keyformat.slot_value(key, identifier_at).ok_or_else(|| {
                CarError::Invalid("rendition key narrower than key format".into())
            })?;
            if !facet_identifiers.contains(&identifier) {
                return Err(CarError::Invalid(format!(
                    "rendition references unknown facet identifier {identifier}"
                )));
            }
            live_identifiers.insert(identifier);
        }
        self.facets.retain(|name, facet| {
            let live = facet
                .identifier()
                .is_some_and(|id| live_identifiers.contains(&id));
            if !live {
                warn!(facet = %name, "dropping facet with no renditions");
            }
            live
        });

        let header_slot = self.bom.add_blob(&self.header.to_bytes());
        self.bom.set_variable(VAR_CARHEADER, header_slot)?;

        let keyformat_slot = self.bom.add_blob(&keyformat.to_bytes());
        self.bom.set_variable(VAR_KEYFORMAT, keyformat_slot)?;

        let mut facet_tree = bom::TreeBuilder::new();
        for (name, facet) in &self.facets {
            facet_tree.insert(name.as_bytes(), &facet.to_bytes())?;
        }
        let facet_root = facet_tree.finish(&mut self.bom)?;
        self.bom.set_variable(VAR_FACETKEYS, facet_root)?;

        let mut rendition_tree = bom::TreeBuilder::new();
        for (key, value) in &self.renditions {
            rendition_tree.insert(key, value)?;
        }
        let rendition_root = rendition_tree.finish(&mut self.bom)?;
        self.bom.set_variable(VAR_RENDITIONS, rendition_root)?;

        for (name, bytes) in &self.sidecars {
            let slot = self.bom.add_blob(bytes);
            self.bom.set_variable(name, slot)?;
        }

        debug!(
            facets = self.facets.len(),
            renditions = self.renditions.len(),
            "committing archive"
        );
        self.bom.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendition::PixelFormat;
    use crate::reader::ArchiveReader;
    use tempfile::NamedTempFile;

    fn keyformat() -> Vec<AttributeId> {
        vec![AttributeId::Idiom, AttributeId::Scale, AttributeId::Identifier]
    }

    fn simple_rendition(scale_percent: u32) -> Rendition {
        Rendition::new_raster(PixelFormat::Bgra8, 2, 2, scale_percent, vec![9; 16]).unwrap()
    }

    #[test]
    fn identifier_assignment_starts_at_128_and_skips_used() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
        writer.set_keyformat(keyformat()).unwrap();

        let explicit = Facet::new(
            "Explicit",
            AttributeList::from_pairs([(AttributeId::Identifier, 129)]),
        );
        assert_eq!(writer.add_facet(explicit).unwrap(), 129);

        let a = writer.add_facet(Facet::new("A", AttributeList::new())).unwrap();
        let b = writer.add_facet(Facet::new("B", AttributeList::new())).unwrap();
        assert_eq!(a, 128);
        assert_eq!(b, 130); // 129 was reserved by the explicit facet
    }

    #[test]
    fn duplicate_facet_name_conflicts() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
        writer.set_keyformat(keyformat()).unwrap();
        writer.add_facet(Facet::new("Logo", AttributeList::new())).unwrap();
        assert!(matches!(
            writer.add_facet(Facet::new("Logo", AttributeList::new())),
            Err(CarError::Conflict(_))
        ));
    }

    #[test]
    fn keyformat_is_set_once() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
        writer.set_keyformat(keyformat()).unwrap();
        assert!(matches!(
            writer.set_keyformat(keyformat()),
            Err(CarError::Invalid(_))
        ));
    }

    #[test]
    fn keyformat_requires_identifier() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
        assert!(matches!(
            writer.set_keyformat(vec![AttributeId::Idiom, AttributeId::Scale]),
            Err(CarError::Invalid(_))
        ));
    }

    #[test]
    fn rendition_before_keyformat_is_invalid() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
        let attrs = AttributeList::from_pairs([(AttributeId::Identifier, 128)]);
        assert!(matches!(
            writer.add_rendition(&attrs, &simple_rendition(100), Compression::Rle),
            Err(CarError::Invalid(_))
        ));
    }

    #[test]
    fn duplicate_key_conflicts() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
        writer.set_keyformat(keyformat()).unwrap();
        let attrs = AttributeList::from_pairs([
            (AttributeId::Idiom, 1),
            (AttributeId::Scale, 1),
            (AttributeId::Identifier, 128),
        ]);
        writer
            .add_rendition(&attrs, &simple_rendition(100), Compression::Rle)
            .unwrap();
        assert!(matches!(
            writer.add_rendition(&attrs, &simple_rendition(100), Compression::Rle),
            Err(CarError::Conflict(_))
        ));
    }

    #[test]
    fn facet_without_renditions_is_not_emitted() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
        writer.set_keyformat(keyformat()).unwrap();

        let kept = writer.add_facet(Facet::new("Kept", AttributeList::new())).unwrap();
        writer.add_facet(Facet::new("Empty", AttributeList::new())).unwrap();

        let attrs = AttributeList::from_pairs([
            (AttributeId::Scale, 1),
            (AttributeId::Identifier, kept),
        ]);
        writer
            .add_rendition(&attrs, &simple_rendition(100), Compression::Rle)
            .unwrap();
        writer.commit().unwrap();

        let reader = ArchiveReader::open(temp.path()).unwrap();
        assert_eq!(reader.facet_count(), 1);
        let facets = reader.facets().unwrap();
        assert_eq!(facets[0].name(), "Kept");
    }

    #[test]
    fn rendition_with_unknown_identifier_is_invalid() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = ArchiveWriter::create(bom::Writer::create(temp.path()).unwrap());
        writer.set_keyformat(keyformat()).unwrap();
        let attrs = AttributeList::from_pairs([(AttributeId::Identifier, 9999)]);
        writer
            .add_rendition(&attrs, &simple_rendition(100), Compression::Rle)
            .unwrap();
        assert!(matches!(writer.commit(), Err(CarError::Invalid(_))));
    }
}
