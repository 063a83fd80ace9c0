//! Archive reader: the typed layer over a container reader.

use crate::attributes::{AttributeId, AttributeList};
use crate::error::{CarError, Result};
use crate::facet::Facet;
use crate::header::CarHeader;
use crate::keyformat::KeyFormat;
use crate::rendition::Rendition;
use crate::{SIDECAR_NAMES, VAR_CARHEADER, VAR_FACETKEYS, VAR_KEYFORMAT, VAR_RENDITIONS};
use acbuild_bom as bom;

pub struct ArchiveReader {
    bom: bom::Reader,
    header: CarHeader,
    keyformat: KeyFormat,
    facet_count: usize,
    rendition_count: usize,
}

impl ArchiveReader {
    /// Load and validate the schema: `CARHEADER` and `KEYFORMAT` must be
    /// present and supported, and both trees must open cleanly.
    pub fn load(bom: bom::Reader) -> Result<Self> {
        let header_slot = bom
            .variable(VAR_CARHEADER)
            .map_err(|_| CarError::NotFound("CARHEADER variable".into()))?;
        let header = CarHeader::from_bytes(bom.blob(header_slot)?)?;

        let keyformat_slot = bom
            .variable(VAR_KEYFORMAT)
            .map_err(|_| CarError::NotFound("KEYFORMAT variable".into()))?;
        let keyformat = KeyFormat::from_bytes(bom.blob(keyformat_slot)?)?;

        let facet_count = bom.tree(bom.variable(VAR_FACETKEYS)?)?.len();
        let rendition_count = bom.tree(bom.variable(VAR_RENDITIONS)?)?.len();

        Ok(ArchiveReader {
            bom,
            header,
            keyformat,
            facet_count,
            rendition_count,
        })
    }

    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::load(bom::Reader::open(path)?)
    }

    pub fn header(&self) -> &CarHeader {
        &self.header
    }

    pub fn keyformat(&self) -> &KeyFormat {
        &self.keyformat
    }

    pub fn facet_count(&self) -> usize {
        self.facet_count
    }

    pub fn rendition_count(&self) -> usize {
        self.rendition_count
    }

    /// Visit every facet in ascending name order.
    pub fn facet_iter(&self, mut visit: impl FnMut(&Facet)) -> Result<()> {
        let tree = self.bom.tree(self.bom.variable(VAR_FACETKEYS)?)?;
        for (key, value) in tree.fast_iter() {
            let name = std::str::from_utf8(key)
                .map_err(|_| CarError::Corrupt("facet name is not UTF-8".into()))?;
            let facet = Facet::from_bytes(name, value)?;
            visit(&facet);
        }
        Ok(())
    }

    pub fn facets(&self) -> Result<Vec<Facet>> {
        let mut out = Vec::with_capacity(self.facet_count);
        self.facet_iter(|facet| out.push(facet.clone()))?;
        Ok(out)
    }

    /// Visit every rendition decoded, in ascending key order.
    pub fn rendition_iter(
        &self,
        mut visit: impl FnMut(&AttributeList, &Rendition),
    ) -> Result<()> {
        let tree = self.bom.tree(self.bom.variable(VAR_RENDITIONS)?)?;
        for (key, value) in tree.fast_iter() {
            let attributes = self.keyformat.unpack(key)?;
            let rendition = Rendition::decode(value)?;
            visit(&attributes, &rendition);
        }
        Ok(())
    }

    /// Visit every rendition as raw borrowed `(key, value)` slices, for
    /// copy-free filtering.
    pub fn rendition_fast_iter(&self, mut visit: impl FnMut(&[u8], &[u8])) -> Result<()> {
        let tree = self.bom.tree(self.bom.variable(VAR_RENDITIONS)?)?;
        for (key, value) in tree.fast_iter() {
            visit(key, value);
        }
        Ok(())
    }

    /// All renditions whose key's identifier slot matches the facet's
    /// identifier, decoded, in ascending key order.
    pub fn lookup_renditions(&self, facet: &Facet) -> Result<Vec<(AttributeList, Rendition)>> {
        let identifier = facet.identifier().ok_or_else(|| {
            CarError::Invalid(format!("facet {:?} has no identifier", facet.name()))
        })?;
        let position = self.identifier_position()?;

        let tree = self.bom.tree(self.bom.variable(VAR_RENDITIONS)?)?;
        let mut out = Vec::new();
        for (key, value) in tree.fast_iter() {
            if self.keyformat.slot_value(key, position) == Some(identifier) {
                out.push((self.keyformat.unpack(key)?, Rendition::decode(value)?));
            }
        }
        Ok(out)
    }

    /// Position of the identifier attribute within packed keys.
    pub fn identifier_position(&self) -> Result<usize> {
        self.keyformat
            .position(AttributeId::Identifier)
            .ok_or_else(|| CarError::Corrupt("key format lacks the identifier attribute".into()))
    }

    /// A sidecar blob by name, when present.
    pub fn sidecar(&self, name: &str) -> Result<Option<&[u8]>> {
        if !SIDECAR_NAMES.contains(&name) {
            return Err(CarError::Invalid(format!("{name:?} is not a sidecar name")));
        }
        match self.bom.variable(name) {
            Ok(slot) => Ok(Some(self.bom.blob(slot)?)),
            Err(_) => Ok(None),
        }
    }

    /// Names of the sidecars this archive carries.
    pub fn sidecar_names(&self) -> Vec<&str> {
        SIDECAR_NAMES
            .iter()
            .copied()
            .filter(|name| self.bom.has_variable(name))
            .collect()
    }
}
