//! Facet records: the named, attribute-free identity of an asset.
//!
//! Stored in the `FACETKEYS` tree with the UTF-8 name as key. The value is
//! a hot spot (u16 x, u16 y), a u16 attribute count, then the attribute
//! pairs, all little-endian. The `identifier` attribute carries the facet's
//! unique 16-bit handle within the archive.

use crate::attributes::{AttributeId, AttributeList};
use crate::error::{CarError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    name: String,
    hotspot_x: u16,
    hotspot_y: u16,
    attributes: AttributeList,
}

impl Facet {
    pub fn new(name: &str, attributes: AttributeList) -> Self {
        Facet {
            name: name.to_string(),
            hotspot_x: 0,
            hotspot_y: 0,
            attributes,
        }
    }

    pub fn with_hotspot(name: &str, x: u16, y: u16, attributes: AttributeList) -> Self {
        Facet {
            name: name.to_string(),
            hotspot_x: x,
            hotspot_y: y,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hotspot(&self) -> (u16, u16) {
        (self.hotspot_x, self.hotspot_y)
    }

    pub fn attributes(&self) -> &AttributeList {
        &self.attributes
    }

    pub fn identifier(&self) -> Option<u16> {
        self.attributes.get(AttributeId::Identifier)
    }

    pub fn set_identifier(&mut self, identifier: u16) {
        self.attributes.set(AttributeId::Identifier, identifier);
    }

    /// Serialize the tree value (the name lives in the tree key).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(6 + self.attributes.len() * 4);
        bytes.extend_from_slice(&self.hotspot_x.to_le_bytes());
        bytes.extend_from_slice(&self.hotspot_y.to_le_bytes());
        bytes.extend_from_slice(&(self.attributes.len() as u16).to_le_bytes());
        self.attributes.write_to(&mut bytes);
        bytes
    }

    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 6 {
            return Err(CarError::Corrupt(format!(
                "facet value for {name:?} is {} bytes",
                bytes.len()
            )));
        }
        let hotspot_x = u16::from_le_bytes(bytes[0..2].try_into().unwrap());
        let hotspot_y = u16::from_le_bytes(bytes[2..4].try_into().unwrap());
        let count = u16::from_le_bytes(bytes[4..6].try_into().unwrap()) as usize;
        let attributes = AttributeList::parse(&bytes[6..], count)?;
        Ok(Facet {
            name: name.to_string(),
            hotspot_x,
            hotspot_y,
            attributes,
        })
    }
}
