//! Key format: the ordered attribute list that defines the packed layout
//! of every rendition key in an archive.
//!
//! Stored in the `KEYFORMAT` variable as `"kfmt"` magic, u32 version, u32
//! count, then one u32 attribute code per entry, little-endian. Keys pack
//! one little-endian u16 value per entry in the same order; key comparison
//! is byte-wise, so the order is semantically significant and round-trips
//! byte-exact.

use crate::attributes::{AttributeId, AttributeList};
use crate::error::{CarError, Result};

pub const KEYFORMAT_MAGIC: [u8; 4] = *b"kfmt";
pub const KEYFORMAT_VERSION: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFormat {
    identifiers: Vec<AttributeId>,
}

impl KeyFormat {
    pub fn new(identifiers: Vec<AttributeId>) -> Result<Self> {
        if identifiers.is_empty() {
            return Err(CarError::Invalid("key format must not be empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for id in &identifiers {
            if !seen.insert(*id) {
                return Err(CarError::Invalid(format!(
                    "key format repeats attribute {}",
                    id.name()
                )));
            }
        }
        Ok(KeyFormat { identifiers })
    }

    pub fn identifiers(&self) -> &[AttributeId] {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Packed key width in bytes.
    pub fn key_len(&self) -> usize {
        self.identifiers.len() * 2
    }

    /// Position of an attribute within the packed key, if present.
    pub fn position(&self, id: AttributeId) -> Option<usize> {
        self.identifiers.iter().position(|&i| i == id)
    }

    /// Pack an attribute list: one little-endian u16 per entry in format
    /// order, 0 for attributes the list does not set.
    pub fn pack(&self, attributes: &AttributeList) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.key_len());
        for &id in &self.identifiers {
            let value = attributes.get(id).unwrap_or(0);
            key.extend_from_slice(&value.to_le_bytes());
        }
        key
    }

    /// Unpack a key into an attribute list. The key must be exactly one
    /// u16 per format entry.
    pub fn unpack(&self, key: &[u8]) -> Result<AttributeList> {
        if key.len() != self.key_len() {
            return Err(CarError::Corrupt(format!(
                "rendition key is {} bytes, format expects {}",
                key.len(),
                self.key_len()
            )));
        }
        let mut attributes = AttributeList::new();
        for (i, &id) in self.identifiers.iter().enumerate() {
            let value = u16::from_le_bytes(key[i * 2..i * 2 + 2].try_into().unwrap());
            attributes.set(id, value);
        }
        Ok(attributes)
    }

    /// Read one u16 slot out of a packed key without unpacking the rest.
    pub fn slot_value(&self, key: &[u8], position: usize) -> Option<u16> {
        let at = position * 2;
        key.get(at..at + 2)
            .map(|b| u16::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12 + self.identifiers.len() * 4);
        bytes.extend_from_slice(&KEYFORMAT_MAGIC);
        bytes.extend_from_slice(&KEYFORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.identifiers.len() as u32).to_le_bytes());
        for &id in &self.identifiers {
            bytes.extend_from_slice(&u32::from(id.code()).to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 12 {
            return Err(CarError::Corrupt("key format blob too small".into()));
        }
        if bytes[0..4] != KEYFORMAT_MAGIC {
            return Err(CarError::Corrupt("bad key format magic".into()));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != KEYFORMAT_VERSION {
            return Err(CarError::Unsupported(format!(
                "key format version {version}"
            )));
        }
        let count = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        if bytes.len() < 12 + count * 4 {
            return Err(CarError::Corrupt(format!(
                "key format declares {count} entries but holds {} bytes",
                bytes.len()
            )));
        }

        let mut identifiers = Vec::with_capacity(count);
        for i in 0..count {
            let at = 12 + i * 4;
            let code = u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
            let code16 = u16::try_from(code)
                .map_err(|_| CarError::Corrupt(format!("attribute code {code} out of range")))?;
            let id = AttributeId::from_u16(code16)
                .ok_or_else(|| CarError::Corrupt(format!("unknown attribute code {code}")))?;
            identifiers.push(id);
        }
        KeyFormat::new(identifiers)
    }
}
