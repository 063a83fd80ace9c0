//! Variables directory: short textual names bound to index slots.
//!
//! Serialized as u32 count, then (u32 slot, u8 name length, name bytes)
//! records with no padding. Insertion order is preserved on disk.

use crate::error::{BomError, Result};

#[derive(Debug, Clone, Default)]
pub struct Variables {
    entries: Vec<(String, u32)>,
}

impl Variables {
    pub fn new() -> Self {
        Variables::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind `name` to `slot`, replacing an existing binding of the same name.
    pub fn set(&mut self, name: &str, slot: u32) -> Result<()> {
        if name.is_empty() || name.len() > u8::MAX as usize {
            return Err(BomError::Invalid(format!(
                "variable name must be 1..=255 bytes, got {}",
                name.len()
            )));
        }
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = slot,
            None => self.entries.push((name.to_string(), slot)),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| *slot)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn serialized_len(&self) -> usize {
        4 + self
            .entries
            .iter()
            .map(|(n, _)| 4 + 1 + n.len())
            .sum::<usize>()
    }

    pub fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for (name, slot) in &self.entries {
            buffer.extend_from_slice(&slot.to_be_bytes());
            buffer.push(name.len() as u8);
            buffer.extend_from_slice(name.as_bytes());
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let corrupt = || BomError::Corrupt("truncated variables region".into());

        let count_bytes = bytes.get(0..4).ok_or_else(corrupt)?;
        let count = u32::from_be_bytes(count_bytes.try_into().unwrap()) as usize;

        let mut entries = Vec::with_capacity(count);
        let mut at = 4usize;
        for _ in 0..count {
            let slot_bytes = bytes.get(at..at + 4).ok_or_else(corrupt)?;
            let slot = u32::from_be_bytes(slot_bytes.try_into().unwrap());
            let name_len = *bytes.get(at + 4).ok_or_else(corrupt)? as usize;
            let name_bytes = bytes.get(at + 5..at + 5 + name_len).ok_or_else(corrupt)?;
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| BomError::Corrupt("variable name is not UTF-8".into()))?;
            if entries.iter().any(|(n, _): &(String, u32)| n == name) {
                return Err(BomError::Corrupt(format!("duplicate variable {name:?}")));
            }
            entries.push((name.to_string(), slot));
            at += 5 + name_len;
        }

        Ok(Variables { entries })
    }
}
