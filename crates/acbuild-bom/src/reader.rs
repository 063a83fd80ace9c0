//! Container reader.
//!
//! `Reader::open` buffers the whole file and validates the header, index
//! table, and free list before returning; malformed input yields `Corrupt`
//! and no partial reads propagate. Tree access validates ordering and the
//! leaf chain up front, so iteration is infallible and `fast_iter` can hand
//! out borrowed slices of the underlying buffer.

use crate::error::{BomError, Result};
use crate::header::{ContainerHeader, HEADER_SIZE};
use crate::index::{Extent, FreeList, IndexTable};
use crate::tree::{Leaf, TreeRoot};
use crate::variables::Variables;
use std::ops::Range;
use std::path::Path;

pub struct Reader {
    data: Vec<u8>,
    index: IndexTable,
    free: FreeList,
    vars: Variables,
    payload_end: u32,
}

impl Reader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(&path)?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let header = ContainerHeader::from_bytes(&data)?;

        let index_range = header.index_offset as usize
            ..(header.index_offset + header.index_length) as usize;
        let vars_range =
            header.vars_offset as usize..(header.vars_offset + header.vars_length) as usize;
        let (index, free) = IndexTable::from_bytes(&data[index_range])?;
        let vars = Variables::from_bytes(&data[vars_range])?;

        let payload_end = header.index_offset.min(header.vars_offset);
        let reader = Reader {
            data,
            index,
            free,
            vars,
            payload_end,
        };
        reader.validate_extents()?;
        Ok(reader)
    }

    /// Live blobs and free holes must each sit inside the payload region
    /// and must be pairwise disjoint.
    fn validate_extents(&self) -> Result<()> {
        let mut extents: Vec<(u32, u32)> = Vec::new();

        for (slot, entry) in self.index.entries().iter().enumerate() {
            if entry.is_free() {
                continue;
            }
            let end = u64::from(entry.offset) + u64::from(entry.length);
            if entry.offset < HEADER_SIZE as u32 || end > u64::from(self.payload_end) {
                return Err(BomError::Corrupt(format!(
                    "slot {slot} points outside the payload region"
                )));
            }
            if entry.length > 0 {
                extents.push((entry.offset, entry.length));
            }
        }
        for hole in self.free.holes() {
            if hole.offset < HEADER_SIZE as u32 || hole.end() > u64::from(self.payload_end) {
                return Err(BomError::Corrupt(
                    "free hole points outside the payload region".into(),
                ));
            }
            extents.push((hole.offset, hole.length));
        }

        extents.sort_unstable();
        for pair in extents.windows(2) {
            let (offset, length) = pair[0];
            let (next_offset, _) = pair[1];
            if u64::from(offset) + u64::from(length) > u64::from(next_offset) {
                return Err(BomError::Corrupt(format!(
                    "overlapping regions at offset {next_offset}"
                )));
            }
        }
        Ok(())
    }

    pub fn slot_count(&self) -> u32 {
        self.index.len()
    }

    pub fn free_holes(&self) -> &[Extent] {
        self.free.holes()
    }

    pub fn blob(&self, slot: u32) -> Result<&[u8]> {
        let entry = self.index.get(slot)?;
        if entry.is_free() {
            return Err(BomError::NotFound(format!("slot {slot} is free")));
        }
        Ok(&self.data[entry.offset as usize..(entry.offset + entry.length) as usize])
    }

    pub fn variable(&self, name: &str) -> Result<u32> {
        self.vars
            .get(name)
            .ok_or_else(|| BomError::NotFound(format!("variable {name:?}")))
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.vars.get(name).is_some()
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.vars.names()
    }

    /// Load and validate the tree rooted at `slot`: the leaf chain must be
    /// consistent, inline lengths must match the index table, and keys must
    /// strictly ascend across the concatenation of leaves.
    pub fn tree(&self, slot: u32) -> Result<Tree<'_>> {
        let root = TreeRoot::from_bytes(self.blob(slot)?)?;

        let mut ranges: Vec<(Range<usize>, Range<usize>)> =
            Vec::with_capacity(root.entry_count as usize);
        let mut leaf_slot = root.child;
        let mut previous_leaf = 0u32;
        let mut visited = std::collections::HashSet::new();

        while leaf_slot != 0 {
            if !visited.insert(leaf_slot) {
                return Err(BomError::Corrupt("tree leaf chain contains a cycle".into()));
            }
            let leaf = Leaf::from_bytes(self.blob(leaf_slot)?)?;
            if leaf.backward != previous_leaf {
                return Err(BomError::Corrupt(format!(
                    "tree leaf {leaf_slot} backward pointer mismatch"
                )));
            }
            for entry in &leaf.entries {
                ranges.push((
                    self.resolve(entry.key_slot, entry.key_len)?,
                    self.resolve(entry.value_slot, entry.value_len)?,
                ));
            }
            previous_leaf = leaf_slot;
            leaf_slot = leaf.forward;
        }

        if ranges.len() as u32 != root.entry_count {
            return Err(BomError::Corrupt(format!(
                "tree declares {} entries but leaves hold {}",
                root.entry_count,
                ranges.len()
            )));
        }

        for pair in ranges.windows(2) {
            let previous = &self.data[pair[0].0.clone()];
            let next = &self.data[pair[1].0.clone()];
            if previous >= next {
                return Err(BomError::Corrupt("tree keys are not strictly ascending".into()));
            }
        }

        Ok(Tree {
            data: &self.data,
            ranges,
        })
    }

    /// Resolve a leaf entry's (slot, inline length) pair to a byte range,
    /// checking the inline length against the index table.
    fn resolve(&self, slot: u32, inline_len: u32) -> Result<Range<usize>> {
        let entry = self.index.get(slot).map_err(|_| {
            BomError::Corrupt(format!("tree entry references missing slot {slot}"))
        })?;
        if entry.length != inline_len {
            return Err(BomError::Corrupt(format!(
                "tree entry inline length {} disagrees with index length {} for slot {slot}",
                inline_len, entry.length
            )));
        }
        Ok(entry.offset as usize..(entry.offset + entry.length) as usize)
    }
}

/// A validated ordered tree. Iteration yields entries in ascending key
/// order; `fast_iter` borrows straight from the reader's buffer.
pub struct Tree<'r> {
    data: &'r [u8],
    ranges: Vec<(Range<usize>, Range<usize>)>,
}

impl<'r> Tree<'r> {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, Vec<u8>)> + '_ {
        self.fast_iter().map(|(k, v)| (k.to_vec(), v.to_vec()))
    }

    pub fn fast_iter(&self) -> impl Iterator<Item = (&'r [u8], &'r [u8])> + '_ {
        let data = self.data;
        self.ranges
            .iter()
            .map(move |(k, v)| (&data[k.clone()], &data[v.clone()]))
    }
}
