//! Container writer.
//!
//! The writer owns the output file exclusively for its lifetime and builds
//! the container in memory: blobs append to the payload buffer, the index
//! and variables regions are assembled at `commit`. Until `commit` runs the
//! file on disk is a zero-length placeholder, so a crashed or abandoned
//! writer never leaves a half-written container behind.

use crate::error::{BomError, Result};
use crate::header::{ContainerHeader, HEADER_SIZE, VERSION};
use crate::index::{FreeList, IndexEntry, IndexTable};
use crate::tree::TreeBuilder;
use crate::variables::Variables;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Writer {
    file: File,
    path: PathBuf,
    index: IndexTable,
    free: FreeList,
    vars: Variables,
    payload: Vec<u8>,
    committed: bool,
}

impl Writer {
    /// Create a container at `path`, truncating any existing file to the
    /// zero-length placeholder.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_reserve(path, 0)
    }

    /// Create a container, pre-reserving `reserved_index_count` index slots
    /// so single-pass tree construction allocates no index growth.
    pub fn create_with_reserve<P: AsRef<Path>>(path: P, reserved_index_count: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        Ok(Writer {
            file,
            path: path.as_ref().to_path_buf(),
            index: IndexTable::new(reserved_index_count),
            free: FreeList::new(),
            vars: Variables::new(),
            payload: Vec::new(),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The slot the next `add_blob` call will return. Tree construction
    /// relies on slots being assigned sequentially.
    pub fn next_slot(&self) -> u32 {
        self.index.len()
    }

    /// Append a blob to the payload and return its slot.
    pub fn add_blob(&mut self, bytes: &[u8]) -> u32 {
        let offset = HEADER_SIZE + self.payload.len();
        self.payload.extend_from_slice(bytes);
        self.index.add(offset as u32, bytes.len() as u32)
    }

    /// Replace the blob in `slot`. Equal-length replacements happen in
    /// place; otherwise the old extent becomes a hole and the new bytes go
    /// to the first fitting hole, or to the end of the payload.
    pub fn replace_blob(&mut self, slot: u32, bytes: &[u8]) -> Result<()> {
        let old = self.index.get(slot)?;
        let new_len = bytes.len() as u32;

        if old.length == new_len && !old.is_free() {
            let start = old.offset as usize - HEADER_SIZE;
            self.payload[start..start + bytes.len()].copy_from_slice(bytes);
            return Ok(());
        }

        if !old.is_free() {
            self.free.release(old.offset, old.length);
        }

        let offset = match self.free.take_first_fit(new_len) {
            Some(offset) => {
                let start = offset as usize - HEADER_SIZE;
                self.payload[start..start + bytes.len()].copy_from_slice(bytes);
                offset
            }
            None => {
                let offset = (HEADER_SIZE + self.payload.len()) as u32;
                self.payload.extend_from_slice(bytes);
                offset
            }
        };

        self.index.set(
            slot,
            IndexEntry {
                offset,
                length: new_len,
            },
        )
    }

    pub fn set_variable(&mut self, name: &str, slot: u32) -> Result<()> {
        self.index.get(slot)?;
        self.vars.set(name, slot)
    }

    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new()
    }

    /// Assemble header, payload, index region, and variables region, and
    /// write the whole container in one pass. This is the single point at
    /// which on-disk state becomes visible.
    pub fn commit(mut self) -> Result<()> {
        self.free.coalesce();

        let index_offset = HEADER_SIZE + self.payload.len();
        let index_length = self.index.serialized_len(&self.free);
        let vars_offset = index_offset + index_length;
        let vars_length = self.vars.serialized_len();
        let total_size = vars_offset + vars_length;

        if total_size > u32::MAX as usize {
            return Err(BomError::Invalid(format!(
                "container would be {total_size} bytes, beyond the 32-bit limit"
            )));
        }

        let header = ContainerHeader {
            version: VERSION,
            total_size: total_size as u32,
            index_offset: index_offset as u32,
            index_length: index_length as u32,
            vars_offset: vars_offset as u32,
            vars_length: vars_length as u32,
        };

        let mut contents = Vec::with_capacity(total_size);
        contents.extend_from_slice(&header.to_bytes());
        contents.append(&mut self.payload);
        self.index.write_to(&mut contents, &self.free);
        self.vars.write_to(&mut contents);

        self.file.write_all(&contents)?;
        self.file.flush()?;
        self.file.sync_all()?;
        self.committed = true;

        debug!(
            path = %self.path.display(),
            bytes = total_size,
            slots = self.index.len(),
            "committed container"
        );
        Ok(())
    }
}
