use crate::error::{BomError, Result};

pub const MAGIC: [u8; 8] = *b"BOMStore";
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 32;

/// Container header, the first 32 bytes of the file.
///
/// All fields after the magic are big-endian 32-bit values. The header
/// locates the index region (blob slots plus free list) and the variables
/// region; everything between the header and the index region is payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u32,
    /// Total file size in bytes.
    pub total_size: u32,
    pub index_offset: u32,
    pub index_length: u32,
    pub vars_offset: u32,
    pub vars_length: u32,
}

impl ContainerHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..8].copy_from_slice(&MAGIC);
        bytes[8..12].copy_from_slice(&self.version.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.total_size.to_be_bytes());
        bytes[16..20].copy_from_slice(&self.index_offset.to_be_bytes());
        bytes[20..24].copy_from_slice(&self.index_length.to_be_bytes());
        bytes[24..28].copy_from_slice(&self.vars_offset.to_be_bytes());
        bytes[28..32].copy_from_slice(&self.vars_length.to_be_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(BomError::Corrupt(format!(
                "file too small for header: {} bytes",
                bytes.len()
            )));
        }
        if bytes[0..8] != MAGIC {
            return Err(BomError::Corrupt("bad magic".into()));
        }

        let field = |at: usize| u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap());
        let header = ContainerHeader {
            version: field(8),
            total_size: field(12),
            index_offset: field(16),
            index_length: field(20),
            vars_offset: field(24),
            vars_length: field(28),
        };
        header.validate(bytes.len() as u64)?;
        Ok(header)
    }

    /// Check the header against the actual file length. Every region must
    /// lie inside the file and past the header itself.
    pub fn validate(&self, file_len: u64) -> Result<()> {
        if self.version != VERSION {
            return Err(BomError::Corrupt(format!(
                "unsupported container version {}",
                self.version
            )));
        }
        if u64::from(self.total_size) != file_len {
            return Err(BomError::Corrupt(format!(
                "header total size {} does not match file length {}",
                self.total_size, file_len
            )));
        }

        for (name, offset, length) in [
            ("index", self.index_offset, self.index_length),
            ("variables", self.vars_offset, self.vars_length),
        ] {
            let end = u64::from(offset) + u64::from(length);
            if u64::from(offset) < HEADER_SIZE as u64 || end > file_len {
                return Err(BomError::Corrupt(format!(
                    "{name} region [{offset}, {end}) outside file of {file_len} bytes"
                )));
            }
        }
        Ok(())
    }
}
