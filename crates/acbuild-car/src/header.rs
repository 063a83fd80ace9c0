//! Archive header, stored in the `CARHEADER` variable.

use crate::error::{CarError, Result};
use uuid::Uuid;

pub const CAR_MAGIC: [u8; 4] = *b"RATC";
pub const VERSION_MAJOR: u16 = 1;
pub const VERSION_MINOR: u16 = 10;
pub const STORAGE_VERSION: u32 = 1;
pub const CREATOR_LEN: usize = 128;
pub const HEADER_LEN: usize = 4 + 2 + 2 + 4 + CREATOR_LEN + 16 + 4 + 4 + 4 + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarHeader {
    pub version_major: u16,
    pub version_minor: u16,
    pub storage_version: u32,
    pub creator: String,
    pub uuid: [u8; 16],
    pub flags: u32,
    pub key_semantics: u32,
    pub rendition_semantics: u32,
    pub associated_checksum: u32,
}

impl CarHeader {
    pub fn new(creator: &str) -> Self {
        CarHeader {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            storage_version: STORAGE_VERSION,
            creator: creator.to_string(),
            uuid: *Uuid::new_v4().as_bytes(),
            flags: 0,
            key_semantics: 1,
            rendition_semantics: 1,
            associated_checksum: 0,
        }
    }

    /// Schema support: major must match, minor at most our own.
    pub fn validate(&self) -> Result<()> {
        if self.version_major != VERSION_MAJOR {
            return Err(CarError::Unsupported(format!(
                "archive schema version {}.{}",
                self.version_major, self.version_minor
            )));
        }
        if self.version_minor > VERSION_MINOR {
            return Err(CarError::Unsupported(format!(
                "archive schema minor version {} is newer than {}",
                self.version_minor, VERSION_MINOR
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(&CAR_MAGIC);
        bytes.extend_from_slice(&self.version_major.to_le_bytes());
        bytes.extend_from_slice(&self.version_minor.to_le_bytes());
        bytes.extend_from_slice(&self.storage_version.to_le_bytes());

        let mut creator = [0u8; CREATOR_LEN];
        let copy_len = self.creator.len().min(CREATOR_LEN);
        creator[..copy_len].copy_from_slice(&self.creator.as_bytes()[..copy_len]);
        bytes.extend_from_slice(&creator);

        bytes.extend_from_slice(&self.uuid);
        bytes.extend_from_slice(&self.flags.to_le_bytes());
        bytes.extend_from_slice(&self.key_semantics.to_le_bytes());
        bytes.extend_from_slice(&self.rendition_semantics.to_le_bytes());
        bytes.extend_from_slice(&self.associated_checksum.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(CarError::Corrupt(format!(
                "archive header is {} bytes, need {HEADER_LEN}",
                bytes.len()
            )));
        }
        if bytes[0..4] != CAR_MAGIC {
            return Err(CarError::Corrupt("bad archive magic".into()));
        }

        let u16_at = |at: usize| u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap());
        let u32_at = |at: usize| u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());

        let creator_bytes = &bytes[12..12 + CREATOR_LEN];
        let creator_end = creator_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(CREATOR_LEN);
        let creator = std::str::from_utf8(&creator_bytes[..creator_end])
            .map_err(|_| CarError::Corrupt("creator string is not UTF-8".into()))?
            .to_string();

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&bytes[140..156]);

        let header = CarHeader {
            version_major: u16_at(4),
            version_minor: u16_at(6),
            storage_version: u32_at(8),
            creator,
            uuid,
            flags: u32_at(156),
            key_semantics: u32_at(160),
            rendition_semantics: u32_at(164),
            associated_checksum: u32_at(168),
        };
        header.validate()?;
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let header = CarHeader::new("acbuild");
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        let parsed = CarHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn newer_minor_is_unsupported() {
        let mut header = CarHeader::new("acbuild");
        header.version_minor = VERSION_MINOR + 1;
        assert!(matches!(
            CarHeader::from_bytes(&header.to_bytes()),
            Err(CarError::Unsupported(_))
        ));
    }

    #[test]
    fn older_minor_is_accepted() {
        let mut header = CarHeader::new("acbuild");
        header.version_minor = 4;
        assert!(CarHeader::from_bytes(&header.to_bytes()).is_ok());
    }

    #[test]
    fn wrong_major_is_unsupported() {
        let mut header = CarHeader::new("acbuild");
        header.version_major = 2;
        assert!(matches!(
            CarHeader::from_bytes(&header.to_bytes()),
            Err(CarError::Unsupported(_))
        ));
    }

    #[test]
    fn bad_magic_is_corrupt() {
        let mut bytes = CarHeader::new("acbuild").to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            CarHeader::from_bytes(&bytes),
            Err(CarError::Corrupt(_))
        ));
    }

    #[test]
    fn long_creator_is_truncated() {
        let header = CarHeader::new(&"x".repeat(300));
        let parsed = CarHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed.creator.len(), CREATOR_LEN);
    }
}
