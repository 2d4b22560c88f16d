use log::debug;

use super::consts::*;
use super::entry::{
    decode,
    PartitionEntry,
};
use super::types::{
    AppSubtype,
    PartitionType,
};
use super::TableLocation;
use crate::error::Error;

/// How much a decoded entry is trusted before it is added to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsPolicy {
    /// The region was located by the caller. Every syntactically valid entry
    /// is accepted.
    Trusted,
    /// The region was found heuristically. An entry is only accepted if it
    /// is non-empty and lies completely inside an image of `image_len` bytes.
    Untrusted { image_len: usize },
}

impl BoundsPolicy {
    pub(crate) fn check(&self, entry: &PartitionEntry) -> Result<(), Error> {
        let image_len = match *self {
            BoundsPolicy::Trusted => return Ok(()),
            BoundsPolicy::Untrusted { image_len } => image_len,
        };

        let len = image_len as u64;
        let offset = entry.offset as u64;
        let size = entry.size as u64;
        if offset == 0 || offset >= len || size == 0 || size >= len || entry.end() > len {
            return Err(Error::OutOfBounds {
                offset: entry.offset,
                size: entry.size,
                image_len,
            });
        }
        Ok(())
    }
}

/// Why a table stopped collecting entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The erased `FF FF` end marker was reached.
    Terminator,
    /// Fewer than 32 bytes were left in the region.
    EndOfRegion,
    /// An entry failed to decode or was rejected by the bounds policy.
    Invalid(Error),
}

/// An ordered list of partitions as they appear on flash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    entries: Vec<PartitionEntry>,
    stop: StopReason,
}

impl PartitionTable {
    pub fn entries(&self) -> &[PartitionEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PartitionEntry> {
        self.entries
    }

    pub fn stop_reason(&self) -> &StopReason {
        &self.stop
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PartitionEntry> {
        self.entries.iter()
    }

    /// First partition named `label`. Earlier entries win.
    pub fn find_by_label(&self, label: &str) -> Option<&PartitionEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// First partition with the given raw type and subtype.
    pub fn find_by_type(&self, part_type: u8, subtype: u8) -> Option<&PartitionEntry> {
        self.entries
            .iter()
            .find(|e| e.part_type == part_type && e.subtype == subtype)
    }

    /// The app partition booted when OTA data selects `index`.
    pub fn ota_app(&self, index: u32) -> Option<&PartitionEntry> {
        let subtype = AppSubtype::for_ota_index(index)?;
        self.find_by_type(PartitionType::App as u8, subtype as u8)
    }
}

impl<'a> IntoIterator for &'a PartitionTable {
    type Item = &'a PartitionEntry;
    type IntoIter = std::slice::Iter<'a, PartitionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parse consecutive entries of `region` starting at `start`, accepting every
/// syntactically valid entry.
pub fn parse(region: &[u8], start: usize) -> PartitionTable {
    parse_with_policy(region, start, BoundsPolicy::Trusted)
}

/// Parse consecutive entries of `region` starting at `start`.
///
/// Parsing never fails. It stops at the end marker, at the first entry that
/// fails to decode or is rejected by `policy`, or when fewer than 32 bytes are
/// left. The entries collected up to that point are returned together with
/// the reason parsing stopped.
pub fn parse_with_policy(region: &[u8], start: usize, policy: BoundsPolicy) -> PartitionTable {
    let mut entries = Vec::new();
    let mut pos = start;

    let stop = loop {
        let window = pos
            .checked_add(ENTRY_SIZE)
            .and_then(|end| region.get(pos..end));
        let Some(window) = window else {
            break StopReason::EndOfRegion;
        };

        match decode(window) {
            Ok(None) => break StopReason::Terminator,
            Ok(Some(entry)) => {
                if let Err(e) = policy.check(&entry) {
                    break StopReason::Invalid(e);
                }
                entries.push(entry);
            }
            Err(e) => break StopReason::Invalid(e),
        }

        pos += ENTRY_SIZE;
    };

    debug!(
        "parsed {} entries from 0x{:x}, stopped: {:?}",
        entries.len(),
        start,
        stop
    );

    PartitionTable { entries, stop }
}

/// Parse the table at its canonical location, `0x8000` with up to `0xC00`
/// bytes. Images shorter than that are parsed as far as they reach.
pub fn parse_at_canonical_offset(image: &[u8]) -> TableLocation {
    let start = DEFAULT_TABLE_OFFSET.min(image.len());
    let end = (DEFAULT_TABLE_OFFSET + MAX_TABLE_SIZE).min(image.len());
    TableLocation {
        offset: DEFAULT_TABLE_OFFSET,
        table: parse(&image[start..end], 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(offset: u32, size: u32) -> PartitionEntry {
        PartitionEntry::new("p", 0x01, 0x02, offset, size)
    }

    #[test]
    fn test_trusted_accepts_anything() {
        assert!(BoundsPolicy::Trusted.check(&entry(0, 0)).is_ok());
        assert!(BoundsPolicy::Trusted.check(&entry(u32::MAX, u32::MAX)).is_ok());
    }

    #[test]
    fn test_untrusted_bounds() {
        let policy = BoundsPolicy::Untrusted { image_len: 0x1000 };
        assert!(policy.check(&entry(0x100, 0x100)).is_ok());
        assert!(policy.check(&entry(0x800, 0x800)).is_ok());

        for (offset, size) in [
            (0, 0x100),
            (0x100, 0),
            (0x1000, 0x10),
            (0x10, 0x1000),
            (0x801, 0x800),
            (u32::MAX, u32::MAX),
        ] {
            assert_eq!(
                policy.check(&entry(offset, size)),
                Err(Error::OutOfBounds {
                    offset,
                    size,
                    image_len: 0x1000
                }),
                "offset 0x{offset:x} size 0x{size:x}"
            );
        }
    }

    #[test]
    fn test_start_past_region() {
        let table = parse(&[0xFF; 64], 100);
        assert!(table.is_empty());
        assert_eq!(table.stop_reason(), &StopReason::EndOfRegion);
    }
}
