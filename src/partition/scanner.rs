use log::debug;

use super::consts::*;
use super::parser::{
    parse_with_policy,
    BoundsPolicy,
    PartitionTable,
};

/// A plausible partition table found in an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    /// Byte offset of the first entry within the image.
    pub offset: usize,
    pub table: PartitionTable,
}

/// Searches images for partition tables at unknown offsets.
///
/// Candidates are the `alignment`-byte boundaries of the image whose first
/// entry carries the entry magic. Up to `0xC00` bytes of a candidate are
/// parsed with [`BoundsPolicy::Untrusted`], checked against the whole image,
/// and the candidate is reported if at least one entry survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableScanner {
    alignment: usize,
}

impl Default for TableScanner {
    fn default() -> Self {
        Self {
            alignment: FLASH_SECTOR_SIZE,
        }
    }
}

impl TableScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stride between candidate offsets. An alignment of 0 is treated as 1.
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment.max(1);
        self
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// All plausible table locations in `image`, in ascending offset order.
    pub fn scan(&self, image: &[u8]) -> Vec<TableLocation> {
        let policy = BoundsPolicy::Untrusted {
            image_len: image.len(),
        };
        let mut found = Vec::new();

        for offset in (0..image.len()).step_by(self.alignment) {
            let Some(window) = image.get(offset..offset + ENTRY_SIZE) else {
                break;
            };
            // only the entry magic starts a candidate
            if window[..2] != ENTRY_MAGIC {
                continue;
            }

            // a table never extends past 0xC00 bytes
            let end = (offset + MAX_TABLE_SIZE).min(image.len());
            let table = parse_with_policy(&image[offset..end], 0, policy);
            debug!(
                "candidate at 0x{:08x}: {} plausible entries, stopped: {:?}",
                offset,
                table.len(),
                table.stop_reason()
            );
            if !table.is_empty() {
                found.push(TableLocation { offset, table });
            }
        }

        debug!(
            "scanned 0x{:x} bytes with stride 0x{:x}: {} tables",
            image.len(),
            self.alignment,
            found.len()
        );
        found
    }
}

/// Scan `image` for partition tables on 4 KiB boundaries.
pub fn scan(image: &[u8]) -> Vec<TableLocation> {
    TableScanner::new().scan(image)
}

/// Raw bytes found at a well-known offset of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetProbe<'a> {
    pub offset: usize,
    /// Up to 16 bytes, fewer if the image ends early.
    pub bytes: &'a [u8],
}

impl OffsetProbe<'_> {
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

/// The first bytes at each offset tables have historically been placed at,
/// for manual inspection when [`scan`] finds nothing. Offsets past the end of
/// the image are omitted.
pub fn probe_known_offsets(image: &[u8]) -> Vec<OffsetProbe<'_>> {
    KNOWN_TABLE_OFFSETS
        .iter()
        .filter(|&&offset| offset < image.len())
        .map(|&offset| OffsetProbe {
            offset,
            bytes: &image[offset..(offset + PROBE_LENGTH).min(image.len())],
        })
        .collect()
}

/// The first four bytes of the image, where the second stage bootloader
/// header starts.
pub fn bootloader_magic(image: &[u8]) -> OffsetProbe<'_> {
    OffsetProbe {
        offset: 0,
        bytes: &image[..BOOTLOADER_MAGIC_LENGTH.min(image.len())],
    }
}
