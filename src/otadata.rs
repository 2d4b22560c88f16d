//! The OTA data partition, which tells the second stage bootloader which app
//! slot to boot.
//!
//! The region is 8 KiB and holds two redundant 4 KiB slots. Each slot starts
//! with a 12-byte record `sequence (u32 LE) | selected_index (u32 LE) |
//! crc32 (u32 LE)`, the CRC covering the first 8 bytes. Everything else is
//! erased flash.

use log::debug;

use crate::crc::crc32;
use crate::error::Error;
use crate::partition::types::MAX_OTA_SLOTS;
use crate::partition::FLASH_SECTOR_SIZE;

pub const SLOT_SIZE: usize = FLASH_SECTOR_SIZE;
pub const SLOT_COUNT: usize = 2;
pub const OTADATA_SIZE: usize = SLOT_SIZE * SLOT_COUNT;
pub const RECORD_SIZE: usize = 12;

/// Offset OTA data is placed at by the default ESP-IDF two-OTA layout.
pub const DEFAULT_OTADATA_OFFSET: usize = 0xE000;

/// Sequence number written by [`build`].
pub const INITIAL_SEQUENCE: u32 = 1;

const ERASED: u8 = 0xFF;
const CHECKED_LENGTH: usize = 8;

/// A decoded and checksum verified OTA data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorRecord {
    pub sequence: u32,
    /// Index of the OTA app slot to boot, `0` for `ota_0`.
    pub selected_index: u32,
    pub checksum: u32,
}

impl SelectorRecord {
    /// Create a record for `selected_index` with a matching checksum.
    pub fn new(sequence: u32, selected_index: u32) -> Self {
        Self {
            sequence,
            selected_index,
            checksum: record_crc(sequence, selected_index),
        }
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut raw = [0u8; RECORD_SIZE];
        raw[0..4].copy_from_slice(&self.sequence.to_le_bytes());
        raw[4..8].copy_from_slice(&self.selected_index.to_le_bytes());
        raw[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        raw
    }
}

fn record_crc(sequence: u32, selected_index: u32) -> u32 {
    let mut checked = [0u8; CHECKED_LENGTH];
    checked[0..4].copy_from_slice(&sequence.to_le_bytes());
    checked[4..8].copy_from_slice(&selected_index.to_le_bytes());
    crc32(&checked)
}

/// Build an 8 KiB OTA data region selecting `selected_index`.
///
/// Slot 0 receives a record with sequence number 1. Slot 1 is left erased.
/// Whether `selected_index` names an existing app partition is up to the
/// caller to check, for example with
/// [`PartitionTable::ota_app`](crate::PartitionTable::ota_app).
pub fn build(selected_index: u32) -> Vec<u8> {
    let mut region = vec![ERASED; OTADATA_SIZE];
    let record = SelectorRecord::new(INITIAL_SEQUENCE, selected_index);
    region[..RECORD_SIZE].copy_from_slice(&record.to_bytes());

    debug!(
        "built otadata: sequence {}, index {}, crc 0x{:08x}",
        record.sequence, record.selected_index, record.checksum
    );
    region
}

/// Verify the record at the start of `record` and decode it.
pub fn validate(record: &[u8]) -> Result<SelectorRecord, Error> {
    if record.len() < RECORD_SIZE {
        return Err(Error::TruncatedRegion {
            needed: RECORD_SIZE,
            available: record.len(),
        });
    }

    let sequence = read_u32(record, 0);
    let selected_index = read_u32(record, 4);
    let stored = read_u32(record, 8);
    let computed = crc32(&record[..CHECKED_LENGTH]);
    if stored != computed {
        return Err(Error::ChecksumMismatch { stored, computed });
    }

    Ok(SelectorRecord {
        sequence,
        selected_index,
        checksum: stored,
    })
}

/// The state of one slot of an OTA data region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// The record bytes are still erased. No selection was ever written.
    Erased,
    Valid(SelectorRecord),
    Invalid(Error),
}

impl SlotState {
    pub fn record(&self) -> Option<&SelectorRecord> {
        match self {
            SlotState::Valid(record) => Some(record),
            _ => None,
        }
    }
}

/// Both slots of an OTA data region read back from flash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRegion {
    pub slots: [SlotState; SLOT_COUNT],
}

impl SelectorRegion {
    /// Classify both slots of an 8 KiB OTA data region.
    pub fn parse(region: &[u8]) -> Result<Self, Error> {
        if region.len() < OTADATA_SIZE {
            return Err(Error::TruncatedRegion {
                needed: OTADATA_SIZE,
                available: region.len(),
            });
        }

        let slots = [0, 1].map(|idx| {
            let start = idx * SLOT_SIZE;
            let raw = &region[start..start + RECORD_SIZE];
            if raw.iter().all(|&b| b == ERASED) {
                SlotState::Erased
            } else {
                match validate(raw) {
                    Ok(record) => SlotState::Valid(record),
                    Err(e) => SlotState::Invalid(e),
                }
            }
        });

        Ok(Self { slots })
    }

    /// The valid record with the highest sequence number, which is the one a
    /// bootloader would follow. Slot 0 wins a tie.
    pub fn active(&self) -> Option<&SelectorRecord> {
        self.slots
            .iter()
            .filter_map(SlotState::record)
            .fold(None, |best: Option<&SelectorRecord>, record| match best {
                Some(b) if b.sequence >= record.sequence => Some(b),
                _ => Some(record),
            })
    }
}

/// Map an OTA app name to its slot index. Both the subtype names `ota_0` to
/// `ota_15` and the labels `app0` to `app15` are accepted.
pub fn ota_index_from_name(name: &str) -> Result<u32, Error> {
    let digits = name
        .strip_prefix("ota_")
        .or_else(|| name.strip_prefix("app"))
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()));

    match digits.and_then(|d| d.parse::<u32>().ok()) {
        Some(index) if index < MAX_OTA_SLOTS => Ok(index),
        _ => Err(Error::InvalidOtaTarget(name.to_string())),
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
