use std::borrow::Cow;

use log::trace;

use super::consts::*;
use super::types::{
    subtype_name,
    type_name,
    AppSubtype,
    DataSubtype,
    PartitionType,
};
use crate::error::Error;

/// A single partition table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionEntry {
    /// Partition name, at most 16 ASCII bytes.
    pub label: String,
    /// Raw type byte, see [`PartitionType`].
    pub part_type: u8,
    /// Raw subtype byte. Its meaning depends on `part_type`.
    pub subtype: u8,
    /// Byte offset of the partition on the flash device.
    pub offset: u32,
    /// Byte length of the partition.
    pub size: u32,
    /// Opaque flag bits, preserved as read.
    pub flags: u32,
}

impl PartitionEntry {
    pub fn new(label: impl Into<String>, part_type: u8, subtype: u8, offset: u32, size: u32) -> Self {
        Self {
            label: label.into(),
            part_type,
            subtype,
            offset,
            size,
            flags: 0,
        }
    }

    /// The typed partition type, `None` for vendor specific codes.
    pub fn kind(&self) -> Option<PartitionType> {
        PartitionType::from_repr(self.part_type)
    }

    /// The typed app subtype if this is an app partition with a known subtype.
    pub fn app_subtype(&self) -> Option<AppSubtype> {
        match self.kind()? {
            PartitionType::App => AppSubtype::from_repr(self.subtype),
            PartitionType::Data => None,
        }
    }

    /// The typed data subtype if this is a data partition with a known subtype.
    pub fn data_subtype(&self) -> Option<DataSubtype> {
        match self.kind()? {
            PartitionType::Data => DataSubtype::from_repr(self.subtype),
            PartitionType::App => None,
        }
    }

    pub fn type_name(&self) -> Cow<'static, str> {
        type_name(self.part_type)
    }

    pub fn subtype_name(&self) -> Cow<'static, str> {
        subtype_name(self.part_type, self.subtype)
    }

    /// First byte past the end of the partition. Computed in 64 bits so
    /// entries near the top of the address space cannot overflow.
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }
}

/// Decode one table entry from the start of `data`.
///
/// Returns `Ok(None)` when the entry starts with the erased `FF FF` marker,
/// which terminates a table. Bytes following the marker are not looked at.
pub fn decode(data: &[u8]) -> Result<Option<PartitionEntry>, Error> {
    if data.len() < ENTRY_SIZE {
        return Err(Error::TruncatedRegion {
            needed: ENTRY_SIZE,
            available: data.len(),
        });
    }

    let magic = [data[0], data[1]];
    if magic == END_MARKER {
        return Ok(None);
    }
    if magic != ENTRY_MAGIC {
        return Err(Error::InvalidMagic(magic));
    }

    let entry = PartitionEntry {
        label: extract_label(&data[LABEL_OFFSET..LABEL_OFFSET + MAX_LABEL_LENGTH]),
        part_type: data[TYPE_OFFSET],
        subtype: data[SUBTYPE_OFFSET],
        offset: read_u32(data, OFFSET_OFFSET),
        size: read_u32(data, SIZE_OFFSET),
        flags: read_u32(data, FLAGS_OFFSET),
    };

    trace!(
        "decoded entry '{}' {}/{} @0x{:08x} [0x{:08x}]",
        entry.label,
        entry.type_name(),
        entry.subtype_name(),
        entry.offset,
        entry.size
    );

    Ok(Some(entry))
}

/// Encode `entry` into its 32-byte on-flash representation.
pub fn encode(entry: &PartitionEntry) -> Result<[u8; ENTRY_SIZE], Error> {
    validate_label(&entry.label)?;

    let mut raw = [0u8; ENTRY_SIZE];
    raw[..2].copy_from_slice(&ENTRY_MAGIC);
    raw[TYPE_OFFSET] = entry.part_type;
    raw[SUBTYPE_OFFSET] = entry.subtype;
    raw[OFFSET_OFFSET..OFFSET_OFFSET + 4].copy_from_slice(&entry.offset.to_le_bytes());
    raw[SIZE_OFFSET..SIZE_OFFSET + 4].copy_from_slice(&entry.size.to_le_bytes());
    raw[LABEL_OFFSET..LABEL_OFFSET + entry.label.len()].copy_from_slice(entry.label.as_bytes());
    raw[FLAGS_OFFSET..FLAGS_OFFSET + 4].copy_from_slice(&entry.flags.to_le_bytes());
    Ok(raw)
}

fn validate_label(label: &str) -> Result<(), Error> {
    if label.len() > MAX_LABEL_LENGTH {
        return Err(Error::InvalidLabel(format!(
            "'{}' is too long (max {} bytes)",
            label, MAX_LABEL_LENGTH
        )));
    }
    if !label.is_ascii() {
        return Err(Error::InvalidLabel(format!("'{}' is not ASCII", label)));
    }
    if label.ends_with('\0') {
        return Err(Error::InvalidLabel(format!(
            "'{}' has trailing NUL bytes",
            label.escape_default()
        )));
    }
    Ok(())
}

/// Best effort label decoding: bytes outside of ASCII are dropped and the
/// trailing NUL padding is stripped.
fn extract_label(raw: &[u8]) -> String {
    let label: String = raw
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect();
    label.trim_end_matches('\0').to_string()
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
