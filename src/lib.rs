//! ESP-IDF compatible partition table and OTA data codec.
//!
//! The crate works on byte buffers only. Reading a flash dump from a file or
//! device and writing generated OTA data back is left to the caller.
//!
//! - [`partition::entry`] decodes and encodes single 32-byte table entries.
//! - [`parse`] walks a table from a known offset.
//! - [`scan`] locates tables in an image when the offset is unknown.
//! - [`otadata`] builds and validates the boot selection records.
//!
//! ```
//! use esp_flash_layout::{otadata, scan};
//!
//! let image = vec![0xFF; 0x10000];
//! assert!(scan(&image).is_empty());
//!
//! let region = otadata::build(1);
//! let record = otadata::validate(&region).unwrap();
//! assert_eq!(record.selected_index, 1);
//! ```

pub mod crc;
pub mod error;
pub mod otadata;
pub mod partition;

pub use error::{
    CsvError,
    Error,
};
pub use partition::entry::{
    decode,
    encode,
};
pub use partition::parser::{
    parse,
    parse_at_canonical_offset,
    parse_with_policy,
};
pub use partition::scanner::{
    bootloader_magic,
    probe_known_offsets,
    scan,
};
pub use partition::types::{
    subtype_name,
    type_name,
    AppSubtype,
    DataSubtype,
    PartitionType,
};
pub use partition::{
    BoundsPolicy,
    OffsetProbe,
    PartitionEntry,
    PartitionTable,
    StopReason,
    TableLocation,
    TableScanner,
    DEFAULT_TABLE_OFFSET,
    ENTRY_SIZE,
    FLASH_SECTOR_SIZE,
    MAX_ENTRIES,
    MAX_LABEL_LENGTH,
    MAX_TABLE_SIZE,
};
