// Partition table layout
pub const ENTRY_SIZE: usize = 32;
pub const ENTRY_MAGIC: [u8; 2] = [0x50, 0xAA];
pub const END_MARKER: [u8; 2] = [0xFF, 0xFF];
pub const MAX_LABEL_LENGTH: usize = 16;

// Entry flag bits, named as in partitions.csv
pub const FLAG_ENCRYPTED: u32 = 1 << 0;
pub const FLAG_READONLY: u32 = 1 << 1;

// Canonical location of the table in a device image
pub const DEFAULT_TABLE_OFFSET: usize = 0x8000;
pub const MAX_TABLE_SIZE: usize = 0xC00;
pub const MAX_ENTRIES: usize = MAX_TABLE_SIZE / ENTRY_SIZE;

// Flash erase block granularity, used as the default scan stride
pub const FLASH_SECTOR_SIZE: usize = 4096;

// Offsets the table or OTA data have historically been found at
pub const KNOWN_TABLE_OFFSETS: [usize; 4] = [0x8000, 0x9000, 0xD000, 0xE000];
pub const PROBE_LENGTH: usize = 16;
pub const BOOTLOADER_MAGIC_LENGTH: usize = 4;

// Field offsets within an entry
pub(crate) const TYPE_OFFSET: usize = 2;
pub(crate) const SUBTYPE_OFFSET: usize = 3;
pub(crate) const OFFSET_OFFSET: usize = 4;
pub(crate) const SIZE_OFFSET: usize = 8;
pub(crate) const LABEL_OFFSET: usize = 12;
pub(crate) const FLAGS_OFFSET: usize = 28;
