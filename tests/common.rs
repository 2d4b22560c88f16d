#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use esp_flash_layout::{
    encode,
    PartitionEntry,
    DEFAULT_TABLE_OFFSET,
    ENTRY_SIZE,
    MAX_TABLE_SIZE,
};

pub const MIB: usize = 1024 * 1024;

/// The three partitions of the reference layout: factory app, nvs and ota_0.
pub fn reference_entries() -> Vec<PartitionEntry> {
    vec![
        PartitionEntry::new("factory", 0x00, 0x00, 0x10000, 0x100000),
        PartitionEntry::new("nvs", 0x01, 0x02, 0x9000, 0x6000),
        PartitionEntry::new("ota_0", 0x00, 0x10, 0x650000, 0x640000),
    ]
}

/// Encode `entries` followed by erased flash into a table region of
/// `0xC00` bytes.
pub fn table_region(entries: &[PartitionEntry]) -> Vec<u8> {
    let mut region = vec![0xFFu8; MAX_TABLE_SIZE];
    write_entries(&mut region, 0, entries);
    region
}

pub fn write_entries(buf: &mut [u8], offset: usize, entries: &[PartitionEntry]) {
    for (idx, entry) in entries.iter().enumerate() {
        let start = offset + idx * ENTRY_SIZE;
        buf[start..start + ENTRY_SIZE].copy_from_slice(&encode(entry).unwrap());
    }
}

/// An erased image of `len` bytes.
pub fn erased_image(len: usize) -> Vec<u8> {
    vec![0xFFu8; len]
}

/// An image of `len` bytes filled with deterministic noise. The first byte of
/// every 4 KiB sector is forced away from `0x50` so the noise can never look
/// like a table start.
pub fn noise_image(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    let mut image: Vec<u8> = (0..len)
        .map(|_| {
            // numerical recipes LCG
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 24) as u8
        })
        .collect();

    for sector in (0..len).step_by(4096) {
        if image[sector] == 0x50 {
            image[sector] = 0x00;
        }
    }
    image
}

/// A 16 MiB image holding the reference table at its canonical offset.
pub fn reference_image() -> Vec<u8> {
    let mut image = noise_image(16 * MIB, 0xE5F3_2C3A);
    image[DEFAULT_TABLE_OFFSET..DEFAULT_TABLE_OFFSET + MAX_TABLE_SIZE].fill(0xFF);
    write_entries(&mut image, DEFAULT_TABLE_OFFSET, &reference_entries());
    image
}

pub fn crc32_reference(data: &[u8]) -> u32 {
    unsafe { libz_sys::crc32(0, data.as_ptr(), data.len() as u32) as u32 }
}
