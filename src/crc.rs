/// CRC32 using the IEEE 802.3 polynomial (0xEDB88320, bit-reversed 0x04C11DB7).
///
/// This is the checksum zlib and most general purpose libraries compute, and
/// the one the ESP-IDF bootloader expects in OTA data records.
pub fn crc32(data: &[u8]) -> u32 {
    crc32_update(0, data)
}

/// Continue a CRC32 computation. `crc32_update(crc32(a), b) == crc32(a ++ b)`.
pub fn crc32_update(init: u32, data: &[u8]) -> u32 {
    let mut crc = !init;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
        }
    }

    !crc
}
