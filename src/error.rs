use thiserror::Error;

/// Errors that can occur while decoding partition table entries or OTA data
/// records.
///
/// Table parsing and scanning never return these directly. They are recorded
/// as the [`StopReason`](crate::StopReason) of a table so the caller still
/// receives every entry decoded before the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The first two bytes of an entry are neither `50 AA` nor the erased
    /// `FF FF` terminator.
    #[error("invalid entry magic {:02x} {:02x}", .0[0], .0[1])]
    InvalidMagic([u8; 2]),

    /// Fewer bytes remain than the fixed-size structure requires.
    #[error("truncated region: needed {needed} bytes, {available} available")]
    TruncatedRegion { needed: usize, available: usize },

    /// A decoded entry points outside of the scanned image or is empty.
    #[error(
        "partition at 0x{offset:08x} with size 0x{size:08x} is outside of the image (0x{image_len:x} bytes)"
    )]
    OutOfBounds {
        offset: u32,
        size: u32,
        image_len: usize,
    },

    /// The stored OTA data CRC does not match the computed one.
    #[error("checksum mismatch: stored 0x{stored:08x}, computed 0x{computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// Labels are limited to 16 ASCII bytes.
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    /// The name does not refer to an OTA app slot.
    #[error("invalid OTA target: {0}")]
    InvalidOtaTarget(String),
}

/// Errors that can occur while rendering a partition table as CSV.
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
