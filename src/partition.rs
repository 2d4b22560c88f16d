pub mod consts;
pub mod entry;
pub mod parser;
pub mod scanner;
pub mod types;

mod csv_writer;

use std::io::Write;

pub use consts::{
    DEFAULT_TABLE_OFFSET,
    ENTRY_SIZE,
    FLASH_SECTOR_SIZE,
    MAX_ENTRIES,
    MAX_LABEL_LENGTH,
    MAX_TABLE_SIZE,
};
pub use entry::PartitionEntry;
pub use parser::{
    BoundsPolicy,
    PartitionTable,
    StopReason,
};
pub use scanner::{
    OffsetProbe,
    TableLocation,
    TableScanner,
};

use crate::error::CsvError;

impl PartitionTable {
    /// Render the table as an ESP-IDF style `partitions.csv` and return the
    /// content as a `String`.
    pub fn to_csv(&self) -> Result<String, CsvError> {
        csv_writer::write_csv_content(self)
    }

    /// Render the table as an ESP-IDF style `partitions.csv` into `out`.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), CsvError> {
        csv_writer::write_csv(self, out)
    }
}
