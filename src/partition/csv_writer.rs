use std::io::Write;

use csv::{
    Writer,
    WriterBuilder,
};
use serde::Serialize;

use super::consts::{
    FLAG_ENCRYPTED,
    FLAG_READONLY,
};
use super::parser::PartitionTable;
use crate::error::CsvError;

const HEADER: [&str; 6] = ["# Name", "Type", "SubType", "Offset", "Size", "Flags"];

/// One row of an ESP-IDF `partitions.csv`, in [`HEADER`] order.
#[derive(Serialize)]
struct Row<'a> {
    name: &'a str,
    part_type: &'a str,
    subtype: &'a str,
    offset: String,
    size: String,
    flags: String,
}

/// Render `table` in the layout of an ESP-IDF `partitions.csv`.
///
/// Types and subtypes are written by name where known and numbers as hex.
/// Flags are the `:` separated names `gen_esp32part.py` accepts, so a table
/// without flags leaves the column empty. The header row is always written.
pub(crate) fn write_csv<W: Write>(table: &PartitionTable, out: W) -> Result<(), CsvError> {
    let mut wtr = writer(out);
    write_records(&mut wtr, table)
}

pub(crate) fn write_csv_content(table: &PartitionTable) -> Result<String, CsvError> {
    let mut wtr = writer(Vec::new());
    write_records(&mut wtr, table)?;
    let bytes = wtr.into_inner().map_err(|e| CsvError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

// serde only emits a header together with the first record
fn writer<W: Write>(out: W) -> Writer<W> {
    WriterBuilder::new().has_headers(false).from_writer(out)
}

fn write_records<W: Write>(wtr: &mut Writer<W>, table: &PartitionTable) -> Result<(), CsvError> {
    wtr.write_record(HEADER)?;
    for entry in table {
        let part_type = entry.type_name();
        let subtype = entry.subtype_name();
        wtr.serialize(Row {
            name: &entry.label,
            part_type: &part_type,
            subtype: &subtype,
            offset: format!("0x{:x}", entry.offset),
            size: format!("0x{:x}", entry.size),
            flags: flag_names(entry.flags),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

fn flag_names(flags: u32) -> String {
    let mut names = Vec::new();
    if flags & FLAG_ENCRYPTED != 0 {
        names.push("encrypted".to_string());
    }
    if flags & FLAG_READONLY != 0 {
        names.push("readonly".to_string());
    }
    let unknown = flags & !(FLAG_ENCRYPTED | FLAG_READONLY);
    if unknown != 0 {
        names.push(format!("0x{:x}", unknown));
    }
    names.join(":")
}
