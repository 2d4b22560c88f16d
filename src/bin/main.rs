use std::fs;
use std::io;
use std::path::PathBuf;

use clap::{
    Parser,
    Subcommand,
};
use esp_flash_layout::otadata::{
    self,
    SelectorRegion,
    SlotState,
    DEFAULT_OTADATA_OFFSET,
    OTADATA_SIZE,
};
use esp_flash_layout::{
    bootloader_magic,
    parse,
    probe_known_offsets,
    PartitionTable,
    TableScanner,
    DEFAULT_TABLE_OFFSET,
    FLASH_SECTOR_SIZE,
    MAX_TABLE_SIZE,
};
use log::{
    info,
    warn,
    LevelFilter,
};

#[derive(Parser)]
#[command(name = "esp-flash-layout")]
#[command(about = "ESP partition table scanner and OTA data generator", long_about = None)]
struct Cli {
    /// Print debug logs (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the partition table at a known offset of a flash image
    Parse {
        /// Flash image file path
        image: PathBuf,

        /// Offset of the table within the image
        #[arg(short, long, value_parser = parse_size, default_value_t = DEFAULT_TABLE_OFFSET)]
        offset: usize,

        /// Maximum table length in bytes
        #[arg(short, long, value_parser = parse_size, default_value_t = MAX_TABLE_SIZE)]
        length: usize,

        /// Print the table as partitions.csv
        #[arg(long)]
        csv: bool,
    },
    /// Search a flash image for partition tables
    Scan {
        /// Flash image file path
        image: PathBuf,

        /// Stride between candidate offsets
        #[arg(short, long, value_parser = parse_size, default_value_t = FLASH_SECTOR_SIZE)]
        alignment: usize,

        /// Print the tables as partitions.csv
        #[arg(long)]
        csv: bool,
    },
    /// Generate or verify OTA data
    Otadata {
        #[command(subcommand)]
        command: OtadataCommands,
    },
}

#[derive(Subcommand)]
enum OtadataCommands {
    /// Generate an OTA data binary selecting the given app slot
    Generate {
        /// App slot to boot: ota_N, appN or a plain index
        target: String,

        /// Output binary file path
        output: PathBuf,
    },
    /// Verify both slots of OTA data
    Verify {
        /// OTA data dump or full flash image
        input: PathBuf,

        /// Offset of the OTA data within the input; use 0xe000 for full images
        #[arg(short, long, value_parser = parse_size, default_value_t = 0)]
        offset: usize,
    },
}

fn parse_size(s: &str) -> Result<usize, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<usize>().map_err(|e| e.to_string())
    }
}

fn parse_target(s: &str) -> Result<u32, esp_flash_layout::Error> {
    match s.parse::<u32>() {
        Ok(index) => Ok(index),
        Err(_) => otadata::ota_index_from_name(s),
    }
}

fn print_table(table: &PartitionTable, csv: bool) -> Result<(), Box<dyn std::error::Error>> {
    if csv {
        table.write_csv(io::stdout().lock())?;
        return Ok(());
    }

    println!(
        "{:<16} {:<8} {:<10} {:<10} {:<10} {}",
        "Label", "Type", "SubType", "Offset", "Size", "Flags"
    );
    for entry in table {
        println!(
            "{:<16} {:<8} {:<10} 0x{:08X} 0x{:08X} 0x{:08X}",
            entry.label,
            entry.type_name(),
            entry.subtype_name(),
            entry.offset,
            entry.size,
            entry.flags
        );
    }
    Ok(())
}

fn init_logger(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    );
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Parse {
            image,
            offset,
            length,
            csv,
        } => {
            info!("Reading flash image: {}", image.display());
            let data = fs::read(&image)?;
            let start = offset.min(data.len());
            let end = offset.saturating_add(length).min(data.len());

            let table = parse(&data[start..end], 0);
            info!(
                "Found {} partitions at 0x{:X} (stopped: {:?})",
                table.len(),
                offset,
                table.stop_reason()
            );
            print_table(&table, csv)?;

            Ok(())
        }
        Commands::Scan {
            image,
            alignment,
            csv,
        } => {
            info!("Reading flash image: {}", image.display());
            let data = fs::read(&image)?;

            let locations = TableScanner::new().with_alignment(alignment).scan(&data);
            if locations.is_empty() {
                warn!("No partition table found");
                let magic = bootloader_magic(&data);
                println!("0x{:04X}: {}", magic.offset, magic.to_hex());
                for probe in probe_known_offsets(&data) {
                    println!("0x{:04X}: {}", probe.offset, probe.to_hex());
                }
                return Ok(());
            }

            info!("Found {} possible partition tables", locations.len());
            for location in &locations {
                println!();
                println!("Table at 0x{:08X}", location.offset);
                print_table(&location.table, csv)?;
            }

            Ok(())
        }
        Commands::Otadata {
            command: OtadataCommands::Generate { target, output },
        } => {
            let index = parse_target(&target)?;
            let region = otadata::build(index);
            fs::write(&output, &region)?;

            info!(
                "Generated OTA data selecting slot {} ({} bytes): {}",
                index,
                region.len(),
                output.display()
            );
            println!("First 16 bytes: {}", hex::encode(&region[..16]));

            Ok(())
        }
        Commands::Otadata {
            command: OtadataCommands::Verify { input, offset },
        } => {
            info!("Reading OTA data: {}", input.display());
            let data = fs::read(&input)?;
            if offset == 0 && data.len() > OTADATA_SIZE {
                warn!(
                    "input is larger than OTA data; pass --offset 0x{:X} for a full flash image",
                    DEFAULT_OTADATA_OFFSET
                );
            }
            let region = data.get(offset..).unwrap_or_default();
            let selector = SelectorRegion::parse(region)?;

            for (idx, slot) in selector.slots.iter().enumerate() {
                match slot {
                    SlotState::Erased => println!("slot {idx}: erased"),
                    SlotState::Valid(record) => println!(
                        "slot {idx}: sequence {}, ota_{} (crc 0x{:08X})",
                        record.sequence, record.selected_index, record.checksum
                    ),
                    SlotState::Invalid(e) => println!("slot {idx}: invalid: {e}"),
                }
            }
            match selector.active() {
                Some(record) => println!("boots ota_{}", record.selected_index),
                None => println!("no valid selection, bootloader falls back to factory/ota_0"),
            }

            Ok(())
        }
    }
}
