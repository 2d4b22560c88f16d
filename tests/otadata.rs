mod common;

use common::*;
use esp_flash_layout::crc::crc32;
use esp_flash_layout::otadata::{
    build,
    validate,
    SelectorRecord,
    SelectorRegion,
    SlotState,
    OTADATA_SIZE,
    RECORD_SIZE,
    SLOT_SIZE,
};
use esp_flash_layout::{
    parse,
    Error,
};
use pretty_assertions::assert_eq;

#[test]
fn test_build_layout() {
    for index in [0, 1, 2, u32::MAX] {
        let region = build(index);
        assert_eq!(region.len(), OTADATA_SIZE);

        assert_eq!(&region[0..4], &1u32.to_le_bytes());
        assert_eq!(&region[4..8], &index.to_le_bytes());
        let crc = u32::from_le_bytes(region[8..12].try_into().unwrap());
        assert_eq!(crc, crc32_reference(&region[0..8]));

        assert!(region[RECORD_SIZE..].iter().all(|&b| b == 0xFF));
        assert!(region[SLOT_SIZE..].iter().all(|&b| b == 0xFF));
    }
}

#[test]
fn test_build_is_deterministic() {
    assert_eq!(build(1), build(1));
    assert_ne!(build(0), build(1));
}

#[test]
fn test_build_matches_known_image() {
    // otadata selecting ota_1 as produced by the ESP-IDF tooling
    let region = build(1);
    assert_eq!(
        hex::encode(&region[..16]),
        format!(
            "0100000001000000{}ffffffff",
            hex::encode(crc32_reference(&[1, 0, 0, 0, 1, 0, 0, 0]).to_le_bytes())
        )
    );
}

#[test]
fn test_validate_built_record() {
    let region = build(1);

    let record = validate(&region[..RECORD_SIZE]).unwrap();
    assert_eq!(record.sequence, 1);
    assert_eq!(record.selected_index, 1);
    assert_eq!(record, SelectorRecord::new(1, 1));
}

#[test]
fn test_validate_detects_corrupted_sequence() {
    let mut region = build(1);
    region[0] ^= 0x01;

    assert!(matches!(
        validate(&region[..RECORD_SIZE]),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_validate_detects_every_single_bit_flip() {
    let region = build(1);

    for bit in 0..64 {
        let mut record = region[..RECORD_SIZE].to_vec();
        record[bit / 8] ^= 1 << (bit % 8);

        let stored = u32::from_le_bytes(record[8..12].try_into().unwrap());
        assert_eq!(
            validate(&record),
            Err(Error::ChecksumMismatch {
                stored,
                computed: crc32(&record[..8]),
            }),
            "bit {bit}"
        );
    }
}

#[test]
fn test_validate_detects_corrupted_checksum() {
    let mut region = build(0);
    region[11] ^= 0x80;

    assert!(matches!(
        validate(&region),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_validate_truncated_record() {
    let region = build(0);

    assert_eq!(
        validate(&region[..11]),
        Err(Error::TruncatedRegion {
            needed: 12,
            available: 11,
        })
    );
}

#[test]
fn test_crc_matches_zlib() {
    let cases: [&[u8]; 3] = [b"", b"\x01\x00\x00\x00\x01\x00\x00\x00", b"123456789"];
    for data in cases {
        assert_eq!(crc32(data), crc32_reference(data));
    }
    let noise = noise_image(0x2000, 11);
    assert_eq!(crc32(&noise), crc32_reference(&noise));
}

#[test]
fn test_region_slots_of_built_region() {
    let selector = SelectorRegion::parse(&build(1)).unwrap();

    assert_eq!(
        selector.slots,
        [SlotState::Valid(SelectorRecord::new(1, 1)), SlotState::Erased]
    );
    assert_eq!(selector.active(), Some(&SelectorRecord::new(1, 1)));
}

#[test]
fn test_region_picks_highest_sequence() {
    let mut region = build(0);
    region[SLOT_SIZE..SLOT_SIZE + RECORD_SIZE]
        .copy_from_slice(&SelectorRecord::new(2, 1).to_bytes());

    let selector = SelectorRegion::parse(&region).unwrap();
    assert_eq!(selector.active().map(|r| r.selected_index), Some(1));

    region[SLOT_SIZE..SLOT_SIZE + RECORD_SIZE]
        .copy_from_slice(&SelectorRecord::new(1, 1).to_bytes());
    let selector = SelectorRegion::parse(&region).unwrap();
    assert_eq!(selector.active().map(|r| r.selected_index), Some(0));
}

#[test]
fn test_region_ignores_invalid_slot() {
    let mut region = build(0);
    let mut newer = SelectorRecord::new(5, 1).to_bytes();
    newer[4] = 2;
    region[SLOT_SIZE..SLOT_SIZE + RECORD_SIZE].copy_from_slice(&newer);

    let selector = SelectorRegion::parse(&region).unwrap();
    assert!(matches!(
        selector.slots[1],
        SlotState::Invalid(Error::ChecksumMismatch { .. })
    ));
    assert_eq!(selector.active().map(|r| r.sequence), Some(1));
}

#[test]
fn test_region_erased() {
    let selector = SelectorRegion::parse(&erased_image(OTADATA_SIZE)).unwrap();
    assert_eq!(selector.slots, [SlotState::Erased, SlotState::Erased]);
    assert_eq!(selector.active(), None);

    assert_eq!(
        SelectorRegion::parse(&erased_image(OTADATA_SIZE - 1)),
        Err(Error::TruncatedRegion {
            needed: OTADATA_SIZE,
            available: OTADATA_SIZE - 1,
        })
    );
}

#[test]
fn test_selected_index_resolves_against_table() {
    let region = table_region(&reference_entries());
    let table = parse(&region, 0);

    let record = validate(&build(0)).unwrap();
    let app = table.ota_app(record.selected_index).unwrap();
    assert_eq!(app.label, "ota_0");
    assert_eq!(app.offset, 0x650000);

    let record = validate(&build(1)).unwrap();
    assert!(table.ota_app(record.selected_index).is_none());
}
