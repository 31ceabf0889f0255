//! Configuration Record Integrity Tests
//!
//! Covers:
//! - Stored records decode only when the checksum matches
//! - Every single-bit corruption is detected
//! - Encoding is byte-exact and deterministic
//! - Rejected assignments never change the record

use nvmtool::nvm::{
    crc16, ConfigField, ConfigUpdate, ConfigurationRecord, NvmErrorCode, PAYLOAD_LEN, RECORD_LEN,
};
use nvmtool::store::{ByteStore, MemoryImage};

// =============================================================================
// Test Utilities
// =============================================================================

/// version=1, network_id=000000000000, report_interval=60,
/// aes_key="AAAAAAAAAAAAAAAA", master=1, address=2, broadcast=255
fn stored_record() -> Vec<u8> {
    let mut bytes = vec![0x01, 0x00];
    bytes.extend_from_slice(&[0x00; 6]);
    bytes.extend_from_slice(&[0x3c, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(&[0x41; 16]);
    bytes.push(0x00);
    bytes.extend_from_slice(&[0x01, 0x02, 0xff]);
    bytes.extend_from_slice(&[0x01, 0x2b]);
    bytes
}

fn sample_record() -> ConfigurationRecord {
    ConfigurationRecord::new(1, &[0; 6], 60, "AAAAAAAAAAAAAAAA", 1, 2, 255).unwrap()
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_decode_stored_record() {
    let record = ConfigurationRecord::decode(&stored_record()).unwrap();

    assert_eq!(record.version(), 1);
    assert_eq!(record.network_id(), &[0; 6]);
    assert_eq!(record.report_interval(), 60);
    assert_eq!(record.aes_key(), "AAAAAAAAAAAAAAAA");
    assert_eq!(record.master_address(), 1);
    assert_eq!(record.address(), 2);
    assert_eq!(record.broadcast_address(), 255);
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    let mut bytes = stored_record();
    bytes.extend_from_slice(&[0xEE; 10]);
    assert_eq!(ConfigurationRecord::decode(&bytes).unwrap(), sample_record());
}

#[test]
fn test_decode_short_buffer() {
    let bytes = stored_record();
    let err = ConfigurationRecord::decode(&bytes[..RECORD_LEN - 1]).unwrap_err();
    assert!(err.is_short_read());
}

#[test]
fn test_every_single_bit_flip_is_detected() {
    let original = stored_record();

    for bit in 0..RECORD_LEN * 8 {
        let mut corrupted = original.clone();
        corrupted[bit / 8] ^= 1 << (bit % 8);

        let err = ConfigurationRecord::decode(&corrupted).unwrap_err();
        assert_eq!(
            err.code(),
            NvmErrorCode::Integrity,
            "bit {} flip was not detected",
            bit
        );
    }
}

#[test]
fn test_all_zero_record_has_zero_checksum() {
    // CRC of a zero payload is zero, so a blank EEPROM decodes
    let record = ConfigurationRecord::decode(&[0u8; RECORD_LEN]).unwrap();
    assert_eq!(record.version(), 0);
    assert_eq!(record.report_interval(), 0);
}

#[test]
fn test_erased_eeprom_fails_integrity() {
    let err = ConfigurationRecord::decode(&[0xFFu8; RECORD_LEN]).unwrap_err();
    assert!(err.is_integrity());
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_encode_is_byte_exact() {
    assert_eq!(sample_record().encode().to_vec(), stored_record());
}

#[test]
fn test_checksum_covers_payload_only() {
    let encoded = sample_record().encode();
    let crc = crc16(&encoded[..PAYLOAD_LEN]);
    assert_eq!(crc, 0x2B01);
    assert_eq!(sample_record().checksum_of(), crc);
}

#[test]
fn test_firmware_default_record() {
    let record = ConfigurationRecord::new(
        1,
        &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF],
        60,
        "1DUMMYKEYFOOBAR1",
        1,
        128,
        255,
    )
    .unwrap();

    assert_eq!(record.checksum_of(), 0x144B);
    assert_eq!(&record.encode()[PAYLOAD_LEN..], &[0x4B, 0x14]);
}

#[test]
fn test_aes_key_terminator_is_written_as_zero() {
    let encoded = sample_record().encode();
    assert_eq!(encoded[28], 0);
}

#[test]
fn test_store_roundtrip_leaves_neighbours() {
    let mut image = MemoryImage::from_bytes(0, &[0x5A; 0x40]);
    sample_record().write_to(&mut image);

    assert_eq!(ConfigurationRecord::read_from(&image).unwrap(), sample_record());
    assert_eq!(image.get(RECORD_LEN as u32, 4).unwrap(), vec![0x5A; 4]);
}

// =============================================================================
// Field Validation
// =============================================================================

#[test]
fn test_report_interval_boundary() {
    let mut record = sample_record();
    assert!(record.set_report_interval(10).is_ok());
    assert!(record.set_report_interval(u32::MAX as u64).is_ok());

    let err = record.set_report_interval(9).unwrap_err();
    assert_eq!(err.field(), Some("report_interval"));
    assert_eq!(record.report_interval(), u32::MAX);

    assert!(record.set_report_interval(u32::MAX as u64 + 1).is_err());
}

#[test]
fn test_version_boundary() {
    let mut record = sample_record();
    assert!(record.set_version(0).is_err());
    assert!(record.set_version(65535).is_ok());
    assert!(record.set_version(65536).is_err());
    assert_eq!(record.version(), 65535);
}

#[test]
fn test_address_boundary() {
    let mut record = sample_record();
    assert!(record.set_address(0).is_ok());
    assert!(record.set_master_address(255).is_ok());
    assert!(record.set_broadcast_address(256).is_err());
    assert_eq!(record.broadcast_address(), 255);
}

#[test]
fn test_network_id_and_key_lengths() {
    let mut record = sample_record();
    assert!(record.set_network_id(&[1; 5]).is_err());
    assert!(record.set_network_id(&[1; 7]).is_err());
    assert!(record.set_aes_key("short").is_err());
    assert!(record.set_aes_key("seventeen-bytes!!").is_err());
    assert_eq!(record, sample_record());
}

#[test]
fn test_update_is_all_or_nothing() {
    let mut record = sample_record();
    let update = ConfigUpdate::new()
        .report_interval(300)
        .address(7)
        .broadcast_address(1000);

    let problems = record.check(&update);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].field(), Some("broadcast_address"));

    assert!(record.apply(&update).is_err());
    assert_eq!(record, sample_record());

    record
        .apply(&ConfigUpdate::new().report_interval(300).address(7))
        .unwrap();
    assert_eq!(record.report_interval(), 300);
    assert_eq!(record.address(), 7);
}

#[test]
fn test_text_assignment_by_field_name() {
    let mut record = sample_record();
    let field: ConfigField = "network_id".parse().unwrap();
    record.set_field_str(field, "01 02 03 04 05 06").unwrap();
    assert_eq!(record.field_value(field), "010203040506");

    assert!("nonsense".parse::<ConfigField>().is_err());
}
