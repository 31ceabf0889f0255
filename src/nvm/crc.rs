//! CRC-16 checksum for the configuration record
//!
//! The firmware computes the checksum MSB-first over the packed payload with
//! polynomial 0x8005 and a zero register. Parameters come from the format
//! descriptor.

use crc::Crc;

use crate::format::FORMAT_V1;

const CRC16: Crc<u16> = Crc::<u16>::new(FORMAT_V1.checksum);

/// Computes the CRC-16 over the provided data.
///
/// This function is deterministic: the same input always produces the same output.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Verifies that the computed checksum matches the expected checksum.
pub fn verify_crc16(data: &[u8], expected: u16) -> bool {
    crc16(data) == expected
}
