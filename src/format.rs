//! EEPROM image format descriptor
//!
//! Every address, width and checksum parameter of the on-device layout lives
//! in a single [`FormatDescriptor`] value. Codecs take their constants from
//! [`FORMAT_V1`] instead of carrying their own literals.
//!
//! ```text
//! 0x000 +---------------------------+
//!       | Configuration payload     | (32 bytes)
//! 0x020 +---------------------------+
//!       | CRC-16 (u16 LE)           |
//! 0x022 +---------------------------+
//!       | Error log slot 0          | (10 bytes each)
//!       | ...                       |
//!       | Error log slot 79         |
//! 0x340 +---------------------------+ (log window end; last slot runs to 0x342)
//! ```

use crc::{Algorithm, CRC_16_UMTS};

/// Layout of the configuration record and the error log inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Revision of this layout
    pub revision: u16,
    /// Store address of the first configuration byte
    pub config_start: u32,
    /// Configuration bytes covered by the checksum
    pub config_payload_len: usize,
    /// Width of the trailing checksum
    pub checksum_len: usize,
    /// First address of the error log window (inclusive)
    pub log_start: u32,
    /// End of the error log window (exclusive bound on slot start addresses)
    pub log_end: u32,
    /// Width of one error log slot
    pub log_slot_len: usize,
    /// CRC parameters for the configuration checksum
    pub checksum: &'static Algorithm<u16>,
}

/// The layout written by current firmware.
///
/// CRC-16/UMTS is the catalogue name of the BUYPASS/VERIFONE variant:
/// polynomial 0x8005, zero init, no reflection, no output XOR.
pub const FORMAT_V1: FormatDescriptor = FormatDescriptor {
    revision: 1,
    config_start: 0x00,
    config_payload_len: 32,
    checksum_len: 2,
    log_start: 0x22,
    log_end: 0x340,
    log_slot_len: 10,
    checksum: &CRC_16_UMTS,
};

impl FormatDescriptor {
    /// Total encoded size of the configuration record, checksum included.
    pub const fn config_len(&self) -> usize {
        self.config_payload_len + self.checksum_len
    }

    /// Number of slot start addresses inside the log window.
    pub const fn log_capacity(&self) -> usize {
        let window = (self.log_end - self.log_start) as usize;
        window.div_ceil(self.log_slot_len)
    }

    /// Store address of the given slot.
    pub const fn log_slot_address(&self, slot: usize) -> u32 {
        self.log_start + (slot * self.log_slot_len) as u32
    }

    /// Iterates slot start addresses in ascending order.
    pub fn log_slot_addresses(&self) -> impl Iterator<Item = u32> {
        (self.log_start..self.log_end).step_by(self.log_slot_len)
    }
}

impl Default for FormatDescriptor {
    fn default() -> Self {
        FORMAT_V1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_record_ends_where_log_begins() {
        assert_eq!(FORMAT_V1.config_len(), 34);
        assert_eq!(
            FORMAT_V1.config_start as usize + FORMAT_V1.config_len(),
            FORMAT_V1.log_start as usize
        );
    }

    #[test]
    fn test_log_capacity_matches_slot_iteration() {
        assert_eq!(FORMAT_V1.log_capacity(), 80);
        assert_eq!(FORMAT_V1.log_slot_addresses().count(), 80);
    }

    #[test]
    fn test_slot_addresses() {
        let addresses: Vec<u32> = FORMAT_V1.log_slot_addresses().collect();
        assert_eq!(addresses[0], 0x22);
        assert_eq!(addresses[1], 0x2C);
        assert_eq!(*addresses.last().unwrap(), 0x338);
        assert_eq!(FORMAT_V1.log_slot_address(79), 0x338);
    }

    #[test]
    fn test_checksum_parameters() {
        assert_eq!(FORMAT_V1.checksum.poly, 0x8005);
        assert_eq!(FORMAT_V1.checksum.init, 0x0000);
        assert!(!FORMAT_V1.checksum.refin);
        assert!(!FORMAT_V1.checksum.refout);
        assert_eq!(FORMAT_V1.checksum.xorout, 0x0000);
    }
}
