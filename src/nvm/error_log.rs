//! Error log entry codec
//!
//! Each slot is ten packed little-endian bytes:
//!
//! ```text
//! +-------------+-------------+------+-------------+
//! | index (u32) | time (u32)  | code | information |
//! +-------------+-------------+------+-------------+
//! ```
//!
//! An index of zero marks a slot that was never written.

use chrono::{DateTime, TimeDelta, Utc};

use super::errors::{NvmError, NvmResult};
use crate::format::FORMAT_V1;

/// Encoded slot width.
pub const SLOT_LEN: usize = FORMAT_V1.log_slot_len;

/// 2000-01-01T00:00:00Z as a Unix timestamp.
const DEVICE_EPOCH_UNIX: i64 = 946_684_800;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error codes logged by the firmware.
const DESCRIPTIONS: [(u8, &str); 5] = [
    (1, "POWERON"),
    (2, "ASSFAIL"),
    (3, "LOW_STACK"),
    (4, "RTC_FAIL"),
    (5, "CORRUPT_CONFIG"),
];

/// One populated error log slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLogEntry {
    /// Monotonic entry number, never zero for a populated slot
    pub index: u32,
    /// Seconds since 2000-01-01T00:00:00Z
    pub timestamp: u32,
    /// Error code
    pub code: u8,
    /// Auxiliary value saved with the code
    pub information: u8,
}

impl ErrorLogEntry {
    pub fn new(index: u32, timestamp: u32, code: u8, information: u8) -> Self {
        Self {
            index,
            timestamp,
            code,
            information,
        }
    }

    /// Encoded size of a slot in bytes.
    pub const fn size() -> usize {
        SLOT_LEN
    }

    /// Decodes a slot. Returns `Ok(None)` for an unused slot (index 0).
    pub fn decode(data: &[u8]) -> NvmResult<Option<Self>> {
        if data.len() < SLOT_LEN {
            return Err(NvmError::short_read(0, SLOT_LEN, data.len()));
        }

        let index = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if index == 0 {
            return Ok(None);
        }

        Ok(Some(Self {
            index,
            timestamp: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            code: data[8],
            information: data[9],
        }))
    }

    /// Packs the entry into a slot.
    ///
    /// An index of zero encodes fine but reads back as an unused slot.
    pub fn encode(&self) -> [u8; SLOT_LEN] {
        let mut buf = [0u8; SLOT_LEN];
        buf[0..4].copy_from_slice(&self.index.to_le_bytes());
        buf[4..8].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[8] = self.code;
        buf[9] = self.information;
        buf
    }

    /// Short description of the error code.
    pub fn description(&self) -> String {
        describe(self.code)
    }

    /// Time the entry was saved, rendered as `YYYY-MM-DD HH:MM:SS`.
    pub fn time(&self) -> String {
        format_time(self.timestamp)
    }
}

/// Maps an error code to its name; unknown codes render as `UNKNOWN(<code>)`.
pub fn describe(code: u8) -> String {
    DESCRIPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("UNKNOWN({})", code))
}

/// Converts device seconds to a UTC date/time.
fn device_time(timestamp: u32) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
        + TimeDelta::seconds(DEVICE_EPOCH_UNIX)
        + TimeDelta::seconds(timestamp as i64)
}

/// Renders device seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_time(timestamp: u32) -> String {
    device_time(timestamp).format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_roundtrip() {
        let entry = ErrorLogEntry::new(42, 90_061, 3, 0x7F);
        let decoded = ErrorLogEntry::decode(&entry.encode()).unwrap();
        assert_eq!(decoded, Some(entry));
    }

    #[test]
    fn test_encode_layout() {
        let entry = ErrorLogEntry::new(0x01020304, 0x0A0B0C0D, 5, 9);
        assert_eq!(
            entry.encode(),
            [0x04, 0x03, 0x02, 0x01, 0x0D, 0x0C, 0x0B, 0x0A, 5, 9]
        );
    }

    #[test]
    fn test_index_zero_is_empty() {
        let data = [0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 1, 2];
        assert_eq!(ErrorLogEntry::decode(&data).unwrap(), None);

        let entry = ErrorLogEntry::new(0, 123, 1, 1);
        assert_eq!(ErrorLogEntry::decode(&entry.encode()).unwrap(), None);
    }

    #[test]
    fn test_short_slot() {
        let err = ErrorLogEntry::decode(&[1, 0, 0]).unwrap_err();
        assert!(err.is_short_read());
    }

    #[test]
    fn test_describe_known_codes() {
        assert_eq!(describe(1), "POWERON");
        assert_eq!(describe(2), "ASSFAIL");
        assert_eq!(describe(3), "LOW_STACK");
        assert_eq!(describe(4), "RTC_FAIL");
        assert_eq!(describe(5), "CORRUPT_CONFIG");
    }

    #[test]
    fn test_describe_unknown_code() {
        assert_eq!(describe(0), "UNKNOWN(0)");
        assert_eq!(describe(99), "UNKNOWN(99)");
        assert_eq!(ErrorLogEntry::new(1, 0, 99, 0).description(), "UNKNOWN(99)");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "2000-01-01 00:00:00");
        assert_eq!(format_time(90_061), "2000-01-02 01:01:01");
        assert_eq!(format_time(u32::MAX), "2136-02-07 06:28:15");
    }
}
