//! EEPROM codecs for the device configuration record and error log
//!
//! # Design Principles
//!
//! - Byte-exact little-endian layouts taken from the format descriptor
//! - Checksum verified on every configuration decode, recomputed on every encode
//! - Setters validate before mutating
//! - Log scans are lazy and re-read the store every time
//!
//! Codecs work on plain byte slices or any [`ByteStore`](crate::store::ByteStore);
//! they know nothing about Intel-HEX or device programmers.

mod config_record;
mod crc;
mod error_log;
mod errors;
mod scanner;

pub use config_record::{
    ConfigField, ConfigUpdate, ConfigurationRecord, AES_KEY_LEN, MIN_REPORT_INTERVAL,
    NETWORK_ID_LEN, PAYLOAD_LEN, RECORD_LEN,
};
pub use crc::{crc16, verify_crc16};
pub use error_log::{describe, format_time, ErrorLogEntry, SLOT_LEN};
pub use errors::{NvmError, NvmErrorCode, NvmResult};
pub use scanner::{scan, write_cursor, write_entry, ErrorLog, ErrorLogScanner, WriteCursor};
