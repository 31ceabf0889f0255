//! Device configuration record codec
//!
//! The record is a packed little-endian struct followed by a CRC-16 over the
//! payload:
//!
//! ```text
//! +-------------------+  0
//! | Version           |  (u16 LE)
//! +-------------------+  2
//! | Network ID        |  (6 bytes)
//! +-------------------+  8
//! | Report Interval   |  (u32 LE, seconds)
//! +-------------------+  12
//! | AES Key           |  (16 bytes + 1 zero byte)
//! +-------------------+  29
//! | Master Address    |  (u8)
//! | Address           |  (u8)
//! | Broadcast Address |  (u8)
//! +-------------------+  32
//! | Checksum          |  (u16 LE, CRC-16 over bytes 0..32)
//! +-------------------+  34
//! ```
//!
//! Decoding verifies the checksum and refuses to produce a record on
//! mismatch. Setters validate before mutating; a rejected value leaves the
//! record unchanged.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use super::crc::{crc16, verify_crc16};
use super::errors::{NvmError, NvmResult};
use crate::format::FORMAT_V1;
use crate::store::ByteStore;

/// Bytes covered by the checksum.
pub const PAYLOAD_LEN: usize = FORMAT_V1.config_payload_len;

/// Encoded record length including the checksum.
pub const RECORD_LEN: usize = FORMAT_V1.config_len();

/// Network identifier width.
pub const NETWORK_ID_LEN: usize = 6;

/// Logical AES key length accepted by the setter.
pub const AES_KEY_LEN: usize = 16;

/// Shortest accepted report interval in seconds.
pub const MIN_REPORT_INTERVAL: u64 = 10;

const AES_KEY_FIELD_LEN: usize = AES_KEY_LEN + 1;

mod offset {
    pub const VERSION: usize = 0;
    pub const NETWORK_ID: usize = 2;
    pub const REPORT_INTERVAL: usize = 8;
    pub const AES_KEY: usize = 12;
    pub const MASTER_ADDRESS: usize = 29;
    pub const ADDRESS: usize = 30;
    pub const BROADCAST_ADDRESS: usize = 31;
    pub const CHECKSUM: usize = 32;
}

/// Named fields of the configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Version,
    NetworkId,
    ReportInterval,
    AesKey,
    MasterAddress,
    Address,
    BroadcastAddress,
}

impl ConfigField {
    /// All fields in layout order.
    pub const ALL: [ConfigField; 7] = [
        ConfigField::Version,
        ConfigField::NetworkId,
        ConfigField::ReportInterval,
        ConfigField::AesKey,
        ConfigField::MasterAddress,
        ConfigField::Address,
        ConfigField::BroadcastAddress,
    ];

    /// Returns the snake_case field name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::Version => "version",
            ConfigField::NetworkId => "network_id",
            ConfigField::ReportInterval => "report_interval",
            ConfigField::AesKey => "aes_key",
            ConfigField::MasterAddress => "master_address",
            ConfigField::Address => "address",
            ConfigField::BroadcastAddress => "broadcast_address",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfigField {
    type Err = NvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| NvmError::validation("field", s, "Unknown configuration field"))
    }
}

/// Pending field assignments applied all-or-nothing by
/// [`ConfigurationRecord::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub version: Option<u64>,
    pub network_id: Option<Vec<u8>>,
    pub report_interval: Option<u64>,
    pub aes_key: Option<String>,
    pub master_address: Option<u64>,
    pub address: Option<u64>,
    pub broadcast_address: Option<u64>,
}

impl ConfigUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn network_id(mut self, network_id: impl Into<Vec<u8>>) -> Self {
        self.network_id = Some(network_id.into());
        self
    }

    pub fn report_interval(mut self, seconds: u64) -> Self {
        self.report_interval = Some(seconds);
        self
    }

    pub fn aes_key(mut self, key: impl Into<String>) -> Self {
        self.aes_key = Some(key.into());
        self
    }

    pub fn master_address(mut self, address: u64) -> Self {
        self.master_address = Some(address);
        self
    }

    pub fn address(mut self, address: u64) -> Self {
        self.address = Some(address);
        self
    }

    pub fn broadcast_address(mut self, address: u64) -> Self {
        self.broadcast_address = Some(address);
        self
    }

    /// Whether the update assigns nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Device configuration as stored at the start of the EEPROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationRecord {
    version: u16,
    network_id: [u8; NETWORK_ID_LEN],
    report_interval: u32,
    aes_key: [u8; AES_KEY_LEN],
    master_address: u8,
    address: u8,
    broadcast_address: u8,
}

impl ConfigurationRecord {
    /// Creates a record, validating every field.
    pub fn new(
        version: u64,
        network_id: &[u8],
        report_interval: u64,
        aes_key: &str,
        master_address: u64,
        address: u64,
        broadcast_address: u64,
    ) -> NvmResult<Self> {
        let mut record = Self::blank();
        record.set_version(version)?;
        record.set_network_id(network_id)?;
        record.set_report_interval(report_interval)?;
        record.set_aes_key(aes_key)?;
        record.set_master_address(master_address)?;
        record.set_address(address)?;
        record.set_broadcast_address(broadcast_address)?;
        Ok(record)
    }

    fn blank() -> Self {
        Self {
            version: 0,
            network_id: [0; NETWORK_ID_LEN],
            report_interval: 0,
            aes_key: [0; AES_KEY_LEN],
            master_address: 0,
            address: 0,
            broadcast_address: 0,
        }
    }

    /// Encoded size of the record in bytes, checksum included.
    pub const fn size() -> usize {
        RECORD_LEN
    }

    /// Size of the checksummed payload in bytes.
    pub const fn payload_size() -> usize {
        PAYLOAD_LEN
    }

    /// Decodes a record, verifying the trailing checksum.
    ///
    /// Field ranges are not re-validated here; the checksum is the only
    /// acceptance criterion for stored data.
    pub fn decode(data: &[u8]) -> NvmResult<Self> {
        if data.len() < RECORD_LEN {
            return Err(NvmError::short_read(
                FORMAT_V1.config_start,
                RECORD_LEN,
                data.len(),
            ));
        }

        let payload = &data[..PAYLOAD_LEN];
        let stored = u16::from_le_bytes([data[offset::CHECKSUM], data[offset::CHECKSUM + 1]]);

        if !verify_crc16(payload, stored) {
            return Err(NvmError::integrity(stored, crc16(payload)));
        }

        let mut network_id = [0u8; NETWORK_ID_LEN];
        network_id
            .copy_from_slice(&payload[offset::NETWORK_ID..offset::NETWORK_ID + NETWORK_ID_LEN]);

        // The 17th key byte is padding and is ignored.
        let mut aes_key = [0u8; AES_KEY_LEN];
        aes_key.copy_from_slice(&payload[offset::AES_KEY..offset::AES_KEY + AES_KEY_LEN]);

        Ok(Self {
            version: u16::from_le_bytes([
                payload[offset::VERSION],
                payload[offset::VERSION + 1],
            ]),
            network_id,
            report_interval: u32::from_le_bytes([
                payload[offset::REPORT_INTERVAL],
                payload[offset::REPORT_INTERVAL + 1],
                payload[offset::REPORT_INTERVAL + 2],
                payload[offset::REPORT_INTERVAL + 3],
            ]),
            aes_key,
            master_address: payload[offset::MASTER_ADDRESS],
            address: payload[offset::ADDRESS],
            broadcast_address: payload[offset::BROADCAST_ADDRESS],
        })
    }

    /// Packs the fields in layout order, without the checksum.
    pub fn encode_payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut buf = [0u8; PAYLOAD_LEN];

        buf[offset::VERSION..offset::NETWORK_ID].copy_from_slice(&self.version.to_le_bytes());
        buf[offset::NETWORK_ID..offset::REPORT_INTERVAL].copy_from_slice(&self.network_id);
        buf[offset::REPORT_INTERVAL..offset::AES_KEY]
            .copy_from_slice(&self.report_interval.to_le_bytes());
        // Bytes AES_KEY + 16 stays zero.
        buf[offset::AES_KEY..offset::AES_KEY + AES_KEY_LEN].copy_from_slice(&self.aes_key);
        buf[offset::MASTER_ADDRESS] = self.master_address;
        buf[offset::ADDRESS] = self.address;
        buf[offset::BROADCAST_ADDRESS] = self.broadcast_address;

        buf
    }

    /// Encodes the record with a freshly computed checksum.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let payload = self.encode_payload();
        let checksum = crc16(&payload);

        let mut record = [0u8; RECORD_LEN];
        record[..PAYLOAD_LEN].copy_from_slice(&payload);
        record[offset::CHECKSUM..].copy_from_slice(&checksum.to_le_bytes());
        record
    }

    /// Checksum the record would be stored with.
    pub fn checksum_of(&self) -> u16 {
        crc16(&self.encode_payload())
    }

    /// Reads and decodes the record from the configuration region of a store.
    pub fn read_from<S: ByteStore + ?Sized>(store: &S) -> NvmResult<Self> {
        let data = store.get(FORMAT_V1.config_start, RECORD_LEN)?;
        Self::decode(&data)
    }

    /// Encodes the record into the configuration region of a store.
    ///
    /// Bytes outside the region are left untouched.
    pub fn write_to<S: ByteStore + ?Sized>(&self, store: &mut S) {
        store.put(FORMAT_V1.config_start, &self.encode());
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn network_id(&self) -> &[u8; NETWORK_ID_LEN] {
        &self.network_id
    }

    /// Report interval in seconds.
    pub fn report_interval(&self) -> u32 {
        self.report_interval
    }

    /// AES key decoded as text.
    pub fn aes_key(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.aes_key)
    }

    pub fn master_address(&self) -> u8 {
        self.master_address
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn broadcast_address(&self) -> u8 {
        self.broadcast_address
    }

    /// Sets the configuration version. Rejects 0 and values above 65535.
    pub fn set_version(&mut self, version: u64) -> NvmResult<()> {
        if version == 0 || version > u16::MAX as u64 {
            return Err(NvmError::validation("version", version, "Invalid version"));
        }
        self.version = version as u16;
        Ok(())
    }

    /// Sets the network ID. Exactly six bytes are required.
    pub fn set_network_id(&mut self, network_id: &[u8]) -> NvmResult<()> {
        let network_id: [u8; NETWORK_ID_LEN] = network_id.try_into().map_err(|_| {
            NvmError::validation(
                "network_id",
                hex::encode(network_id),
                "Invalid network ID length",
            )
        })?;
        self.network_id = network_id;
        Ok(())
    }

    /// Sets the report interval in seconds. Rejects values below 10 or above
    /// 4294967295.
    pub fn set_report_interval(&mut self, seconds: u64) -> NvmResult<()> {
        if !(MIN_REPORT_INTERVAL..=u32::MAX as u64).contains(&seconds) {
            return Err(NvmError::validation(
                "report_interval",
                seconds,
                "Invalid report interval",
            ));
        }
        self.report_interval = seconds as u32;
        Ok(())
    }

    /// Sets the AES key. Exactly 16 bytes of text are required.
    ///
    /// The key itself is never echoed in the error.
    pub fn set_aes_key(&mut self, key: &str) -> NvmResult<()> {
        let key: [u8; AES_KEY_LEN] = key.as_bytes().try_into().map_err(|_| {
            NvmError::validation(
                "aes_key",
                format!("<{} bytes>", key.len()),
                "Invalid AES-key length",
            )
        })?;
        self.aes_key = key;
        Ok(())
    }

    // The address fields are checked against the full 0..=255 range. Older
    // tooling combined its bounds with AND and never rejected anything, then
    // failed at pack time for values that do not fit a byte.

    /// Sets the master address. Accepts 0..=255.
    pub fn set_master_address(&mut self, address: u64) -> NvmResult<()> {
        self.master_address =
            checked_address("master_address", address, "Invalid master address")?;
        Ok(())
    }

    /// Sets the node address. Accepts 0..=255.
    pub fn set_address(&mut self, address: u64) -> NvmResult<()> {
        self.address = checked_address("address", address, "Invalid address")?;
        Ok(())
    }

    /// Sets the broadcast address. Accepts 0..=255.
    pub fn set_broadcast_address(&mut self, address: u64) -> NvmResult<()> {
        self.broadcast_address =
            checked_address("broadcast_address", address, "Invalid broadcast address")?;
        Ok(())
    }

    /// Validates every assignment in `update` and returns all rejections.
    pub fn check(&self, update: &ConfigUpdate) -> Vec<NvmError> {
        self.staged(update).1
    }

    /// Applies `update` only if every assignment is valid.
    ///
    /// On failure the first rejection is returned and the record is unchanged.
    pub fn apply(&mut self, update: &ConfigUpdate) -> NvmResult<()> {
        let (staged, mut errors) = self.staged(update);
        if !errors.is_empty() {
            return Err(errors.remove(0));
        }
        *self = staged;
        Ok(())
    }

    fn staged(&self, update: &ConfigUpdate) -> (Self, Vec<NvmError>) {
        let mut scratch = self.clone();
        let results = [
            update.version.map(|v| scratch.set_version(v)),
            update
                .network_id
                .as_deref()
                .map(|v| scratch.set_network_id(v)),
            update.report_interval.map(|v| scratch.set_report_interval(v)),
            update.aes_key.as_deref().map(|v| scratch.set_aes_key(v)),
            update.master_address.map(|v| scratch.set_master_address(v)),
            update.address.map(|v| scratch.set_address(v)),
            update
                .broadcast_address
                .map(|v| scratch.set_broadcast_address(v)),
        ];
        let errors = results.into_iter().flatten().filter_map(Result::err).collect();
        (scratch, errors)
    }

    /// Renders a field the way the command line prints it.
    pub fn field_value(&self, field: ConfigField) -> String {
        match field {
            ConfigField::Version => self.version.to_string(),
            ConfigField::NetworkId => hex::encode(self.network_id),
            ConfigField::ReportInterval => self.report_interval.to_string(),
            ConfigField::AesKey => self.aes_key().into_owned(),
            ConfigField::MasterAddress => self.master_address.to_string(),
            ConfigField::Address => self.address.to_string(),
            ConfigField::BroadcastAddress => self.broadcast_address.to_string(),
        }
    }

    /// Parses `text` and assigns it to `field`.
    ///
    /// Integers are decimal, the network ID is hex (whitespace between bytes
    /// allowed) and the AES key is taken verbatim.
    pub fn set_field_str(&mut self, field: ConfigField, text: &str) -> NvmResult<()> {
        match field {
            ConfigField::NetworkId => {
                let compact: String = text.split_whitespace().collect();
                let bytes = hex::decode(&compact).map_err(|e| {
                    let reason = format!("Invalid network ID: {}", e);
                    NvmError::validation(field.as_str(), text, reason)
                })?;
                self.set_network_id(&bytes)
            }
            ConfigField::AesKey => self.set_aes_key(text),
            _ => {
                let value: u64 = text.trim().parse().map_err(|_| {
                    NvmError::validation(field.as_str(), text, "Expected a decimal integer")
                })?;
                match field {
                    ConfigField::Version => self.set_version(value),
                    ConfigField::ReportInterval => self.set_report_interval(value),
                    ConfigField::MasterAddress => self.set_master_address(value),
                    ConfigField::Address => self.set_address(value),
                    _ => self.set_broadcast_address(value),
                }
            }
        }
    }
}

fn checked_address(field: &'static str, value: u64, reason: &str) -> NvmResult<u8> {
    u8::try_from(value).map_err(|_| NvmError::validation(field, value, reason))
}
