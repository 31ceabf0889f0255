//! Error types for the EEPROM codecs and their store
//!
//! Error codes:
//! - NVM_INTEGRITY_ERROR - stored checksum does not match the payload
//! - NVM_VALIDATION_ERROR - a field assignment violates its constraint
//! - NVM_SHORT_READ - fewer bytes available than a record or slot needs
//! - NVM_HEX_FORMAT - the image container could not be parsed
//! - NVM_IO_ERROR - image file could not be read or written
//! - NVM_TRANSPORT_ERROR - the device programmer failed
//!
//! None of these are fatal to the process; callers decide whether to abort or
//! continue.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Error codes for EEPROM image handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvmErrorCode {
    /// Checksum mismatch on configuration decode
    Integrity,
    /// Field value rejected by a setter
    Validation,
    /// Not enough bytes for a fixed-size record or slot
    ShortRead,
    /// Malformed Intel-HEX container
    HexFormat,
    /// Image file I/O failure
    Io,
    /// External programmer failure
    Transport,
}

impl NvmErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            NvmErrorCode::Integrity => "NVM_INTEGRITY_ERROR",
            NvmErrorCode::Validation => "NVM_VALIDATION_ERROR",
            NvmErrorCode::ShortRead => "NVM_SHORT_READ",
            NvmErrorCode::HexFormat => "NVM_HEX_FORMAT",
            NvmErrorCode::Io => "NVM_IO_ERROR",
            NvmErrorCode::Transport => "NVM_TRANSPORT_ERROR",
        }
    }
}

impl fmt::Display for NvmErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// EEPROM error with context
#[derive(Debug)]
pub struct NvmError {
    /// Error code
    code: NvmErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Field that was rejected (validation errors only)
    field: Option<&'static str>,
    /// Underlying error if applicable
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl NvmError {
    fn new(code: NvmErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            field: None,
            source: None,
        }
    }

    /// Checksum mismatch between the stored and the recomputed value
    pub fn integrity(stored: u16, computed: u16) -> Self {
        Self {
            details: Some(format!(
                "stored: 0x{:04x}, computed: 0x{:04x}",
                stored, computed
            )),
            ..Self::new(NvmErrorCode::Integrity, "Configuration checksum mismatch")
        }
    }

    /// A field assignment was rejected. The record is left unchanged.
    pub fn validation(
        field: &'static str,
        value: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            details: Some(format!("field: {}, value: {}", field, value)),
            field: Some(field),
            ..Self::new(NvmErrorCode::Validation, reason)
        }
    }

    /// Fewer bytes were available than required
    pub fn short_read(address: u32, expected: usize, available: usize) -> Self {
        Self {
            details: Some(format!(
                "address: 0x{:04x}, expected: {}, available: {}",
                address, expected, available
            )),
            ..Self::new(NvmErrorCode::ShortRead, "Not enough bytes in store")
        }
    }

    /// Intel-HEX container could not be parsed
    pub fn hex_format(source: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
            ..Self::new(NvmErrorCode::HexFormat, "")
        }
    }

    /// Image file I/O failure
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(NvmErrorCode::Io, message)
        }
    }

    /// Programmer could not be started
    pub fn transport_spawn(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(NvmErrorCode::Transport, message)
        }
    }

    /// Programmer ran but reported failure
    pub fn transport_failed(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(NvmErrorCode::Transport, message)
        }
    }

    /// Returns the error code
    pub fn code(&self) -> NvmErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns the rejected field for validation errors
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Whether this is a checksum failure
    pub fn is_integrity(&self) -> bool {
        self.code == NvmErrorCode::Integrity
    }

    /// Whether this is a rejected field assignment
    pub fn is_validation(&self) -> bool {
        self.code == NvmErrorCode::Validation
    }

    /// Whether this is a short read
    pub fn is_short_read(&self) -> bool {
        self.code == NvmErrorCode::ShortRead
    }
}

impl fmt::Display for NvmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl StdError for NvmError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Result type for EEPROM operations
pub type NvmResult<T> = Result<T, NvmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(NvmErrorCode::Integrity.code(), "NVM_INTEGRITY_ERROR");
        assert_eq!(NvmErrorCode::Validation.code(), "NVM_VALIDATION_ERROR");
        assert_eq!(NvmErrorCode::ShortRead.code(), "NVM_SHORT_READ");
        assert_eq!(NvmErrorCode::HexFormat.code(), "NVM_HEX_FORMAT");
        assert_eq!(NvmErrorCode::Io.code(), "NVM_IO_ERROR");
        assert_eq!(NvmErrorCode::Transport.code(), "NVM_TRANSPORT_ERROR");
    }

    #[test]
    fn test_integrity_display() {
        let err = NvmError::integrity(0x1234, 0xabcd);
        let display = err.to_string();
        assert!(err.is_integrity());
        assert!(display.contains("NVM_INTEGRITY_ERROR"));
        assert!(display.contains("stored: 0x1234"));
        assert!(display.contains("computed: 0xabcd"));
    }

    #[test]
    fn test_validation_names_field_and_value() {
        let err = NvmError::validation("version", 0, "Invalid version");
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("version"));
        assert_eq!(err.details(), Some("field: version, value: 0"));
        assert_eq!(err.message(), "Invalid version");
    }

    #[test]
    fn test_short_read_details() {
        let err = NvmError::short_read(0x22, 10, 4);
        assert!(err.is_short_read());
        assert!(err.to_string().contains("address: 0x0022"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = NvmError::io_error(
            "Failed to read image",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.code(), NvmErrorCode::Io);
        assert!(err.source().is_some());
    }
}
