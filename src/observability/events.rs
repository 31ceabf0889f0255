//! Observable events for nvmtool
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Tool configuration
    /// Tool configuration file loaded
    ToolConfigLoaded,

    // Configuration record
    /// Configuration record decoded and verified
    ConfigLoaded,
    /// Configuration record encoded and written
    ConfigSaved,
    /// Stored checksum did not match
    ConfigIntegrityFailed,
    /// Field assignment accepted
    ConfigFieldUpdated,
    /// Field assignment rejected
    ConfigFieldRejected,

    // Error log
    /// Error log window scanned
    ErrorLogScanned,
    /// A log slot could not be read
    ErrorLogSlotSkipped,

    // Image files
    /// Image file parsed
    ImageLoaded,
    /// Image file written
    ImageSaved,
    /// Temporary image file removed
    TempImageRemoved,

    // Device transport
    /// Device read begins
    DeviceReadBegin,
    /// Device read complete
    DeviceReadComplete,
    /// Device write begins
    DeviceWriteBegin,
    /// Device write complete
    DeviceWriteComplete,
    /// Programmer failed
    TransportFailed,
}

impl Event {
    /// Every event, in declaration order
    pub const ALL: [Event; 16] = [
        Event::ToolConfigLoaded,
        Event::ConfigLoaded,
        Event::ConfigSaved,
        Event::ConfigIntegrityFailed,
        Event::ConfigFieldUpdated,
        Event::ConfigFieldRejected,
        Event::ErrorLogScanned,
        Event::ErrorLogSlotSkipped,
        Event::ImageLoaded,
        Event::ImageSaved,
        Event::TempImageRemoved,
        Event::DeviceReadBegin,
        Event::DeviceReadComplete,
        Event::DeviceWriteBegin,
        Event::DeviceWriteComplete,
        Event::TransportFailed,
    ];

    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ToolConfigLoaded => "TOOL_CONFIG_LOADED",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigSaved => "CONFIG_SAVED",
            Event::ConfigIntegrityFailed => "CONFIG_INTEGRITY_FAILED",
            Event::ConfigFieldUpdated => "CONFIG_FIELD_UPDATED",
            Event::ConfigFieldRejected => "CONFIG_FIELD_REJECTED",

            Event::ErrorLogScanned => "ERROR_LOG_SCANNED",
            Event::ErrorLogSlotSkipped => "ERROR_LOG_SLOT_SKIPPED",

            Event::ImageLoaded => "IMAGE_LOADED",
            Event::ImageSaved => "IMAGE_SAVED",
            Event::TempImageRemoved => "TEMP_IMAGE_REMOVED",

            Event::DeviceReadBegin => "DEVICE_READ_BEGIN",
            Event::DeviceReadComplete => "DEVICE_READ_COMPLETE",
            Event::DeviceWriteBegin => "DEVICE_WRITE_BEGIN",
            Event::DeviceWriteComplete => "DEVICE_WRITE_COMPLETE",
            Event::TransportFailed => "TRANSPORT_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigIntegrityFailed | Event::TransportFailed => Severity::Error,
            Event::ConfigFieldRejected | Event::ErrorLogSlotSkipped => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
