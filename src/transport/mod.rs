//! Device memory transport
//!
//! Moves a whole EEPROM image between the device and an Intel-HEX file on
//! disk. The codecs never talk to hardware; the CLI reads the device into a
//! file, edits the file, and writes it back.

mod avrdude;

use std::fmt;
use std::path::Path;

use crate::nvm::NvmResult;

pub use avrdude::Avrdude;

/// Transfer direction relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device to file
    Read,
    /// File to device
    Write,
}

impl Direction {
    /// Single-letter memory operation code used by programmers
    pub fn op(&self) -> char {
        match self {
            Direction::Read => 'r',
            Direction::Write => 'w',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => write!(f, "read"),
            Direction::Write => write!(f, "write"),
        }
    }
}

/// Something that can copy the EEPROM to and from an image file.
pub trait DeviceTransport {
    /// Reads the device EEPROM into `file`.
    fn read(&self, file: &Path) -> NvmResult<()>;

    /// Writes `file` to the device EEPROM.
    fn write(&self, file: &Path) -> NvmResult<()>;
}
