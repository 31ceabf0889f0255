//! Tool configuration
//!
//! Optional JSON file. Every field has a default; a missing file means all
//! defaults.
//!
//! ```json
//! {
//!   "programmer": "avrdude",
//!   "tool": "avrisp2",
//!   "baud_rate": 19200,
//!   "mcu": "atmega328p",
//!   "hex_record_width": 32,
//!   "atomic_write": true,
//!   "log_level": "warn"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::observability::Severity;
use crate::store::hex::DEFAULT_RECORD_WIDTH;
use crate::store::WriteMode;
use crate::transport::Avrdude;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Programmer executable
    #[serde(default = "default_programmer")]
    pub programmer: String,

    /// Programmer type
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Target part
    #[serde(default = "default_mcu")]
    pub mcu: String,

    /// Data bytes per Intel-HEX record when writing images
    #[serde(default = "default_hex_record_width")]
    pub hex_record_width: usize,

    /// Replace image files via temp file and rename
    #[serde(default = "default_atomic_write")]
    pub atomic_write: bool,

    /// Lowest severity written to stderr
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_programmer() -> String {
    "avrdude".to_string()
}
fn default_tool() -> String {
    "avrisp2".to_string()
}
fn default_baud_rate() -> u32 {
    19200
}
fn default_mcu() -> String {
    "atmega328p".to_string()
}
fn default_hex_record_width() -> usize {
    DEFAULT_RECORD_WIDTH
}
fn default_atomic_write() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            programmer: default_programmer(),
            tool: default_tool(),
            baud_rate: default_baud_rate(),
            mcu: default_mcu(),
            hex_record_width: default_hex_record_width(),
            atomic_write: default_atomic_write(),
            log_level: default_log_level(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: ToolConfig = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.baud_rate == 0 {
            return Err(CliError::config_error("baud_rate must be > 0"));
        }

        if !(1..=255).contains(&self.hex_record_width) {
            return Err(CliError::config_error(format!(
                "Invalid hex_record_width: {}. Must be between 1 and 255.",
                self.hex_record_width
            )));
        }

        for (name, value) in [
            ("programmer", &self.programmer),
            ("tool", &self.tool),
            ("mcu", &self.mcu),
        ] {
            if value.trim().is_empty() {
                return Err(CliError::config_error(format!("{} must not be empty", name)));
            }
        }

        self.severity()?;

        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level.parse().map_err(CliError::config_error)
    }

    /// How image files are replaced
    pub fn write_mode(&self) -> WriteMode {
        if self.atomic_write {
            WriteMode::Atomic
        } else {
            WriteMode::InPlace
        }
    }

    /// Programmer settings for `port`
    pub fn transport(&self, port: &str) -> Avrdude {
        Avrdude {
            programmer: self.programmer.clone(),
            port: port.to_string(),
            tool: self.tool.clone(),
            baud_rate: self.baud_rate,
            mcu: self.mcu.clone(),
        }
    }
}
