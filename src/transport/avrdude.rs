//! avrdude-backed transport
//!
//! Runs `avrdude -p <mcu> -P <port> -c <tool> -b <baud> -U eeprom:<r|w>:<file>:i`
//! without a shell. Arguments are passed as a vector so port names and paths
//! are never interpreted.

use std::path::Path;
use std::process::Command;

use super::{DeviceTransport, Direction};
use crate::nvm::{NvmError, NvmResult};
use crate::observability::{log_event_with_fields, Event};

/// Programmer settings for one serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avrdude {
    /// Executable to run
    pub programmer: String,
    /// Serial port the programmer is attached to
    pub port: String,
    /// Programmer type (`-c`)
    pub tool: String,
    /// Serial baud rate (`-b`)
    pub baud_rate: u32,
    /// Target part (`-p`)
    pub mcu: String,
}

impl Avrdude {
    /// Creates a transport with the stock programmer settings.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            programmer: "avrdude".to_string(),
            port: port.into(),
            tool: "avrisp2".to_string(),
            baud_rate: 19200,
            mcu: "atmega328p".to_string(),
        }
    }

    /// Argument vector for a transfer of `file` in `direction`.
    pub fn command_args(&self, direction: Direction, file: &Path) -> Vec<String> {
        vec![
            "-p".to_string(),
            self.mcu.clone(),
            "-P".to_string(),
            self.port.clone(),
            "-c".to_string(),
            self.tool.clone(),
            "-b".to_string(),
            self.baud_rate.to_string(),
            "-U".to_string(),
            format!("eeprom:{}:{}:i", direction.op(), file.display()),
        ]
    }

    fn transfer(&self, direction: Direction, file: &Path) -> NvmResult<()> {
        let (begin, complete) = match direction {
            Direction::Read => (Event::DeviceReadBegin, Event::DeviceReadComplete),
            Direction::Write => (Event::DeviceWriteBegin, Event::DeviceWriteComplete),
        };
        let path = file.display().to_string();

        log_event_with_fields(begin, &[("file", &path), ("port", &self.port)]);

        let output = Command::new(&self.programmer)
            .args(self.command_args(direction, file))
            .output()
            .map_err(|e| {
                log_event_with_fields(
                    Event::TransportFailed,
                    &[("error", &e.to_string()), ("programmer", &self.programmer)],
                );
                NvmError::transport_spawn(
                    format!("Failed to start programmer '{}'", self.programmer),
                    e,
                )
            })?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

            log_event_with_fields(
                Event::TransportFailed,
                &[("port", &self.port), ("status", &status)],
            );
            return Err(NvmError::transport_failed(
                format!("EEPROM {} on {} failed", direction, self.port),
                format!("exit status: {}, stderr: {}", status, stderr),
            ));
        }

        log_event_with_fields(complete, &[("file", &path), ("port", &self.port)]);
        Ok(())
    }
}

impl DeviceTransport for Avrdude {
    fn read(&self, file: &Path) -> NvmResult<()> {
        self.transfer(Direction::Read, file)
    }

    fn write(&self, file: &Path) -> NvmResult<()> {
        self.transfer(Direction::Write, file)
    }
}
