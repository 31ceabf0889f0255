//! CLI module for nvmtool
//!
//! Provides command-line interface for:
//! - get / set: inspect and edit the configuration record of an image file
//! - load / save: copy the EEPROM between a device and an image file
//! - log: print the error log from a file or straight from a device

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, LogSource};
pub use commands::{
    config_json, get, load, log_file, log_json, log_port, render_config, render_log, run,
    run_command, save, set,
};
pub use config::ToolConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_lines};
