//! CLI argument definitions using clap
//!
//! Commands:
//! - nvmtool get <file> [field...] [--json]
//! - nvmtool set <file> <field> <value>
//! - nvmtool load <port> <file>
//! - nvmtool save <port> <file>
//! - nvmtool log file <name> [--json]
//! - nvmtool log port <name> [--clean] [--json]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// nvmtool - inspect and edit sensor-node EEPROM images
#[derive(Parser, Debug)]
#[command(name = "nvmtool")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to tool configuration file
    #[arg(long, global = true, default_value = "./nvmtool.json")]
    pub config: PathBuf,

    /// Log informational events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print configuration fields from an image file
    Get {
        /// Intel-HEX image file
        file: PathBuf,

        /// Fields to print (all when omitted)
        fields: Vec<String>,

        /// Emit a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Change one configuration field in an image file
    Set {
        /// Intel-HEX image file
        file: PathBuf,

        /// Field name
        field: String,

        /// New value
        value: String,
    },

    /// Read the device EEPROM into a file
    Load {
        /// Programmer serial port
        port: String,

        /// Destination image file
        file: PathBuf,
    },

    /// Write a file to the device EEPROM
    Save {
        /// Programmer serial port
        port: String,

        /// Source image file
        file: PathBuf,
    },

    /// Print the error log
    Log {
        #[command(subcommand)]
        source: LogSource,
    },
}

#[derive(Subcommand, Debug)]
pub enum LogSource {
    /// Read the log from an image file
    File {
        /// Intel-HEX image file
        name: PathBuf,

        /// Emit a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Read the log straight from a device
    Port {
        /// Programmer serial port
        name: String,

        /// Remove the downloaded image afterwards
        #[arg(short, long)]
        clean: bool,

        /// Emit a JSON object
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_with_fields() {
        let cli =
            Cli::try_parse_from(["nvmtool", "get", "dev.eep", "version", "aes_key"]).unwrap();
        match cli.command {
            Command::Get { file, fields, json } => {
                assert_eq!(file, PathBuf::from("dev.eep"));
                assert_eq!(fields, vec!["version", "aes_key"]);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("./nvmtool.json"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nvmtool", "set", "dev.eep", "address", "7", "--config", "tool.json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("tool.json"));
    }

    #[test]
    fn test_log_port_clean() {
        let cli =
            Cli::try_parse_from(["nvmtool", "log", "port", "/dev/ttyUSB0", "-c"]).unwrap();
        match cli.command {
            Command::Log {
                source: LogSource::Port { name, clean, json },
            } => {
                assert_eq!(name, "/dev/ttyUSB0");
                assert!(clean);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_set_requires_value() {
        assert!(Cli::try_parse_from(["nvmtool", "set", "dev.eep", "address"]).is_err());
    }
}
