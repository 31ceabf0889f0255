//! nvmtool - EEPROM configuration and error-log toolkit for sensor nodes
//!
//! - `format`: address map of the EEPROM layout
//! - `nvm`: configuration record and error log codecs
//! - `store`: byte-addressable images and Intel-HEX files
//! - `transport`: device programmer integration
//! - `observability`: structured logging
//! - `cli`: command-line front end

pub mod cli;
pub mod format;
pub mod nvm;
pub mod observability;
pub mod store;
pub mod transport;
