//! Observability for nvmtool
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed events with a fixed severity
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on decoding or encoding
//! 3. No background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use nvmtool::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! log_event_with_fields(Event::ImageLoaded, &[("path", "device.eep")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
