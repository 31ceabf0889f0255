//! CLI command implementations
//!
//! Every command works on an Intel-HEX image file. Device commands move the
//! whole EEPROM between the programmer and a file; `get`, `set` and `log`
//! decode the file through the codecs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::nvm::{ConfigField, ConfigurationRecord, ErrorLog};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::store::{load_image, save_image, MemoryImage};
use crate::transport::DeviceTransport;

use super::args::{Cli, Command, LogSource};
use super::config::ToolConfig;
use super::errors::{CliError, CliResult};
use super::io::{write_json, write_lines};

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let config = ToolConfig::load(&cli.config)?;
    let severity = if cli.verbose {
        Severity::Info.min(config.severity()?)
    } else {
        config.severity()?
    };
    Logger::set_min_severity(severity);

    log_event_with_fields(
        Event::ToolConfigLoaded,
        &[("path", &cli.config.display().to_string())],
    );

    run_command(cli.command, &config)
}

/// Run a CLI command
pub fn run_command(command: Command, config: &ToolConfig) -> CliResult<()> {
    match command {
        Command::Get { file, fields, json } => get(&file, &fields, json),
        Command::Set { file, field, value } => set(&file, &field, &value, config),
        Command::Load { port, file } => load(&config.transport(&port), &file),
        Command::Save { port, file } => save(&config.transport(&port), &file),
        Command::Log { source } => match source {
            LogSource::File { name, json } => log_file(&name, json),
            LogSource::Port { name, clean, json } => {
                log_port(&config.transport(&name), clean, json)
            }
        },
    }
}

/// Print configuration fields from an image file
pub fn get(file: &Path, fields: &[String], json: bool) -> CliResult<()> {
    let image = load_image(file)?;
    let record = read_config(&image, file)?;
    let fields = parse_fields(fields)?;

    if json {
        write_json(&config_json(&record, &fields))
    } else {
        write_lines(render_config(&record, &fields))
    }
}

/// Change one configuration field in an image file
///
/// Bytes outside the configuration record, the error log included, are
/// written back unchanged.
pub fn set(file: &Path, field: &str, value: &str, config: &ToolConfig) -> CliResult<()> {
    let mut image = load_image(file)?;
    let mut record = read_config(&image, file)?;
    let field: ConfigField = field.parse()?;

    if let Err(e) = record.set_field_str(field, value) {
        log_event_with_fields(
            Event::ConfigFieldRejected,
            &[("error", &e.to_string()), ("field", field.as_str())],
        );
        return Err(e.into());
    }
    log_event_with_fields(
        Event::ConfigFieldUpdated,
        &[("field", field.as_str()), ("value", &record.field_value(field))],
    );

    record.write_to(&mut image);
    save_image(file, &image, config.hex_record_width, config.write_mode())?;

    log_event_with_fields(
        Event::ConfigSaved,
        &[
            ("checksum", &format!("0x{:04x}", record.checksum_of())),
            ("path", &file.display().to_string()),
        ],
    );

    Ok(())
}

/// Read the device EEPROM into a file
pub fn load<T: DeviceTransport + ?Sized>(transport: &T, file: &Path) -> CliResult<()> {
    transport.read(file)?;
    Ok(())
}

/// Write a file to the device EEPROM
///
/// The file's configuration record must verify before anything is sent.
pub fn save<T: DeviceTransport + ?Sized>(transport: &T, file: &Path) -> CliResult<()> {
    let image = load_image(file)?;
    read_config(&image, file)?;
    transport.write(file)?;
    Ok(())
}

/// Print the error log stored in an image file
pub fn log_file(file: &Path, json: bool) -> CliResult<()> {
    let image = load_image(file)?;
    let log = ErrorLog::read_from(&image);

    if json {
        write_json(&log_json(&log))
    } else {
        write_lines(render_log(&log))
    }
}

/// Read a device into a temporary image and print its error log
///
/// With `clean` the image is removed afterwards; otherwise its path is
/// reported so it can be inspected again with `log file`.
pub fn log_port<T: DeviceTransport + ?Sized>(
    transport: &T,
    clean: bool,
    json: bool,
) -> CliResult<()> {
    let file = temp_image_path();
    let result = transport
        .read(&file)
        .map_err(CliError::from)
        .and_then(|()| log_file(&file, json));

    if clean {
        // The programmer may leave a partial image behind even when it fails
        let removed = remove_temp_image(&file);
        return result.and(removed);
    }

    if result.is_ok() && !json {
        write_lines([kept_image_message(&file)])?;
    }

    result
}

fn kept_image_message(file: &Path) -> String {
    format!("EEPROM stored in ´{}´.", file.display())
}

fn remove_temp_image(file: &Path) -> CliResult<()> {
    match fs::remove_file(file) {
        Ok(()) => {
            log_event_with_fields(
                Event::TempImageRemoved,
                &[("path", &file.display().to_string())],
            );
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CliError::io_error(format!(
            "Failed to remove {}: {}",
            file.display(),
            e
        ))),
    }
}

/// Fresh `<uuid>.eep` name in the working directory
fn temp_image_path() -> PathBuf {
    PathBuf::from(format!("{}.eep", Uuid::new_v4()))
}

fn read_config(image: &MemoryImage, file: &Path) -> CliResult<ConfigurationRecord> {
    match ConfigurationRecord::read_from(image) {
        Ok(record) => {
            log_event_with_fields(
                Event::ConfigLoaded,
                &[("path", &file.display().to_string())],
            );
            Ok(record)
        }
        Err(e) => {
            if e.is_integrity() {
                log_event_with_fields(
                    Event::ConfigIntegrityFailed,
                    &[
                        ("details", e.details().unwrap_or_default()),
                        ("path", &file.display().to_string()),
                    ],
                );
            }
            Err(e.into())
        }
    }
}

/// Resolves field names; an empty list selects every field
fn parse_fields(names: &[String]) -> CliResult<Vec<ConfigField>> {
    if names.is_empty() {
        return Ok(ConfigField::ALL.to_vec());
    }
    names
        .iter()
        .map(|name| name.parse::<ConfigField>().map_err(CliError::from))
        .collect()
}

/// `field=value` lines
pub fn render_config(record: &ConfigurationRecord, fields: &[ConfigField]) -> Vec<String> {
    fields
        .iter()
        .map(|field| format!("{}={}", field, record.field_value(*field)))
        .collect()
}

/// Fields as a JSON object; integers stay numeric
pub fn config_json(record: &ConfigurationRecord, fields: &[ConfigField]) -> Value {
    let mut map = Map::new();
    for field in fields {
        let value = match field {
            ConfigField::Version => json!(record.version()),
            ConfigField::ReportInterval => json!(record.report_interval()),
            ConfigField::MasterAddress => json!(record.master_address()),
            ConfigField::Address => json!(record.address()),
            ConfigField::BroadcastAddress => json!(record.broadcast_address()),
            ConfigField::NetworkId | ConfigField::AesKey => json!(record.field_value(*field)),
        };
        map.insert(field.as_str().to_string(), value);
    }
    Value::Object(map)
}

/// `Total errors: N` followed by one line per entry
pub fn render_log(log: &ErrorLog) -> Vec<String> {
    let mut lines = Vec::with_capacity(log.len() + 1);
    lines.push(format!("Total errors: {}", log.len()));
    for entry in log {
        lines.push(format!(
            "[{}] {} {}:{}",
            entry.index,
            entry.time(),
            entry.description(),
            entry.information
        ));
    }
    lines
}

pub fn log_json(log: &ErrorLog) -> Value {
    let entries: Vec<Value> = log
        .iter()
        .map(|entry| {
            json!({
                "index": entry.index,
                "timestamp": entry.timestamp,
                "time": entry.time(),
                "code": entry.code,
                "description": entry.description(),
                "information": entry.information,
            })
        })
        .collect();

    json!({
        "total": log.len(),
        "skipped_slots": log.skipped_slots(),
        "entries": entries,
    })
}
