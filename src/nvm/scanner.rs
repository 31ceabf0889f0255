//! Error log scanner
//!
//! The firmware keeps the log as a ring of fixed-size slots in the window
//! `[0x22, 0x340)`. Scanning walks the slots in address order and yields the
//! populated ones. Address order is not chronological once the ring has
//! wrapped.

use super::error_log::{ErrorLogEntry, SLOT_LEN};
use super::errors::{NvmError, NvmResult};
use crate::format::FORMAT_V1;
use crate::observability::{log_event_with_fields, Event};
use crate::store::ByteStore;

/// Lazy walk over the error log window of a store.
///
/// Each call to [`scan`] starts from the first slot; nothing is cached
/// between scans. A slot that cannot be read in full yields an error and the
/// walk continues with the next slot. The walk ends early once a slot starts
/// past the last populated address of the store.
pub struct ErrorLogScanner<'a, S: ByteStore + ?Sized> {
    store: &'a S,
    slot: usize,
}

/// Starts a scan of the error log window.
pub fn scan<S: ByteStore + ?Sized>(store: &S) -> ErrorLogScanner<'_, S> {
    ErrorLogScanner { store, slot: 0 }
}

impl<S: ByteStore + ?Sized> ErrorLogScanner<'_, S> {
    /// Index of the next slot to be read.
    pub fn next_slot(&self) -> usize {
        self.slot
    }
}

impl<S: ByteStore + ?Sized> Iterator for ErrorLogScanner<'_, S> {
    type Item = NvmResult<ErrorLogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.slot < FORMAT_V1.log_capacity() {
            let address = FORMAT_V1.log_slot_address(self.slot);

            match self.store.end_address() {
                Some(end) if address < end => {}
                _ => {
                    self.slot = FORMAT_V1.log_capacity();
                    return None;
                }
            }

            self.slot += 1;

            let decoded = self
                .store
                .get(address, SLOT_LEN)
                .and_then(|data| ErrorLogEntry::decode(&data));

            match decoded {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        None
    }
}

/// Populated error log entries in address order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    entries: Vec<ErrorLogEntry>,
    skipped_slots: usize,
}

impl ErrorLog {
    /// Scans the store and collects every populated entry.
    ///
    /// Unreadable slots are skipped and counted rather than aborting the scan.
    pub fn read_from<S: ByteStore + ?Sized>(store: &S) -> Self {
        let mut log = Self::default();

        for item in scan(store) {
            match item {
                Ok(entry) => log.entries.push(entry),
                Err(e) => {
                    log.skipped_slots += 1;
                    log_event_with_fields(
                        Event::ErrorLogSlotSkipped,
                        &[("error", &e.to_string())],
                    );
                }
            }
        }

        log_event_with_fields(
            Event::ErrorLogScanned,
            &[
                ("entries", &log.entries.len().to_string()),
                ("skipped_slots", &log.skipped_slots.to_string()),
            ],
        );

        log
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slots that could not be read during the scan.
    pub fn skipped_slots(&self) -> usize {
        self.skipped_slots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorLogEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ErrorLogEntry] {
        &self.entries
    }
}

impl IntoIterator for ErrorLog {
    type Item = ErrorLogEntry;
    type IntoIter = std::vec::IntoIter<ErrorLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a ErrorLogEntry;
    type IntoIter = std::slice::Iter<'a, ErrorLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Where the firmware will write its next log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCursor {
    /// Slot that receives the next entry
    pub slot: usize,
    /// Index the next entry will carry
    pub next_index: u32,
}

/// Locates the ring head the same way the firmware does at power-on.
///
/// The head is the first slot whose index does not exceed its predecessor's.
/// If every slot is increasing the log is full and wraps to slot 0.
pub fn write_cursor<S: ByteStore + ?Sized>(store: &S) -> NvmResult<WriteCursor> {
    let mut prev_index: u32 = 0;

    for (slot, address) in FORMAT_V1.log_slot_addresses().enumerate() {
        let data = store.get(address, 4)?;
        let index = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);

        if index <= prev_index {
            return Ok(WriteCursor {
                slot,
                next_index: prev_index.wrapping_add(1),
            });
        }
        prev_index = index;
    }

    Ok(WriteCursor {
        slot: 0,
        next_index: prev_index.wrapping_add(1),
    })
}

/// Encodes `entry` into the given slot of the log window.
pub fn write_entry<S: ByteStore + ?Sized>(
    store: &mut S,
    slot: usize,
    entry: &ErrorLogEntry,
) -> NvmResult<()> {
    if slot >= FORMAT_V1.log_capacity() {
        return Err(NvmError::validation(
            "slot",
            slot,
            "Slot outside the error log window",
        ));
    }
    store.put(FORMAT_V1.log_slot_address(slot), &entry.encode());
    Ok(())
}
