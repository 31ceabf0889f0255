//! Sparse in-memory EEPROM image

use std::collections::BTreeMap;

use super::ByteStore;
use crate::nvm::{NvmError, NvmResult};

/// Byte-addressable image backed by a sparse address map.
///
/// Addresses that were never written are absent, mirroring an Intel-HEX file
/// that only covers part of the device memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: BTreeMap<u32, u8>,
}

impl MemoryImage {
    /// Creates an empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a contiguous image starting at `base`.
    pub fn from_bytes(base: u32, data: &[u8]) -> Self {
        let mut image = Self::new();
        image.put(base, data);
        image
    }

    /// Number of populated addresses.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether no address is populated.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Groups populated addresses into contiguous runs.
    pub fn segments(&self) -> Vec<(u32, Vec<u8>)> {
        let mut segments: Vec<(u32, Vec<u8>)> = Vec::new();

        for (&address, &byte) in &self.bytes {
            match segments.last_mut() {
                Some((start, data)) if *start as u64 + data.len() as u64 == address as u64 => {
                    data.push(byte);
                }
                _ => segments.push((address, vec![byte])),
            }
        }

        segments
    }
}

impl ByteStore for MemoryImage {
    fn get(&self, address: u32, length: usize) -> NvmResult<Vec<u8>> {
        let mut out = Vec::with_capacity(length);

        for offset in 0..length {
            let byte = address
                .checked_add(offset as u32)
                .and_then(|a| self.bytes.get(&a));
            match byte {
                Some(b) => out.push(*b),
                None => return Err(NvmError::short_read(address, length, out.len())),
            }
        }

        Ok(out)
    }

    fn put(&mut self, address: u32, data: &[u8]) {
        for (offset, byte) in data.iter().enumerate() {
            self.bytes.insert(address.wrapping_add(offset as u32), *byte);
        }
    }

    fn end_address(&self) -> Option<u32> {
        self.bytes.keys().next_back().map(|a| a.saturating_add(1))
    }
}
