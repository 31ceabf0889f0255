//! Byte-addressable store for EEPROM images
//!
//! The codecs read and write through [`ByteStore`] and know nothing about how
//! the image is encoded on disk. [`MemoryImage`] is the in-memory store;
//! [`hex`] converts it to and from Intel-HEX text and [`file`] moves it on and
//! off disk.

pub mod file;
pub mod hex;
mod image;

pub use file::{load_image, save_image, WriteMode};
pub use hex::HexError;
pub use image::MemoryImage;

use crate::nvm::NvmResult;

/// Flat address space supporting reads and writes by address and length.
pub trait ByteStore {
    /// Reads exactly `length` bytes starting at `address`.
    ///
    /// Fails with a short read if any address in the range is not populated.
    fn get(&self, address: u32, length: usize) -> NvmResult<Vec<u8>>;

    /// Writes `data` starting at `address`.
    fn put(&mut self, address: u32, data: &[u8]);

    /// One past the highest populated address, or `None` for an empty store.
    fn end_address(&self) -> Option<u32>;
}
