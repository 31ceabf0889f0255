//! Intel-HEX container
//!
//! Record framing, checksums and type validation come from the `ihex` crate.
//! This module maps records onto a [`MemoryImage`] and back:
//!
//! - 00 data records are placed at `base + offset`
//! - 02 extended segment and 04 extended linear records move the base
//! - 03 and 05 start address records are accepted and ignored
//! - exactly one 01 end-of-file record must close the file

use ihex::Record;
use thiserror::Error;

use super::{ByteStore, MemoryImage};
use crate::nvm::NvmError;

/// Default number of data bytes per record.
pub const DEFAULT_RECORD_WIDTH: usize = 0x20;

/// Intel-HEX errors
#[derive(Debug, Error)]
pub enum HexError {
    #[error("line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: ihex::ReaderError,
    },

    #[error("line {line}: data after end-of-file record")]
    DataAfterEof { line: usize },

    #[error("missing end-of-file record")]
    MissingEof,

    #[error("failed to encode record: {0}")]
    Write(#[from] ihex::WriterError),
}

impl From<HexError> for NvmError {
    fn from(e: HexError) -> Self {
        NvmError::hex_format(e)
    }
}

/// Parses Intel-HEX text into a sparse image.
pub fn parse(text: &str) -> Result<MemoryImage, HexError> {
    let mut image = MemoryImage::new();
    let mut base: u32 = 0;
    let mut seen_eof = false;

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let record = raw.trim();

        if record.is_empty() {
            continue;
        }
        if seen_eof {
            return Err(HexError::DataAfterEof { line });
        }

        let record = Record::from_record_string(record)
            .map_err(|source| HexError::Record { line, source })?;

        match record {
            Record::Data { offset, value } => {
                image.put(base.wrapping_add(offset as u32), &value)
            }
            Record::EndOfFile => seen_eof = true,
            Record::ExtendedSegmentAddress(segment) => base = (segment as u32) << 4,
            Record::ExtendedLinearAddress(upper) => base = (upper as u32) << 16,
            Record::StartSegmentAddress { .. } | Record::StartLinearAddress(_) => {}
        }
    }

    if !seen_eof {
        return Err(HexError::MissingEof);
    }

    Ok(image)
}

/// Serializes an image as Intel-HEX text.
///
/// Each contiguous run is split into data records of at most `width` bytes
/// (clamped to 1..=255). Records never cross a 64 KiB boundary; an extended
/// linear address record precedes data whenever the upper address half
/// changes.
pub fn serialize(image: &MemoryImage, width: usize) -> Result<String, HexError> {
    let width = width.clamp(1, 255);
    let mut records = Vec::new();
    let mut upper: u16 = 0;

    for (start, data) in image.segments() {
        let mut address = start;
        let mut remaining = data.as_slice();

        while !remaining.is_empty() {
            let high = (address >> 16) as u16;
            if high != upper {
                records.push(Record::ExtendedLinearAddress(high));
                upper = high;
            }

            let low = address & 0xFFFF;
            let room = (0x1_0000 - low) as usize;
            let n = remaining.len().min(width).min(room);

            records.push(Record::Data {
                offset: low as u16,
                value: remaining[..n].to_vec(),
            });
            remaining = &remaining[n..];
            address = address.wrapping_add(n as u32);
        }
    }

    records.push(Record::EndOfFile);

    let mut out = String::new();
    for record in &records {
        out.push_str(&record.to_record_string()?.to_uppercase());
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_and_eof() {
        let text = ":0400000001020304F2\n:00000001FF\n";
        let image = parse(text).unwrap();
        assert_eq!(image.get(0, 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(image.len(), 4);
    }

    #[test]
    fn test_parse_accepts_lowercase_and_blank_lines() {
        let text = "\n:02001000abcd76\r\n\n:00000001ff\n";
        let image = parse(text).unwrap();
        assert_eq!(image.get(0x10, 2).unwrap(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_serialize_eof_only() {
        assert_eq!(
            serialize(&MemoryImage::new(), DEFAULT_RECORD_WIDTH).unwrap(),
            ":00000001FF\n"
        );
    }

    #[test]
    fn test_serialize_known_record() {
        let image = MemoryImage::from_bytes(0, &[1, 2, 3, 4]);
        assert_eq!(
            serialize(&image, DEFAULT_RECORD_WIDTH).unwrap(),
            ":0400000001020304F2\n:00000001FF\n"
        );
    }

    #[test]
    fn test_serialize_uppercase_digits() {
        let image = MemoryImage::from_bytes(0x10, &[0xAB, 0xCD]);
        assert_eq!(
            serialize(&image, DEFAULT_RECORD_WIDTH).unwrap(),
            ":02001000ABCD76\n:00000001FF\n"
        );
    }

    #[test]
    fn test_serialize_splits_by_width() {
        let image = MemoryImage::from_bytes(0, &[0xFF; 0x50]);
        let text = serialize(&image, 0x20).unwrap();
        let lengths: Vec<&str> = text.lines().map(|l| &l[1..3]).collect();
        assert_eq!(lengths, vec!["20", "20", "10", "00"]);
        assert_eq!(parse(&text).unwrap(), image);
    }

    #[test]
    fn test_sparse_image_roundtrip() {
        let mut image = MemoryImage::from_bytes(0, &[1, 2, 3]);
        image.put(0x100, &[4, 5]);
        image.put(0x2_0010, &[6]);

        let text = serialize(&image, 16).unwrap();
        assert!(text.contains(":020000040002F8"));
        assert_eq!(parse(&text).unwrap(), image);
    }

    #[test]
    fn test_record_does_not_cross_64k_boundary() {
        let image = MemoryImage::from_bytes(0xFFFE, &[1, 2, 3, 4]);
        let text = serialize(&image, 32).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ":02FFFE000102FE");
        assert_eq!(lines[1], ":020000040001F9");
        assert_eq!(parse(&text).unwrap(), image);
    }

    #[test]
    fn test_extended_segment_address() {
        // Segment 0x1000 -> base 0x10000
        let text = ":020000021000EC\n:0100000042BD\n:00000001FF\n";
        let image = parse(text).unwrap();
        assert_eq!(image.get(0x10000, 1).unwrap(), vec![0x42]);
    }

    #[test]
    fn test_bad_checksum() {
        let err = parse(":0400000001020304F3\n:00000001FF\n").unwrap_err();
        assert!(matches!(err, HexError::Record { line: 1, .. }));
    }

    #[test]
    fn test_missing_start_code() {
        let err = parse("0400000001020304F2\n").unwrap_err();
        assert!(matches!(err, HexError::Record { line: 1, .. }));
    }

    #[test]
    fn test_invalid_hex_digits() {
        let err = parse(":04000000010203ZZF2\n").unwrap_err();
        assert!(matches!(err, HexError::Record { line: 1, .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let err = parse(":0500000001020304F1\n:00000001FF\n").unwrap_err();
        assert!(matches!(err, HexError::Record { line: 1, .. }));
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse(":0400000001020304F2\n\n:0400000001020304F3\n").unwrap_err();
        assert!(err.to_string().starts_with("line 3:"));
    }

    #[test]
    fn test_missing_eof() {
        let err = parse(":0400000001020304F2\n").unwrap_err();
        assert!(matches!(err, HexError::MissingEof));
    }

    #[test]
    fn test_data_after_eof() {
        let err = parse(":00000001FF\n:0400000001020304F2\n").unwrap_err();
        assert!(matches!(err, HexError::DataAfterEof { line: 2 }));
    }

    #[test]
    fn test_unsupported_record_type() {
        let err = parse(":00000006FA\n").unwrap_err();
        assert!(matches!(err, HexError::Record { line: 1, .. }));
    }

    #[test]
    fn test_converts_to_nvm_error() {
        let err: NvmError = HexError::MissingEof.into();
        assert_eq!(err.code().code(), "NVM_HEX_FORMAT");
        assert!(err.to_string().contains("missing end-of-file record"));
    }
}
