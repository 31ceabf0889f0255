//! Image file I/O
//!
//! Images are stored as Intel-HEX text. Saving defaults to an atomic replace:
//!
//! 1. Write the new image to `<file>.tmp` next to the target
//! 2. fsync the temp file
//! 3. Rename it over the target
//! 4. fsync the parent directory
//!
//! An interrupted save therefore leaves either the old or the new image, never
//! a truncated one.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::hex;
use super::MemoryImage;
use crate::nvm::{NvmError, NvmResult};
use crate::observability::{log_event_with_fields, Event};

/// How [`save_image`] replaces an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Temp file, fsync, rename
    #[default]
    Atomic,
    /// Truncate and rewrite the target directly
    InPlace,
}

/// Reads and parses an Intel-HEX image file.
pub fn load_image(path: &Path) -> NvmResult<MemoryImage> {
    let text = fs::read_to_string(path).map_err(|e| {
        NvmError::io_error(format!("Failed to read image file: {}", path.display()), e)
    })?;

    let image = hex::parse(&text)?;

    log_event_with_fields(
        Event::ImageLoaded,
        &[
            ("bytes", &image.len().to_string()),
            ("path", &path.display().to_string()),
        ],
    );

    Ok(image)
}

/// Serializes `image` and writes it to `path`.
pub fn save_image(
    path: &Path,
    image: &MemoryImage,
    record_width: usize,
    mode: WriteMode,
) -> NvmResult<()> {
    let text = hex::serialize(image, record_width)?;

    match mode {
        WriteMode::Atomic => write_atomic(path, text.as_bytes())?,
        WriteMode::InPlace => write_synced(path, text.as_bytes())?,
    }

    log_event_with_fields(
        Event::ImageSaved,
        &[
            ("bytes", &image.len().to_string()),
            ("path", &path.display().to_string()),
        ],
    );

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_synced(path: &Path, content: &[u8]) -> NvmResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| {
            NvmError::io_error(format!("Failed to create image file: {}", path.display()), e)
        })?;

    file.write_all(content).map_err(|e| {
        NvmError::io_error(format!("Failed to write image file: {}", path.display()), e)
    })?;

    file.sync_all().map_err(|e| {
        NvmError::io_error(format!("Failed to fsync image file: {}", path.display()), e)
    })
}

fn write_atomic(path: &Path, content: &[u8]) -> NvmResult<()> {
    let temp = temp_path(path);

    if let Err(e) = write_synced(&temp, content) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    fs::rename(&temp, path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        NvmError::io_error(
            format!("Failed to atomically replace image file: {}", path.display()),
            e,
        )
    })?;

    // fsync the directory so the rename is durable
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ByteStore;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.eep");

        let mut image = MemoryImage::from_bytes(0, &[0xAB; 40]);
        image.put(0x200, &[1, 2, 3]);

        save_image(&path, &image, 0x20, WriteMode::Atomic).unwrap();
        assert_eq!(load_image(&path).unwrap(), image);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_in_place_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.eep");
        fs::write(&path, "garbage that is much longer than the new image\n").unwrap();

        let image = MemoryImage::from_bytes(0, &[1, 2, 3, 4]);
        save_image(&path, &image, 0x20, WriteMode::InPlace).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            ":0400000001020304F2\n:00000001FF\n"
        );
    }

    #[test]
    fn test_atomic_save_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("device.eep");

        save_image(&path, &MemoryImage::from_bytes(0, &[1]), 16, WriteMode::Atomic).unwrap();
        save_image(&path, &MemoryImage::from_bytes(0, &[2]), 16, WriteMode::Atomic).unwrap();

        assert_eq!(load_image(&path).unwrap().get(0, 1).unwrap(), vec![2]);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_image(&temp_dir.path().join("absent.eep")).unwrap_err();
        assert_eq!(err.code().code(), "NVM_IO_ERROR");
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.eep");
        fs::write(&path, ":0400000001020304F2\n").unwrap();

        let err = load_image(&path).unwrap_err();
        assert_eq!(err.code().code(), "NVM_HEX_FORMAT");
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/data/device.eep");
        assert_eq!(temp_path(path), PathBuf::from("/data/device.eep.tmp"));
    }
}
