//! Read-only memory-mapped feed files

use crate::error::FeedResult;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// An ITCH capture mapped into memory
///
/// Full-day captures run to several gigabytes, so the file is mapped rather
/// than read. Pages are faulted in as the reader walks forward.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    map: Mmap,
}

impl MappedFile {
    /// Map `path` read-only
    ///
    /// # Errors
    /// I/O errors from opening or mapping the file.
    #[allow(unsafe_code)]
    pub fn open(path: impl AsRef<Path>) -> FeedResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and the capture is not modified
        // while the replay runs.
        let map = unsafe { Mmap::map(&file)? };
        info!("Mapped {} ({} bytes)", path.display(), map.len());
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// Mapped bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.map
    }

    /// File size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True for an empty file
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Path the file was opened from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use std::io::Write;

    #[test]
    fn test_maps_file_contents() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"\x00\x0cS")?;
        file.flush()?;

        let mapped = MappedFile::open(file.path())?;
        assert_eq!(mapped.bytes(), b"\x00\x0cS");
        assert_eq!(mapped.len(), 3);
        assert_eq!(mapped.path(), file.path());
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MappedFile::open("/nonexistent/itch.bin"),
            Err(FeedError::Io(_))
        ));
    }
}
