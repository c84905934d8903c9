//! rstest fixtures

use crate::factories::sample_session;
use rstest::fixture;
use std::io::Write;
use tempfile::NamedTempFile;

/// Bytes of the four-symbol sample session
#[fixture]
pub fn sample_feed() -> Vec<u8> {
    sample_session()
}

/// The sample session written to a temporary file
///
/// The file is removed when the handle drops.
#[fixture]
pub fn sample_feed_file() -> NamedTempFile {
    write_feed(&sample_session()).unwrap_or_else(|e| panic!("failed to write sample feed: {e}"))
}

/// Write raw feed bytes to a temporary file
pub fn write_feed(bytes: &[u8]) -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}
