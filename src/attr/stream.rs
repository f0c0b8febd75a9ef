use crate::attr::{clear_or_already_absent, AttributeStore, Mechanism, ATTRIBUTE_NAME, MARKER_VALUE};
use crate::{Result, SkipperError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Named-stream store. The marker lives in the side stream `<path>:<name>`,
/// which NTFS keeps as an alternate data stream of `path`.
#[derive(Debug, Clone)]
pub struct StreamStore {
    name: String,
}

impl StreamStore {
    pub fn new() -> Self {
        Self::with_name(ATTRIBUTE_NAME)
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// `<path>:<name>`
    pub fn stream_path(&self, path: &Path) -> PathBuf {
        let mut stream = path.as_os_str().to_os_string();
        stream.push(":");
        stream.push(&self.name);
        PathBuf::from(stream)
    }
}

impl Default for StreamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeStore for StreamStore {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Stream
    }

    fn get(&self, path: &Path) -> bool {
        match fs::File::open(self.stream_path(path)) {
            Ok(_) => true,
            Err(e) => {
                debug!("No stream on {:?}: {}", path, e);
                false
            }
        }
    }

    fn set(&self, path: &Path) -> Result<()> {
        // Opening a stream of a missing path would create the path itself.
        path.symlink_metadata()
            .map_err(|e| SkipperError::attribute(path, e))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.stream_path(path))
            .map_err(|e| SkipperError::attribute(path, e))?;
        file.write_all(MARKER_VALUE.as_bytes())
            .map_err(|e| SkipperError::attribute(path, e))?;
        Ok(())
    }

    fn clear(&self, path: &Path) -> Result<()> {
        match fs::remove_file(self.stream_path(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                clear_or_already_absent(self, path, SkipperError::attribute(path, e))
            }
            Err(e) => Err(SkipperError::attribute(path, e)),
        }
    }
}
