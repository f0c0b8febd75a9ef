use crate::attr::{AttributeStore, Mechanism, ATTRIBUTE_NAME, MARKER_VALUE};
use crate::{Result, SkipperError};
use std::path::Path;
use tracing::debug;

/// Direct extended-attribute store (`getxattr` family).
///
/// Linux only allows unprivileged attributes in the `user.` namespace, so the
/// name is prefixed there. This matches what the `attr` tool writes.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    name: String,
}

impl MetadataStore {
    pub fn new() -> Self {
        let name = if cfg!(target_os = "linux") {
            format!("user.{}", ATTRIBUTE_NAME)
        } else {
            ATTRIBUTE_NAME.to_string()
        };
        Self { name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeStore for MetadataStore {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Metadata
    }

    fn get(&self, path: &Path) -> bool {
        match sys::get(path, &self.name) {
            Ok(present) => present,
            Err(e) => {
                debug!("Failed to read {} on {:?}: {}", self.name, path, e);
                false
            }
        }
    }

    fn set(&self, path: &Path) -> Result<()> {
        sys::set(path, &self.name, MARKER_VALUE.as_bytes())
            .map_err(|e| into_store_error(path, e))
    }

    fn clear(&self, path: &Path) -> Result<()> {
        sys::remove(path, &self.name).map_err(|e| into_store_error(path, e))
    }
}

fn into_store_error(path: &Path, err: std::io::Error) -> SkipperError {
    if err.kind() == std::io::ErrorKind::Unsupported && !sys::AVAILABLE {
        return crate::attr::unsupported();
    }
    SkipperError::attribute(path, err)
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
mod sys {
    use std::ffi::CString;
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    pub const AVAILABLE: bool = true;

    #[cfg(target_os = "linux")]
    const NO_ATTRIBUTE: i32 = libc::ENODATA;
    #[cfg(target_os = "macos")]
    const NO_ATTRIBUTE: i32 = libc::ENOATTR;

    fn c_strings(path: &Path, name: &str) -> io::Result<(CString, CString)> {
        let path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let name = CString::new(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok((path, name))
    }

    pub fn get(path: &Path, name: &str) -> io::Result<bool> {
        let (path, name) = c_strings(path, name)?;

        // A zero-sized buffer asks only for the value length.
        #[cfg(target_os = "linux")]
        let ret = unsafe { libc::getxattr(path.as_ptr(), name.as_ptr(), std::ptr::null_mut(), 0) };
        #[cfg(target_os = "macos")]
        let ret = unsafe { libc::getxattr(path.as_ptr(), name.as_ptr(), std::ptr::null_mut(), 0, 0, 0) };

        if ret >= 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(NO_ATTRIBUTE) {
            Ok(false)
        } else {
            Err(err)
        }
    }

    pub fn set(path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        let (path, name) = c_strings(path, name)?;
        let value_ptr = value.as_ptr() as *const libc::c_void;

        #[cfg(target_os = "linux")]
        let ret = unsafe { libc::setxattr(path.as_ptr(), name.as_ptr(), value_ptr, value.len(), 0) };
        #[cfg(target_os = "macos")]
        let ret = unsafe { libc::setxattr(path.as_ptr(), name.as_ptr(), value_ptr, value.len(), 0, 0) };

        if ret == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    pub fn remove(path: &Path, name: &str) -> io::Result<()> {
        let (path, name) = c_strings(path, name)?;

        #[cfg(target_os = "linux")]
        let ret = unsafe { libc::removexattr(path.as_ptr(), name.as_ptr()) };
        #[cfg(target_os = "macos")]
        let ret = unsafe { libc::removexattr(path.as_ptr(), name.as_ptr(), 0) };

        if ret == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(NO_ATTRIBUTE) {
            Ok(())
        } else {
            Err(err)
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod sys {
    use std::io;
    use std::path::Path;

    pub const AVAILABLE: bool = false;

    fn unsupported() -> io::Error {
        io::Error::new(io::ErrorKind::Unsupported, "extended attributes are not available")
    }

    pub fn get(_path: &Path, _name: &str) -> io::Result<bool> {
        Err(unsupported())
    }

    pub fn set(_path: &Path, _name: &str, _value: &[u8]) -> io::Result<()> {
        Err(unsupported())
    }

    pub fn remove(_path: &Path, _name: &str) -> io::Result<()> {
        Err(unsupported())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_name_namespace() {
        let store = MetadataStore::new();
        if cfg!(target_os = "linux") {
            assert_eq!(store.name(), "user.com.dropbox.ignored");
        } else {
            assert_eq!(store.name(), "com.dropbox.ignored");
        }
    }

    #[test]
    fn test_set_get_clear() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "data").unwrap();
        let store = MetadataStore::new();

        if store.set(&file).is_err() {
            // Filesystem without user xattr support.
            return;
        }
        store.set(&file).unwrap();
        assert!(store.get(&file));

        store.clear(&file).unwrap();
        store.clear(&file).unwrap();
        assert!(!store.get(&file));
    }

    #[test]
    fn test_missing_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let store = MetadataStore::new();

        assert!(!store.get(&missing));
        assert!(store.set(&missing).is_err());
        assert!(store.clear(&missing).is_err());
    }
}
