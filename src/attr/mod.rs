//! Extended-attribute store for the Dropbox "ignored" marker.
//!
//! Three platform mechanisms sit behind [`AttributeStore`]:
//!
//! - [`StreamStore`]: a named side stream `<path>:<name>` (NTFS alternate data streams)
//! - [`MetadataStore`]: direct `getxattr`/`setxattr`/`removexattr` calls
//! - [`CommandStore`]: the `attr` / `xattr` helper programs, judged by exit status
//!
//! The mechanism is picked once with [`Mechanism::platform_default`] (or a CLI
//! override) and handed out as a boxed trait object.

use crate::Result;
use std::fmt;
use std::path::Path;

pub mod batch;
pub mod command;
pub mod metadata;
pub mod stream;

pub use batch::{clear_many, set_many, BatchReport, Outcome};
pub use command::{CommandStore, HelperSyntax};
pub use metadata::MetadataStore;
pub use stream::StreamStore;

/// Attribute Dropbox checks to skip a file or folder.
pub const ATTRIBUTE_NAME: &str = "com.dropbox.ignored";

/// Value written when marking. Dropbox only looks at presence.
pub const MARKER_VALUE: &str = "1";

/// Which attribute mechanism backs a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    Stream,
    Metadata,
    Command,
    Unsupported,
}

impl Mechanism {
    /// Mechanism native to the platform this binary was built for.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Mechanism::Stream
        } else if cfg!(any(target_os = "linux", target_os = "macos")) {
            Mechanism::Metadata
        } else {
            Mechanism::Unsupported
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mechanism::Stream => "stream",
            Mechanism::Metadata => "metadata",
            Mechanism::Command => "command",
            Mechanism::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Read, set and clear the ignored marker on a single path.
pub trait AttributeStore: Send + Sync {
    fn mechanism(&self) -> Mechanism;

    /// Whether the marker is present. Unreadable counts as absent.
    fn get(&self, path: &Path) -> bool;

    /// Create or overwrite the marker with [`MARKER_VALUE`].
    fn set(&self, path: &Path) -> Result<()>;

    /// Remove the marker. Clearing an already-clear path succeeds.
    fn clear(&self, path: &Path) -> Result<()>;
}

/// Store for platforms without any attribute mechanism.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedStore;

impl AttributeStore for UnsupportedStore {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Unsupported
    }

    fn get(&self, _path: &Path) -> bool {
        false
    }

    fn set(&self, _path: &Path) -> Result<()> {
        Err(unsupported())
    }

    fn clear(&self, _path: &Path) -> Result<()> {
        Err(unsupported())
    }
}

pub(crate) fn unsupported() -> crate::SkipperError {
    crate::SkipperError::UnsupportedPlatform(std::env::consts::OS.to_string())
}

/// Build the store for `mechanism`. `helper` overrides the program used by
/// the command mechanism and is ignored otherwise.
pub fn open_store(mechanism: Mechanism, helper: Option<&Path>) -> Box<dyn AttributeStore> {
    match mechanism {
        Mechanism::Stream => Box::new(StreamStore::new()),
        Mechanism::Metadata => Box::new(MetadataStore::new()),
        Mechanism::Command => {
            let store = CommandStore::platform_default();
            match helper {
                Some(program) => Box::new(store.with_program(program)),
                None => Box::new(store),
            }
        }
        Mechanism::Unsupported => Box::new(UnsupportedStore),
    }
}

/// Treats a failed clear as success when the path exists and no longer
/// carries the marker. Mechanisms that cannot tell "absent" apart from a
/// real failure go through this.
pub(crate) fn clear_or_already_absent(
    store: &dyn AttributeStore,
    path: &Path,
    err: crate::SkipperError,
) -> Result<()> {
    if path.symlink_metadata().is_ok() && !store.get(path) {
        tracing::debug!("Marker already absent on {:?}", path);
        return Ok(());
    }
    Err(err)
}
