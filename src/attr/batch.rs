use crate::attr::AttributeStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of marking or unmarking one path in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub path: PathBuf,
    pub success: bool,
    pub message: String,
}

/// Mark every path, in order. A failing path never stops the batch.
pub fn set_many<P: AsRef<Path>>(store: &dyn AttributeStore, paths: &[P]) -> Vec<Outcome> {
    paths
        .iter()
        .map(|p| {
            let path = p.as_ref();
            match store.set(path) {
                Ok(()) => {
                    info!("Ignored: {}", path.display());
                    Outcome {
                        path: path.to_path_buf(),
                        success: true,
                        message: format!("Ignored: {}", path.display()),
                    }
                }
                Err(e) => {
                    warn!("Failed to ignore {}: {}", path.display(), e);
                    Outcome {
                        path: path.to_path_buf(),
                        success: false,
                        message: format!("Error ignoring {}: {}", path.display(), e),
                    }
                }
            }
        })
        .collect()
}

/// Unmark every path, in order. A failing path never stops the batch.
pub fn clear_many<P: AsRef<Path>>(store: &dyn AttributeStore, paths: &[P]) -> Vec<Outcome> {
    paths
        .iter()
        .map(|p| {
            let path = p.as_ref();
            match store.clear(path) {
                Ok(()) => {
                    info!("Unignored: {}", path.display());
                    Outcome {
                        path: path.to_path_buf(),
                        success: true,
                        message: format!("Unignored: {}", path.display()),
                    }
                }
                Err(e) => {
                    warn!("Failed to unignore {}: {}", path.display(), e);
                    Outcome {
                        path: path.to_path_buf(),
                        success: false,
                        message: format!("Error unignoring {}: {}", path.display(), e),
                    }
                }
            }
        })
        .collect()
}

/// Totals over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{Mechanism, StreamStore};
    use crate::{Result, SkipperError};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Fails on any path whose name contains "bad", records call order.
    struct FlakyStore {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl AttributeStore for FlakyStore {
        fn mechanism(&self) -> Mechanism {
            Mechanism::Unsupported
        }

        fn get(&self, _path: &Path) -> bool {
            false
        }

        fn set(&self, path: &Path) -> Result<()> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            if path.to_string_lossy().contains("bad") {
                Err(SkipperError::attribute(path, std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")))
            } else {
                Ok(())
            }
        }

        fn clear(&self, path: &Path) -> Result<()> {
            self.set(path)
        }
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let store = FlakyStore { calls: Mutex::new(Vec::new()) };
        let paths = ["a", "bad", "c"];

        let outcomes = set_many(&store, &paths);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(outcomes[2].success);
        assert_eq!(outcomes[1].message, "Error ignoring bad: denied");
        assert_eq!(store.calls.lock().unwrap().len(), 3);

        let outcomes = clear_many(&store, &paths);
        assert_eq!(outcomes[0].message, "Unignored: a");
        assert_eq!(outcomes[1].message, "Error unignoring bad: denied");

        let report = BatchReport::from_outcomes(&outcomes);
        assert_eq!(report, BatchReport { succeeded: 2, failed: 1 });
        assert!(!report.all_succeeded());
    }

    #[test]
    fn test_writable_then_missing() {
        let dir = tempdir().unwrap();
        let p1 = dir.path().join("p1");
        let p2 = dir.path().join("p2");
        fs::write(&p1, "").unwrap();
        let store = StreamStore::new();

        let outcomes = set_many(&store, &[&p1, &p2]);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].path, p1);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].message, format!("Ignored: {}", p1.display()));
        assert_eq!(outcomes[1].path, p2);
        assert!(!outcomes[1].success);
        assert!(store.get(&p1));
    }

    #[test]
    fn test_empty_batch() {
        let store = StreamStore::new();
        let paths: Vec<PathBuf> = Vec::new();
        assert!(set_many(&store, &paths).is_empty());
        assert!(BatchReport::from_outcomes(&[]).all_succeeded());
    }
}
