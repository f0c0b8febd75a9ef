use crate::attr::AttributeStore;
use crate::scanner::{CancelToken, Match, ScanRequest};
use crate::{Result, SkipperError};
use std::io::ErrorKind;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Sequential, depth-first walker that collects keyword matches.
///
/// Matching directories are recorded and not descended into. Matching files
/// are recorded and the walk goes on. Every visited entry bumps the progress
/// counter, and the cancel token is checked once per entry.
pub struct LocalScanner<'a> {
    store: &'a dyn AttributeStore,
    cancel: CancelToken,
}

impl<'a> LocalScanner<'a> {
    pub fn new(store: &'a dyn AttributeStore, cancel: CancelToken) -> Self {
        Self { store, cancel }
    }

    pub fn scan<F>(&self, request: &ScanRequest, mut progress: F) -> Result<Vec<Match>>
    where
        F: FnMut(u64),
    {
        info!("Scanning {:?} for {} keyword(s)", request.root, request.keywords.iter().count());

        let mut matches = Vec::new();
        let mut visited: u64 = 0;

        // Symlinks are reported as entries but never followed, the root included.
        let mut walker = WalkDir::new(&request.root)
            .follow_links(false)
            .follow_root_links(false)
            .into_iter();

        while let Some(result) = walker.next() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    if err.io_error().map(|e| e.kind()) == Some(ErrorKind::NotFound) {
                        warn!("Skipping vanished entry: {}", err);
                        continue;
                    }
                    return Err(SkipperError::from(err));
                }
            };

            let matched = entry
                .file_name()
                .to_str()
                .is_some_and(|name| request.keywords.contains(name));

            if matched {
                let is_ignored = self.store.get(entry.path());
                debug!("Match: {:?} (ignored: {})", entry.path(), is_ignored);
                matches.push(Match {
                    path: entry.path().to_string_lossy().into_owned(),
                    is_ignored,
                });

                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
            }

            visited += 1;
            progress(visited);

            if self.cancel.is_cancelled() {
                info!("Scan cancelled after {} entries", visited);
                return Err(SkipperError::Cancelled);
            }
        }

        info!("Scan finished: {} entries visited, {} matches", visited, matches.len());
        Ok(matches)
    }
}
