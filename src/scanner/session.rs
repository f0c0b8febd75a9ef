//! One-at-a-time scan sessions.
//!
//! [`ScanCoordinator`] owns the only slot for the running scan. Starting a
//! scan swaps a fresh session into the slot under the lock and cancels
//! whatever was there, so at most one walk is ever live. A finished scan
//! empties the slot only if the slot still holds its own session.

use crate::attr::AttributeStore;
use crate::scanner::{LocalScanner, Match, ScanRequest};
use crate::{Result, SkipperError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Cooperative cancellation flag shared between a scan and its canceller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bookkeeping for one in-flight scan.
#[derive(Debug, Clone)]
pub struct ScanSession {
    id: u64,
    token: CancelToken,
}

impl ScanSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running { session: u64 },
}

/// Runs scans on a background thread, one at a time.
#[derive(Clone)]
pub struct ScanCoordinator {
    store: Arc<dyn AttributeStore>,
    slot: Arc<Mutex<Option<ScanSession>>>,
    next_id: Arc<AtomicU64>,
}

impl ScanCoordinator {
    pub fn new(store: Arc<dyn AttributeStore>) -> Self {
        Self {
            store,
            slot: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<ScanSession>> {
        // The slot holds plain data, so a poisoned lock is still usable.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install a new session, cancelling the previous one if still running.
    pub fn begin(&self) -> ScanSession {
        let session = ScanSession {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            token: CancelToken::new(),
        };
        let previous = self.lock_slot().replace(session.clone());
        if let Some(previous) = previous {
            info!("Cancelling scan {} in favour of scan {}", previous.id, session.id);
            previous.token.cancel();
        }
        session
    }

    /// Clear the slot if it still belongs to `session`.
    fn finish(slot: &Mutex<Option<ScanSession>>, session: &ScanSession) {
        let mut slot = slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().map(|s| s.id) == Some(session.id) {
            *slot = None;
        }
        debug!("Scan {} finished", session.id);
    }

    /// Cancel the running scan. Returns false when there was nothing to cancel.
    pub fn cancel(&self) -> bool {
        match self.lock_slot().take() {
            Some(session) => {
                info!("Cancelling scan {}", session.id);
                session.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> ScanState {
        match self.lock_slot().as_ref() {
            Some(session) => ScanState::Running { session: session.id },
            None => ScanState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() != ScanState::Idle
    }

    /// Start `request` on its own thread. `progress` receives the visited
    /// entry count after every entry.
    pub fn spawn<F>(&self, request: ScanRequest, progress: F) -> Result<ScanHandle>
    where
        F: FnMut(u64) + Send + 'static,
    {
        let session = self.begin();
        let store = Arc::clone(&self.store);
        let slot = Arc::clone(&self.slot);
        let worker_session = session.clone();

        let spawned = thread::Builder::new()
            .name(format!("scan-{}", session.id))
            .spawn(move || {
                let scanner = LocalScanner::new(store.as_ref(), worker_session.token.clone());
                let result = scanner.scan(&request, progress);
                Self::finish(&slot, &worker_session);
                result
            });

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                Self::finish(&self.slot, &session);
                return Err(SkipperError::Io(e));
            }
        };

        Ok(ScanHandle { session, thread })
    }

    /// Run `request` to completion on the calling thread while still
    /// registering it as the active session.
    pub fn run<F>(&self, request: &ScanRequest, progress: F) -> Result<Vec<Match>>
    where
        F: FnMut(u64),
    {
        let session = self.begin();
        let scanner = LocalScanner::new(self.store.as_ref(), session.token.clone());
        let result = scanner.scan(request, progress);
        Self::finish(&self.slot, &session);
        result
    }
}

/// Handle to a scan running on a background thread.
pub struct ScanHandle {
    session: ScanSession,
    thread: JoinHandle<Result<Vec<Match>>>,
}

impl ScanHandle {
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn cancel(&self) {
        self.session.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the scan and return its matches or its error.
    pub fn join(self) -> Result<Vec<Match>> {
        self.thread.join().unwrap_or_else(|_| {
            Err(SkipperError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "scan thread panicked",
            )))
        })
    }
}
