use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use syncskipper::attr::{AttributeStore, Mechanism};
use syncskipper::scanner::{CancelToken, Keywords, LocalScanner, ScanCoordinator, ScanRequest};
use syncskipper::{Result, SkipperError};
use tempfile::tempdir;

/// In-memory marker store that records every lookup.
struct MockStore {
    marked: Mutex<HashSet<PathBuf>>,
    lookups: Mutex<Vec<PathBuf>>,
}

impl MockStore {
    fn new() -> Self {
        Self {
            marked: Mutex::new(HashSet::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }
}

impl AttributeStore for MockStore {
    fn mechanism(&self) -> Mechanism {
        Mechanism::Unsupported
    }

    fn get(&self, path: &Path) -> bool {
        self.lookups.lock().unwrap().push(path.to_path_buf());
        self.marked.lock().unwrap().contains(path)
    }

    fn set(&self, path: &Path) -> Result<()> {
        self.marked.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    fn clear(&self, path: &Path) -> Result<()> {
        self.marked.lock().unwrap().remove(path);
        Ok(())
    }
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

fn relative(root: &Path, path: &str) -> PathBuf {
    Path::new(path).strip_prefix(root).unwrap().to_path_buf()
}

#[test]
fn test_node_modules_scenario() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    // Structure:
    // root
    //   |- node_modules/
    //   |    |- left-pad/node_modules/x.js
    //   |- src/
    //        |- node_modules.txt
    //        |- main.rs
    touch(&root.join("node_modules/left-pad/node_modules/x.js"));
    touch(&root.join("src/node_modules.txt"));
    touch(&root.join("src/main.rs"));

    let store = MockStore::new();
    let scanner = LocalScanner::new(&store, CancelToken::new());
    let request = ScanRequest::parse(root, "node_modules;node_modules.txt").unwrap();

    let mut counts = Vec::new();
    let matches = scanner.scan(&request, |n| counts.push(n)).unwrap();

    let mut found: Vec<_> = matches.iter().map(|m| relative(root, &m.path)).collect();
    found.sort();
    assert_eq!(found, vec![PathBuf::from("node_modules"), PathBuf::from("src/node_modules.txt")]);

    // root, node_modules, src, src/node_modules.txt, src/main.rs
    assert_eq!(counts, vec![1, 2, 3, 4, 5]);

    // Only matches are looked up, and nothing below the pruned folder.
    let lookups = store.lookups.lock().unwrap();
    assert_eq!(lookups.len(), 2);
    assert!(lookups.iter().all(|p| !p.starts_with(root.join("node_modules/left-pad"))));
}

#[test]
fn test_exact_name_matching() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("a"));
    touch(&root.join("b"));
    touch(&root.join("ab"));
    touch(&root.join("sub/ba"));

    let store = MockStore::new();
    let scanner = LocalScanner::new(&store, CancelToken::new());
    let request = ScanRequest::new(root, Keywords::parse("a;b").unwrap());
    let matches = scanner.scan(&request, |_| {}).unwrap();

    let mut found: Vec<_> = matches.iter().map(|m| relative(root, &m.path)).collect();
    found.sort();
    assert_eq!(found, vec![PathBuf::from("a"), PathBuf::from("b")]);
}

#[test]
fn test_matches_report_marker_state() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("x/target/debug.log"));
    touch(&root.join("y/target/debug.log"));

    let store = MockStore::new();
    store.set(&root.join("y/target")).unwrap();

    let scanner = LocalScanner::new(&store, CancelToken::new());
    let matches = scanner.scan(&ScanRequest::parse(root, "target").unwrap(), |_| {}).unwrap();

    assert_eq!(matches.len(), 2);
    for m in &matches {
        let rel = relative(root, &m.path);
        assert_eq!(m.is_ignored, rel == Path::new("y/target"), "{:?}", rel);
    }
}

#[test]
fn test_progress_is_strictly_increasing() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for i in 0..5 {
        touch(&root.join(format!("d{}/f{}", i, i)));
    }

    let store = MockStore::new();
    let scanner = LocalScanner::new(&store, CancelToken::new());
    let mut counts = Vec::new();
    scanner.scan(&ScanRequest::parse(root, "none").unwrap(), |n| counts.push(n)).unwrap();

    assert_eq!(counts.len(), 11);
    assert!(counts.windows(2).all(|w| w[1] == w[0] + 1));
    assert_eq!(counts.first(), Some(&1));
}

#[test]
fn test_entries_removed_during_scan_are_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    for i in 0..20 {
        touch(&root.join(format!("d{:02}/x", i)));
    }

    let store = MockStore::new();
    let scanner = LocalScanner::new(&store, CancelToken::new());
    let request = ScanRequest::parse(&root, "x").unwrap();

    // Remove every subtree once the walk is under way.
    let mut counts = Vec::new();
    let result = scanner.scan(&request, |n| {
        counts.push(n);
        if n == 3 {
            for i in 0..20 {
                let _ = fs::remove_dir_all(root.join(format!("d{:02}", i)));
            }
        }
    });

    let matches = result.unwrap();
    assert!(matches.len() < 20);
    assert!(counts.windows(2).all(|w| w[1] == w[0] + 1));
    assert!(fs::read_dir(&root).unwrap().next().is_none());
}

#[test]
fn test_coordinator_cancel_is_not_partial_success() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    for i in 0..50 {
        touch(&root.join(format!("dir{}/file", i)));
    }

    let coordinator = ScanCoordinator::new(Arc::new(MockStore::new()));
    let canceller = coordinator.clone();
    let handle = coordinator
        .spawn(ScanRequest::parse(&root, "file").unwrap(), move |n| {
            if n == 10 {
                canceller.cancel();
            }
        })
        .unwrap();

    let result = handle.join();
    assert!(matches!(result, Err(SkipperError::Cancelled)));
    assert!(!coordinator.is_running());
}

#[test]
fn test_coordinator_completes() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("one/.cache/x"));
    touch(&root.join("two/.cache/y"));

    let coordinator = ScanCoordinator::new(Arc::new(MockStore::new()));
    let handle = coordinator.spawn(ScanRequest::parse(root, ".cache").unwrap(), |_| {}).unwrap();
    let matches = handle.join().unwrap();

    assert_eq!(matches.len(), 2);
    assert!(!coordinator.is_running());
}

#[test]
fn test_missing_root_yields_no_matches() {
    let dir = tempdir().unwrap();
    let coordinator = ScanCoordinator::new(Arc::new(MockStore::new()));
    let handle = coordinator
        .spawn(ScanRequest::parse(dir.path().join("nope"), "x").unwrap(), |_| {})
        .unwrap();
    assert!(handle.join().unwrap().is_empty());
}
