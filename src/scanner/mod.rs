use crate::{Result, SkipperError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod local;
pub mod session;

pub use local::LocalScanner;
pub use session::{CancelToken, ScanCoordinator, ScanHandle, ScanSession, ScanState};

/// Separator between keywords in user input. There is no escape for it.
pub const KEYWORD_SEPARATOR: char = ';';

/// Entry whose base name equals one of the keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Full path as reported by the walk
    pub path: String,
    /// Whether the ignored marker was present when scanned
    pub is_ignored: bool,
}

/// Exact, case-sensitive base names to look for. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords(Vec<String>);

impl Keywords {
    /// Collect keywords, dropping empty tokens and duplicates (first wins).
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.into();
            if !keyword.is_empty() && !list.contains(&keyword) {
                list.push(keyword);
            }
        }
        if list.is_empty() {
            return Err(SkipperError::EmptyKeywords);
        }
        Ok(Self(list))
    }

    /// Split a `;`-separated list such as `"node_modules;target"`.
    pub fn parse(input: &str) -> Result<Self> {
        Self::new(input.split(KEYWORD_SEPARATOR))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|k| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromStr for Keywords {
    type Err = SkipperError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Root directory plus the keywords to look for beneath it.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub root: PathBuf,
    pub keywords: Keywords,
}

impl ScanRequest {
    pub fn new(root: impl Into<PathBuf>, keywords: Keywords) -> Self {
        Self {
            root: root.into(),
            keywords,
        }
    }

    /// Build a request from the raw `;`-separated keyword string.
    pub fn parse(root: impl AsRef<Path>, keywords: &str) -> Result<Self> {
        Ok(Self::new(root.as_ref(), Keywords::parse(keywords)?))
    }
}
