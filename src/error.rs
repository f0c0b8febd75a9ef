use thiserror::Error;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum SkipperError {
    #[error("Traversal failed at {path}: {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("context canceled")]
    Cancelled,

    #[error("{source}")]
    Attribute {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Keyword is empty")]
    EmptyKeywords,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkipperError {
    pub fn attribute(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Attribute { path: path.into(), source }
    }

    /// True for an intentional cancel, which callers report without an error message.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<walkdir::Error> for SkipperError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"));
        Self::Traversal { path, source }
    }
}
