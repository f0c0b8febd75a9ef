//! syncskipper - find folders and files by name and tell Dropbox to skip them
//!
//! Dropbox leaves any file or folder carrying the `com.dropbox.ignored`
//! extended attribute out of sync. This crate walks a folder tree for entries
//! named after a set of keywords (`node_modules`, `target`, ...) and sets or
//! clears that attribute on them.
//!
//! - [`scanner`]: cancellable depth-first walk with progress reporting
//! - [`attr`]: the marker store, one trait over three platform mechanisms

pub mod attr;
pub mod config;
pub mod engine;
pub mod error;
pub mod scanner;

pub use error::SkipperError;
pub type Result<T> = std::result::Result<T, SkipperError>;
