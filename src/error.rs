use std::io;
use thiserror::Error;

/// A failure while acquiring, populating or entering a module.
///
/// The display form is `<operation>: <description>`, the shape the command
/// line tool writes to stderr.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("open: {0}")]
    Open(#[source] io::Error),
    #[error("fstat: {0}")]
    Stat(#[source] io::Error),
    #[error("fstat: module size {0} does not fit in the address space")]
    TooLarge(u64),
    #[error("mmap: {0}")]
    Map(#[source] io::Error),
    #[error("read: {0}")]
    Read(#[source] io::Error),
    #[error("read: short read ({read} of {expected} bytes)")]
    ShortRead { read: usize, expected: usize },
    #[error("entry: offset {offset:#x} lies outside the {size}-byte module")]
    EntryOutOfBounds { offset: usize, size: usize },
}

impl LoadError {
    /// Name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            LoadError::Open(_) => "open",
            LoadError::Stat(_) | LoadError::TooLarge(_) => "fstat",
            LoadError::Map(_) => "mmap",
            LoadError::Read(_) | LoadError::ShortRead { .. } => "read",
            LoadError::EntryOutOfBounds { .. } => "entry",
        }
    }
}
