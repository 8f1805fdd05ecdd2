use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A structural error found while scanning a `.bib` or `.tex` source.
/// Offsets count bytes from the start of the source, lines start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error(
        "unexpected end of input at byte {offset} while {action} ({} started at line {line}, byte {start})",
        describe_entry(.key)
    )]
    TruncatedEntry {
        offset: usize,
        start: usize,
        line: usize,
        action: &'static str,
        key: Option<String>,
    },
    #[error(
        "unexpected end of input at byte {offset}: '{marker}' command started at line {line}, byte {start} has no closing '}}'"
    )]
    UnterminatedCitation {
        offset: usize,
        start: usize,
        line: usize,
        marker: &'static str,
    },
}

fn describe_entry(key: &Option<String>) -> String {
    match key {
        Some(key) => format!("entry '{}'", key),
        None => String::from("entry"),
    }
}

impl ScanError {
    /// Byte offset at which the scanner gave up
    pub fn offset(&self) -> usize {
        match self {
            Self::TruncatedEntry { offset, .. } => *offset,
            Self::UnterminatedCitation { offset, .. } => *offset,
        }
    }
}

/// Everything that can abort an extraction run
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),
    #[error("cannot {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: ScanError,
    },
}

impl Error {
    pub(crate) fn io<'p>(action: &'static str, path: &'p Path) -> impl FnOnce(io::Error) -> Error + 'p {
        move |source| Error::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn scan(path: &Path) -> impl FnOnce(ScanError) -> Error + '_ {
        move |source| Error::Scan {
            path: path.to_path_buf(),
            source,
        }
    }
}
