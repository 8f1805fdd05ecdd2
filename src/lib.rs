//! This crate reduces a `.bib` library to the entries a `.tex` document cites.
//!
//! Bibliography managers tend to export one large library, while a paper
//! only needs a handful of its entries. Given a library like this:
//!
//! ```tex
//! @book{DBLP:books/aw/Knuth73a,
//!     author    = {Donald E. Knuth},
//!     title     = {The Art of Computer Programming, Volume {I:} Fundamental Algorithms},
//!     year      = {1973},
//! }
//! ```
//!
//! and a document citing it with `\cite{DBLP:books/aw/Knuth73a}` or
//! `\onlinecite{...}`, the cited entries are copied verbatim (including
//! their original formatting) into a new library. Cited keys without an
//! entry are reported, not treated as errors.
//!
//! Two scanners do the work. `Parser` reads a `.bib` source into an
//! `EntryTable` and `CitationScanner` reads a `.tex` source into a
//! `CitationSet`. `emit` then writes the cited entries:
//!
//! ```rust
//! use bibextract::{CitationScanner, Parser};
//! use std::str::FromStr;
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = Parser::from_str("@book{tolkien1937, author = {J. R. R. Tolkien}}")?.table()?;
//!     let cites = CitationScanner::from_str(r"see \cite{tolkien1937, lewis1950}")?.keys()?;
//!     let mut out = Vec::new();
//!     let report = bibextract::emit(&table, &cites, &mut out)?;
//!     assert_eq!(report.written, vec!["tolkien1937"]);
//!     assert_eq!(report.unresolved, vec!["lewis1950"]);
//!     Ok(())
//! }
//! ```
//!
//! `extract::run` does the same for three file paths and is what the
//! `bibextract` binary calls. Both sources are read into memory at once.

mod citations;
mod cursor;
mod errors;
pub mod extract;
mod filter;
mod parser;
mod types;

pub use crate::citations::{Citation, CitationScanner, Citations, MARKERS};
pub use crate::errors::{Error, ScanError};
pub use crate::filter::{emit, Report};
pub use crate::parser::{Entries, Parser};
pub use crate::types::{CitationSet, DuplicateKey, Entry, EntryTable};
