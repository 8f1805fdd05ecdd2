use std::collections::BTreeSet;
use std::io;

use log::debug;

use crate::types::{CitationSet, EntryTable};

/// Outcome of writing the cited entries
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Report {
    /// keys whose entries were written, in output order
    pub written: Vec<String>,
    /// cited keys without an entry, sorted
    pub unresolved: Vec<String>,
    /// keys defined more than once in the `.bib` source, sorted, each listed once
    pub duplicates: Vec<String>,
}

impl Report {
    /// Did every cited key resolve to an entry?
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Write the body of every cited entry to `out`, each followed by a newline.
///
/// Keys are visited in sorted order, so the same inputs always produce the
/// same bytes. Keys missing from `table` are collected in `Report::unresolved`
/// and do not stop the remaining entries from being written.
pub fn emit<W: io::Write>(
    table: &EntryTable,
    citations: &CitationSet,
    out: &mut W,
) -> io::Result<Report> {
    let mut report = Report::default();
    for key in citations {
        match table.get(key) {
            Some(entry) => {
                debug!("writing entry '{}'", key);
                out.write_all(entry.body.as_bytes())?;
                out.write_all(b"\n")?;
                report.written.push(key.clone());
            }
            None => {
                debug!("no entry for citation key '{}'", key);
                report.unresolved.push(key.clone());
            }
        }
    }
    let duplicates: BTreeSet<&String> = table.duplicates().iter().map(|d| &d.key).collect();
    report.duplicates = duplicates.into_iter().cloned().collect();
    Ok(report)
}
