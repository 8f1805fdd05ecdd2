use std::convert::Infallible;
use std::fs;
use std::io;
use std::path;
use std::str;

use log::debug;

use crate::cursor::Cursor;
use crate::errors::ScanError;
use crate::types::CitationSet;

/// The citation commands recognized in a `.tex` source, including the opening brace
pub const MARKERS: [&str; 2] = ["\\cite{", "\\onlinecite{"];

/// One citation command found in a `.tex` source, e.g. `\cite{knuth97, lamport94}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// the marker this command matched, one of `MARKERS`
    pub marker: &'static str,
    /// trimmed, non-empty keys in argument order
    pub keys: Vec<String>,
    /// byte offset of the marker
    pub offset: usize,
    /// line of the marker, starting at 1
    pub line: usize,
}

/// Scanner finding citation commands in a `.tex` source
pub struct CitationScanner {
    src: String,
}

impl CitationScanner {
    /// Use a file at some filepath as source for the scanning process.
    pub fn from_file<P: AsRef<path::Path>>(path: P) -> Result<CitationScanner, io::Error> {
        let src = fs::read_to_string(path)?;
        Ok(CitationScanner { src })
    }

    /// Use a string as source for the scanning process.
    pub fn from_string(data: String) -> CitationScanner {
        CitationScanner { src: data }
    }

    /// Iterate over citation commands in source order.
    /// The iterator ends after the first error.
    pub fn iter(&self) -> Citations<'_> {
        Citations {
            cursor: Cursor::new(&self.src),
            finished: false,
        }
    }

    /// Collect the distinct keys of all citation commands.
    pub fn keys(&self) -> Result<CitationSet, ScanError> {
        let mut set = CitationSet::new();
        for citation in self.iter() {
            set.extend(citation?.keys);
        }
        Ok(set)
    }
}

impl str::FromStr for CitationScanner {
    type Err = Infallible;

    /// Use a string as source for the scanning process.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Ok(CitationScanner::from_string(data.to_string()))
    }
}

/// A stateful iterator yielding one `Citation` after another
pub struct Citations<'s> {
    cursor: Cursor<'s>,
    finished: bool,
}

impl<'s> Citations<'s> {
    fn next_citation(&mut self) -> Result<Option<Citation>, ScanError> {
        while self.cursor.skip_to('\\') {
            let start = self.cursor.position();
            let marker = match MARKERS.iter().copied().find(|m| self.cursor.eat(m)) {
                Some(marker) => marker,
                None => {
                    self.cursor.bump();
                    continue;
                }
            };

            // the argument list is consumed in full, so markers inside it never match
            let mut keys = Vec::new();
            let mut token = String::new();
            loop {
                match self.cursor.bump() {
                    Some(',') => flush(&mut token, &mut keys, start.lineno + 1),
                    Some('}') => {
                        flush(&mut token, &mut keys, start.lineno + 1);
                        break;
                    }
                    Some('{') => {}
                    Some(chr) => token.push(chr),
                    None => {
                        return Err(ScanError::UnterminatedCitation {
                            offset: self.cursor.offset(),
                            start: start.offset,
                            line: start.lineno + 1,
                            marker,
                        })
                    }
                }
            }

            debug!(
                "{} command at line {} col {}: {:?}",
                marker,
                start.lineno + 1,
                start.colno + 1,
                keys
            );
            return Ok(Some(Citation {
                marker,
                keys,
                offset: start.offset,
                line: start.lineno + 1,
            }));
        }
        Ok(None)
    }
}

/// Move the trimmed `token` into `keys`; empty tokens are dropped.
fn flush(token: &mut String, keys: &mut Vec<String>, line: usize) {
    let key = token.trim();
    if key.is_empty() {
        debug!("dropping empty citation key at line {}", line);
    } else {
        keys.push(key.to_string());
    }
    token.clear();
}

impl<'s> Iterator for Citations<'s> {
    type Item = Result<Citation, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_citation() {
            Ok(Some(citation)) => Some(Ok(citation)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
