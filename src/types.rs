use std::collections::btree_set;
use std::collections::{BTreeSet, HashMap};

use log::warn;

/// One entry in a `.bib` file, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// entry type, e.g. “article”
    pub kind: String,
    /// citation key, e.g. “DBLP:books/lib/Knuth97”
    pub key: String,
    /// source text from `@` through the matching closing brace
    pub body: String,
    /// byte offset of the `@`
    pub offset: usize,
    /// line of the `@`, starting at 1
    pub line: usize,
}

/// A key defined more than once in the same `.bib` source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: String,
    /// byte offset of the entry that was replaced
    pub first_offset: usize,
    pub first_line: usize,
    /// byte offset of the entry that replaced it
    pub second_offset: usize,
    pub second_line: usize,
}

/// Entries of a `.bib` source indexed by their key.
/// Inserting a key twice keeps the later entry and records a `DuplicateKey`.
#[derive(Debug, Default)]
pub struct EntryTable {
    entries: HashMap<String, Entry>,
    duplicates: Vec<DuplicateKey>,
}

impl EntryTable {
    pub fn new() -> EntryTable {
        Self::default()
    }

    /// Add `entry`, returning the entry it replaced, if any.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        let (offset, line) = (entry.offset, entry.line);
        let previous = self.entries.insert(entry.key.clone(), entry)?;
        warn!(
            "duplicate key '{}' at line {} (byte {}) replaces the entry at line {} (byte {})",
            previous.key, line, offset, previous.line, previous.offset
        );
        self.duplicates.push(DuplicateKey {
            key: previous.key.clone(),
            first_offset: previous.offset,
            first_line: previous.line,
            second_offset: offset,
            second_line: line,
        });
        Some(previous)
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys replaced by a later definition, in order of discovery
    pub fn duplicates(&self) -> &[DuplicateKey] {
        &self.duplicates
    }
}

/// Distinct citation keys referenced by a document, in sorted order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CitationSet {
    keys: BTreeSet<String>,
}

impl CitationSet {
    pub fn new() -> CitationSet {
        Self::default()
    }

    /// Returns false if `key` was already present.
    pub fn insert<S: Into<String>>(&mut self, key: S) -> bool {
        self.keys.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.keys.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for CitationSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = CitationSet::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for CitationSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'c> IntoIterator for &'c CitationSet {
    type Item = &'c String;
    type IntoIter = btree_set::Iter<'c, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
