use std::convert::Infallible;
use std::fs;
use std::io;
use std::path;
use std::str;

use log::{debug, warn};

use crate::cursor::{Cursor, Position};
use crate::errors::ScanError;
use crate::types::{Entry, EntryTable};

/// What the entry scanner is looking at inside an entry.
/// Outside of entries the scanner only searches for the next `@`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryState {
    ReadingType,
    ReadingKey,
    ReadingBody,
}

impl EntryState {
    fn action(self) -> &'static str {
        match self {
            Self::ReadingType => "reading entry type (no '{' after '@')",
            Self::ReadingKey => "reading entry key",
            Self::ReadingBody => "reading entry body",
        }
    }
}

/// Parser reading a `.bib` source into verbatim `Entry` values
pub struct Parser {
    src: String,
}

impl Parser {
    /// Use a file at some filepath as source for the parsing process.
    pub fn from_file<P: AsRef<path::Path>>(path: P) -> Result<Parser, io::Error> {
        let src = fs::read_to_string(path)?;
        Ok(Parser { src })
    }

    /// Use a string as source for the parsing process.
    pub fn from_string(data: String) -> Parser {
        Parser { src: data }
    }

    /// Iterate over the entries in source order.
    /// The iterator ends after the first error.
    pub fn iter(&self) -> Entries<'_> {
        Entries {
            cursor: Cursor::new(&self.src),
            finished: false,
        }
    }

    /// Read every entry into a table indexed by key.
    /// Later entries replace earlier ones with the same key.
    pub fn table(&self) -> Result<EntryTable, ScanError> {
        let mut table = EntryTable::new();
        for entry in self.iter() {
            table.insert(entry?);
        }
        Ok(table)
    }
}

impl str::FromStr for Parser {
    type Err = Infallible;

    /// Use a string as source for the parsing process.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Ok(Parser::from_string(data.to_string()))
    }
}

/// A stateful iterator yielding one `Entry` after another
pub struct Entries<'s> {
    cursor: Cursor<'s>,
    finished: bool,
}

impl<'s> Entries<'s> {
    fn next_entry(&mut self) -> Result<Option<Entry>, ScanError> {
        while self.cursor.skip_to('@') {
            let start = self.cursor.position();
            if let Some(entry) = self.scan_entry(start)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Scan one entry starting at the `@` under the cursor.
    /// Returns `None` for entries without a key, which are skipped.
    fn scan_entry(&mut self, start: Position) -> Result<Option<Entry>, ScanError> {
        let mut state = EntryState::ReadingType;
        let mut depth = 0usize;
        let mut kind_end = start.offset;
        let mut key = String::new();
        let mut escaped = false;

        self.cursor.bump(); // '@'
        loop {
            let chr = match self.cursor.bump() {
                Some(chr) => chr,
                None => {
                    return Err(ScanError::TruncatedEntry {
                        offset: self.cursor.offset(),
                        start: start.offset,
                        line: start.lineno + 1,
                        action: state.action(),
                        key: match state {
                            EntryState::ReadingBody => Some(key.trim().to_string()),
                            _ => None,
                        },
                    })
                }
            };

            match state {
                EntryState::ReadingType => {
                    if chr == '{' {
                        kind_end = self.cursor.offset() - 1;
                        depth = 1;
                        state = EntryState::ReadingKey;
                    }
                }
                EntryState::ReadingKey => {
                    // a backslash only protects a following comma
                    let comma_escaped = escaped;
                    escaped = chr == '\\' && !escaped;
                    if chr == ',' && !comma_escaped {
                        state = EntryState::ReadingBody;
                    } else if chr == '{' {
                        depth += 1;
                        key.push(chr);
                    } else if chr == '}' {
                        depth -= 1;
                        if depth == 0 {
                            debug!(
                                "skipping entry without key at line {}: {}",
                                start.lineno + 1,
                                self.cursor.slice(start.offset, kind_end).trim()
                            );
                            return Ok(None);
                        }
                        key.push(chr);
                    } else {
                        key.push(chr);
                    }
                }
                EntryState::ReadingBody => {
                    if chr == '{' {
                        depth += 1;
                    } else if chr == '}' {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
            }
        }

        let key = key.trim();
        if key.is_empty() {
            warn!("skipping entry with empty key at line {}", start.lineno + 1);
            return Ok(None);
        }

        let entry = Entry {
            kind: self.cursor.slice(start.offset + 1, kind_end).trim().to_string(),
            key: key.to_string(),
            body: self.cursor.slice(start.offset, self.cursor.offset()).to_string(),
            offset: start.offset,
            line: start.lineno + 1,
        };
        debug!("found entry '{}' at line {}", entry.key, entry.line);
        Ok(Some(entry))
    }
}

impl<'s> Iterator for Entries<'s> {
    type Item = Result<Entry, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::error;
    use std::str::FromStr;

    #[test]
    fn test_tolkien() -> Result<(), Box<dyn error::Error>> {
        let src = "@book{tolkien1937, author = {J. R. R. Tolkien}}";
        let p = Parser::from_str(src)?;
        let mut count = 0;
        for e in p.iter() {
            let entry = e?;
            assert_eq!(entry.kind, "book");
            assert_eq!(entry.key, "tolkien1937");
            assert_eq!(entry.body, src);
            assert_eq!(entry.offset, 0);
            assert_eq!(entry.line, 1);
            count += 1;
        }
        assert_eq!(count, 1);
        Ok(())
    }

    #[test]
    fn test_single_entry_verbatim() -> Result<(), Box<dyn error::Error>> {
        let table = Parser::from_str("@article{doe2020,author={Doe},}")?.table()?;
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("doe2020").map(|e| e.body.as_str()),
            Some("@article{doe2020,author={Doe},}")
        );
        Ok(())
    }

    #[test]
    fn test_taocp() -> Result<(), Box<dyn error::Error>> {
        let src = r#"% exported from dblp
@book{DBLP:books/lib/Knuth97,
  author    = {Donald Ervin Knuth},
  title     = {The art of computer programming, Volume {I:} Fundamental Algorithms,
               3rd Edition},
  publisher = {Addison-Wesley},
  year      = {1997},
  bibsource = {{dblp computer science bibliography}, https://dblp.org}
}

@inproceedings{ DBLP:conf/x/Y ,
  note = {contact: someone@example.org}
}
trailing text"#;
        let p = Parser::from_str(src)?;
        let entries = p.iter().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "DBLP:books/lib/Knuth97");
        assert_eq!(entries[0].line, 2);
        assert!(entries[0].body.starts_with("@book{DBLP"));
        assert!(entries[0].body.ends_with("https://dblp.org}\n}"));
        assert_eq!(entries[1].kind, "inproceedings");
        assert_eq!(entries[1].key, "DBLP:conf/x/Y");
        assert!(entries[1].body.ends_with("someone@example.org}\n}"));
        Ok(())
    }

    #[test]
    fn test_count_matches_entries() -> Result<(), Box<dyn error::Error>> {
        let src = "@a{k1, x={1}}\n@b{k2, x={{2}}}\ncomment\n@c{k3,}\n";
        let table = Parser::from_str(src)?.table()?;
        assert_eq!(table.len(), 3);
        assert!(table.contains("k1") && table.contains("k2") && table.contains("k3"));
        Ok(())
    }

    #[test]
    fn test_body_reparses_to_same_key() -> Result<(), Box<dyn error::Error>> {
        let src = "@misc{ spaced key ,\n title = {A {nested} title}}\n@misc{other, a = b}";
        for entry in Parser::from_str(src)?.iter() {
            let entry = entry?;
            let reparsed = Parser::from_string(entry.body.clone()).table()?;
            assert_eq!(reparsed.len(), 1);
            assert!(reparsed.contains(&entry.key));
        }
        Ok(())
    }

    #[test]
    fn test_duplicate_key() -> Result<(), Box<dyn error::Error>> {
        let src = "@misc{same, v = {1}}\n@misc{same, v = {2}}";
        let table = Parser::from_str(src)?.table()?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("same").unwrap().body, "@misc{same, v = {2}}");
        assert_eq!(table.duplicates().len(), 1);
        assert_eq!(table.duplicates()[0].first_line, 1);
        assert_eq!(table.duplicates()[0].first_offset, 0);
        assert_eq!(table.duplicates()[0].second_line, 2);
        assert_eq!(table.duplicates()[0].second_offset, 21);
        Ok(())
    }

    #[test]
    fn test_truncated_body() -> Result<(), Box<dyn error::Error>> {
        let src = "@misc{ok, a = {1}}\n@article{doe2020,author={Doe},";
        let err = Parser::from_str(src)?.table().unwrap_err();
        assert_eq!(
            err,
            ScanError::TruncatedEntry {
                offset: src.len(),
                start: 19,
                line: 2,
                action: "reading entry body",
                key: Some("doe2020".to_string()),
            }
        );
        assert_eq!(err.offset(), src.len());
        Ok(())
    }

    #[test]
    fn test_truncated_before_key() -> Result<(), Box<dyn error::Error>> {
        let err = Parser::from_str("text @article")?.table().unwrap_err();
        match err {
            ScanError::TruncatedEntry { offset, start, action, key, .. } => {
                assert_eq!(offset, 13);
                assert_eq!(start, 5);
                assert_eq!(action, "reading entry type (no '{' after '@')");
                assert_eq!(key, None);
            }
            other => panic!("unexpected error {other}"),
        }
        let err = Parser::from_str("@article{doe2020")?.table().unwrap_err();
        assert!(err.to_string().contains("reading entry key"));
        Ok(())
    }

    #[test]
    fn test_entry_without_key_is_skipped() -> Result<(), Box<dyn error::Error>> {
        let src = "@comment{jabref-meta {groups}}\n@misc{kept, a = {1}}\n@misc{ , a = {2}}";
        let table = Parser::from_str(src)?.table()?;
        assert_eq!(table.len(), 1);
        assert!(table.contains("kept"));
        Ok(())
    }

    #[test]
    fn test_escaped_comma_in_key() -> Result<(), Box<dyn error::Error>> {
        let table = Parser::from_str(r"@misc{a\,b, x = {1}}")?.table()?;
        assert!(table.contains(r"a\,b"));
        Ok(())
    }

    #[test]
    fn test_backslash_does_not_hide_braces_in_key() -> Result<(), Box<dyn error::Error>> {
        let table = Parser::from_str(r"@misc{a\{b\}, x=1}")?.table()?;
        let entry = table.get(r"a\{b\}").unwrap();
        assert_eq!(entry.body, r"@misc{a\{b\}, x=1}");
        assert_eq!(entry.body.matches('{').count(), entry.body.matches('}').count());

        let err = Parser::from_str(r"@misc{a\{b, x=1}")?.table().unwrap_err();
        assert!(matches!(
            err,
            ScanError::TruncatedEntry {
                action: "reading entry body",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn test_stray_at_sign_after_last_entry() -> Result<(), Box<dyn error::Error>> {
        let src = "@misc{a, x={1}}\nContact: me@example.org\n";
        let err = Parser::from_str(src)?.table().unwrap_err();
        assert_eq!(err.offset(), 40);
        assert!(err.to_string().contains("no '{' after '@'"));
        assert!(err.to_string().contains("line 2"));
        Ok(())
    }

    #[test]
    fn test_empty_source() -> Result<(), Box<dyn error::Error>> {
        assert!(Parser::from_str("")?.table()?.is_empty());
        assert!(Parser::from_str("no entries here\n")?.table()?.is_empty());
        Ok(())
    }

    fn value_strategy() -> impl Strategy<Value = String> {
        let text = "[A-Za-z0-9 ,.@:]{0,12}";
        prop_oneof![
            text.prop_map(|t| format!("{{{}}}", t)),
            (text, text).prop_map(|(a, b)| format!("{{{} {{{}}} }}", a, b)),
            "[0-9]{1,4}",
        ]
    }

    /// (key, verbatim entry text)
    fn entry_strategy() -> impl Strategy<Value = (String, String)> {
        (
            "[a-zA-Z]{1,10}",
            "[A-Za-z][A-Za-z0-9:_/-]{0,15}",
            "[ \n]{0,2}",
            prop::collection::vec(("[a-z]{1,8}", value_strategy()), 0..4),
        )
            .prop_map(|(kind, key, pad, fields)| {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("  {} = {}", name, value))
                    .collect();
                let body = format!("@{}{{{}{}{},\n{}\n}}", kind, pad, key, pad, fields.join(",\n"));
                (key, body)
            })
    }

    /// entries separated by text without `@`
    fn source_strategy() -> impl Strategy<Value = (Vec<(String, String)>, String)> {
        prop::collection::vec((entry_strategy(), "[ a-z%.\n]{0,10}"), 0..6).prop_map(|parts| {
            let mut src = String::new();
            let mut entries = Vec::new();
            for (entry, filler) in parts {
                src.push_str(&filler);
                src.push_str(&entry.1);
                entries.push(entry);
            }
            (entries, src)
        })
    }

    proptest! {
        #[test]
        fn test_every_generated_entry_is_found((expected, src) in source_strategy()) {
            let p = Parser::from_string(src);
            let entries = p.iter().collect::<Result<Vec<_>, _>>().unwrap();
            prop_assert_eq!(entries.len(), expected.len());
            for (entry, (key, body)) in entries.iter().zip(expected.iter()) {
                prop_assert_eq!(&entry.key, key);
                prop_assert_eq!(&entry.body, body);
            }
            let distinct: std::collections::HashSet<&String> = expected.iter().map(|(k, _)| k).collect();
            prop_assert_eq!(p.table().unwrap().len(), distinct.len());
        }

        #[test]
        fn test_every_body_reparses_to_its_key((_expected, src) in source_strategy()) {
            for entry in Parser::from_string(src).iter() {
                let entry = entry.unwrap();
                let reparsed = Parser::from_string(entry.body.clone()).iter().collect::<Result<Vec<_>, _>>().unwrap();
                prop_assert_eq!(reparsed.len(), 1);
                prop_assert_eq!(&reparsed[0].key, &entry.key);
                prop_assert_eq!(&reparsed[0].body, &entry.body);
            }
        }
    }
}
