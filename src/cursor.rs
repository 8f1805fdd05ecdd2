/// Where a character sits in the source.
/// `lineno` and `colno` are zero-based, `offset` counts bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Position {
    pub(crate) offset: usize,
    pub(crate) lineno: usize,
    pub(crate) colno: usize,
}

/// A forward-only cursor over a source string.
///
/// Running out of input is reported as `None` by `bump()`, so the scanners
/// built on top of it never index past the end of their buffer.
pub(crate) struct Cursor<'s> {
    src: &'s str,
    offset: usize,
    lineno: usize,
    colno: usize,
}

impl<'s> Cursor<'s> {
    pub(crate) fn new(src: &'s str) -> Cursor<'s> {
        Cursor {
            src,
            offset: 0,
            lineno: 0,
            colno: 0,
        }
    }

    /// Position of the next character (or of the end of input)
    pub(crate) fn position(&self) -> Position {
        Position {
            offset: self.offset,
            lineno: self.lineno,
            colno: self.colno,
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// The unread part of the source
    pub(crate) fn rest(&self) -> &'s str {
        &self.src[self.offset..]
    }

    /// The source between two byte offsets previously returned by this cursor
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'s str {
        &self.src[start..end]
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume and return the next character.
    pub(crate) fn bump(&mut self) -> Option<char> {
        let chr = self.peek()?;
        self.offset += chr.len_utf8();
        if chr == '\n' {
            self.lineno += 1;
            self.colno = 0;
        } else {
            self.colno += 1;
        }
        Some(chr)
    }

    /// Consume `prefix` if the unread source starts with it.
    pub(crate) fn eat(&mut self, prefix: &str) -> bool {
        if !self.rest().starts_with(prefix) {
            return false;
        }
        for _ in prefix.chars() {
            self.bump();
        }
        true
    }

    /// Advance up to (not past) the next occurrence of `chr`.
    /// Returns false if the input ended first.
    pub(crate) fn skip_to(&mut self, chr: char) -> bool {
        while let Some(next) = self.peek() {
            if next == chr {
                return true;
            }
            self.bump();
        }
        false
    }
}
