//! Cursor primitives shared by the property-list and configuration parsers
//! (`spec.md` §2 "Scanner primitives").

/// A cursor over `&str` input tracking a byte offset, with the handful of
/// primitives both recursive-descent parsers in this crate need: literal
/// matching, scan-until, character-class runs, and single-character
/// peek/consume.
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// The slice of the original input between two byte offsets previously
    /// obtained from [`Scanner::pos`].
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Up to `n` characters of context starting at the current position, for
    /// error messages (`spec.md` §4.2 "up to 20 characters of actual
    /// context").
    pub fn context(&self, n: usize) -> String {
        self.remaining().chars().take(n).collect()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume and return the next character, if any.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// If the remaining input starts with `s`, consume it and return true.
    pub fn scan_string(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume characters up to (not including) the first occurrence of
    /// `s`, or to end-of-input if `s` never occurs. Returns the consumed
    /// slice.
    pub fn scan_up_to(&mut self, s: &str) -> &'a str {
        let rest = self.remaining();
        let end = rest.find(s).unwrap_or(rest.len());
        let consumed = &rest[..end];
        self.pos += end;
        consumed
    }

    /// Consume the longest run of characters satisfying `pred`, returning
    /// the consumed slice (possibly empty).
    pub fn scan_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.remaining();
        let end = rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let consumed = &rest[..end];
        self.pos += end;
        consumed
    }

    /// Consume the next character if it equals `c`.
    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }
}
