use std::collections::HashSet;

use crate::buffer::{DEFAULT_READ_AHEAD, Lookahead};
use crate::entities;
use crate::offsets::OffsetMap;
use crate::source::{CharSource, SourceError};

/// Outcome of a tentative scan started at `<` or `&`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Scan {
    Match,
    Mismatch,
}

/// Streaming markup-stripping filter.
///
/// Pulls characters from a [`CharSource`], removes tags, comments,
/// processing instructions, and declarations (each replaced by a single
/// space), decodes character references, and passes everything else through.
/// Tag names in the reserved set survive verbatim, brackets and attributes
/// included. Malformed markup is emitted as literal text instead of being
/// dropped; it never raises an error.
///
/// [`correct_offset`](Self::correct_offset) maps a position in the stripped
/// output back to the input position where the producing span began, so that
/// downstream tokenizers can report spans against the original document.
pub struct HtmlStripFilter<S> {
    input: Lookahead<S>,
    reserved_tags: HashSet<String>,
    offsets: OffsetMap,
    out: usize,
    // decoded reference characters not yet returned, stored in reverse
    pending: Vec<char>,
    pending_started_at: usize,
    name_buf: String,
}

impl<S: CharSource> HtmlStripFilter<S> {
    pub fn new(source: S) -> Self {
        Self::with_reserved_tags(source, HashSet::new())
    }

    pub fn with_reserved_tags(source: S, reserved_tags: HashSet<String>) -> Self {
        Self::with_read_ahead(source, reserved_tags, DEFAULT_READ_AHEAD)
    }

    /// `read_ahead` sets the initial lookahead capacity; the window still
    /// grows without bound when a construct needs it.
    pub fn with_read_ahead(source: S, reserved_tags: HashSet<String>, read_ahead: usize) -> Self {
        Self {
            input: Lookahead::new(source, read_ahead),
            reserved_tags,
            offsets: OffsetMap::new(),
            out: 0,
            pending: Vec::new(),
            pending_started_at: 0,
            name_buf: String::new(),
        }
    }

    /// Next character of the stripped output, or `Ok(None)` once the input is
    /// exhausted. Stays `Ok(None)` on every later call.
    pub fn read(&mut self) -> Result<Option<char>, SourceError> {
        if let Some(ch) = self.pending.pop() {
            let started_at = self.pending_started_at;
            return Ok(Some(self.emit(ch, started_at)));
        }
        loop {
            let started_at = self.input.pos();
            let Some(ch) = self.input.next()? else {
                return Ok(None);
            };
            match ch {
                '<' => {
                    let mark = self.input.mark();
                    match self.scan_markup()? {
                        Scan::Match => {
                            self.input.commit();
                            return Ok(Some(self.emit(' ', started_at)));
                        }
                        Scan::Mismatch => {
                            self.input.rewind(mark);
                            self.input.commit();
                            return Ok(Some(self.emit('<', started_at)));
                        }
                    }
                }
                '&' => {
                    let mark = self.input.mark();
                    match self.scan_entity()? {
                        Scan::Match => {
                            self.input.commit();
                            self.pending_started_at = started_at;
                            if let Some(first) = self.pending.pop() {
                                return Ok(Some(self.emit(first, started_at)));
                            }
                        }
                        Scan::Mismatch => {
                            self.input.rewind(mark);
                            self.input.commit();
                            return Ok(Some(self.emit('&', started_at)));
                        }
                    }
                }
                _ => {
                    self.input.commit();
                    return Ok(Some(self.emit(ch, started_at)));
                }
            }
        }
    }

    /// Maps an output position to the input position where the span that
    /// produced it began. Monotonically non-decreasing.
    pub fn correct_offset(&self, output_pos: usize) -> usize {
        self.offsets.project(output_pos)
    }

    fn emit(&mut self, ch: char, started_at: usize) -> char {
        if self.offsets.project(self.out) != started_at {
            self.offsets.record(self.out, started_at);
        }
        self.out += 1;
        ch
    }

    // -- markup scanning; '<' has been consumed --

    fn scan_markup(&mut self) -> Result<Scan, SourceError> {
        match self.input.next()? {
            Some('!') => self.scan_bang(),
            Some('?') => self.scan_processing_instruction(),
            Some('/') => self.scan_close_tag(),
            Some(ch) if is_name_start(ch) => self.scan_open_tag(ch),
            _ => Ok(Scan::Mismatch),
        }
    }

    fn scan_bang(&mut self) -> Result<Scan, SourceError> {
        if self.input.peek()? == Some('-') && self.input.peek_at(1)? == Some('-') {
            self.skip(2)?;
            return self.scan_comment_body();
        }
        if self.lookahead_matches("[CDATA[")? {
            self.skip(7)?;
            return self.scan_cdata_body();
        }
        self.scan_declaration()
    }

    /// Scans toward `-->`. Any shorter dash run is comment content.
    fn scan_comment_body(&mut self) -> Result<Scan, SourceError> {
        loop {
            let Some(ch) = self.input.next()? else {
                return Ok(Scan::Mismatch);
            };
            if ch != '-' {
                continue;
            }
            let Some(second) = self.input.next()? else {
                return Ok(Scan::Mismatch);
            };
            if second != '-' {
                self.input.back(1);
                continue;
            }
            let Some(third) = self.input.next()? else {
                return Ok(Scan::Mismatch);
            };
            if third == '>' {
                return Ok(Scan::Match);
            }
            // slide one dash forward so "--->" still terminates
            self.input.back(2);
        }
    }

    fn scan_cdata_body(&mut self) -> Result<Scan, SourceError> {
        loop {
            let Some(ch) = self.input.next()? else {
                return Ok(Scan::Mismatch);
            };
            if ch == ']' && self.input.peek()? == Some(']') && self.input.peek_at(1)? == Some('>') {
                self.skip(2)?;
                return Ok(Scan::Match);
            }
        }
    }

    /// Other `<!...>` constructs (DOCTYPE, entity declarations). A `--`
    /// comment section inside hides any `>` it contains.
    fn scan_declaration(&mut self) -> Result<Scan, SourceError> {
        loop {
            let Some(ch) = self.input.next()? else {
                return Ok(Scan::Mismatch);
            };
            match ch {
                '>' => return Ok(Scan::Match),
                '-' if self.input.peek()? == Some('-') => {
                    self.input.next()?;
                    loop {
                        let Some(inner) = self.input.next()? else {
                            return Ok(Scan::Mismatch);
                        };
                        if inner == '-' && self.input.peek()? == Some('-') {
                            self.input.next()?;
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn scan_processing_instruction(&mut self) -> Result<Scan, SourceError> {
        loop {
            let Some(ch) = self.input.next()? else {
                return Ok(Scan::Mismatch);
            };
            if ch == '?' && self.input.peek()? == Some('>') {
                self.input.next()?;
                return Ok(Scan::Match);
            }
        }
    }

    fn scan_close_tag(&mut self) -> Result<Scan, SourceError> {
        self.skip_space()?;
        let Some(first) = self.input.next()? else {
            return Ok(Scan::Mismatch);
        };
        if !is_name_start(first) {
            return Ok(Scan::Mismatch);
        }
        self.scan_name(first)?;
        if self.reserved_tags.contains(self.name_buf.as_str()) {
            return Ok(Scan::Mismatch);
        }
        self.skip_space()?;
        match self.input.next()? {
            Some('>') => Ok(Scan::Match),
            _ => Ok(Scan::Mismatch),
        }
    }

    fn scan_open_tag(&mut self, first: char) -> Result<Scan, SourceError> {
        self.scan_name(first)?;
        if self.reserved_tags.contains(self.name_buf.as_str()) {
            // reserved tags pass through verbatim as literal text
            return Ok(Scan::Mismatch);
        }
        loop {
            self.skip_space()?;
            match self.input.next()? {
                None => return Ok(Scan::Mismatch),
                Some('>') => return Ok(Scan::Match),
                Some('/') => {
                    return Ok(if self.input.next()? == Some('>') {
                        Scan::Match
                    } else {
                        Scan::Mismatch
                    });
                }
                Some(ch) if is_name_start(ch) => {
                    if self.scan_attribute(ch)? == Scan::Mismatch {
                        return Ok(Scan::Mismatch);
                    }
                }
                Some(_) => return Ok(Scan::Mismatch),
            }
        }
    }

    fn scan_attribute(&mut self, first: char) -> Result<Scan, SourceError> {
        self.scan_name(first)?;
        self.skip_space()?;
        if self.input.peek()? != Some('=') {
            // attribute without a value
            return Ok(Scan::Match);
        }
        self.input.next()?;
        self.skip_space()?;
        match self.input.next()? {
            None => Ok(Scan::Mismatch),
            Some(quote @ ('"' | '\'')) => loop {
                match self.input.next()? {
                    None => return Ok(Scan::Mismatch),
                    Some(ch) if ch == quote => return Ok(Scan::Match),
                    Some(_) => {}
                }
            },
            Some('>') => {
                // empty unquoted value; let the tag loop see the '>'
                self.input.back(1);
                Ok(Scan::Match)
            }
            Some(_) => loop {
                match self.input.next()? {
                    Some('>') => {
                        self.input.back(1);
                        return Ok(Scan::Match);
                    }
                    Some(ch) if is_space(ch) => return Ok(Scan::Match),
                    Some(_) => {}
                    None => return Ok(Scan::Match),
                }
            },
        }
    }

    /// Reads a tag or attribute name into `name_buf`, starting with the
    /// already-consumed `first`. The terminating character stays unconsumed.
    fn scan_name(&mut self, first: char) -> Result<(), SourceError> {
        self.name_buf.clear();
        self.name_buf.push(first);
        loop {
            match self.input.next()? {
                Some(ch) if is_name_char(ch) => self.name_buf.push(ch),
                Some(_) => {
                    self.input.back(1);
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    // -- entity scanning; '&' has been consumed --

    /// On a match, the decoded code points are queued in `pending` (reversed,
    /// so `pop` yields them in order).
    fn scan_entity(&mut self) -> Result<Scan, SourceError> {
        match self.input.next()? {
            Some('#') => self.scan_numeric_reference(),
            Some(ch) if ch.is_ascii_alphabetic() => {
                self.name_buf.clear();
                self.name_buf.push(ch);
                loop {
                    match self.input.next()? {
                        Some(c) if c.is_ascii_alphanumeric() => self.name_buf.push(c),
                        Some(';') => break,
                        // named references require the ';' so that text like
                        // "a &break; the container" is not mangled
                        _ => return Ok(Scan::Mismatch),
                    }
                }
                match entities::lookup(&self.name_buf) {
                    Some(expansion) => {
                        self.pending.extend(expansion.chars().rev());
                        Ok(Scan::Match)
                    }
                    None => Ok(Scan::Mismatch),
                }
            }
            _ => Ok(Scan::Mismatch),
        }
    }

    fn scan_numeric_reference(&mut self) -> Result<Scan, SourceError> {
        self.name_buf.clear();
        let base = match self.input.next()? {
            Some(ch) if ch.is_ascii_digit() => {
                self.name_buf.push(ch);
                10
            }
            Some('x' | 'X') => 16,
            _ => return Ok(Scan::Mismatch),
        };
        loop {
            match self.input.next()? {
                Some(ch) if ch.is_digit(base) => self.name_buf.push(ch),
                Some(';') | None => break,
                Some(ch) if is_space(ch) => {
                    // old HTML lets whitespace end a numeric reference; the
                    // whitespace itself belongs to the following text
                    self.input.back(1);
                    break;
                }
                Some(_) => return Ok(Scan::Mismatch),
            }
        }
        if self.name_buf.is_empty() {
            return Ok(Scan::Mismatch);
        }
        let value = self.name_buf.chars().try_fold(0u32, |acc, ch| {
            let digit = ch.to_digit(base)?;
            acc.checked_mul(base)?.checked_add(digit)
        });
        match value.and_then(char::from_u32) {
            Some(decoded) => {
                self.pending.push(decoded);
                Ok(Scan::Match)
            }
            None => Ok(Scan::Mismatch),
        }
    }

    // -- small helpers --

    fn skip(&mut self, n: usize) -> Result<(), SourceError> {
        for _ in 0..n {
            self.input.next()?;
        }
        Ok(())
    }

    fn skip_space(&mut self) -> Result<(), SourceError> {
        loop {
            match self.input.next()? {
                Some(ch) if is_space(ch) => {}
                Some(_) => {
                    self.input.back(1);
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    fn lookahead_matches(&mut self, text: &str) -> Result<bool, SourceError> {
        for (i, expected) in text.chars().enumerate() {
            if self.input.peek_at(i)? != Some(expected) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<S: CharSource> Iterator for HtmlStripFilter<S> {
    type Item = Result<char, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

/// Strips `input` in one call. In-memory input cannot fail.
pub fn strip_html(input: &str) -> String {
    let mut filter = HtmlStripFilter::new(input.chars());
    let mut output = String::new();
    while let Ok(Some(ch)) = filter.read() {
        output.push(ch);
    }
    output
}

fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch.is_alphabetic()
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_' | ':') || ch.is_alphabetic()
}

#[cfg(test)]
mod tests {
    use super::strip_html;

    #[test]
    fn bare_ampersand_is_literal() {
        assert_eq!(strip_html("Here is an &."), "Here is an &.");
        assert_eq!(strip_html("fish & chips"), "fish & chips");
        assert_eq!(strip_html("trailing &"), "trailing &");
    }

    #[test]
    fn lone_angle_brackets_are_literal() {
        assert_eq!(strip_html("1 < 2 > 0"), "1 < 2 > 0");
        assert_eq!(strip_html("<"), "<");
        assert_eq!(strip_html("< p>"), "< p>");
    }

    #[test]
    fn unterminated_constructs_fall_back_to_text() {
        assert_eq!(strip_html("</close"), "</close");
        assert_eq!(strip_html("<!-- never closed"), "<!-- never closed");
        assert_eq!(strip_html("<? no end"), "<? no end");
        assert_eq!(strip_html("<a href=\"x"), "<a href=\"x");
    }

    #[test]
    fn self_closing_tag_strips_to_one_space() {
        assert_eq!(strip_html("a<br/>b"), "a b");
        assert_eq!(strip_html("a<br />b"), "a b");
    }

    #[test]
    fn declarations_and_cdata_strip() {
        assert_eq!(strip_html("<!DOCTYPE html>x"), " x");
        assert_eq!(strip_html("<![CDATA[ 1 > 0 ]]>x"), " x");
        assert_eq!(strip_html("<!>x"), " x");
        assert_eq!(
            strip_html("<!ENTITY amp CDATA \"&#38;\" -- ampersand, U+0026 --> x"),
            "  x"
        );
    }

    #[test]
    fn numeric_reference_terminated_by_whitespace_or_eof() {
        assert_eq!(strip_html("&#61 x"), "= x");
        assert_eq!(strip_html("&#61"), "=");
        assert_eq!(strip_html("&#x3E"), ">");
    }

    #[test]
    fn invalid_numeric_references_stay_literal() {
        assert_eq!(strip_html("&#;"), "&#;");
        assert_eq!(strip_html("&#x;"), "&#x;");
        assert_eq!(strip_html("&#zz;"), "&#zz;");
        // over u32::MAX
        assert_eq!(strip_html("&#99999999999;"), "&#99999999999;");
        // surrogate code point
        assert_eq!(strip_html("&#xD800;"), "&#xD800;");
    }

    #[test]
    fn quoted_attribute_values_hide_brackets() {
        assert_eq!(strip_html("a<x y=\"1 > 0\">b"), "a b");
        assert_eq!(strip_html("a<x y='<'>b"), "a b");
    }
}
