use crate::source::{CharSource, SourceError};

/// Initial capacity of the lookahead window, in characters. Scanning grows
/// past this transparently; it is a tuning knob, not a correctness limit.
pub const DEFAULT_READ_AHEAD: usize = 8192;

/// Growable lookahead window over a character source.
///
/// Fetched characters accumulate in `buf` until `commit` permanently consumes
/// everything before the cursor. `mark`/`rewind` move only the cursor, so an
/// abandoned scan loses nothing and committed characters are never re-read.
pub(crate) struct Lookahead<S> {
    source: S,
    buf: Vec<char>,
    cursor: usize,
    consumed: usize,
    at_end: bool,
}

impl<S: CharSource> Lookahead<S> {
    pub(crate) fn new(source: S, capacity: usize) -> Self {
        Self {
            source,
            buf: Vec::with_capacity(capacity),
            cursor: 0,
            consumed: 0,
            at_end: false,
        }
    }

    /// Absolute input position (in characters) of the cursor.
    pub(crate) fn pos(&self) -> usize {
        self.consumed + self.cursor
    }

    fn fill_to(&mut self, len: usize) -> Result<(), SourceError> {
        while self.buf.len() < len && !self.at_end {
            match self.source.next_char()? {
                Some(ch) => self.buf.push(ch),
                None => self.at_end = true,
            }
        }
        Ok(())
    }

    pub(crate) fn next(&mut self) -> Result<Option<char>, SourceError> {
        self.fill_to(self.cursor + 1)?;
        match self.buf.get(self.cursor) {
            Some(&ch) => {
                self.cursor += 1;
                Ok(Some(ch))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn peek(&mut self) -> Result<Option<char>, SourceError> {
        self.peek_at(0)
    }

    /// Character `k` positions ahead of the cursor, without consuming.
    pub(crate) fn peek_at(&mut self, k: usize) -> Result<Option<char>, SourceError> {
        self.fill_to(self.cursor + k + 1)?;
        Ok(self.buf.get(self.cursor + k).copied())
    }

    pub(crate) fn mark(&self) -> usize {
        self.cursor
    }

    pub(crate) fn rewind(&mut self, mark: usize) {
        debug_assert!(mark <= self.cursor);
        self.cursor = mark;
    }

    /// Step back over `n` already-fetched characters.
    pub(crate) fn back(&mut self, n: usize) {
        debug_assert!(n <= self.cursor);
        self.cursor -= n;
    }

    /// Permanently consume everything before the cursor.
    pub(crate) fn commit(&mut self) {
        self.consumed += self.cursor;
        self.buf.drain(..self.cursor);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::Lookahead;

    fn over(text: &str, capacity: usize) -> Lookahead<std::vec::IntoIter<char>> {
        Lookahead::new(text.chars().collect::<Vec<_>>().into_iter(), capacity)
    }

    #[test]
    fn next_and_pos_track_consumption() {
        let mut buf = over("abc", 8);
        assert_eq!(buf.pos(), 0);
        assert_eq!(buf.next().unwrap(), Some('a'));
        assert_eq!(buf.next().unwrap(), Some('b'));
        assert_eq!(buf.pos(), 2);
        buf.commit();
        assert_eq!(buf.pos(), 2);
        assert_eq!(buf.next().unwrap(), Some('c'));
        assert_eq!(buf.next().unwrap(), None);
        assert_eq!(buf.next().unwrap(), None);
    }

    #[test]
    fn rewind_restores_an_abandoned_scan() {
        let mut buf = over("abcdef", 8);
        assert_eq!(buf.next().unwrap(), Some('a'));
        let mark = buf.mark();
        assert_eq!(buf.next().unwrap(), Some('b'));
        assert_eq!(buf.next().unwrap(), Some('c'));
        buf.rewind(mark);
        assert_eq!(buf.next().unwrap(), Some('b'));
        buf.back(1);
        assert_eq!(buf.next().unwrap(), Some('b'));
    }

    #[test]
    fn grows_far_beyond_initial_capacity() {
        let text: String = std::iter::repeat('x').take(10_000).collect();
        let mut buf = over(&text, 4);
        assert_eq!(buf.peek_at(9_999).unwrap(), Some('x'));
        assert_eq!(buf.peek_at(10_000).unwrap(), None);
        // nothing was consumed by peeking
        assert_eq!(buf.pos(), 0);
        for _ in 0..10_000 {
            buf.next().unwrap();
        }
        buf.commit();
        assert_eq!(buf.pos(), 10_000);
        assert_eq!(buf.next().unwrap(), None);
    }

    #[test]
    fn commit_keeps_unread_tail() {
        let mut buf = over("abcd", 8);
        assert_eq!(buf.peek_at(3).unwrap(), Some('d'));
        assert_eq!(buf.next().unwrap(), Some('a'));
        buf.commit();
        assert_eq!(buf.peek().unwrap(), Some('b'));
        assert_eq!(buf.pos(), 1);
    }
}
