//! Character cursor the event reader pulls from.

/// How far behind the furthest read position [`CharacterStream::unget`] may step.
///
/// The reader needs two characters of pushback when a `/>` is found at the end
/// of an attribute list.
pub const MAX_PUSHBACK: usize = 2;

/// A bidirectional source of characters with sticky failure flags.
///
/// Once `bad()` returns true no further result of `get`/`unget` is meaningful.
///
/// The reader steps back at most [`MAX_PUSHBACK`] characters behind the
/// furthest character it has read, so a source must support at least that many
/// consecutive `unget` calls without going bad.
pub trait CharacterSource {
    /// Returns the next character and advances, or `None` at the end of input.
    /// Reaching the end latches both `eof` and `bad`.
    fn get(&mut self) -> Option<char>;

    /// Steps back by one character.
    fn unget(&mut self);

    fn eof(&self) -> bool;

    fn bad(&self) -> bool;

    /// Index of the next character `get` would return.
    fn position(&self) -> usize;
}

/// In-memory [`CharacterSource`] over an immutable text buffer.
#[derive(Clone, Debug)]
pub struct CharacterStream {
    chars: Vec<char>,
    cursor: usize,
    furthest: usize,
    bad: bool,
    eof: bool,
}

impl CharacterStream {
    pub fn new(text: &str) -> CharacterStream {
        CharacterStream {
            chars: text.chars().collect(),
            cursor: 0,
            furthest: 0,
            bad: false,
            eof: false,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl From<&str> for CharacterStream {
    fn from(text: &str) -> Self {
        CharacterStream::new(text)
    }
}

impl CharacterSource for CharacterStream {
    fn get(&mut self) -> Option<char> {
        match self.chars.get(self.cursor) {
            Some(&c) => {
                self.cursor += 1;
                if self.cursor > self.furthest {
                    self.furthest = self.cursor;
                }
                Some(c)
            }
            None => {
                self.eof = true;
                self.bad = true;
                None
            }
        }
    }

    fn unget(&mut self) {
        // clamp at 0, the latched flag makes any further read fatal for the caller
        if self.cursor == 0 || self.furthest - self.cursor >= MAX_PUSHBACK {
            self.bad = true;
            return;
        }
        self.cursor -= 1;
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn bad(&self) -> bool {
        self.bad
    }

    fn position(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_until_end() {
        let mut s = CharacterStream::new("ab");
        assert_eq!(s.get(), Some('a'));
        assert_eq!(s.get(), Some('b'));
        assert!(!s.eof());
        assert!(!s.bad());

        assert_eq!(s.get(), None);
        assert!(s.eof());
        assert!(s.bad());
        assert_eq!(s.position(), 2);

        // flags stay latched
        assert_eq!(s.get(), None);
        assert!(s.eof());
    }

    #[test]
    fn multibyte_characters() {
        let mut s = CharacterStream::new("ü<");
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(), Some('ü'));
        assert_eq!(s.get(), Some('<'));
    }

    #[test]
    fn unget_rereads() {
        let mut s = CharacterStream::new("xyz");
        s.get();
        s.get();
        s.unget();
        assert_eq!(s.position(), 1);
        assert_eq!(s.get(), Some('y'));
        assert!(!s.bad());
    }

    #[test]
    fn unget_two_deep() {
        let mut s = CharacterStream::new("/>a");
        s.get();
        s.get();
        s.unget();
        s.unget();
        assert!(!s.bad());
        assert_eq!(s.get(), Some('/'));
        assert_eq!(s.get(), Some('>'));
        assert_eq!(s.get(), Some('a'));
    }

    #[test]
    fn unget_beyond_depth_is_bad() {
        let mut s = CharacterStream::new("abcd");
        s.get();
        s.get();
        s.get();
        s.unget();
        s.unget();
        assert!(!s.bad());
        s.unget();
        assert!(s.bad());
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn unget_at_start_clamps() {
        let mut s = CharacterStream::new("a");
        s.unget();
        assert!(s.bad());
        assert!(!s.eof());
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn empty_buffer() {
        let mut s = CharacterStream::from("");
        assert!(s.is_empty());
        assert_eq!(s.get(), None);
        assert!(s.eof());
    }
}
