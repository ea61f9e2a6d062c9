use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, satisfy},
    combinator::{all_consuming, map, recognize},
    multi::many0_count,
    sequence::{pair, separated_pair},
    IResult,
};

// Name characters are restricted to ASCII on purpose.

// NameStartChar ::= [A-Z] | "_" | [a-z]
#[inline]
pub(crate) fn is_namestart_char(chr: char) -> bool {
    chr.is_ascii_alphabetic() || chr == '_'
}

// NameChar ::= [A-Z] | [a-z] | [0-9] | "-" | "_" | "."
#[inline]
pub(crate) fn is_namechar(chr: char) -> bool {
    chr.is_ascii_alphanumeric() || chr == '-' || chr == '_' || chr == '.'
}

// S ::= (#x20 | #x9 | #xD | #xA)+
#[inline]
pub(crate) fn is_whitespace(chr: char) -> bool {
    chr == '\u{20}' || chr == '\u{9}' || chr == '\u{D}' || chr == '\u{A}'
}

pub(crate) fn is_whitespace_str(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_whitespace)
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(is_namestart_char),
        many0_count(satisfy(is_namechar)),
    ))(input)
}

/// Splits `prefix:local` or `local` into `(prefix, local)`.
///
/// The local part after a prefix may start with any name character, the same
/// as the reader accepts in tags.
pub(crate) fn qname(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(alt((
        //first try harder alternative
        separated_pair(name, char(':'), take_while1(is_namechar)),
        map(name, |local| ("", local)),
    )))(input)
}

/// Incremental matcher for a closing delimiter such as `-->` or `?>`.
///
/// Characters that turn out not to belong to the delimiter are handed back
/// to the caller in document order.
#[derive(Debug)]
pub(crate) struct Terminator {
    pattern: &'static [char],
    matched: usize,
}

impl Terminator {
    pub(crate) fn new(pattern: &'static [char]) -> Terminator {
        Terminator {
            pattern,
            matched: 0,
        }
    }

    /// Feeds one character. Returns true once the whole delimiter was seen.
    pub(crate) fn feed(&mut self, chr: char, out: &mut String) -> bool {
        if chr == self.pattern[self.matched] {
            self.matched += 1;
            return self.matched == self.pattern.len();
        }

        // broken match: flush held characters until the rest is a prefix again.
        // Unlike a plain flush-and-reset, `chr` itself may start the delimiter.
        let mut held: Vec<char> = self.pattern[..self.matched].to_vec();
        held.push(chr);
        let mut start = 0;
        while !self.pattern.starts_with(&held[start..]) {
            out.push(held[start]);
            start += 1;
        }
        self.matched = held.len() - start;
        false
    }
}
