mod entities;
pub mod error;
mod internal;
pub mod parser;

use std::{fmt, str::FromStr};

pub use entities::{EntityTable, BUILTIN_ENTITIES};
pub use error::{Error, SaxResult};

// Pull API

/// A name with an optional namespace prefix.
///
/// Prefixes are captured but never resolved, so readers always leave
/// `namespace_uri` empty.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct QName {
    pub namespace_uri: String,
    pub local_part: String,
    pub prefix: String,
}

impl QName {
    pub fn new(namespace_uri: &str, local_part: &str, prefix: &str) -> QName {
        QName {
            namespace_uri: namespace_uri.to_owned(),
            local_part: local_part.to_owned(),
            prefix: prefix.to_owned(),
        }
    }

    pub fn local(local_part: &str) -> QName {
        QName::new("", local_part, "")
    }

    pub fn prefixed(prefix: &str, local_part: &str) -> QName {
        QName::new("", local_part, prefix)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.local_part)
        } else {
            write!(f, "{}:{}", self.prefix, self.local_part)
        }
    }
}

impl FromStr for QName {
    type Err = Error;

    fn from_str(s: &str) -> SaxResult<QName> {
        match internal::qname(s) {
            Ok((_, (prefix, local))) => Ok(QName::prefixed(prefix, local)),
            Err(_e) => Err(Error::InvalidQName(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: QName, value: &str) -> Attribute {
        Attribute {
            name,
            value: value.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StartElement {
    pub name: QName,
    /// In document order. Duplicates are kept.
    pub attributes: Vec<Attribute>,
}

impl StartElement {
    pub fn new(name: QName, attributes: Vec<Attribute>) -> StartElement {
        StartElement { name, attributes }
    }

    /// First attribute whose name equals `name`.
    pub fn attribute_by_name(&self, name: &QName) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| &attr.name == name)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EndElement {
    pub name: QName,
}

impl EndElement {
    pub fn new(name: QName) -> EndElement {
        EndElement { name }
    }
}

/// Character data. Never empty.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Characters {
    data: String,
    is_whitespace: bool,
}

impl Characters {
    pub fn new(data: String) -> SaxResult<Characters> {
        if data.is_empty() {
            return Err(Error::EmptyCharacters);
        }
        let is_whitespace = internal::is_whitespace_str(&data);
        Ok(Characters {
            data,
            is_whitespace,
        })
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// True when the data consists only of XML whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.is_whitespace
    }

    pub fn into_data(self) -> String {
        self.data
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessingInstruction {
    pub target: String,
    pub data: String,
}

impl ProcessingInstruction {
    pub fn new(target: &str, data: &str) -> ProcessingInstruction {
        ProcessingInstruction {
            target: target.to_owned(),
            data: data.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub text: String,
}

impl Comment {
    pub fn new(text: &str) -> Comment {
        Comment {
            text: text.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    StartElement(StartElement),
    EndElement(EndElement),
    Characters(Characters),
    ProcessingInstruction(ProcessingInstruction),
    Comment(Comment),
}

impl Event {
    pub fn is_start_element(&self) -> bool {
        matches!(self, Event::StartElement(_))
    }

    pub fn is_end_element(&self) -> bool {
        matches!(self, Event::EndElement(_))
    }
}
