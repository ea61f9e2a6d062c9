use thiserror::Error;

pub type SaxResult<T> = Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("XML Stream Err: stream is bad")]
    StreamBad,

    #[error("XML Parsing Err: Unexpected EOF in {0}")]
    UnexpectedEof(&'static str),

    // Generic
    #[error("XML Parsing Err: {0}")]
    Malformed(String),

    #[error("XML Parsing Err: there can't be two prefixes in {0}")]
    DuplicatePrefix(&'static str),

    #[error("XML Parsing Err: unable to resolve entity '&{0};'")]
    UnresolvedEntity(String),

    #[error("XML Parsing Err: {0} not implemented")]
    Unimplemented(String),

    #[error("XML Usage Err: {0}")]
    Usage(&'static str),

    #[error("Entity Err: redefinition of built-in entity '{0}'")]
    BuiltinEntity(String),

    #[error("Event Err: character data must not be empty")]
    EmptyCharacters,

    #[error("Name Err: '{0}' is not a qualified name")]
    InvalidQName(String),
}
