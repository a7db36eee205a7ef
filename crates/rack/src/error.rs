use std::fmt;
use thiserror::Error as ThisError;

///
/// RackError
/// Structured runtime error with a stable classification.
///

#[derive(Debug, ThisError)]
#[error("{origin}:{class}: {message}")]
pub struct RackError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
    pub parse: Option<ParseErrorDetail>,
}

impl RackError {
    #[must_use]
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            parse: None,
        }
    }

    #[must_use]
    pub fn key_not_found(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorClass::Key,
            ErrorOrigin::Store,
            format!("key not found: {key}"),
        )
    }

    #[must_use]
    pub fn key_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::Key,
            ErrorOrigin::Store,
            format!(
                "key mismatch: expected '{}', value canonicalizes to '{}'",
                expected.into(),
                found.into()
            ),
        )
    }

    #[must_use]
    pub fn parse(message: impl Into<String>, offset: usize, expected: Vec<&'static str>) -> Self {
        Self {
            class: ErrorClass::QueryParse,
            origin: ErrorOrigin::Query,
            message: message.into(),
            parse: Some(ParseErrorDetail { offset, expected }),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::Key)
    }
}

///
/// ParseErrorDetail
/// Byte offset and expected-token set attached to a `QueryParse` error.
///

#[derive(Clone, Debug)]
pub struct ParseErrorDetail {
    pub offset: usize,
    pub expected: Vec<&'static str>,
}

///
/// ErrorClass
/// Error taxonomy from spec §7: kinds, not names.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Schema,
    Field,
    Key,
    QueryParse,
    QueryType,
    Cycle,
    Io,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Schema => "schema",
            Self::Field => "field",
            Self::Key => "key",
            Self::QueryParse => "query_parse",
            Self::QueryType => "query_type",
            Self::Cycle => "cycle",
            Self::Io => "io",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which component raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Registry,
    Codec,
    Query,
    Relation,
    Store,
    Backup,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Registry => "registry",
            Self::Codec => "codec",
            Self::Query => "query",
            Self::Relation => "relation",
            Self::Store => "store",
            Self::Backup => "backup",
        };
        write!(f, "{label}")
    }
}

impl From<sled::Error> for RackError {
    fn from(err: sled::Error) -> Self {
        Self::new(ErrorClass::Io, ErrorOrigin::Store, err.to_string())
    }
}

impl From<serde_json::Error> for RackError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorClass::Field, ErrorOrigin::Codec, err.to_string())
    }
}

impl From<zip::result::ZipError> for RackError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::new(ErrorClass::Io, ErrorOrigin::Backup, err.to_string())
    }
}

impl From<std::io::Error> for RackError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorClass::Io, ErrorOrigin::Backup, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RackError>;
