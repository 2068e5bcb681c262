//! # Error Definitions
//!
//! Failures of the bridge between host values and wire values, plus the codec
//! and transport failures it passes through.

use std::fmt;

use crate::transport::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Encoding or decoding the wire message failed.
    Codec(didlpack::Error),
    /// A host value does not fit the declared wire type, or the reverse.
    TypeMismatch { expected: String, found: String },
    /// A record lacks a field the type requires.
    MissingField(String),
    /// A host map key has no counterpart in the target record type.
    UnknownField(String),
    /// Two host keys map to the same wire field.
    DuplicateField(String),
    /// A variant tag the type does not declare.
    UnknownVariant(String),
    /// A map used as a variant must have exactly one populated arm.
    AmbiguousVariant { populated: usize },
    /// No wire type can be inferred for this host value.
    UnknownValueType(String),
    /// The wire type has no default value.
    UnknownType(String),
    /// The nested depth of the values exceeded the safety limit.
    RecursionLimitExceeded,
    /// The call never produced reply bytes.
    Transport(TransportError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Codec(e) => write!(f, "codec error: {}", e),
            Error::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Error::MissingField(name) => write!(f, "missing field '{}'", name),
            Error::UnknownField(name) => write!(f, "unknown field '{}'", name),
            Error::DuplicateField(name) => write!(f, "field '{}' given twice", name),
            Error::UnknownVariant(tag) => write!(f, "unknown variant '{}'", tag),
            Error::AmbiguousVariant { populated } => {
                write!(f, "variant needs exactly one populated arm, found {}", populated)
            }
            Error::UnknownValueType(what) => write!(f, "cannot infer a wire type for {}", what),
            Error::UnknownType(ty) => write!(f, "no default value for type {}", ty),
            Error::RecursionLimitExceeded => write!(f, "recursion limit exceeded"),
            Error::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<didlpack::Error> for Error {
    fn from(e: didlpack::Error) -> Self {
        Self::Codec(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
