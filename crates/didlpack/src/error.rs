//! # Error Definitions
//!
//! Every way an encode or a decode call can fail. Errors are returned to the
//! caller of that one call; the codec never retries or swallows them.

use std::fmt;

use crate::label::Label;
use crate::limits::Limit;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The wire bytes are malformed or exceed a configured limit.
    Format,
    /// A value does not fit the type it is being encoded against.
    EncodeValue,
}

/// Didlpack serialization and deserialization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input shorter than the 4-byte magic. Carries the input length.
    NoMagic(usize),
    /// The first four bytes are not `DIDL`.
    WrongMagic([u8; 4]),
    /// Buffer exhausted while reading.
    UnexpectedEnd,
    /// A LEB128 number does not fit the integer it is read into.
    Leb128Overflow,
    /// An opcode outside the closed opcode range, or a primitive where a
    /// constructor marker is required.
    InvalidOpcode(i64),
    /// A type reference points past the end of the type table.
    TypeIndexOutOfRange(i64),
    /// Some table slots form a cycle with no base case. Carries the count.
    Unresolved(usize),
    /// Record or variant field ids are not strictly increasing.
    FieldOrder { previous: u32, next: u32 },
    /// Service method names are not strictly increasing.
    MethodOrder(String),
    /// A service method does not refer to a func type.
    NotAFunction(String),
    /// A recursive type reference is not defined in the type environment.
    UnknownRec(usize),
    /// Byte is not a valid boolean.
    InvalidBool(u8),
    /// Byte is not a valid `opt` presence tag.
    InvalidOptTag(u8),
    /// Byte is not a valid principal/func/service reference tag.
    InvalidReferenceTag(u8),
    /// Byte is not a known func annotation.
    InvalidAnnotation(u8),
    /// A variant ordinal beyond the number of arms.
    InvalidDiscriminant { index: u64, arms: usize },
    /// Text data is not valid UTF-8.
    InvalidUtf8,
    /// Principal longer than the protocol allows.
    PrincipalTooLong(usize),
    /// The `empty` type has no values.
    EmptyValue,
    /// A negative element or argument count.
    NegativeCount(i64),
    /// Unconsumed bytes after the last argument value.
    TrailingBytes(usize),
    /// A configured decoding ceiling was hit.
    LimitExceeded(Limit),
    /// The value shape does not match the type.
    ValueMismatch { expected: String, found: &'static str },
    /// A record value lacks a field its type requires.
    MissingField(Label),
    /// A record value carries a field its type does not declare.
    UnexpectedField(Label),
    /// A variant value names an arm its type does not declare.
    UnknownVariantArm(Label),
    /// Fewer values than argument types.
    TooFewValues { types: usize, values: usize },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ValueMismatch { .. }
            | Error::MissingField(_)
            | Error::UnexpectedField(_)
            | Error::UnknownVariantArm(_)
            | Error::TooFewValues { .. }
            | Error::UnknownRec(_) => ErrorKind::EncodeValue,
            _ => ErrorKind::Format,
        }
    }

    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoMagic(0) => write!(f, "no magic bytes: empty input"),
            Error::NoMagic(n) => write!(f, "no magic bytes: input is only {} bytes", n),
            Error::WrongMagic(found) => write!(f, "wrong magic bytes: {:02x?}", found),
            Error::UnexpectedEnd => write!(f, "unexpected end of input"),
            Error::Leb128Overflow => write!(f, "leb128 value overflows"),
            Error::InvalidOpcode(op) => write!(f, "invalid type opcode: {}", op),
            Error::TypeIndexOutOfRange(idx) => write!(f, "type index out of range: {}", idx),
            Error::Unresolved(n) => write!(f, "failed to resolve all types ({} unresolved)", n),
            Error::FieldOrder { previous, next } => {
                write!(f, "field ids not strictly increasing: {} then {}", previous, next)
            }
            Error::MethodOrder(name) => write!(f, "service methods not sorted at '{}'", name),
            Error::NotAFunction(name) => write!(f, "service method '{}' is not a func type", name),
            Error::UnknownRec(id) => write!(f, "recursive type rec{} is not defined", id),
            Error::InvalidBool(b) => write!(f, "invalid bool byte: {:#04x}", b),
            Error::InvalidOptTag(b) => write!(f, "invalid opt tag: {:#04x}", b),
            Error::InvalidReferenceTag(b) => write!(f, "invalid reference tag: {:#04x}", b),
            Error::InvalidAnnotation(b) => write!(f, "invalid func annotation: {:#04x}", b),
            Error::InvalidDiscriminant { index, arms } => {
                write!(f, "variant index {} out of range for {} arms", index, arms)
            }
            Error::InvalidUtf8 => write!(f, "text is not valid utf-8"),
            Error::PrincipalTooLong(n) => write!(f, "principal of {} bytes is too long", n),
            Error::EmptyValue => write!(f, "the empty type has no values"),
            Error::NegativeCount(n) => write!(f, "negative count: {}", n),
            Error::TrailingBytes(n) => write!(f, "too long: {} trailing bytes", n),
            Error::LimitExceeded(limit) => write!(f, "limit exceeded: {:?}", limit),
            Error::ValueMismatch { expected, found } => {
                write!(f, "cannot encode {} value as {}", found, expected)
            }
            Error::MissingField(label) => write!(f, "record value is missing field {}", label),
            Error::UnexpectedField(label) => write!(f, "record type has no field {}", label),
            Error::UnknownVariantArm(label) => write!(f, "variant type has no arm {}", label),
            Error::TooFewValues { types, values } => {
                write!(f, "{} values supplied for {} argument types", values, types)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for didlpack operations.
pub type Result<T> = std::result::Result<T, Error>;
