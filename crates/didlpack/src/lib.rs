//! # Didlpack
//!
//! A bit-exact codec for DIDL, a self-describing binary interface format.
//!
//! ## Philosophy
//!
//! - **Self-describing**: every message carries the table of types its values
//!   are laid out by. The decoder needs no schema.
//! - **Bounded**: decoding is zero-copy and bounds-checked, and runs under
//!   explicit [`Limits`]. Hostile input yields an [`Error`], never a panic or
//!   an unbounded loop.
//! - **Acyclic**: recursive types are arena entries ([`TypeEnv`]) referenced by
//!   index, so type handles are plain shared trees.
//!
//! ## Format
//!
//! ```text
//! message  := "DIDL" table args
//! table    := uLEB128(count) descriptor*
//! args     := sLEB128(count) type-ref* value*
//! type-ref := sLEB128(table index | primitive opcode)
//! ```
//!
//! Fixed-width numbers are little-endian; `nat` and `int` are LEB128 of
//! arbitrary precision.

pub mod decoder;
pub mod encoder;
pub mod env;
pub mod error;
pub mod label;
pub mod leb128;
pub mod limits;
pub mod principal;
mod resolve;
pub mod table;
pub mod types;
pub mod value;

#[cfg(test)]
mod tests;

pub use decoder::Decoder;
pub use decoder::Message;
pub use decoder::decode;
pub use decoder::decode_with_limits;
pub use encoder::Encoder;
pub use encoder::encode;
pub use encoder::encode_with_env;
pub use env::TypeEnv;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use label::Label;
pub use label::field_hash;
pub use limits::Limit;
pub use limits::Limits;
pub use limits::MAX_RECURSION_DEPTH;
pub use limits::MAX_TYPE_TEXT_LEN;
pub use principal::Principal;
pub use table::TypeTable;
pub use types::Field;
pub use types::Fields;
pub use types::FuncType;
pub use types::Mode;
pub use types::Opcode;
pub use types::ServiceType;
pub use types::TypeKind;
pub use types::WireType;
pub use value::FuncRef;
pub use value::Value;
