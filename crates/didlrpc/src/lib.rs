//! # Didlrpc
//!
//! Bridges loosely typed host values and `didlpack` wire values, and carries
//! calls to remote canisters over a pluggable transport.
//!
//! ## Philosophy
//!
//! - **Closed Shapes**: host values are the [`Host`] enum. Inference and
//!   conversion are plain pattern matches over it.
//! - **Type-Directed**: conversion always follows a wire type, declared or
//!   inferred. Field names pass through an explicit [`FieldMap`].
//! - **Byte-Oriented Transport**: the [`Transport`] sees encoded messages
//!   only; signing, HTTP and polling live behind it.

pub mod client;
pub mod convert;
pub mod error;
pub mod fields;
pub mod host;
pub mod infer;
pub mod marshal;
pub mod transport;
pub mod zero;

#[cfg(test)]
mod tests;

pub use client::Client;
pub use client::Signature;
pub use convert::from_host;
pub use convert::to_host;
pub use error::Error;
pub use error::Result;
pub use fields::FieldMap;
pub use fields::normalize;
pub use host::Host;
pub use infer::infer_type;
pub use marshal::marshal;
pub use marshal::marshal_typed;
pub use marshal::marshal_with;
pub use marshal::unmarshal;
pub use marshal::unmarshal_typed;
pub use marshal::unmarshal_with;
pub use transport::CallKind;
pub use transport::Request;
pub use transport::Transport;
pub use transport::TransportError;
pub use zero::zero_value;
