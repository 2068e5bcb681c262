//! # Transport Abstraction
//!
//! The boundary to whatever carries a call to a remote canister.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: the transport receives an already encoded argument
//!   message and returns the raw reply message. It never looks inside either.
//! - **Request-Response**: one request, one reply. Envelope signing, HTTP,
//!   polling for update results and certificate checks all live behind this
//!   trait.

use std::fmt;

use didlpack::Principal;

/// Errors that occur at the network/transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer is unreachable or the connection was dropped.
    ConnectionLost(String),
    /// The operation timed out before a response was received.
    Timeout,
    /// The remote peer rejected the payload size.
    PayloadTooLarge,
    /// The canister rejected the call.
    Rejected { code: u32, message: String },
    /// Generic I/O error or internal transport failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::Timeout => write!(f, "Request timed out"),
            Self::PayloadTooLarge => write!(f, "Payload too large for transport"),
            Self::Rejected { code, message } => write!(f, "Call rejected ({}): {}", code, message),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Whether a call may change canister state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Query,
    Update,
}

/// One call, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub canister: Principal,
    pub method: String,
    pub kind: CallKind,
    /// An encoded `DIDL` argument message.
    pub arg: Vec<u8>,
}

/// A mechanism to deliver a request and receive the reply.
///
/// This trait is designed to be object-safe (`Arc<dyn Transport>`).
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a request and waits for the reply message.
    ///
    /// # Invariants
    /// - Must return `Ok(vec)` with the raw reply bytes on success.
    /// - Must return `Err` if the network fails or the call is rejected.
    /// - Should not interpret the argument or reply bytes.
    async fn call(&self, request: &Request) -> Result<Vec<u8>>;
}
