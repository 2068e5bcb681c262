//! Opaque binary principal identifiers.
//!
//! The codec never looks inside a principal; it only frames the bytes.

use std::fmt;

use crate::error::Error;
use crate::error::Result;

/// Longest principal the protocol issues, in bytes.
pub const MAX_PRINCIPAL_LEN: usize = 29;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal(Vec<u8>);

impl Principal {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_PRINCIPAL_LEN {
            return Err(Error::PrincipalTooLong(bytes.len()));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// The anonymous caller, `0x04`.
    pub fn anonymous() -> Self {
        Self(vec![0x04])
    }

    /// The management canister, the empty principal.
    pub fn management() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
