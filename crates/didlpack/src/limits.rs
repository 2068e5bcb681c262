//! # Decoding Ceilings
//!
//! The wire format carries no intrinsic bound on table size, nesting depth or
//! element counts, so every decode runs against a `Limits` value. Exceeding any
//! ceiling is a format error, never a panic or an unbounded loop.

/// The maximum nesting depth for values and types before trapping.
pub const MAX_RECURSION_DEPTH: usize = 64;

/// The longest text form a type renders before it is cut off with `...`.
pub const MAX_TYPE_TEXT_LEN: usize = 64 * 1024;

/// Which ceiling was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    MessageLen,
    TableLen,
    Args,
    Depth,
    ResolvePasses,
    Values,
}

/// Ceilings applied to a single encode or decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest accepted message, in bytes.
    pub max_message_len: usize,
    /// Largest accepted type table, in entries.
    pub max_table_len: usize,
    /// Largest accepted argument list.
    pub max_args: usize,
    /// Deepest accepted nesting of values (and of recursive type lookups).
    pub max_depth: usize,
    /// Most resolution passes over the type table.
    pub max_resolve_passes: usize,
    /// Most value nodes decoded from one message.
    pub max_values: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_len: 2 * 1024 * 1024,
            max_table_len: 1024,
            max_args: 1024,
            max_depth: MAX_RECURSION_DEPTH,
            max_resolve_passes: 2048,
            max_values: 1 << 20,
        }
    }
}

impl Limits {
    pub fn with_max_message_len(mut self, n: usize) -> Self {
        self.max_message_len = n;
        self
    }

    pub fn with_max_table_len(mut self, n: usize) -> Self {
        self.max_table_len = n;
        self
    }

    pub fn with_max_args(mut self, n: usize) -> Self {
        self.max_args = n;
        self
    }

    pub fn with_max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    pub fn with_max_resolve_passes(mut self, n: usize) -> Self {
        self.max_resolve_passes = n;
        self
    }

    pub fn with_max_values(mut self, n: usize) -> Self {
        self.max_values = n;
        self
    }
}
