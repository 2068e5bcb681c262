//! # Field Labels
//!
//! Record and variant fields are identified on the wire by a 32-bit id: the
//! field hash of the name, or a small integer for positional (tuple) fields.
//! The sorted order of these ids is the implicit numbering of variant arms.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

/// `hash(name) = (Σ utf8[i] * 223^(k-i)) mod 2^32`, k = byte length - 1.
pub fn field_hash(name: &str) -> u32 {
    name.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(223).wrapping_add(b as u32))
}

/// A record or variant field identifier.
///
/// Equality, ordering and hashing look only at [`Label::id`], so a decoded
/// `Id(4895187)` equals the `Named("bar")` it was encoded from.
#[derive(Debug, Clone)]
pub enum Label {
    /// A textual name; its id is the field hash.
    Named(String),
    /// A bare numeric id, as seen after decoding.
    Id(u32),
    /// A tuple position.
    Unnamed(u32),
}

impl Label {
    pub fn id(&self) -> u32 {
        match self {
            Label::Named(name) => field_hash(name),
            Label::Id(id) | Label::Unnamed(id) => *id,
        }
    }

    /// The textual name, if the label still carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Label::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Named(name) => write!(f, "{}", name),
            Label::Id(id) | Label::Unnamed(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label::Named(name.to_string())
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Label::Named(name)
    }
}

impl From<u32> for Label {
    fn from(id: u32) -> Self {
        Label::Id(id)
    }
}
