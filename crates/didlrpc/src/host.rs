//! Host values: the untyped shapes callers build and receive.

use std::collections::BTreeMap;

use didlpack::FuncRef;
use didlpack::Principal;
use num_bigint::BigInt;
use num_bigint::BigUint;

use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Host {
    Null,
    Reserved,
    Bool(bool),
    Nat(BigUint),
    Int(BigInt),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Blob(Vec<u8>),
    List(Vec<Host>),
    /// A record keyed by host field name.
    Map(BTreeMap<String, Host>),
    Opt(Option<Box<Host>>),
    /// A tagged choice.
    Variant(String, Box<Host>),
    Principal(Principal),
    Func(FuncRef),
    Service(Principal),
}

impl Host {
    pub fn some(v: impl Into<Host>) -> Self {
        Host::Opt(Some(Box::new(v.into())))
    }

    pub fn none() -> Self {
        Host::Opt(None)
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Host)>) -> Self {
        Host::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn variant(tag: impl Into<String>, v: impl Into<Host>) -> Self {
        Host::Variant(tag.into(), Box::new(v.into()))
    }

    /// Looks up a map entry.
    pub fn field(&self, name: &str) -> Result<&Host> {
        match self {
            Host::Map(m) => m.get(name).ok_or_else(|| Error::MissingField(name.to_string())),
            other => Err(Error::TypeMismatch {
                expected: "map".into(),
                found: other.kind_name().into(),
            }),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Host::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Host::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short shape name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Host::Null => "null",
            Host::Reserved => "reserved",
            Host::Bool(_) => "bool",
            Host::Nat(_) => "nat",
            Host::Int(_) => "int",
            Host::U8(_) => "u8",
            Host::U16(_) => "u16",
            Host::U32(_) => "u32",
            Host::U64(_) => "u64",
            Host::I8(_) => "i8",
            Host::I16(_) => "i16",
            Host::I32(_) => "i32",
            Host::I64(_) => "i64",
            Host::F32(_) => "f32",
            Host::F64(_) => "f64",
            Host::Text(_) => "text",
            Host::Blob(_) => "blob",
            Host::List(_) => "list",
            Host::Map(_) => "map",
            Host::Opt(_) => "optional",
            Host::Variant(..) => "variant",
            Host::Principal(_) => "principal",
            Host::Func(_) => "func",
            Host::Service(_) => "service",
        }
    }
}

macro_rules! from_scalar {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Host {
                fn from(v: $t) -> Self {
                    Host::$variant(v)
                }
            }
        )*
    };
}

from_scalar! {
    bool => Bool,
    BigUint => Nat,
    BigInt => Int,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Text,
    Vec<u8> => Blob,
    Principal => Principal,
}

impl From<&str> for Host {
    fn from(v: &str) -> Self {
        Host::Text(v.to_string())
    }
}

impl From<Vec<Host>> for Host {
    fn from(v: Vec<Host>) -> Self {
        Host::List(v)
    }
}

impl<T: Into<Host>> From<Option<T>> for Host {
    fn from(v: Option<T>) -> Self {
        Host::Opt(v.map(|x| Box::new(x.into())))
    }
}
