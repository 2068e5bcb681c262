//! Wire values: what the encoder consumes and the decoder produces.

use num_bigint::BigInt;
use num_bigint::BigUint;

use crate::label::Label;
use crate::principal::Principal;

/// A reference to one method of a remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncRef {
    pub principal: Principal,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Nat(BigUint),
    Int(BigInt),
    Nat8(u8),
    Nat16(u16),
    Nat32(u32),
    Nat64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Reserved,
    Principal(Principal),
    Opt(Option<Box<Value>>),
    Vec(Vec<Value>),
    /// `vec nat8` in compact form. The decoder always produces this shape.
    Blob(Vec<u8>),
    Record(Vec<(Label, Value)>),
    Variant(Label, Box<Value>),
    Func(FuncRef),
    Service(Principal),
}

impl Value {
    pub fn some(v: Value) -> Self {
        Value::Opt(Some(Box::new(v)))
    }

    pub fn none() -> Self {
        Value::Opt(None)
    }

    pub fn record<L: Into<Label>>(fields: impl IntoIterator<Item = (L, Value)>) -> Self {
        Value::Record(fields.into_iter().map(|(l, v)| (l.into(), v)).collect())
    }

    pub fn variant(label: impl Into<Label>, v: Value) -> Self {
        Value::Variant(label.into(), Box::new(v))
    }

    /// A record with positional labels `0..n`.
    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Record(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Label::Unnamed(i as u32), v))
                .collect(),
        )
    }

    /// Looks up a record field by label.
    pub fn field(&self, label: impl Into<Label>) -> Option<&Value> {
        let label = label.into();
        match self {
            Value::Record(fields) => fields.iter().find(|(l, _)| *l == label).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short shape name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Nat(_) => "nat",
            Value::Int(_) => "int",
            Value::Nat8(_) => "nat8",
            Value::Nat16(_) => "nat16",
            Value::Nat32(_) => "nat32",
            Value::Nat64(_) => "nat64",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Text(_) => "text",
            Value::Reserved => "reserved",
            Value::Principal(_) => "principal",
            Value::Opt(_) => "opt",
            Value::Vec(_) => "vec",
            Value::Blob(_) => "blob",
            Value::Record(_) => "record",
            Value::Variant(..) => "variant",
            Value::Func(_) => "func",
            Value::Service(_) => "service",
        }
    }
}
