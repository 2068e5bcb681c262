//! # Decoder
//!
//! Reads `DIDL` messages. The type table is resolved in full before any value
//! is read, so every type handed out is usable without further checks.
//!
//! ## Invariants
//!
//! - Reads are zero-copy and bounds-checked; exhausting the input is
//!   `Error::UnexpectedEnd`, never a panic.
//! - Every decode runs under [`Limits`]: message size, table size, argument
//!   count, nesting depth and total value nodes are all capped.

use num_bigint::BigInt;
use num_bigint::BigUint;

use crate::encoder::MAGIC;
use crate::encoder::is_nat8;
use crate::env::TypeEnv;
use crate::error::Error;
use crate::error::Result;
use crate::leb128;
use crate::limits::Limit;
use crate::limits::Limits;
use crate::principal::Principal;
use crate::resolve;
use crate::types::TypeKind;
use crate::types::WireType;
use crate::value::FuncRef;
use crate::value::Value;

/// A decoded message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The resolved type table; `Rec` edges in `types` point into it.
    pub env: TypeEnv,
    pub types: Vec<WireType>,
    pub values: Vec<Value>,
}

pub fn decode(bytes: &[u8]) -> Result<Message> {
    decode_with_limits(bytes, Limits::default())
}

pub fn decode_with_limits(bytes: &[u8], limits: Limits) -> Result<Message> {
    if bytes.len() > limits.max_message_len {
        return Err(Error::LimitExceeded(Limit::MessageLen));
    }
    let mut dec = Decoder::with_limits(bytes, limits);
    dec.magic()?;
    let env = resolve::read_table(&mut dec)?;

    let argc = dec.count()?;
    if argc > limits.max_args {
        return Err(Error::LimitExceeded(Limit::Args));
    }
    let mut types = Vec::with_capacity(argc.min(dec.remaining()));
    for _ in 0..argc {
        let r = dec.sleb()?;
        types.push(resolve::lookup(r, &env)?);
    }

    let mut values = Vec::with_capacity(types.len());
    for ty in &types {
        values.push(dec.value(ty, &env)?);
    }
    if dec.remaining() > 0 {
        return Err(Error::TrailingBytes(dec.remaining()));
    }
    tracing::trace!(table = env.len(), args = types.len(), bytes = bytes.len(), "decoded message");
    Ok(Message { env, types, values })
}

/// A zero-copy, bounds-checked cursor over a message.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    limits: Limits,
    values: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_limits(buf, Limits::default())
    }

    pub fn with_limits(buf: &'a [u8], limits: Limits) -> Self {
        Self { buf, limits, values: 0 }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Returns the remaining bytes in the view.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn consume(&mut self, n: usize) {
        self.buf = &self.buf[n..];
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let (&b, rest) = self.buf.split_first().ok_or(Error::UnexpectedEnd)?;
        self.buf = rest;
        Ok(b)
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Checks the four magic bytes.
    pub fn magic(&mut self) -> Result<()> {
        if self.buf.len() < MAGIC.len() {
            return Err(Error::NoMagic(self.buf.len()));
        }
        let found: [u8; 4] = self.read_array()?;
        if &found != MAGIC {
            return Err(Error::WrongMagic(found));
        }
        Ok(())
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    pub fn uleb(&mut self) -> Result<u64> {
        let (v, used) = leb128::decode_u64(self.buf)?;
        self.consume(used);
        Ok(v)
    }

    pub fn sleb(&mut self) -> Result<i64> {
        let (v, used) = leb128::decode_i64(self.buf)?;
        self.consume(used);
        Ok(v)
    }

    pub fn nat(&mut self) -> Result<BigUint> {
        let (v, used) = leb128::decode_nat(self.buf)?;
        self.consume(used);
        Ok(v)
    }

    pub fn int(&mut self) -> Result<BigInt> {
        let (v, used) = leb128::decode_int(self.buf)?;
        self.consume(used);
        Ok(v)
    }

    /// A uLEB128 length or element count.
    pub fn length(&mut self) -> Result<usize> {
        usize::try_from(self.uleb()?).map_err(|_| Error::Leb128Overflow)
    }

    /// An sLEB128 count, as used for the argument list.
    pub fn count(&mut self) -> Result<usize> {
        let n = self.sleb()?;
        usize::try_from(n).map_err(|_| Error::NegativeCount(n))
    }

    /// uLEB128 length followed by UTF-8 bytes.
    pub fn text(&mut self) -> Result<&'a str> {
        let n = self.length()?;
        let bytes = self.read_bytes(n)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    pub fn principal(&mut self) -> Result<Principal> {
        self.reference_tag()?;
        let n = self.length()?;
        Principal::from_slice(self.read_bytes(n)?)
    }

    fn reference_tag(&mut self) -> Result<()> {
        match self.read_u8()? {
            0x01 => Ok(()),
            b => Err(Error::InvalidReferenceTag(b)),
        }
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Reads one value laid out as `ty`, resolving `Rec` edges through `env`.
    pub fn value(&mut self, ty: &WireType, env: &TypeEnv) -> Result<Value> {
        self.value_at(ty, env, 0)
    }

    fn value_at(&mut self, ty: &WireType, env: &TypeEnv, depth: usize) -> Result<Value> {
        if depth > self.limits.max_depth {
            return Err(Error::LimitExceeded(Limit::Depth));
        }
        self.values += 1;
        if self.values > self.limits.max_values {
            return Err(Error::LimitExceeded(Limit::Values));
        }
        let ty = env.resolve(ty)?;
        let v = match ty.kind() {
            TypeKind::Null => Value::Null,
            TypeKind::Reserved => Value::Reserved,
            TypeKind::Empty => return Err(Error::EmptyValue),
            TypeKind::Bool => match self.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                b => return Err(Error::InvalidBool(b)),
            },
            TypeKind::Nat => Value::Nat(self.nat()?),
            TypeKind::Int => Value::Int(self.int()?),
            TypeKind::Nat8 => Value::Nat8(self.read_u8()?),
            TypeKind::Nat16 => Value::Nat16(u16::from_le_bytes(self.read_array()?)),
            TypeKind::Nat32 => Value::Nat32(u32::from_le_bytes(self.read_array()?)),
            TypeKind::Nat64 => Value::Nat64(u64::from_le_bytes(self.read_array()?)),
            TypeKind::Int8 => Value::Int8(i8::from_le_bytes(self.read_array()?)),
            TypeKind::Int16 => Value::Int16(i16::from_le_bytes(self.read_array()?)),
            TypeKind::Int32 => Value::Int32(i32::from_le_bytes(self.read_array()?)),
            TypeKind::Int64 => Value::Int64(i64::from_le_bytes(self.read_array()?)),
            TypeKind::Float32 => Value::Float32(f32::from_le_bytes(self.read_array()?)),
            TypeKind::Float64 => Value::Float64(f64::from_le_bytes(self.read_array()?)),
            TypeKind::Text => Value::Text(self.text()?.to_string()),
            TypeKind::Principal => Value::Principal(self.principal()?),
            TypeKind::Opt(inner) => match self.read_u8()? {
                0x00 => Value::Opt(None),
                0x01 => Value::some(self.value_at(inner, env, depth + 1)?),
                b => return Err(Error::InvalidOptTag(b)),
            },
            TypeKind::Vec(inner) if is_nat8(env, inner) => {
                let n = self.length()?;
                Value::Blob(self.read_bytes(n)?.to_vec())
            }
            TypeKind::Vec(inner) => {
                let n = self.length()?;
                // Zero-sized elements are bounded by `max_values`, not
                // by the input length.
                let mut items = Vec::with_capacity(n.min(self.remaining()));
                for _ in 0..n {
                    items.push(self.value_at(inner, env, depth + 1)?);
                }
                Value::Vec(items)
            }
            TypeKind::Record(fields) => {
                let mut entries = Vec::with_capacity(fields.len());
                for field in fields {
                    entries.push((field.label.clone(), self.value_at(&field.ty, env, depth + 1)?));
                }
                Value::Record(entries)
            }
            TypeKind::Variant(arms) => {
                let index = self.uleb()?;
                let arm = usize::try_from(index)
                    .ok()
                    .and_then(|i| arms.at(i))
                    .ok_or(Error::InvalidDiscriminant { index, arms: arms.len() })?;
                let v = self.value_at(&arm.ty, env, depth + 1)?;
                Value::Variant(arm.label.clone(), Box::new(v))
            }
            TypeKind::Func(_) => {
                self.reference_tag()?;
                let principal = self.principal()?;
                let method = self.text()?.to_string();
                Value::Func(FuncRef { principal, method })
            }
            TypeKind::Service(_) => {
                self.reference_tag()?;
                Value::Service(self.principal()?)
            }
            TypeKind::Rec(id) => return Err(Error::UnknownRec(*id)),
        };
        Ok(v)
    }
}
