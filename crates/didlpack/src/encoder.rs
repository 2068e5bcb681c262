//! # Encoder
//!
//! Writes `DIDL` messages: magic, type table, argument type references, then
//! each value laid out by its argument type.
//!
//! ## Invariants
//!
//! - Values are checked against their types; a shape mismatch is an error and
//!   leaves the buffer in an unspecified state.
//! - Record values may list fields in any order. A missing field is allowed
//!   only when its type is `opt`, `null` or `reserved`.

use num_bigint::BigInt;
use num_bigint::BigUint;

use crate::env::TypeEnv;
use crate::error::Error;
use crate::error::Result;
use crate::label::Label;
use crate::leb128;
use crate::limits::Limit;
use crate::limits::Limits;
use crate::principal::Principal;
use crate::table::TypeTable;
use crate::types::Fields;
use crate::types::TypeKind;
use crate::types::WireType;
use crate::value::Value;

pub const MAGIC: &[u8; 4] = b"DIDL";

/// Encodes `values` against `types` into a fresh message.
///
/// Only the first `types.len()` values are written; fewer values than types is
/// an error.
pub fn encode(types: &[WireType], values: &[Value]) -> Result<Vec<u8>> {
    encode_with_env(&TypeEnv::new(), types, values)
}

/// Like [`encode`], for types that refer to recursive definitions in `env`.
pub fn encode_with_env(env: &TypeEnv, types: &[WireType], values: &[Value]) -> Result<Vec<u8>> {
    let mut enc = Encoder::new(env);
    enc.message(types, values)?;
    Ok(enc.into_bytes())
}

pub struct Encoder<'e> {
    buf: Vec<u8>,
    env: &'e TypeEnv,
    limits: Limits,
}

impl<'e> Encoder<'e> {
    pub fn new(env: &'e TypeEnv) -> Self {
        Self::with_limits(env, Limits::default())
    }

    pub fn with_limits(env: &'e TypeEnv, limits: Limits) -> Self {
        Self { buf: Vec::with_capacity(256), env, limits }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Writes one complete message.
    pub fn message(&mut self, types: &[WireType], values: &[Value]) -> Result<()> {
        if values.len() < types.len() {
            return Err(Error::TooFewValues { types: types.len(), values: values.len() });
        }
        let mut table = TypeTable::new(self.env);
        let refs = types.iter().map(|t| t.describe(&mut table)).collect::<Result<Vec<_>>>()?;

        let start = self.buf.len();
        self.buf.extend_from_slice(MAGIC);
        table.write_to(&mut self.buf);
        self.sleb(types.len() as i64);
        for r in refs {
            self.sleb(r);
        }
        for (ty, v) in types.iter().zip(values) {
            self.value(ty, v)?;
        }
        tracing::trace!(
            table = table.len(),
            args = types.len(),
            bytes = self.buf.len() - start,
            "encoded message"
        );
        Ok(())
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    pub fn uleb(&mut self, v: u64) {
        leb128::encode_u64(v, &mut self.buf);
    }

    pub fn sleb(&mut self, v: i64) {
        leb128::encode_i64(v, &mut self.buf);
    }

    pub fn nat(&mut self, v: &BigUint) {
        leb128::encode_nat(v, &mut self.buf);
    }

    pub fn int(&mut self, v: &BigInt) {
        leb128::encode_int(v, &mut self.buf);
    }

    pub fn text(&mut self, v: &str) {
        self.bytes(v.as_bytes());
    }

    /// uLEB128 length followed by the raw bytes.
    pub fn bytes(&mut self, v: &[u8]) {
        self.uleb(v.len() as u64);
        self.buf.extend_from_slice(v);
    }

    pub fn principal(&mut self, p: &Principal) {
        self.buf.push(0x01);
        self.bytes(p.as_slice());
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Writes `v` laid out as `ty`.
    pub fn value(&mut self, ty: &WireType, v: &Value) -> Result<()> {
        self.value_at(ty, v, 0)
    }

    fn value_at(&mut self, ty: &WireType, v: &Value, depth: usize) -> Result<()> {
        if depth > self.limits.max_depth {
            return Err(Error::LimitExceeded(Limit::Depth));
        }
        let ty = self.env.resolve(ty)?;
        match (ty.kind(), v) {
            (TypeKind::Null, Value::Null) => {}
            (TypeKind::Reserved, Value::Reserved | Value::Null) => {}
            (TypeKind::Bool, Value::Bool(b)) => self.buf.push(*b as u8),
            (TypeKind::Nat, Value::Nat(n)) => self.nat(n),
            (TypeKind::Int, Value::Int(n)) => self.int(n),
            (TypeKind::Nat8, Value::Nat8(n)) => self.buf.push(*n),
            (TypeKind::Nat16, Value::Nat16(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Nat32, Value::Nat32(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Nat64, Value::Nat64(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Int8, Value::Int8(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Int16, Value::Int16(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Int32, Value::Int32(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Int64, Value::Int64(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Float32, Value::Float32(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Float64, Value::Float64(n)) => self.buf.extend_from_slice(&n.to_le_bytes()),
            (TypeKind::Text, Value::Text(s)) => self.text(s),
            (TypeKind::Principal, Value::Principal(p)) => self.principal(p),
            (TypeKind::Opt(_), Value::Opt(None)) => self.buf.push(0x00),
            (TypeKind::Opt(inner), Value::Opt(Some(v))) => {
                self.buf.push(0x01);
                self.value_at(inner, v, depth + 1)?;
            }
            (TypeKind::Vec(inner), Value::Vec(items)) => {
                self.uleb(items.len() as u64);
                for item in items {
                    self.value_at(inner, item, depth + 1)?;
                }
            }
            (TypeKind::Vec(inner), Value::Blob(bytes)) if is_nat8(self.env, inner) => {
                self.bytes(bytes);
            }
            (TypeKind::Record(fields), Value::Record(entries)) => {
                self.record(fields, entries, depth)?;
            }
            (TypeKind::Variant(arms), Value::Variant(label, v)) => {
                let index = arms
                    .position(label.id())
                    .ok_or_else(|| Error::UnknownVariantArm(label.clone()))?;
                self.uleb(index as u64);
                if let Some(arm) = arms.at(index) {
                    self.value_at(&arm.ty, v, depth + 1)?;
                }
            }
            (TypeKind::Func(_), Value::Func(func)) => {
                self.buf.push(0x01);
                self.principal(&func.principal);
                self.text(&func.method);
            }
            (TypeKind::Service(_), Value::Service(p)) => {
                self.buf.push(0x01);
                self.principal(p);
            }
            _ => {
                return Err(Error::ValueMismatch {
                    expected: ty.to_string(),
                    found: v.kind_name(),
                });
            }
        }
        Ok(())
    }

    fn record(&mut self, fields: &Fields, entries: &[(Label, Value)], depth: usize) -> Result<()> {
        if let Some((label, _)) = entries.iter().find(|(l, _)| fields.get(l.id()).is_none()) {
            return Err(Error::UnexpectedField(label.clone()));
        }
        for field in fields {
            match entries.iter().find(|(l, _)| *l == field.label) {
                Some((_, v)) => self.value_at(&field.ty, v, depth + 1)?,
                None => match self.env.resolve(&field.ty)?.kind() {
                    TypeKind::Opt(_) => self.buf.push(0x00),
                    TypeKind::Null | TypeKind::Reserved => {}
                    _ => return Err(Error::MissingField(field.label.clone())),
                },
            }
        }
        Ok(())
    }
}

pub(crate) fn is_nat8(env: &TypeEnv, ty: &WireType) -> bool {
    env.resolve(ty).is_ok_and(|t| matches!(t.kind(), TypeKind::Nat8))
}
