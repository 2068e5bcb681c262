//! # Host Conversion
//!
//! Type-directed translation between host values and wire values.
//!
//! ## Invariants
//! - **Recursion Safety**: all recursive operations are bounded by `MAX_RECURSION_DEPTH`.
//! - **Type Strictness**: the wire type decides the shape; a host value of the
//!   wrong shape is an error, never coerced silently into something else.
//! - **Field Names**: records and variants go through a [`FieldMap`]. Wire
//!   fields without a host name surface under their numeric id.

use std::collections::BTreeMap;

use didlpack::Label;
use didlpack::MAX_RECURSION_DEPTH;
use didlpack::TypeEnv;
use didlpack::TypeKind;
use didlpack::Value;
use didlpack::WireType;
use num_bigint::BigInt;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::Error;
use crate::error::Result;
use crate::fields::FieldMap;
use crate::host::Host;
use crate::zero::zero_value;

// ============================================================================
// Wire to host
// ============================================================================

/// Converts a decoded value of type `ty` into its host shape.
///
/// Tuple-shaped records (ids `0..n`) become lists; other records become maps.
/// Fields the value lacks are filled in when their type is `opt`, `null` or
/// `reserved`, so a reply may omit fields a newer signature declares.
pub fn to_host(ty: &WireType, value: &Value, env: &TypeEnv, fields: &FieldMap) -> Result<Host> {
    to_host_at(ty, value, env, fields, 0)
}

fn to_host_at(
    ty: &WireType,
    value: &Value,
    env: &TypeEnv,
    fields: &FieldMap,
    depth: usize,
) -> Result<Host> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded);
    }
    let ty = env.resolve(ty)?;
    let host = match (ty.kind(), value) {
        (TypeKind::Null, Value::Null) => Host::Null,
        (TypeKind::Reserved, _) => Host::Reserved,
        (TypeKind::Bool, Value::Bool(b)) => Host::Bool(*b),
        (TypeKind::Nat, Value::Nat(n)) => Host::Nat(n.clone()),
        (TypeKind::Int, Value::Int(n)) => Host::Int(n.clone()),
        (TypeKind::Nat8, Value::Nat8(n)) => Host::U8(*n),
        (TypeKind::Nat16, Value::Nat16(n)) => Host::U16(*n),
        (TypeKind::Nat32, Value::Nat32(n)) => Host::U32(*n),
        (TypeKind::Nat64, Value::Nat64(n)) => Host::U64(*n),
        (TypeKind::Int8, Value::Int8(n)) => Host::I8(*n),
        (TypeKind::Int16, Value::Int16(n)) => Host::I16(*n),
        (TypeKind::Int32, Value::Int32(n)) => Host::I32(*n),
        (TypeKind::Int64, Value::Int64(n)) => Host::I64(*n),
        (TypeKind::Float32, Value::Float32(n)) => Host::F32(*n),
        (TypeKind::Float64, Value::Float64(n)) => Host::F64(*n),
        (TypeKind::Text, Value::Text(s)) => Host::Text(s.clone()),
        (TypeKind::Principal, Value::Principal(p)) => Host::Principal(p.clone()),
        (TypeKind::Opt(_), Value::Opt(None)) => Host::Opt(None),
        (TypeKind::Opt(inner), Value::Opt(Some(v))) => {
            Host::Opt(Some(Box::new(to_host_at(inner, v, env, fields, depth + 1)?)))
        }
        (TypeKind::Vec(_), Value::Blob(bytes)) => Host::Blob(bytes.clone()),
        (TypeKind::Vec(inner), Value::Vec(items)) => Host::List(
            items
                .iter()
                .map(|v| to_host_at(inner, v, env, fields, depth + 1))
                .collect::<Result<Vec<_>>>()?,
        ),
        (TypeKind::Record(record), Value::Record(entries)) => {
            let lookup = |label: &Label| entries.iter().find(|(l, _)| l == label).map(|(_, v)| v);
            if !record.is_empty() && record.is_tuple() {
                let mut items = Vec::with_capacity(record.len());
                for field in record {
                    let filled;
                    let v = match lookup(&field.label) {
                        Some(v) => v,
                        None => {
                            filled = absent_field(&field.ty, env)?.ok_or_else(|| {
                                Error::MissingField(field.label.id().to_string())
                            })?;
                            &filled
                        }
                    };
                    items.push(to_host_at(&field.ty, v, env, fields, depth + 1)?);
                }
                Host::List(items)
            } else {
                let mut map = BTreeMap::new();
                for field in record {
                    let name = fields.host_name(&field.label);
                    let filled;
                    let v = match lookup(&field.label) {
                        Some(v) => v,
                        None => {
                            filled = absent_field(&field.ty, env)?
                                .ok_or_else(|| Error::MissingField(name.clone()))?;
                            &filled
                        }
                    };
                    map.insert(name, to_host_at(&field.ty, v, env, fields, depth + 1)?);
                }
                Host::Map(map)
            }
        }
        (TypeKind::Variant(arms), Value::Variant(label, v)) => {
            let arm = arms
                .get(label.id())
                .ok_or_else(|| Error::UnknownVariant(fields.host_name(label)))?;
            Host::Variant(
                fields.host_name(&arm.label),
                Box::new(to_host_at(&arm.ty, v, env, fields, depth + 1)?),
            )
        }
        (TypeKind::Func(_), Value::Func(func)) => Host::Func(func.clone()),
        (TypeKind::Service(_), Value::Service(p)) => Host::Service(p.clone()),
        _ => {
            return Err(Error::TypeMismatch {
                expected: ty.to_string(),
                found: value.kind_name().into(),
            });
        }
    };
    Ok(host)
}

// ============================================================================
// Host to wire
// ============================================================================

/// Converts a host value into a wire value of type `ty`.
///
/// Record fields absent from a host map are filled in when their type is
/// `opt`, `null` or `reserved`. A map key naming no field of the record is an
/// error, as are two keys naming the same field. A variant is read from a tagged choice, a bare tag (for arms of type
/// `null`), or a map with exactly one populated entry.
pub fn from_host(ty: &WireType, host: &Host, env: &TypeEnv, fields: &FieldMap) -> Result<Value> {
    from_host_at(ty, host, env, fields, 0)
}

fn from_host_at(
    ty: &WireType,
    host: &Host,
    env: &TypeEnv,
    fields: &FieldMap,
    depth: usize,
) -> Result<Value> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded);
    }
    let ty = env.resolve(ty)?;
    let mismatch = || Error::TypeMismatch {
        expected: ty.to_string(),
        found: host.kind_name().into(),
    };

    let v = match ty.kind() {
        TypeKind::Null => match host {
            Host::Null => Value::Null,
            _ => return Err(mismatch()),
        },
        TypeKind::Reserved => Value::Reserved,
        TypeKind::Empty => return Err(mismatch()),
        TypeKind::Bool => match host {
            Host::Bool(b) => Value::Bool(*b),
            _ => return Err(mismatch()),
        },
        TypeKind::Nat => Value::Nat(to_biguint(host).ok_or_else(mismatch)?),
        TypeKind::Int => Value::Int(to_bigint(host).ok_or_else(mismatch)?),
        TypeKind::Nat8 => Value::Nat8(narrow(host, BigInt::to_u8).ok_or_else(mismatch)?),
        TypeKind::Nat16 => Value::Nat16(narrow(host, BigInt::to_u16).ok_or_else(mismatch)?),
        TypeKind::Nat32 => Value::Nat32(narrow(host, BigInt::to_u32).ok_or_else(mismatch)?),
        TypeKind::Nat64 => Value::Nat64(narrow(host, BigInt::to_u64).ok_or_else(mismatch)?),
        TypeKind::Int8 => Value::Int8(narrow(host, BigInt::to_i8).ok_or_else(mismatch)?),
        TypeKind::Int16 => Value::Int16(narrow(host, BigInt::to_i16).ok_or_else(mismatch)?),
        TypeKind::Int32 => Value::Int32(narrow(host, BigInt::to_i32).ok_or_else(mismatch)?),
        TypeKind::Int64 => Value::Int64(narrow(host, BigInt::to_i64).ok_or_else(mismatch)?),
        TypeKind::Float32 => match host {
            Host::F32(x) => Value::Float32(*x),
            _ => return Err(mismatch()),
        },
        TypeKind::Float64 => match host {
            Host::F64(x) => Value::Float64(*x),
            Host::F32(x) => Value::Float64(f64::from(*x)),
            _ => return Err(mismatch()),
        },
        TypeKind::Text => match host {
            Host::Text(s) => Value::Text(s.clone()),
            _ => return Err(mismatch()),
        },
        TypeKind::Principal => match host {
            Host::Principal(p) => Value::Principal(p.clone()),
            _ => return Err(mismatch()),
        },
        TypeKind::Func(_) => match host {
            Host::Func(func) => Value::Func(func.clone()),
            _ => return Err(mismatch()),
        },
        TypeKind::Service(_) => match host {
            Host::Service(p) | Host::Principal(p) => Value::Service(p.clone()),
            _ => return Err(mismatch()),
        },
        TypeKind::Opt(inner) => match host {
            Host::Opt(None) | Host::Null => Value::Opt(None),
            Host::Opt(Some(h)) => Value::some(from_host_at(inner, h, env, fields, depth + 1)?),
            other => Value::some(from_host_at(inner, other, env, fields, depth + 1)?),
        },
        TypeKind::Vec(inner) => match host {
            Host::Blob(bytes) => match env.resolve(inner)?.kind() {
                TypeKind::Nat8 => Value::Blob(bytes.clone()),
                _ => return Err(mismatch()),
            },
            Host::List(items) => Value::Vec(
                items
                    .iter()
                    .map(|h| from_host_at(inner, h, env, fields, depth + 1))
                    .collect::<Result<Vec<_>>>()?,
            ),
            _ => return Err(mismatch()),
        },
        TypeKind::Record(record) => match host {
            Host::List(items) if record.is_tuple() => {
                if items.len() != record.len() {
                    return Err(mismatch());
                }
                let mut entries = Vec::with_capacity(items.len());
                for (field, item) in record.iter().zip(items) {
                    let v = from_host_at(&field.ty, item, env, fields, depth + 1)?;
                    entries.push((field.label.clone(), v));
                }
                Value::Record(entries)
            }
            Host::Map(map) => {
                let mut given = Vec::with_capacity(map.len());
                for (key, h) in map {
                    let label = fields.wire_label(key);
                    if record.get(label.id()).is_none() {
                        return Err(Error::UnknownField(key.clone()));
                    }
                    if given.iter().any(|(l, _)| *l == label) {
                        return Err(Error::DuplicateField(key.clone()));
                    }
                    given.push((label, h));
                }
                let mut entries = Vec::with_capacity(record.len());
                for field in record {
                    let v = match given.iter().find(|(l, _)| *l == field.label) {
                        Some((_, h)) => from_host_at(&field.ty, h, env, fields, depth + 1)?,
                        None => absent_field(&field.ty, env)?
                            .ok_or_else(|| Error::MissingField(fields.host_name(&field.label)))?,
                    };
                    entries.push((field.label.clone(), v));
                }
                Value::Record(entries)
            }
            _ => return Err(mismatch()),
        },
        TypeKind::Variant(arms) => {
            let null = Host::Null;
            let (tag, payload) = match host {
                Host::Variant(tag, payload) => (tag.as_str(), payload.as_ref()),
                Host::Text(tag) => (tag.as_str(), &null),
                Host::Map(map) => {
                    let populated: Vec<(&String, &Host)> =
                        map.iter().filter(|(_, h)| !matches!(h, Host::Opt(None))).collect();
                    if populated.len() != 1 {
                        return Err(Error::AmbiguousVariant { populated: populated.len() });
                    }
                    let (tag, h) = populated[0];
                    let payload = match h {
                        Host::Opt(Some(inner)) => inner.as_ref(),
                        other => other,
                    };
                    (tag.as_str(), payload)
                }
                _ => return Err(mismatch()),
            };
            let arm = arms
                .get(fields.wire_label(tag).id())
                .ok_or_else(|| Error::UnknownVariant(tag.to_string()))?;
            let v = from_host_at(&arm.ty, payload, env, fields, depth + 1)?;
            Value::Variant(arm.label.clone(), Box::new(v))
        }
        TypeKind::Rec(id) => return Err(didlpack::Error::UnknownRec(*id).into()),
    };
    Ok(v)
}

/// The stand-in for a record field that was left out, if its type has one.
fn absent_field(ty: &WireType, env: &TypeEnv) -> Result<Option<Value>> {
    match env.resolve(ty)?.kind() {
        TypeKind::Opt(_) | TypeKind::Null | TypeKind::Reserved => Ok(Some(zero_value(ty, env)?)),
        _ => Ok(None),
    }
}

fn narrow<T>(host: &Host, f: impl FnOnce(&BigInt) -> Option<T>) -> Option<T> {
    to_bigint(host).as_ref().and_then(f)
}

fn to_biguint(host: &Host) -> Option<BigUint> {
    to_bigint(host).and_then(|n| n.to_biguint())
}

fn to_bigint(host: &Host) -> Option<BigInt> {
    let n = match host {
        Host::Nat(n) => BigInt::from(n.clone()),
        Host::Int(n) => n.clone(),
        Host::U8(n) => BigInt::from(*n),
        Host::U16(n) => BigInt::from(*n),
        Host::U32(n) => BigInt::from(*n),
        Host::U64(n) => BigInt::from(*n),
        Host::I8(n) => BigInt::from(*n),
        Host::I16(n) => BigInt::from(*n),
        Host::I32(n) => BigInt::from(*n),
        Host::I64(n) => BigInt::from(*n),
        _ => return None,
    };
    Some(n)
}
