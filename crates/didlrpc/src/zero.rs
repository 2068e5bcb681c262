//! Canonical default values for wire types.

use didlpack::FuncRef;
use didlpack::MAX_RECURSION_DEPTH;
use didlpack::Principal;
use didlpack::TypeEnv;
use didlpack::TypeKind;
use didlpack::Value;
use didlpack::WireType;
use num_bigint::BigInt;
use num_bigint::BigUint;

use crate::error::Error;
use crate::error::Result;

/// The default value of `ty`: false, zero, empty text, absent, empty vec, a
/// record of defaults, or the first variant arm that does not recurse.
///
/// `empty` has no values and fails with `Error::UnknownType`.
pub fn zero_value(ty: &WireType, env: &TypeEnv) -> Result<Value> {
    zero_at(ty, env, 0)
}

fn zero_at(ty: &WireType, env: &TypeEnv, depth: usize) -> Result<Value> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::RecursionLimitExceeded);
    }
    let ty = env.resolve(ty)?;
    let v = match ty.kind() {
        TypeKind::Null => Value::Null,
        TypeKind::Reserved => Value::Reserved,
        TypeKind::Empty => return Err(Error::UnknownType(ty.to_string())),
        TypeKind::Bool => Value::Bool(false),
        TypeKind::Nat => Value::Nat(BigUint::default()),
        TypeKind::Int => Value::Int(BigInt::default()),
        TypeKind::Nat8 => Value::Nat8(0),
        TypeKind::Nat16 => Value::Nat16(0),
        TypeKind::Nat32 => Value::Nat32(0),
        TypeKind::Nat64 => Value::Nat64(0),
        TypeKind::Int8 => Value::Int8(0),
        TypeKind::Int16 => Value::Int16(0),
        TypeKind::Int32 => Value::Int32(0),
        TypeKind::Int64 => Value::Int64(0),
        TypeKind::Float32 => Value::Float32(0.0),
        TypeKind::Float64 => Value::Float64(0.0),
        TypeKind::Text => Value::Text(String::new()),
        TypeKind::Principal => Value::Principal(Principal::management()),
        TypeKind::Opt(_) => Value::Opt(None),
        TypeKind::Vec(inner) => match env.resolve(inner)?.kind() {
            TypeKind::Nat8 => Value::Blob(Vec::new()),
            _ => Value::Vec(Vec::new()),
        },
        TypeKind::Record(fields) => {
            let mut entries = Vec::with_capacity(fields.len());
            for field in fields {
                entries.push((field.label.clone(), zero_at(&field.ty, env, depth + 1)?));
            }
            Value::Record(entries)
        }
        TypeKind::Variant(arms) => {
            let arm = arms
                .iter()
                .find(|arm| !mentions_rec(&arm.ty))
                .or_else(|| arms.at(0))
                .ok_or_else(|| Error::UnknownType(ty.to_string()))?;
            Value::Variant(arm.label.clone(), Box::new(zero_at(&arm.ty, env, depth + 1)?))
        }
        TypeKind::Func(_) => Value::Func(FuncRef {
            principal: Principal::management(),
            method: String::new(),
        }),
        TypeKind::Service(_) => Value::Service(Principal::management()),
        TypeKind::Rec(id) => return Err(didlpack::Error::UnknownRec(*id).into()),
    };
    Ok(v)
}

/// True when the type refers to a recursive definition anywhere inside.
fn mentions_rec(ty: &WireType) -> bool {
    match ty.kind() {
        TypeKind::Rec(_) => true,
        TypeKind::Opt(inner) | TypeKind::Vec(inner) => mentions_rec(inner),
        TypeKind::Record(fields) | TypeKind::Variant(fields) => {
            fields.iter().any(|f| mentions_rec(&f.ty))
        }
        TypeKind::Func(func) => func.args.iter().chain(&func.rets).any(mentions_rec),
        TypeKind::Service(service) => service.methods().iter().any(|(_, m)| mentions_rec(m)),
        _ => false,
    }
}
