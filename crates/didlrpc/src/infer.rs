//! # Type Inference
//!
//! Derives a wire type from an untyped host value, for calls made without a
//! declared signature.
//!
//! ## Rules
//!
//! - Scalars map to their wire counterparts; blobs become `vec nat8`.
//! - A list takes the unified type of its elements; an empty list is
//!   `vec empty`.
//! - A map whose values are all optionals, exactly one of them present, is a
//!   variant (absent arms typed `null`). Any other map is a record.
//! - An absent optional is `opt null`.
//! - Func references have no inferable type.

use didlpack::Label;
use didlpack::MAX_RECURSION_DEPTH;
use didlpack::TypeKind;
use didlpack::WireType;

use crate::error::Error;
use crate::error::Result;
use crate::fields::FieldMap;
use crate::host::Host;

pub fn infer_type(host: &Host, fields: &FieldMap) -> Result<WireType> {
    infer_at(host, fields, 0)
}

fn infer_at(host: &Host, fields: &FieldMap, depth: usize) -> Result<WireType> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(Error::UnknownValueType(format!(
            "a value nested deeper than {} levels",
            MAX_RECURSION_DEPTH
        )));
    }
    let ty = match host {
        Host::Null => WireType::null(),
        Host::Reserved => WireType::reserved(),
        Host::Bool(_) => WireType::bool(),
        Host::Nat(_) => WireType::nat(),
        Host::Int(_) => WireType::int(),
        Host::U8(_) => WireType::nat8(),
        Host::U16(_) => WireType::nat16(),
        Host::U32(_) => WireType::nat32(),
        Host::U64(_) => WireType::nat64(),
        Host::I8(_) => WireType::int8(),
        Host::I16(_) => WireType::int16(),
        Host::I32(_) => WireType::int32(),
        Host::I64(_) => WireType::int64(),
        Host::F32(_) => WireType::float32(),
        Host::F64(_) => WireType::float64(),
        Host::Text(_) => WireType::text(),
        Host::Blob(_) => WireType::vec(WireType::nat8()),
        Host::Principal(_) => WireType::principal(),
        Host::Service(_) => WireType::service::<String>([]),
        Host::Opt(None) => WireType::opt(WireType::null()),
        Host::Opt(Some(inner)) => WireType::opt(infer_at(inner, fields, depth + 1)?),
        Host::List(items) => {
            let mut element = WireType::empty();
            for (i, item) in items.iter().enumerate() {
                let ty = infer_at(item, fields, depth + 1)?;
                element = if i == 0 {
                    ty
                } else {
                    unify(&element, &ty).ok_or_else(|| {
                        Error::UnknownValueType(format!("a list mixing {} and {}", element, ty))
                    })?
                };
            }
            WireType::vec(element)
        }
        Host::Map(entries) => {
            let present = entries.values().filter(|v| matches!(v, Host::Opt(Some(_)))).count();
            let all_optional = entries.values().all(|v| matches!(v, Host::Opt(_)));
            if !entries.is_empty() && all_optional && present == 1 {
                let arms = entries
                    .iter()
                    .map(|(k, v)| -> Result<(Label, WireType)> {
                        let ty = match v {
                            Host::Opt(Some(inner)) => infer_at(inner, fields, depth + 1)?,
                            _ => WireType::null(),
                        };
                        Ok((fields.wire_label(k), ty))
                    })
                    .collect::<Result<Vec<(Label, WireType)>>>()?;
                WireType::variant(arms)
            } else {
                let record = entries
                    .iter()
                    .map(|(k, v)| -> Result<(Label, WireType)> {
                        Ok((fields.wire_label(k), infer_at(v, fields, depth + 1)?))
                    })
                    .collect::<Result<Vec<(Label, WireType)>>>()?;
                WireType::record(record)
            }
        }
        Host::Variant(tag, inner) => {
            WireType::variant([(fields.wire_label(tag), infer_at(inner, fields, depth + 1)?)])
        }
        Host::Func(_) => return Err(Error::UnknownValueType("a func reference".into())),
    };
    Ok(ty)
}

/// The least type covering both, if any: `opt null` and `vec empty` widen to
/// any opt and vec, records unify field by field, and variants take the union
/// of their arms.
fn unify(a: &WireType, b: &WireType) -> Option<WireType> {
    if a == b {
        return Some(a.clone());
    }
    match (a.kind(), b.kind()) {
        (TypeKind::Opt(x), TypeKind::Opt(y)) => {
            if matches!(x.kind(), TypeKind::Null) {
                Some(b.clone())
            } else if matches!(y.kind(), TypeKind::Null) {
                Some(a.clone())
            } else {
                unify(x, y).map(WireType::opt)
            }
        }
        (TypeKind::Vec(x), TypeKind::Vec(y)) => {
            if matches!(x.kind(), TypeKind::Empty) {
                Some(b.clone())
            } else if matches!(y.kind(), TypeKind::Empty) {
                Some(a.clone())
            } else {
                unify(x, y).map(WireType::vec)
            }
        }
        (TypeKind::Variant(xs), TypeKind::Variant(ys)) => {
            let mut arms: Vec<(Label, WireType)> = Vec::with_capacity(xs.len() + ys.len());
            for x in xs {
                let ty = match ys.get(x.label.id()) {
                    Some(y) => unify(&x.ty, &y.ty)?,
                    None => x.ty.clone(),
                };
                arms.push((x.label.clone(), ty));
            }
            for y in ys {
                if xs.get(y.label.id()).is_none() {
                    arms.push((y.label.clone(), y.ty.clone()));
                }
            }
            Some(WireType::variant(arms))
        }
        (TypeKind::Record(xs), TypeKind::Record(ys)) if xs.len() == ys.len() => {
            let fields = xs
                .iter()
                .zip(ys.iter())
                .map(|(x, y)| {
                    (x.label.id() == y.label.id())
                        .then(|| unify(&x.ty, &y.ty).map(|ty| (x.label.clone(), ty)))
                        .flatten()
                })
                .collect::<Option<Vec<_>>>()?;
            Some(WireType::record(fields))
        }
        _ => None,
    }
}
