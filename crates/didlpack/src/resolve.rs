//! # Type Table Resolution
//!
//! A table may refer forward to later entries and back to itself. Entries are
//! parsed and validated first, then resolved by repeated passes until every
//! slot has a type.
//!
//! ## Passes
//!
//! - A strict pass resolves each slot whose references are all primitives or
//!   already-resolved slots, inlining them.
//! - If a strict pass makes no progress, a knot pass resolves the first slot
//!   that can be closed by turning its lazy references (opt, vec, variant arms,
//!   func signatures, service methods) to unresolved slots into `Rec` edges.
//!   Record fields are always strict: a cycle through records alone has no
//!   finite value and never resolves.
//! - A knot pass without progress is fatal.

use crate::decoder::Decoder;
use crate::env::TypeEnv;
use crate::error::Error;
use crate::error::Result;
use crate::label::Label;
use crate::limits::Limit;
use crate::types::Field;
use crate::types::Fields;
use crate::types::FuncType;
use crate::types::Mode;
use crate::types::Opcode;
use crate::types::TypeKind;
use crate::types::WireType;

/// A table entry as read, references unresolved.
#[derive(Debug)]
enum RawEntry {
    Opt(i64),
    Vec(i64),
    Record(Vec<(u32, i64)>),
    Variant(Vec<(u32, i64)>),
    Func { args: Vec<i64>, rets: Vec<i64>, modes: Vec<Mode> },
    Service(Vec<(String, i64)>),
}

#[derive(Debug, Clone)]
enum Slot {
    Unseen,
    Resolving,
    Resolved(WireType),
}

/// Reads the type table and resolves it into an environment indexed by slot.
pub(crate) fn read_table(dec: &mut Decoder<'_>) -> Result<TypeEnv> {
    let n = dec.length()?;
    if n > dec.limits().max_table_len {
        return Err(Error::LimitExceeded(Limit::TableLen));
    }
    let mut raw = Vec::with_capacity(n);
    for _ in 0..n {
        raw.push(read_entry(dec)?);
    }
    validate(&raw)?;
    resolve(&raw, dec.limits().max_resolve_passes)
}

/// The type an argument reference names.
pub(crate) fn lookup(r: i64, env: &TypeEnv) -> Result<WireType> {
    if r < 0 {
        return primitive(r);
    }
    let idx = usize::try_from(r).map_err(|_| Error::TypeIndexOutOfRange(r))?;
    env.get(idx).cloned().map_err(|_| Error::TypeIndexOutOfRange(r))
}

fn primitive(r: i64) -> Result<WireType> {
    Opcode::from_i64(r)
        .and_then(WireType::primitive)
        .ok_or(Error::InvalidOpcode(r))
}

// ============================================================================
// Parsing
// ============================================================================

fn read_entry(dec: &mut Decoder<'_>) -> Result<RawEntry> {
    let code = dec.sleb()?;
    let entry = match Opcode::from_i64(code) {
        Some(Opcode::Opt) => RawEntry::Opt(dec.sleb()?),
        Some(Opcode::Vec) => RawEntry::Vec(dec.sleb()?),
        Some(Opcode::Record) => RawEntry::Record(read_fields(dec)?),
        Some(Opcode::Variant) => RawEntry::Variant(read_fields(dec)?),
        Some(Opcode::Func) => {
            let args = read_refs(dec)?;
            let rets = read_refs(dec)?;
            let count = dec.length()?;
            let mut modes = Vec::with_capacity(count.min(dec.remaining()));
            for _ in 0..count {
                let b = dec.read_u8()?;
                modes.push(Mode::from_u8(b).ok_or(Error::InvalidAnnotation(b))?);
            }
            RawEntry::Func { args, rets, modes }
        }
        Some(Opcode::Service) => {
            let count = dec.length()?;
            let mut methods: Vec<(String, i64)> = Vec::with_capacity(count.min(dec.remaining()));
            for _ in 0..count {
                let name = dec.text()?.to_string();
                if methods.last().is_some_and(|(prev, _)| *prev >= name) {
                    return Err(Error::MethodOrder(name));
                }
                let r = dec.sleb()?;
                methods.push((name, r));
            }
            RawEntry::Service(methods)
        }
        _ => return Err(Error::InvalidOpcode(code)),
    };
    Ok(entry)
}

fn read_fields(dec: &mut Decoder<'_>) -> Result<Vec<(u32, i64)>> {
    let count = dec.length()?;
    let mut fields: Vec<(u32, i64)> = Vec::with_capacity(count.min(dec.remaining()));
    for _ in 0..count {
        let id = u32::try_from(dec.uleb()?).map_err(|_| Error::Leb128Overflow)?;
        if let Some(&(previous, _)) = fields.last() {
            if previous >= id {
                return Err(Error::FieldOrder { previous, next: id });
            }
        }
        fields.push((id, dec.sleb()?));
    }
    Ok(fields)
}

fn read_refs(dec: &mut Decoder<'_>) -> Result<Vec<i64>> {
    let count = dec.length()?;
    let mut refs = Vec::with_capacity(count.min(dec.remaining()));
    for _ in 0..count {
        refs.push(dec.sleb()?);
    }
    Ok(refs)
}

/// Every reference is a primitive opcode or an in-range index, and service
/// methods name func entries.
fn validate(raw: &[RawEntry]) -> Result<()> {
    let check = |r: i64| -> Result<()> {
        if r < 0 {
            primitive(r).map(|_| ())
        } else if r as u64 >= raw.len() as u64 {
            Err(Error::TypeIndexOutOfRange(r))
        } else {
            Ok(())
        }
    };
    for entry in raw {
        match entry {
            RawEntry::Opt(r) | RawEntry::Vec(r) => check(*r)?,
            RawEntry::Record(fields) | RawEntry::Variant(fields) => {
                fields.iter().try_for_each(|(_, r)| check(*r))?;
            }
            RawEntry::Func { args, rets, .. } => {
                args.iter().chain(rets).try_for_each(|r| check(*r))?;
            }
            RawEntry::Service(methods) => {
                for (name, r) in methods {
                    check(*r)?;
                    if *r < 0 || !matches!(raw[*r as usize], RawEntry::Func { .. }) {
                        return Err(Error::NotAFunction(name.clone()));
                    }
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Resolution
// ============================================================================

fn resolve(raw: &[RawEntry], max_passes: usize) -> Result<TypeEnv> {
    let mut slots = vec![Slot::Unseen; raw.len()];
    let mut left = raw.len();
    let mut passes = 0;

    while left > 0 {
        passes += 1;
        if passes > max_passes {
            return Err(Error::LimitExceeded(Limit::ResolvePasses));
        }

        let mut progress = false;
        for i in 0..raw.len() {
            if matches!(slots[i], Slot::Resolved(_)) {
                continue;
            }
            match build(&raw[i], &slots, false) {
                Some(ty) => {
                    slots[i] = Slot::Resolved(ty);
                    left -= 1;
                    progress = true;
                }
                None => slots[i] = Slot::Resolving,
            }
        }
        if progress {
            continue;
        }

        passes += 1;
        if passes > max_passes {
            return Err(Error::LimitExceeded(Limit::ResolvePasses));
        }
        let knot = (0..raw.len())
            .filter(|&i| !matches!(slots[i], Slot::Resolved(_)))
            .find_map(|i| build(&raw[i], &slots, true).map(|ty| (i, ty)));
        match knot {
            Some((i, ty)) => {
                tracing::trace!(slot = i, "closed recursive type");
                slots[i] = Slot::Resolved(ty);
                left -= 1;
            }
            None => return Err(Error::Unresolved(left)),
        }
    }
    tracing::trace!(slots = raw.len(), passes, "resolved type table");

    let defs = slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Resolved(ty) => Ok(ty),
            Slot::Unseen | Slot::Resolving => Err(Error::Unresolved(1)),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TypeEnv::from_defs(defs))
}

/// Builds the type of one entry if its references allow it. With `knot`,
/// lazy references to unresolved slots become `Rec` edges.
fn build(entry: &RawEntry, slots: &[Slot], knot: bool) -> Option<WireType> {
    let strict = |r: i64| -> Option<WireType> {
        if r < 0 {
            return primitive(r).ok();
        }
        match &slots[r as usize] {
            Slot::Resolved(ty) => Some(ty.clone()),
            Slot::Unseen | Slot::Resolving => None,
        }
    };
    let lazy = |r: i64| -> Option<WireType> {
        strict(r).or_else(|| knot.then(|| WireType::rec(r as usize)))
    };
    let field_list = |fields: &[(u32, i64)], get: &dyn Fn(i64) -> Option<WireType>| {
        fields
            .iter()
            .map(|&(id, r)| get(r).map(|ty| Field { label: Label::Id(id), ty }))
            .collect::<Option<Vec<_>>>()
            .map(Fields::new)
    };

    let kind = match entry {
        RawEntry::Opt(r) => TypeKind::Opt(lazy(*r)?),
        RawEntry::Vec(r) => TypeKind::Vec(lazy(*r)?),
        RawEntry::Record(fs) => TypeKind::Record(field_list(fs, &strict)?),
        RawEntry::Variant(fs) => TypeKind::Variant(field_list(fs, &lazy)?),
        RawEntry::Func { args, rets, modes } => TypeKind::Func(FuncType {
            args: args.iter().map(|r| lazy(*r)).collect::<Option<_>>()?,
            rets: rets.iter().map(|r| lazy(*r)).collect::<Option<_>>()?,
            modes: modes.clone(),
        }),
        RawEntry::Service(methods) => {
            let methods = methods
                .iter()
                .map(|(name, r)| lazy(*r).map(|ty| (name.clone(), ty)))
                .collect::<Option<Vec<_>>>()?;
            return Some(WireType::service(methods));
        }
    };
    Some(WireType::new(kind))
}
