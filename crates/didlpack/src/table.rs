//! # Type Definition Table
//!
//! Per-call registry of constructed types. Each distinct descriptor gets one
//! slot, in first-seen order; sub-types are registered before the type that
//! mentions them. Primitives never take a slot and are referenced by opcode.
//!
//! ## Invariants
//!
//! - Descriptors name their children by slot, so equal descriptors mean equal
//!   types and deduplication never renders a type as text.
//! - A shared node is described once: decoded types share `Arc` subtrees, and
//!   walking them as trees would take time exponential in the table size.

use std::collections::HashMap;

use crate::env::TypeEnv;
use crate::error::Error;
use crate::error::Result;
use crate::leb128;
use crate::types::Opcode;
use crate::types::TypeKind;
use crate::types::WireType;

pub struct TypeTable<'e> {
    env: &'e TypeEnv,
    /// Descriptor bytes to slot.
    index: HashMap<Vec<u8>, i64>,
    /// Recursive definition to slot.
    recs: HashMap<usize, i64>,
    /// Node address to type reference. `held` keeps those nodes alive.
    seen: HashMap<usize, i64>,
    held: Vec<WireType>,
    entries: Vec<Vec<u8>>,
}

impl<'e> TypeTable<'e> {
    pub fn new(env: &'e TypeEnv) -> Self {
        Self {
            env,
            index: HashMap::new(),
            recs: HashMap::new(),
            seen: HashMap::new(),
            held: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the type reference for `ty`: its opcode if primitive, else its
    /// table index. Registering an equal type twice is a no-op.
    pub fn register(&mut self, ty: &WireType) -> Result<i64> {
        if let Some(op) = ty.primitive_opcode() {
            return Ok(op);
        }
        if let Some(&idx) = self.seen.get(&ty.node_addr()) {
            return Ok(idx);
        }
        let idx = match ty.kind() {
            TypeKind::Rec(id) => self.register_rec(*id)?,
            _ => {
                let bytes = self.descriptor(ty)?;
                self.intern(bytes)
            }
        };
        self.seen.insert(ty.node_addr(), idx);
        self.held.push(ty.clone());
        Ok(idx)
    }

    fn register_rec(&mut self, id: usize) -> Result<i64> {
        if let Some(&idx) = self.recs.get(&id) {
            return Ok(idx);
        }
        let body = self.env.resolve(&WireType::rec(id))?;
        if let Some(op) = body.primitive_opcode() {
            self.recs.insert(id, op);
            return Ok(op);
        }
        // The slot exists before the body is described, so the body can
        // refer back to it.
        let idx = self.entries.len() as i64;
        self.entries.push(Vec::new());
        self.recs.insert(id, idx);
        let bytes = self.descriptor(&body)?;
        self.index.entry(bytes.clone()).or_insert(idx);
        self.entries[idx as usize] = bytes;
        Ok(idx)
    }

    fn intern(&mut self, bytes: Vec<u8>) -> i64 {
        if let Some(&idx) = self.index.get(&bytes) {
            return idx;
        }
        let idx = self.entries.len() as i64;
        self.entries.push(bytes.clone());
        self.index.insert(bytes, idx);
        idx
    }

    fn descriptor(&mut self, ty: &WireType) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match ty.kind() {
            TypeKind::Opt(inner) => {
                let r = self.register(inner)?;
                leb128::encode_i64(Opcode::Opt.code(), &mut out);
                leb128::encode_i64(r, &mut out);
            }
            TypeKind::Vec(inner) => {
                let r = self.register(inner)?;
                leb128::encode_i64(Opcode::Vec.code(), &mut out);
                leb128::encode_i64(r, &mut out);
            }
            TypeKind::Record(fields) | TypeKind::Variant(fields) => {
                if let Some((previous, next)) = fields.first_duplicate() {
                    return Err(Error::FieldOrder { previous, next });
                }
                let refs = fields
                    .iter()
                    .map(|f| self.register(&f.ty))
                    .collect::<Result<Vec<_>>>()?;
                let op = match ty.kind() {
                    TypeKind::Record(_) => Opcode::Record,
                    _ => Opcode::Variant,
                };
                leb128::encode_i64(op.code(), &mut out);
                leb128::encode_u64(fields.len() as u64, &mut out);
                for (field, r) in fields.iter().zip(refs) {
                    leb128::encode_u64(field.label.id() as u64, &mut out);
                    leb128::encode_i64(r, &mut out);
                }
            }
            TypeKind::Func(func) => {
                let args = func.args.iter().map(|t| self.register(t)).collect::<Result<Vec<_>>>()?;
                let rets = func.rets.iter().map(|t| self.register(t)).collect::<Result<Vec<_>>>()?;
                leb128::encode_i64(Opcode::Func.code(), &mut out);
                write_refs(&args, &mut out);
                write_refs(&rets, &mut out);
                leb128::encode_u64(func.modes.len() as u64, &mut out);
                out.extend(func.modes.iter().map(|m| *m as u8));
            }
            TypeKind::Service(service) => {
                let mut refs = Vec::with_capacity(service.methods().len());
                let mut previous: Option<&str> = None;
                for (name, method) in service.methods() {
                    if previous.is_some_and(|p| p >= name.as_str()) {
                        return Err(Error::MethodOrder(name.clone()));
                    }
                    previous = Some(name);
                    if !matches!(self.env.resolve(method)?.kind(), TypeKind::Func(_)) {
                        return Err(Error::NotAFunction(name.clone()));
                    }
                    refs.push(self.register(method)?);
                }
                leb128::encode_i64(Opcode::Service.code(), &mut out);
                leb128::encode_u64(refs.len() as u64, &mut out);
                for ((name, _), r) in service.methods().iter().zip(refs) {
                    leb128::encode_u64(name.len() as u64, &mut out);
                    out.extend_from_slice(name.as_bytes());
                    leb128::encode_i64(r, &mut out);
                }
            }
            _ => {
                return Err(Error::InvalidOpcode(
                    ty.opcode().map(Opcode::code).unwrap_or_default(),
                ));
            }
        }
        Ok(out)
    }

    /// Appends the table: uLEB128 slot count, then each descriptor.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        leb128::encode_u64(self.entries.len() as u64, out);
        for entry in &self.entries {
            out.extend_from_slice(entry);
        }
    }
}

fn write_refs(refs: &[i64], out: &mut Vec<u8>) {
    leb128::encode_u64(refs.len() as u64, out);
    for r in refs {
        leb128::encode_i64(*r, out);
    }
}

impl WireType {
    /// Registers this type and its sub-types, returning its type reference.
    pub fn describe(&self, table: &mut TypeTable<'_>) -> Result<i64> {
        table.register(self)
    }
}
