//! # Wire Type Model
//!
//! The closed set of DIDL types. A [`WireType`] is a cheap-to-clone handle over
//! a shared [`TypeKind`] tree; decoded tables share sub-trees instead of
//! copying them.
//!
//! ## Invariants
//!
//! - Record and variant fields are sorted ascending by label id. The sorted
//!   position of a variant arm is its ordinal on the wire.
//! - Service methods are sorted ascending by name.
//! - Recursion is expressed with [`TypeKind::Rec`], an index into a
//!   [`TypeEnv`](crate::env::TypeEnv). Handles never form reference cycles.
//!
//! The [`Display`](fmt::Display) form is the canonical text signature, e.g.
//! `record {4895187:int; 5097222:text}`. It is capped at
//! [`MAX_TYPE_TEXT_LEN`] bytes.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::label::Label;
use crate::limits::MAX_TYPE_TEXT_LEN;

/// Type opcodes, as written on the wire in signed LEB128.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Null = -1,
    Bool = -2,
    Nat = -3,
    Int = -4,
    Nat8 = -5,
    Nat16 = -6,
    Nat32 = -7,
    Nat64 = -8,
    Int8 = -9,
    Int16 = -10,
    Int32 = -11,
    Int64 = -12,
    Float32 = -13,
    Float64 = -14,
    Text = -15,
    Reserved = -16,
    Empty = -17,
    Opt = -18,
    Vec = -19,
    Record = -20,
    Variant = -21,
    Func = -22,
    Service = -23,
    Principal = -24,
}

impl Opcode {
    /// Returns the opcode for a wire code, or `None` outside the closed range.
    pub fn from_i64(code: i64) -> Option<Self> {
        use Opcode::*;
        let op = match code {
            -1 => Null,
            -2 => Bool,
            -3 => Nat,
            -4 => Int,
            -5 => Nat8,
            -6 => Nat16,
            -7 => Nat32,
            -8 => Nat64,
            -9 => Int8,
            -10 => Int16,
            -11 => Int32,
            -12 => Int64,
            -13 => Float32,
            -14 => Float64,
            -15 => Text,
            -16 => Reserved,
            -17 => Empty,
            -18 => Opt,
            -19 => Vec,
            -20 => Record,
            -21 => Variant,
            -22 => Func,
            -23 => Service,
            -24 => Principal,
            _ => return None,
        };
        Some(op)
    }

    pub fn code(self) -> i64 {
        self as i8 as i64
    }

    /// Constructor markers open a table entry; everything else is a
    /// primitive usable directly as a type reference.
    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            Opcode::Opt
                | Opcode::Vec
                | Opcode::Record
                | Opcode::Variant
                | Opcode::Func
                | Opcode::Service
        )
    }
}

/// Func annotations.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mode {
    Query = 0x01,
    Oneway = 0x02,
    CompositeQuery = 0x03,
}

impl Mode {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Mode::Query),
            0x02 => Some(Mode::Oneway),
            0x03 => Some(Mode::CompositeQuery),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Mode::Query => "query",
            Mode::Oneway => "oneway",
            Mode::CompositeQuery => "composite_query",
        }
    }
}

/// One record field or variant arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: Label,
    pub ty: WireType,
}

/// Fields sorted ascending by label id.
///
/// Duplicate ids are kept as given and rejected when the type is described
/// into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields(Vec<Field>);

impl Fields {
    pub fn new(mut fields: Vec<Field>) -> Self {
        fields.sort_by_key(|f| f.label.id());
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.0.iter()
    }

    /// The field at a sorted position; for variants, the arm with that ordinal.
    pub fn at(&self, index: usize) -> Option<&Field> {
        self.0.get(index)
    }

    /// Sorted position of the field with the given id.
    pub fn position(&self, id: u32) -> Option<usize> {
        self.0.binary_search_by_key(&id, |f| f.label.id()).ok()
    }

    pub fn get(&self, id: u32) -> Option<&Field> {
        self.position(id).map(|i| &self.0[i])
    }

    /// Returns the first pair of adjacent ids that are not strictly increasing.
    pub fn first_duplicate(&self) -> Option<(u32, u32)> {
        self.0
            .windows(2)
            .map(|w| (w[0].label.id(), w[1].label.id()))
            .find(|(a, b)| a >= b)
    }

    /// True for `0, 1, .., n-1`: the shape of a tuple.
    pub fn is_tuple(&self) -> bool {
        self.0.iter().enumerate().all(|(i, f)| f.label.id() as usize == i)
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncType {
    pub args: Vec<WireType>,
    pub rets: Vec<WireType>,
    pub modes: Vec<Mode>,
}

/// Service methods, sorted by name. Each method type must be a func.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceType {
    methods: Vec<(String, WireType)>,
}

impl ServiceType {
    pub fn methods(&self) -> &[(String, WireType)] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&WireType> {
        self.methods
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|i| &self.methods[i].1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Null,
    Bool,
    Nat,
    Int,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Reserved,
    Empty,
    Principal,
    Opt(WireType),
    Vec(WireType),
    Record(Fields),
    Variant(Fields),
    Func(FuncType),
    Service(ServiceType),
    /// A reference into a type environment.
    Rec(usize),
}

/// Shared handle over a [`TypeKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireType(Arc<TypeKind>);

macro_rules! primitives {
    ($($name:ident => $kind:ident),* $(,)?) => {
        impl WireType {
            $(
                pub fn $name() -> Self {
                    WireType::new(TypeKind::$kind)
                }
            )*
        }
    };
}

primitives! {
    null => Null,
    bool => Bool,
    nat => Nat,
    int => Int,
    nat8 => Nat8,
    nat16 => Nat16,
    nat32 => Nat32,
    nat64 => Nat64,
    int8 => Int8,
    int16 => Int16,
    int32 => Int32,
    int64 => Int64,
    float32 => Float32,
    float64 => Float64,
    text => Text,
    reserved => Reserved,
    empty => Empty,
    principal => Principal,
}

impl WireType {
    pub fn new(kind: TypeKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> &TypeKind {
        &self.0
    }

    /// Address of the shared node, for identity-keyed memo tables.
    pub(crate) fn node_addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn opt(inner: WireType) -> Self {
        WireType::new(TypeKind::Opt(inner))
    }

    pub fn vec(inner: WireType) -> Self {
        WireType::new(TypeKind::Vec(inner))
    }

    pub fn record<L: Into<Label>>(fields: impl IntoIterator<Item = (L, WireType)>) -> Self {
        WireType::new(TypeKind::Record(collect_fields(fields)))
    }

    pub fn variant<L: Into<Label>>(arms: impl IntoIterator<Item = (L, WireType)>) -> Self {
        WireType::new(TypeKind::Variant(collect_fields(arms)))
    }

    /// A record with positional labels `0..n`.
    pub fn tuple(items: impl IntoIterator<Item = WireType>) -> Self {
        let fields = items
            .into_iter()
            .enumerate()
            .map(|(i, ty)| Field { label: Label::Unnamed(i as u32), ty })
            .collect();
        WireType::new(TypeKind::Record(Fields::new(fields)))
    }

    pub fn func(args: Vec<WireType>, rets: Vec<WireType>, modes: Vec<Mode>) -> Self {
        WireType::new(TypeKind::Func(FuncType { args, rets, modes }))
    }

    pub fn service<S: Into<String>>(methods: impl IntoIterator<Item = (S, WireType)>) -> Self {
        let mut methods: Vec<(String, WireType)> =
            methods.into_iter().map(|(n, t)| (n.into(), t)).collect();
        methods.sort_by(|a, b| a.0.cmp(&b.0));
        WireType::new(TypeKind::Service(ServiceType { methods }))
    }

    pub fn rec(id: usize) -> Self {
        WireType::new(TypeKind::Rec(id))
    }

    /// The type a primitive opcode stands for; `None` for constructor markers.
    pub fn primitive(op: Opcode) -> Option<Self> {
        let kind = match op {
            Opcode::Null => TypeKind::Null,
            Opcode::Bool => TypeKind::Bool,
            Opcode::Nat => TypeKind::Nat,
            Opcode::Int => TypeKind::Int,
            Opcode::Nat8 => TypeKind::Nat8,
            Opcode::Nat16 => TypeKind::Nat16,
            Opcode::Nat32 => TypeKind::Nat32,
            Opcode::Nat64 => TypeKind::Nat64,
            Opcode::Int8 => TypeKind::Int8,
            Opcode::Int16 => TypeKind::Int16,
            Opcode::Int32 => TypeKind::Int32,
            Opcode::Int64 => TypeKind::Int64,
            Opcode::Float32 => TypeKind::Float32,
            Opcode::Float64 => TypeKind::Float64,
            Opcode::Text => TypeKind::Text,
            Opcode::Reserved => TypeKind::Reserved,
            Opcode::Empty => TypeKind::Empty,
            Opcode::Principal => TypeKind::Principal,
            _ => return None,
        };
        Some(WireType::new(kind))
    }

    /// `None` only for `Rec`, which has no opcode of its own.
    pub fn opcode(&self) -> Option<Opcode> {
        let op = match self.kind() {
            TypeKind::Null => Opcode::Null,
            TypeKind::Bool => Opcode::Bool,
            TypeKind::Nat => Opcode::Nat,
            TypeKind::Int => Opcode::Int,
            TypeKind::Nat8 => Opcode::Nat8,
            TypeKind::Nat16 => Opcode::Nat16,
            TypeKind::Nat32 => Opcode::Nat32,
            TypeKind::Nat64 => Opcode::Nat64,
            TypeKind::Int8 => Opcode::Int8,
            TypeKind::Int16 => Opcode::Int16,
            TypeKind::Int32 => Opcode::Int32,
            TypeKind::Int64 => Opcode::Int64,
            TypeKind::Float32 => Opcode::Float32,
            TypeKind::Float64 => Opcode::Float64,
            TypeKind::Text => Opcode::Text,
            TypeKind::Reserved => Opcode::Reserved,
            TypeKind::Empty => Opcode::Empty,
            TypeKind::Principal => Opcode::Principal,
            TypeKind::Opt(_) => Opcode::Opt,
            TypeKind::Vec(_) => Opcode::Vec,
            TypeKind::Record(_) => Opcode::Record,
            TypeKind::Variant(_) => Opcode::Variant,
            TypeKind::Func(_) => Opcode::Func,
            TypeKind::Service(_) => Opcode::Service,
            TypeKind::Rec(_) => return None,
        };
        Some(op)
    }

    /// The opcode used directly as a type reference, for primitives only.
    pub fn primitive_opcode(&self) -> Option<i64> {
        self.opcode()
            .filter(|op| !op.is_constructor())
            .map(Opcode::code)
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive_opcode().is_some()
    }
}

fn collect_fields<L: Into<Label>>(fields: impl IntoIterator<Item = (L, WireType)>) -> Fields {
    Fields::new(
        fields
            .into_iter()
            .map(|(label, ty)| Field { label: label.into(), ty })
            .collect(),
    )
}

// ============================================================================
// Text form
// ============================================================================

/// Renders the text form, cut off after [`MAX_TYPE_TEXT_LEN`] bytes with a
/// trailing `...`. Decoded types may share subtrees, so their full text can
/// be exponentially larger than the message they came from.
impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = Capped { f, left: MAX_TYPE_TEXT_LEN, cut: false };
        render(&mut w, self)?;
        if w.cut {
            w.f.write_str("...")?;
        }
        Ok(())
    }
}

/// A writer that drops everything past its budget.
struct Capped<'a, 'f> {
    f: &'a mut fmt::Formatter<'f>,
    left: usize,
    cut: bool,
}

impl fmt::Write for Capped<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.cut {
            return Ok(());
        }
        let mut take = s.len().min(self.left);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.f.write_str(&s[..take])?;
        self.left -= take;
        if take < s.len() {
            self.cut = true;
        }
        Ok(())
    }
}

fn render(w: &mut Capped<'_, '_>, ty: &WireType) -> fmt::Result {
    if w.cut {
        return Ok(());
    }
    match ty.kind() {
        TypeKind::Opt(inner) => {
            w.write_str("opt ")?;
            render(w, inner)
        }
        TypeKind::Vec(inner) => {
            w.write_str("vec ")?;
            render(w, inner)
        }
        TypeKind::Record(fields) => render_fields(w, "record", fields),
        TypeKind::Variant(fields) => render_fields(w, "variant", fields),
        TypeKind::Func(func) => {
            w.write_str("func ")?;
            render_func(w, func)
        }
        TypeKind::Service(service) => {
            w.write_str("service {")?;
            for (i, (name, ty)) in service.methods.iter().enumerate() {
                if i > 0 {
                    w.write_str("; ")?;
                }
                write!(w, "{:?}:", name)?;
                render(w, ty)?;
            }
            w.write_str("}")
        }
        TypeKind::Rec(id) => write!(w, "rec{}", id),
        primitive => w.write_str(primitive_name(primitive)),
    }
}

fn primitive_name(kind: &TypeKind) -> &'static str {
    match kind {
        TypeKind::Null => "null",
        TypeKind::Bool => "bool",
        TypeKind::Nat => "nat",
        TypeKind::Int => "int",
        TypeKind::Nat8 => "nat8",
        TypeKind::Nat16 => "nat16",
        TypeKind::Nat32 => "nat32",
        TypeKind::Nat64 => "nat64",
        TypeKind::Int8 => "int8",
        TypeKind::Int16 => "int16",
        TypeKind::Int32 => "int32",
        TypeKind::Int64 => "int64",
        TypeKind::Float32 => "float32",
        TypeKind::Float64 => "float64",
        TypeKind::Text => "text",
        TypeKind::Reserved => "reserved",
        TypeKind::Empty => "empty",
        TypeKind::Principal => "principal",
        _ => "?",
    }
}

fn render_fields(w: &mut Capped<'_, '_>, keyword: &str, fields: &Fields) -> fmt::Result {
    write!(w, "{} {{", keyword)?;
    for (i, field) in fields.iter().enumerate() {
        if w.cut {
            return Ok(());
        }
        if i > 0 {
            w.write_str("; ")?;
        }
        write!(w, "{}:", field.label.id())?;
        render(w, &field.ty)?;
    }
    w.write_str("}")
}

fn render_func(w: &mut Capped<'_, '_>, func: &FuncType) -> fmt::Result {
    render_list(w, &func.args)?;
    w.write_str(" -> ")?;
    render_list(w, &func.rets)?;
    for mode in &func.modes {
        write!(w, " {}", mode.keyword())?;
    }
    Ok(())
}

fn render_list(w: &mut Capped<'_, '_>, types: &[WireType]) -> fmt::Result {
    w.write_str("(")?;
    for (i, ty) in types.iter().enumerate() {
        if w.cut {
            return Ok(());
        }
        if i > 0 {
            w.write_str(", ")?;
        }
        render(w, ty)?;
    }
    w.write_str(")")
}
