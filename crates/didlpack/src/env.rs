//! Recursive type definitions.
//!
//! A `TypeEnv` is an arena of type bodies addressed by [`TypeKind::Rec`]
//! references. Building a recursive type reserves an id first, so the body can
//! mention itself without a reference cycle between handles.

use crate::error::Error;
use crate::error::Result;
use crate::types::TypeKind;
use crate::types::WireType;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeEnv {
    defs: Vec<Option<WireType>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_defs(defs: Vec<WireType>) -> Self {
        Self { defs: defs.into_iter().map(Some).collect() }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Allocates an id whose body is bound later.
    pub fn reserve(&mut self) -> usize {
        self.defs.push(None);
        self.defs.len() - 1
    }

    pub fn bind(&mut self, id: usize, body: WireType) -> Result<()> {
        match self.defs.get_mut(id) {
            Some(slot) => {
                *slot = Some(body);
                Ok(())
            }
            None => Err(Error::UnknownRec(id)),
        }
    }

    /// Defines a recursive type. `body` receives the `Rec` handle standing
    /// for the type being defined and returns its body.
    ///
    /// ```
    /// use didlpack::{TypeEnv, WireType};
    ///
    /// let mut env = TypeEnv::new();
    /// let list = env.define(|this| WireType::opt(WireType::record([
    ///     ("head", WireType::int()),
    ///     ("tail", this),
    /// ])));
    /// assert_eq!(list.to_string(), "rec0");
    /// ```
    pub fn define(&mut self, body: impl FnOnce(WireType) -> WireType) -> WireType {
        let id = self.reserve();
        let this = WireType::rec(id);
        self.defs[id] = Some(body(this.clone()));
        this
    }

    pub fn get(&self, id: usize) -> Result<&WireType> {
        self.defs
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownRec(id))
    }

    /// Follows `Rec` references until a structural type is reached.
    pub fn resolve(&self, ty: &WireType) -> Result<WireType> {
        let mut current = ty.clone();
        for _ in 0..=self.defs.len() {
            let id = match current.kind() {
                TypeKind::Rec(id) => *id,
                _ => return Ok(current),
            };
            current = self.get(id)?.clone();
        }
        match current.kind() {
            TypeKind::Rec(id) => Err(Error::UnknownRec(*id)),
            _ => Ok(current),
        }
    }
}
