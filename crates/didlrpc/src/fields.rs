//! # Field Mapping
//!
//! Host field names and wire labels meet here. By default a host name maps to
//! the wire name with its first character lower-cased; explicit renames
//! override that in both directions. Numeric host keys (`"4895187"`) address a
//! wire id directly.

use std::collections::HashMap;

use didlpack::Label;
use didlpack::field_hash;

/// Lower-cases the first character of a host name.
pub fn normalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    /// Host name to wire name.
    to_wire: HashMap<String, String>,
    /// Wire id to host name.
    to_host: HashMap<u32, String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `host` to the wire name `wire`, and back.
    pub fn rename(mut self, host: impl Into<String>, wire: impl Into<String>) -> Self {
        let host = host.into();
        let wire = wire.into();
        self.to_host.insert(field_hash(&wire), host.clone());
        self.to_wire.insert(host, wire);
        self
    }

    /// Declares host names so decoded ids can be named again.
    pub fn declare<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            let name = name.into();
            let id = self.wire_label(&name).id();
            self.to_host.entry(id).or_insert(name);
        }
        self
    }

    /// The wire label for a host name.
    pub fn wire_label(&self, host: &str) -> Label {
        if let Some(wire) = self.to_wire.get(host) {
            return Label::Named(wire.clone());
        }
        match host.parse::<u32>() {
            Ok(id) => Label::Id(id),
            Err(_) => Label::Named(normalize(host)),
        }
    }

    /// The host name for a wire label. Labels with neither a mapping nor a
    /// name are keyed by their numeric id.
    pub fn host_name(&self, label: &Label) -> String {
        if let Some(name) = self.to_host.get(&label.id()) {
            return name.clone();
        }
        match label.name() {
            Some(name) => name.to_string(),
            None => label.id().to_string(),
        }
    }
}
