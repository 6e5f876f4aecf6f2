//! Parameter descriptors.
//!
//! # Design
//! Each request type registers an ordered list of `Param<R>` values. A
//! descriptor names the wire key, says where the value goes (path, query or
//! body) and knows how to read the raw value off the request. Reading applies
//! the optional provide predicate and mapping table; serialization into
//! query text or body JSON happens in the request base.

use serde_json::{Map, Value};

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Path,
    Query,
    Body,
}

/// Mapping applied to `ascending` flags to produce a `sortOrder` value.
pub const SORT_ORDER: &[(&str, &str)] = &[("true", "asc"), ("false", "desc")];

/// Declares how one field of request `R` maps onto the wire.
pub struct Param<R> {
    name: &'static str,
    kind: ParamKind,
    getter: fn(&R) -> Option<Value>,
    mapping: Option<&'static [(&'static str, &'static str)]>,
    provide: Option<fn(&R) -> bool>,
    opaque: bool,
}

impl<R> Param<R> {
    fn new(name: &'static str, kind: ParamKind, getter: fn(&R) -> Option<Value>) -> Self {
        Self {
            name,
            kind,
            getter,
            mapping: None,
            provide: None,
            opaque: false,
        }
    }

    pub fn path(name: &'static str, getter: fn(&R) -> Option<Value>) -> Self {
        Self::new(name, ParamKind::Path, getter)
    }

    pub fn query(name: &'static str, getter: fn(&R) -> Option<Value>) -> Self {
        Self::new(name, ParamKind::Query, getter)
    }

    pub fn body(name: &'static str, getter: fn(&R) -> Option<Value>) -> Self {
        Self::new(name, ParamKind::Body, getter)
    }

    /// Translate raw values through `mapping`. Values without an entry pass
    /// through unchanged.
    pub fn with_mapping(mut self, mapping: &'static [(&'static str, &'static str)]) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Only emit this parameter when `predicate` holds for the request.
    pub fn provided_if(mut self, predicate: fn(&R) -> bool) -> Self {
        self.provide = Some(predicate);
        self
    }

    /// Send a body value exactly as read. Caller payloads such as variable
    /// values keep their nulls and empty objects.
    pub fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Resolve the value to send, or `None` when the parameter is omitted.
    pub fn read(&self, owner: &R) -> Option<Value> {
        if let Some(provide) = self.provide {
            if !provide(owner) {
                return None;
            }
        }
        let raw = (self.getter)(owner)?;
        if raw.is_null() {
            return None;
        }
        Some(self.apply_mapping(raw))
    }

    fn apply_mapping(&self, raw: Value) -> Value {
        let Some(mapping) = self.mapping else {
            return raw;
        };
        let key = match &raw {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            _ => return raw,
        };
        mapping
            .iter()
            .find(|(from, _)| *from == key)
            .map(|(_, to)| Value::from(*to))
            .unwrap_or(raw)
    }
}

/// Serialize a value for a query string or path segment.
///
/// Lists become comma-joined text; empty lists and nulls produce nothing.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(to_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(","))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Drop null fields from a body value. Objects left without any field are
/// dropped entirely.
pub fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(fields) => {
            let kept: Map<String, Value> = fields
                .into_iter()
                .filter_map(|(key, value)| prune(value).map(|v| (key, v)))
                .collect();
            if kept.is_empty() {
                None
            } else {
                Some(Value::Object(kept))
            }
        }
        other => Some(other),
    }
}
