//! Resource schema layer
//!
//! Each resource kind publishes a static [`ResourceSchema`]: field names,
//! required/optional, computed, ForceNew, defaults and allow-lists. The schema
//! normalizes declared attributes before any network call and tells the
//! lifecycle driver which changes can be applied in place and which force a
//! replacement.

use crate::error::{Error, Result};
use crate::traits::Attributes;
use serde::Serialize;
use serde_json::Value;

/// Value kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 string
    String,
    /// Non-negative integer
    Int,
}

/// Default applied when a field is omitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldDefault {
    /// String default
    Str(&'static str),
    /// Integer default
    Int(u64),
}

impl FieldDefault {
    fn to_value(self) -> Value {
        match self {
            FieldDefault::Str(s) => Value::from(s),
            FieldDefault::Int(n) => Value::from(n),
        }
    }
}

/// One field of a resource schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    /// Attribute name
    pub name: &'static str,
    /// Value kind
    pub kind: FieldKind,
    /// Must be declared
    pub required: bool,
    /// May be filled in by the resource when omitted
    pub computed: bool,
    /// Changing it requires destroying and recreating the entity
    pub force_new: bool,
    /// Default applied when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldDefault>,
    /// Permitted values; empty means unrestricted
    #[serde(skip_serializing_if = "is_unrestricted")]
    pub allowed: &'static [&'static str],
    /// Human readable description
    pub description: &'static str,
}

impl FieldSchema {
    /// An optional string field
    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// An optional integer field
    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int)
    }

    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            computed: false,
            force_new: false,
            default: None,
            allowed: &[],
            description: "",
        }
    }

    /// Mark the field as required
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field as computed when omitted
    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Mark the field as ForceNew
    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Set a default
    pub const fn default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict values to an allow-list
    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }

    /// Attach a description
    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn check(&self, type_name: &str, value: &Value) -> Result<()> {
        match (self.kind, value) {
            (FieldKind::String, Value::String(s)) => {
                if !self.allowed.is_empty() && !self.allowed.contains(&s.as_str()) {
                    return Err(Error::invalid_input(format!(
                        "{type_name}.{}: '{s}' is not one of {}",
                        self.name,
                        self.allowed.join(", ")
                    )));
                }
                Ok(())
            }
            (FieldKind::Int, Value::Number(n)) if n.as_u64().is_some() => Ok(()),
            (kind, other) => Err(Error::invalid_input(format!(
                "{type_name}.{}: expected {kind:?}, got {other}",
                self.name
            ))),
        }
    }
}

fn is_unrestricted(allowed: &&'static [&'static str]) -> bool {
    allowed.is_empty()
}

/// Schema of one managed resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceSchema {
    /// Resource type name
    pub type_name: &'static str,
    /// Fields in declaration order
    pub fields: &'static [FieldSchema],
}

/// Result of comparing prior attributes against declared ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDiff {
    /// Every field whose declared value differs
    pub changed: Vec<&'static str>,
    /// The subset of `changed` that forces replacement
    pub force_new: Vec<&'static str>,
}

impl AttributeDiff {
    /// Nothing differs
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    /// At least one ForceNew field differs
    pub fn requires_replacement(&self) -> bool {
        !self.force_new.is_empty()
    }

    /// Whether a specific field differs
    pub fn has_change(&self, field: &str) -> bool {
        self.changed.contains(&field)
    }
}

impl ResourceSchema {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Apply defaults and validate declared attributes
    ///
    /// Rejects unknown fields, missing required fields, wrong kinds and
    /// allow-list violations. `null` counts as omitted. Empty strings on
    /// optional fields are dropped so that computed defaults apply.
    pub fn normalize(&self, desired: &Attributes) -> Result<Attributes> {
        if let Some(unknown) = desired.keys().find(|key| self.field(key).is_none()) {
            return Err(Error::invalid_input(format!(
                "{}: unknown attribute '{unknown}'",
                self.type_name
            )));
        }

        let mut normalized = Attributes::new();
        for field in self.fields {
            let declared = desired
                .get(field.name)
                .filter(|v| !v.is_null())
                .filter(|v| field.required || v.as_str() != Some(""));

            match (declared, field.default) {
                (Some(value), _) => {
                    field.check(self.type_name, value)?;
                    normalized.insert(field.name.to_string(), value.clone());
                }
                (None, Some(default)) => {
                    normalized.insert(field.name.to_string(), default.to_value());
                }
                (None, None) if field.required => {
                    return Err(Error::invalid_input(format!(
                        "{}: missing required attribute '{}'",
                        self.type_name, field.name
                    )));
                }
                (None, None) => {}
            }
        }

        if let Some(required_empty) = self
            .fields
            .iter()
            .filter(|f| f.required && f.kind == FieldKind::String)
            .find(|f| normalized.get(f.name).and_then(Value::as_str) == Some(""))
        {
            return Err(Error::invalid_input(format!(
                "{}: attribute '{}' cannot be empty",
                self.type_name, required_empty.name
            )));
        }

        Ok(normalized)
    }

    /// Compare prior attributes with normalized declared attributes
    ///
    /// Computed fields left undeclared never count as changed.
    pub fn diff(&self, prior: &Attributes, desired: &Attributes) -> AttributeDiff {
        let mut diff = AttributeDiff::default();

        for field in self.fields {
            let Some(wanted) = desired.get(field.name) else {
                if field.computed {
                    continue;
                }
                if prior.get(field.name).is_some_and(|v| !v.is_null()) {
                    diff.changed.push(field.name);
                    if field.force_new {
                        diff.force_new.push(field.name);
                    }
                }
                continue;
            };

            if prior.get(field.name) != Some(wanted) {
                diff.changed.push(field.name);
                if field.force_new {
                    diff.force_new.push(field.name);
                }
            }
        }

        diff
    }
}
