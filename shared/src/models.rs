use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════
// FORM VALUES
// ═══════════════════════════════════════════════════════════════════════════

/// One form's data: field name to value. Owned by exactly one engine instance
/// for the lifetime of one mounted form.
pub type FormData = BTreeMap<String, FieldValue>;

/// Field name (or [`GENERAL_ERROR_KEY`]) to a human-readable message. Sparse:
/// a field with no entry is currently considered valid.
pub type FieldErrors = BTreeMap<String, String>;

/// Reserved error key for form-wide (banner) messages.
pub const GENERAL_ERROR_KEY: &str = "general";

/// The expected shape of a field's value, declared per field by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Records,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Records => write!(f, "records"),
        }
    }
}

impl FieldKind {
    /// User-facing (Spanish) name used in variant-mismatch messages.
    pub fn display_es(&self) -> &'static str {
        match self {
            FieldKind::Text => "texto",
            FieldKind::Number => "número",
            FieldKind::Bool => "booleano",
            FieldKind::Records => "lista",
        }
    }
}

/// A single form field value. The source system kept an open bag of
/// heterogeneous values; here each value carries its variant so the schema
/// can additionally check variant-match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Records(Vec<DynamicRecord>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Records(_) => FieldKind::Records,
        }
    }

    /// JS-style truthiness, used for checkbox coercion.
    pub fn truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => *n != 0.0,
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Records(r) => !r.is_empty(),
        }
    }

    /// True for the values the source treated as "not filled in".
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Records(r) => r.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[DynamicRecord]> {
        match self {
            FieldValue::Records(r) => Some(r),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<DynamicRecord>> for FieldValue {
    fn from(value: Vec<DynamicRecord>) -> Self {
        FieldValue::Records(value)
    }
}

/// Template for a dynamic record's fields, e.g. `{"telefono": Text("")}`.
pub type RecordTemplate = BTreeMap<String, FieldValue>;

/// One repeatable sub-record inside a dynamic (array-typed) field.
///
/// The id exists only for in-sequence identity and removal; it is never
/// persisted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub values: BTreeMap<String, FieldValue>,
}

impl DynamicRecord {
    pub fn from_template(template: &RecordTemplate) -> Self {
        Self {
            id: Uuid::new_v4(),
            values: template.clone(),
        }
    }

    pub fn get(&self, sub_field: &str) -> Option<&FieldValue> {
        self.values.get(sub_field)
    }
}

/// How the originating input widget delivered the value. Checkbox inputs
/// coerce their value to a boolean on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Number,
    Checkbox,
    Select,
}

/// A field-level validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PRINCIPALS
// ═══════════════════════════════════════════════════════════════════════════

/// Clinic staff role, used by the default permission checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Secretary,
    Guest,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Doctor => write!(f, "doctor"),
            Role::Secretary => write!(f, "secretary"),
            Role::Guest => write!(f, "guest"),
        }
    }
}

/// The acting principal a form is mounted for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            full_name: None,
            role,
            created_at: Utc::now(),
        }
    }
}
