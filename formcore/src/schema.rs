//! Declarative form schemas
//!
//! A [`Schema`] declares, per field, the expected value variant and the rules
//! it must satisfy. Validation is aggregate, never fail-fast: one pass
//! reports every violation it can detect, so a form can show all field
//! errors at once. Single-field validation backs on-blur feedback.
//!
//! The engine only depends on the [`SchemaValidator`] seam, so tests and
//! callers may substitute their own validator.

use regex::Regex;
use shared::{FieldError, FieldKind, FieldValue, FormData};

/// Pluggable schema validator contract.
///
/// `validate` must report all violations it can detect in one pass
/// (aggregate semantics); `validate_field` checks exactly one field in
/// isolation.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, data: &FormData) -> Result<(), Vec<FieldError>>;
    fn validate_field(&self, field: &str, data: &FormData) -> Result<(), String>;
}

/// Builder for accumulating validation errors
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    errors: Vec<FieldError>,
}

impl ValidationBuilder {
    pub fn new() -> Self {
        Self { errors: vec![] }
    }

    /// Add an error if the result is Err
    pub fn check<F>(&mut self, field: &str, validator: F) -> &mut Self
    where
        F: FnOnce() -> Result<(), String>,
    {
        if let Err(message) = validator() {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Add an error directly
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Finish building and return Result
    pub fn build(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

type CheckFn = fn(&str) -> Result<(), String>;

/// Rules for one declared field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    kind: FieldKind,
    required: bool,
    min_len: Option<usize>,
    max_len: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<(Regex, String)>,
    no_xss: bool,
    checks: Vec<CheckFn>,
    record_rules: Vec<(String, FieldRule)>,
}

impl FieldRule {
    fn of_kind(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
            pattern: None,
            no_xss: false,
            checks: vec![],
            record_rules: vec![],
        }
    }

    pub fn text() -> Self {
        Self::of_kind(FieldKind::Text)
    }

    pub fn number() -> Self {
        Self::of_kind(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        Self::of_kind(FieldKind::Bool)
    }

    pub fn records() -> Self {
        Self::of_kind(FieldKind::Records)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Regex the text value must match, with the message shown on mismatch.
    pub fn matches(mut self, pattern: &Regex, message: impl Into<String>) -> Self {
        self.pattern = Some((pattern.clone(), message.into()));
        self
    }

    pub fn no_xss(mut self) -> Self {
        self.no_xss = true;
        self
    }

    /// Attach a named validator function (email, phone, date, ...).
    pub fn check(mut self, check: CheckFn) -> Self {
        self.checks.push(check);
        self
    }

    /// Declare a rule for one sub-field of every record in a Records field.
    pub fn record_field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.record_rules.push((name.into(), rule));
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// First violation for a present, non-empty value of this field.
    fn check_value(&self, value: &FieldValue) -> Result<(), String> {
        if value.kind() != self.kind {
            return Err(format!(
                "tipo de valor inválido, se esperaba {}",
                self.kind.display_es()
            ));
        }
        match value {
            FieldValue::Text(s) => {
                if let Some(min) = self.min_len {
                    crate::validators::validate_length(s, min, self.max_len.unwrap_or(usize::MAX))?;
                } else if let Some(max) = self.max_len {
                    crate::validators::validate_length(s, 0, max)?;
                }
                if let Some((pattern, message)) = &self.pattern {
                    if !pattern.is_match(s.trim()) {
                        return Err(message.clone());
                    }
                }
                if self.no_xss {
                    crate::validators::validate_no_xss(s)?;
                }
                for check in &self.checks {
                    check(s)?;
                }
                Ok(())
            }
            FieldValue::Number(n) => crate::validators::validate_range(*n, self.min, self.max),
            FieldValue::Bool(_) => Ok(()),
            // Per-record sub-fields are reported individually by the schema
            // walk so each one gets its own error path.
            FieldValue::Records(_) => Ok(()),
        }
    }
}

/// A declaration-ordered set of field rules for one form type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldRule)>,
}

impl Schema {
    pub fn new() -> Self {
        Self { fields: vec![] }
    }

    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((name.into(), rule));
        self
    }

    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rule)| rule)
    }

    pub fn declared_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    fn validate_one(
        field: &str,
        rule: &FieldRule,
        data: &FormData,
        builder: &mut ValidationBuilder,
    ) {
        let value = data.get(field);
        let missing = value.map(FieldValue::is_empty).unwrap_or(true);

        if missing {
            if rule.required {
                let message = if rule.kind == FieldKind::Records {
                    format!("{} debe tener al menos un elemento", field)
                } else {
                    format!("{} es obligatorio", field)
                };
                builder.add_error(field, message);
            }
            return;
        }

        let value = match value {
            Some(value) => value,
            None => return,
        };

        builder.check(field, || rule.check_value(value));

        if let FieldValue::Records(records) = value {
            for (index, record) in records.iter().enumerate() {
                for (sub_field, sub_rule) in &rule.record_rules {
                    let path = format!("{}[{}].{}", field, index, sub_field);
                    let sub_value = record.get(sub_field);
                    let sub_missing = sub_value.map(FieldValue::is_empty).unwrap_or(true);
                    if sub_missing {
                        if sub_rule.required {
                            builder.add_error(&path, format!("{} es obligatorio", sub_field));
                        }
                        continue;
                    }
                    if let Some(sub_value) = sub_value {
                        builder.check(&path, || sub_rule.check_value(sub_value));
                    }
                }
            }
        }
    }
}

impl SchemaValidator for Schema {
    fn validate(&self, data: &FormData) -> Result<(), Vec<FieldError>> {
        let mut builder = ValidationBuilder::new();
        for (field, rule) in &self.fields {
            Self::validate_one(field, rule, data, &mut builder);
        }
        builder.build()
    }

    fn validate_field(&self, field: &str, data: &FormData) -> Result<(), String> {
        let rule = match self.rule(field) {
            Some(rule) => rule,
            // Undeclared fields are advisory-only and always valid.
            None => return Ok(()),
        };
        let mut builder = ValidationBuilder::new();
        Self::validate_one(field, rule, data, &mut builder);
        match builder.build() {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors
                .into_iter()
                .next()
                .map(|e| e.message)
                .unwrap_or_else(|| "valor inválido".to_string())),
        }
    }
}
