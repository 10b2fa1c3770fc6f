//! Form state engine
//!
//! [`FormEngine`] is the single source of truth for one mounted form: its
//! data, per-field and general errors, dynamic (array-typed) sub-fields, and
//! the validation/submission lifecycle. One engine instance owns one form's
//! data for the lifetime of the mount; `reset_form` replaces it wholesale.
//!
//! Submission follows a fixed pipeline: rate-limit gate, then sanitize, then
//! aggregate schema validation, and only then the caller's async submit
//! callback. Every business failure along the way is absorbed into the
//! error map — `handle_submit` never propagates the callback's error, so
//! callers read `general_error`/`has_errors` reactively instead of catching.

use parking_lot::Mutex;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use shared::{
    DynamicRecord, FieldErrors, FieldValue, FormData, InputKind, RecordTemplate,
    GENERAL_ERROR_KEY,
};

use crate::rate_limit::{submit_key, SubmitRateLimiter};
use crate::sanitizers::{DefaultSanitizer, Sanitize};
use crate::schema::SchemaValidator;

/// Message shown when the submission budget is exhausted.
pub const THROTTLE_MESSAGE: &str =
    "Demasiados intentos. Por favor espere antes de volver a intentarlo.";

/// Fallback when a submit rejection carries no usable message.
pub const SUBMIT_FALLBACK_MESSAGE: &str = "Error al enviar el formulario";

#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub enable_rate_limit: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            enable_rate_limit: true,
        }
    }
}

/// Result of a full validation pass. `data` carries the sanitized copy when
/// valid; the engine's own `formData` is never mutated by validation.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub data: Option<FormData>,
    pub errors: FieldErrors,
}

#[derive(Debug, Default)]
struct EngineState {
    data: FormData,
    errors: FieldErrors,
    is_submitting: bool,
    is_validating: bool,
    attempts: u32,
}

pub struct FormEngine {
    form_type: String,
    schema: Option<Arc<dyn SchemaValidator>>,
    sanitizer: Arc<dyn Sanitize>,
    limiter: Arc<SubmitRateLimiter>,
    initial_data: FormData,
    state: Mutex<EngineState>,
}

impl FormEngine {
    /// Build an engine with the default sanitizer and a private limiter.
    pub fn new(
        schema: Option<Arc<dyn SchemaValidator>>,
        initial_data: FormData,
        form_type: impl Into<String>,
    ) -> Self {
        Self::with_services(
            schema,
            initial_data,
            form_type,
            Arc::new(DefaultSanitizer),
            Arc::new(SubmitRateLimiter::new(Default::default())),
        )
    }

    /// Build an engine against application-provided collaborators. The
    /// limiter is typically shared across every form of the application so
    /// all mounts of one form type share a throttling budget.
    pub fn with_services(
        schema: Option<Arc<dyn SchemaValidator>>,
        initial_data: FormData,
        form_type: impl Into<String>,
        sanitizer: Arc<dyn Sanitize>,
        limiter: Arc<SubmitRateLimiter>,
    ) -> Self {
        let state = EngineState {
            data: initial_data.clone(),
            ..Default::default()
        };
        Self {
            form_type: form_type.into(),
            schema,
            sanitizer,
            limiter,
            initial_data,
            state: Mutex::new(state),
        }
    }

    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    // ── snapshots ──────────────────────────────────────────────────────

    pub fn data(&self) -> FormData {
        self.state.lock().data.clone()
    }

    pub fn value(&self, field: &str) -> Option<FieldValue> {
        self.state.lock().data.get(field).cloned()
    }

    pub fn errors(&self) -> FieldErrors {
        self.state.lock().errors.clone()
    }

    pub fn error(&self, field: &str) -> Option<String> {
        self.state.lock().errors.get(field).cloned()
    }

    pub fn general_error(&self) -> Option<String> {
        self.error(GENERAL_ERROR_KEY)
    }

    pub fn has_errors(&self) -> bool {
        !self.state.lock().errors.is_empty()
    }

    pub fn is_form_valid(&self) -> bool {
        let state = self.state.lock();
        state.errors.is_empty() && !state.is_validating
    }

    pub fn is_submitting(&self) -> bool {
        self.state.lock().is_submitting
    }

    pub fn is_validating(&self) -> bool {
        self.state.lock().is_validating
    }

    /// Submit invocations since mount/reset. Diagnostics only.
    pub fn attempts(&self) -> u32 {
        self.state.lock().attempts
    }

    // ── field mutation ─────────────────────────────────────────────────

    /// Write one field's value and synchronously clear its error. Checkbox
    /// inputs coerce the value to a boolean; validity is only re-assessed on
    /// blur or submit.
    pub fn handle_change(&self, field: &str, value: FieldValue, kind: InputKind) {
        let value = match kind {
            InputKind::Checkbox => FieldValue::Bool(value.truthy()),
            _ => value,
        };
        let mut state = self.state.lock();
        state.data.insert(field.to_string(), value);
        state.errors.remove(field);
    }

    /// Replace one sub-field of the record with `record_id` inside the
    /// ordered sequence at `array_field`. Silent no-op when the array or
    /// record is absent.
    pub fn handle_dynamic_change(
        &self,
        array_field: &str,
        record_id: Uuid,
        sub_field: &str,
        value: FieldValue,
    ) {
        let mut state = self.state.lock();
        if let Some(FieldValue::Records(records)) = state.data.get_mut(array_field) {
            if let Some(record) = records.iter_mut().find(|r| r.id == record_id) {
                record.values.insert(sub_field.to_string(), value);
            }
        }
    }

    /// Append a record built from `template` to the sequence at
    /// `array_field`, creating the sequence if absent. Returns the new
    /// record's id.
    pub fn add_dynamic_field(&self, array_field: &str, template: &RecordTemplate) -> Uuid {
        let record = DynamicRecord::from_template(template);
        let id = record.id;
        let mut state = self.state.lock();
        match state.data.get_mut(array_field) {
            Some(FieldValue::Records(records)) => records.push(record),
            _ => {
                state
                    .data
                    .insert(array_field.to_string(), FieldValue::Records(vec![record]));
            }
        }
        id
    }

    /// Remove the record with `record_id`; no-op if absent. Never reorders
    /// the surviving records.
    pub fn remove_dynamic_field(&self, array_field: &str, record_id: Uuid) {
        let mut state = self.state.lock();
        if let Some(FieldValue::Records(records)) = state.data.get_mut(array_field) {
            records.retain(|r| r.id != record_id);
        }
    }

    // ── validation ─────────────────────────────────────────────────────

    /// Sanitize and validate the current form data. Populates the engine's
    /// error map (wholesale clear on success) but never mutates `formData`;
    /// the sanitized copy comes back in the outcome for the caller to use.
    pub fn validate(&self) -> ValidationOutcome {
        let data = self.data();
        self.validate_data(&data)
    }

    /// Same as [`validate`](Self::validate) but over an explicit override
    /// instead of the engine's current data.
    pub fn validate_data(&self, data: &FormData) -> ValidationOutcome {
        self.state.lock().is_validating = true;
        let outcome = self.run_validation(data);
        {
            let mut state = self.state.lock();
            state.errors = outcome.errors.clone();
            state.is_validating = false;
        }
        outcome
    }

    fn run_validation(&self, data: &FormData) -> ValidationOutcome {
        let sanitized = match self.sanitizer.sanitize(data, &self.form_type) {
            Ok(sanitized) => sanitized,
            Err(err) => {
                let mut errors = FieldErrors::new();
                errors.insert(GENERAL_ERROR_KEY.to_string(), err.message);
                return ValidationOutcome {
                    is_valid: false,
                    data: None,
                    errors,
                };
            }
        };

        if let Some(schema) = &self.schema {
            if let Err(violations) = schema.validate(&sanitized) {
                let mut errors = FieldErrors::new();
                for violation in violations {
                    // First message per field wins
                    errors.entry(violation.field).or_insert(violation.message);
                }
                return ValidationOutcome {
                    is_valid: false,
                    data: None,
                    errors,
                };
            }
        }

        ValidationOutcome {
            is_valid: true,
            data: Some(sanitized),
            errors: FieldErrors::new(),
        }
    }

    /// Validate exactly one field against the schema, setting or clearing
    /// its error entry. Returns whether the field is currently valid. Used
    /// for on-blur feedback.
    pub fn validate_field(&self, field: &str) -> bool {
        let schema = match &self.schema {
            Some(schema) => schema.clone(),
            None => {
                self.state.lock().errors.remove(field);
                return true;
            }
        };
        let data = self.data();
        match schema.validate_field(field, &data) {
            Ok(()) => {
                self.state.lock().errors.remove(field);
                true
            }
            Err(message) => {
                self.state.lock().errors.insert(field.to_string(), message);
                false
            }
        }
    }

    // ── submission ─────────────────────────────────────────────────────

    /// Run the submission pipeline. Resolves to `Some(result)` only when the
    /// rate gate admitted the attempt, validation passed, and the callback
    /// succeeded; every failure is absorbed into the error map and resolves
    /// to `None`.
    pub async fn handle_submit<F, Fut>(&self, on_submit: F, options: SubmitOptions) -> Option<Value>
    where
        F: FnOnce(FormData) -> Fut,
        Fut: Future<Output = Result<Value, Value>>,
    {
        let key = submit_key(&self.form_type);

        // Admission control runs before anything else: a throttled attempt
        // never validates and never flips is_submitting.
        if options.enable_rate_limit && !self.limiter.is_allowed(&key) {
            self.state
                .lock()
                .errors
                .insert(GENERAL_ERROR_KEY.to_string(), THROTTLE_MESSAGE.to_string());
            return None;
        }

        let attempt = {
            let mut state = self.state.lock();
            state.is_submitting = true;
            state.attempts += 1;
            state.attempts
        };
        tracing::debug!(form_type = %self.form_type, attempt, "Form submission started");

        let outcome = self.validate();
        if !outcome.is_valid {
            self.state.lock().is_submitting = false;
            return None;
        }
        let sanitized = match outcome.data {
            Some(sanitized) => sanitized,
            None => {
                self.state.lock().is_submitting = false;
                return None;
            }
        };

        match on_submit(sanitized).await {
            Ok(result) => {
                // A successful submission does not count against future
                // throttling.
                if options.enable_rate_limit {
                    self.limiter.reset(&key);
                }
                self.state.lock().is_submitting = false;
                Some(result)
            }
            Err(rejection) => {
                let message = normalize_submit_error(&rejection);
                tracing::warn!(form_type = %self.form_type, %message, "Form submission failed");
                let mut state = self.state.lock();
                state.errors.insert(GENERAL_ERROR_KEY.to_string(), message);
                state.is_submitting = false;
                None
            }
        }
    }

    /// Store a form-wide error in the `general` slot.
    pub fn set_general_error(&self, message: &str) {
        self.state
            .lock()
            .errors
            .insert(GENERAL_ERROR_KEY.to_string(), message.to_string());
    }

    // ── reset ──────────────────────────────────────────────────────────

    /// Restore the initial data, clear all errors and flags, and zero the
    /// attempt counter.
    pub fn reset_form(&self) {
        self.reset_form_with(self.initial_data.clone());
    }

    /// Reset onto explicit replacement data.
    pub fn reset_form_with(&self, new_data: FormData) {
        let mut state = self.state.lock();
        state.data = new_data;
        state.errors.clear();
        state.is_submitting = false;
        state.is_validating = false;
        state.attempts = 0;
    }
}

/// Derive a display message from a submit rejection.
///
/// Precedence, preserved from the source system for behavioral
/// compatibility: a non-empty `message` member, then a non-empty `error`
/// member, then the object rendered as a string, then the raw value when it
/// is already a string, then the generic fallback. Empty strings are treated
/// as absent.
fn normalize_submit_error(rejection: &Value) -> String {
    match rejection {
        Value::Object(map) => {
            if let Some(message) = non_empty_str(map.get("message")) {
                return message.to_string();
            }
            if let Some(error) = non_empty_str(map.get("error")) {
                return error.to_string();
            }
            rejection.to_string()
        }
        Value::String(s) if !s.is_empty() => s.clone(),
        _ => SUBMIT_FALLBACK_MESSAGE.to_string(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
