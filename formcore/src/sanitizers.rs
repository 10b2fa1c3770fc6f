//! Input sanitization
//!
//! Functions to clean and normalize form input before validation, plus the
//! [`Sanitize`] seam the engine calls. Sanitization never mutates the form's
//! own data; it produces a cleaned copy for validation and submission.

use lazy_static::lazy_static;
use regex::Regex;
use shared::{FieldValue, FormData, SanitizeError};

use crate::validators::validate_email;

lazy_static! {
    /// Pattern to match HTML tags
    static ref HTML_TAG_PATTERN: Regex = Regex::new(r"<[^>]*>").unwrap();

    /// Pattern to match multiple whitespace characters
    static ref MULTI_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    /// Pattern to match control characters (except newline and tab)
    static ref CONTROL_CHARS: Regex = Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap();
}

/// Trim leading and trailing whitespace from a string
pub fn trim(value: &str) -> String {
    value.trim().to_string()
}

/// Normalize whitespace: collapse multiple spaces/newlines into single space
pub fn normalize_whitespace(value: &str) -> String {
    MULTI_WHITESPACE.replace_all(value.trim(), " ").to_string()
}

/// Strip all HTML tags from a string
pub fn strip_html(value: &str) -> String {
    HTML_TAG_PATTERN.replace_all(value, "").to_string()
}

/// Remove control characters from a string
pub fn remove_control_chars(value: &str) -> String {
    CONTROL_CHARS.replace_all(value, "").to_string()
}

/// Normalize an email address: trim and lowercase
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Sanitize a person/entity name: trim, remove control chars, strip HTML,
/// collapse whitespace
pub fn sanitize_name(value: &str) -> String {
    let trimmed = trim(value);
    let no_control = remove_control_chars(&trimmed);
    let no_html = strip_html(&no_control);
    normalize_whitespace(&no_html)
}

/// Sanitize free-form notes: trim, remove control chars, strip HTML but keep
/// the user's line breaks
pub fn sanitize_notes(value: &str) -> String {
    let no_control = CONTROL_CHARS.replace_all(value, "").to_string();
    strip_html(&no_control).trim().to_string()
}

/// Sanitize a phone number: keep digits and common separators
pub fn sanitize_phone(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '(' | ')' | '-' | '.'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitization seam between the engine and the concrete cleaning rules.
///
/// `form_type` lets an implementation apply entity-specific rules; the
/// default sanitizer treats every form the same way.
pub trait Sanitize: Send + Sync {
    fn sanitize(&self, data: &FormData, form_type: &str) -> Result<FormData, SanitizeError>;
}

/// Default sanitizer: cleans every text value (recursing into dynamic
/// records) and performs a semantic email check on fields whose name marks
/// them as email addresses. The email check is a sanitization-level
/// rejection, distinct from schema validation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSanitizer;

fn is_email_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("email") || lower.contains("correo")
}

fn is_phone_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("telefono") || lower.contains("phone")
}

fn clean_text(field: &str, value: &str) -> Result<String, SanitizeError> {
    if is_email_field(field) {
        let normalized = normalize_email(value);
        if !normalized.is_empty() && validate_email(&normalized).is_err() {
            return Err(SanitizeError::new("El correo electrónico no es válido"));
        }
        return Ok(normalized);
    }
    if is_phone_field(field) {
        return Ok(sanitize_phone(value));
    }
    Ok(sanitize_notes(value))
}

impl Sanitize for DefaultSanitizer {
    fn sanitize(&self, data: &FormData, _form_type: &str) -> Result<FormData, SanitizeError> {
        let mut out = FormData::new();
        for (field, value) in data {
            let cleaned = match value {
                FieldValue::Text(s) => FieldValue::Text(clean_text(field, s)?),
                FieldValue::Records(records) => {
                    let mut cleaned_records = Vec::with_capacity(records.len());
                    for record in records {
                        let mut cleaned_record = record.clone();
                        for (sub_field, sub_value) in &record.values {
                            if let FieldValue::Text(s) = sub_value {
                                cleaned_record.values.insert(
                                    sub_field.clone(),
                                    FieldValue::Text(clean_text(sub_field, s)?),
                                );
                            }
                        }
                        cleaned_records.push(cleaned_record);
                    }
                    FieldValue::Records(cleaned_records)
                }
                other => other.clone(),
            };
            out.insert(field.clone(), cleaned);
        }
        Ok(out)
    }
}
