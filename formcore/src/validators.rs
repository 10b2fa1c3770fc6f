//! Field validators for form input
//!
//! Reusable validation functions for the field types the clinic forms use.
//! All messages are user-facing and therefore in Spanish; the functions
//! return `Err(message)` so the schema can attach them to a field name.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Basic email shape: local part, `@`, domain with at least one dot
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();

    /// Phone numbers: optional leading `+`, digits with common separators
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 ().-]{5,19}$").unwrap();

    /// HTML tag detection pattern
    static ref HTML_TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();

    /// Script/event handler pattern for XSS detection
    static ref XSS_PATTERN_REGEX: Regex = Regex::new(
        r"(?i)(javascript:|on\w+\s*=|<script|<iframe|<object|<embed)"
    ).unwrap();
}

/// Validate that a string is not empty after trimming
pub fn validate_required(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} es obligatorio", field_name));
    }
    Ok(())
}

/// Validate string length within bounds (counted in characters, not bytes)
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        return Err(format!("debe tener al menos {} caracteres", min));
    }
    if len > max {
        return Err(format!("debe tener como máximo {} caracteres", max));
    }
    Ok(())
}

/// Validate email format
pub fn validate_email(value: &str) -> Result<(), String> {
    if !EMAIL_REGEX.is_match(value.trim()) {
        return Err("debe ser un correo electrónico válido".to_string());
    }
    Ok(())
}

/// Validate phone number format
pub fn validate_phone(value: &str) -> Result<(), String> {
    if !PHONE_REGEX.is_match(value.trim()) {
        return Err("debe ser un número de teléfono válido".to_string());
    }
    Ok(())
}

/// Validate an ISO calendar date (YYYY-MM-DD)
pub fn validate_date(value: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| "debe ser una fecha válida (AAAA-MM-DD)".to_string())
}

/// Validate that a string contains no HTML tags
pub fn validate_no_html(value: &str) -> Result<(), String> {
    if HTML_TAG_REGEX.is_match(value) {
        return Err("no puede contener etiquetas HTML".to_string());
    }
    Ok(())
}

/// Validate that a string contains no script/XSS patterns
pub fn validate_no_xss(value: &str) -> Result<(), String> {
    if XSS_PATTERN_REGEX.is_match(value) {
        return Err("contiene contenido no permitido".to_string());
    }
    Ok(())
}

/// Validate a number within inclusive bounds
pub fn validate_range(value: f64, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    if let Some(min) = min {
        if value < min {
            return Err(format!("debe ser mayor o igual a {}", min));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(format!("debe ser menor o igual a {}", max));
        }
    }
    Ok(())
}
