//! Exam form.

use formcore::{validators, FieldRule, Schema, ScopeConfig};
use shared::{FieldValue, FormData, User};

pub const FORM_TYPE: &str = "exam";
pub const REQUIRED_PERMISSIONS: &[&str] = &["create:exams"];

pub fn schema() -> Schema {
    Schema::new()
        .field("paciente_id", FieldRule::text().required())
        .field(
            "tipo",
            FieldRule::text().required().min_len(3).max_len(100).no_xss(),
        )
        .field("resultado", FieldRule::text().max_len(5000).no_xss())
        .field(
            "fecha",
            FieldRule::text().required().check(validators::validate_date),
        )
}

pub fn initial_data() -> FormData {
    [
        ("paciente_id".to_string(), FieldValue::from("")),
        ("tipo".to_string(), FieldValue::from("")),
        ("resultado".to_string(), FieldValue::from("")),
        ("fecha".to_string(), FieldValue::from("")),
    ]
    .into_iter()
    .collect()
}

pub fn config(user: Option<User>) -> ScopeConfig {
    super::config(FORM_TYPE, schema(), initial_data(), REQUIRED_PERMISSIONS, user)
}
