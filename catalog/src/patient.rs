//! Patient form: personal data plus a dynamic list of phone numbers.

use formcore::{validators, FieldRule, Schema, ScopeConfig};
use shared::{FieldValue, FormData, RecordTemplate, User};

pub const FORM_TYPE: &str = "patient";
pub const REQUIRED_PERMISSIONS: &[&str] = &["create:patients"];

pub fn schema() -> Schema {
    Schema::new()
        .field(
            "nombre",
            FieldRule::text().required().min_len(2).max_len(100).no_xss(),
        )
        .field(
            "apellido",
            FieldRule::text().required().min_len(2).max_len(100).no_xss(),
        )
        .field("email", FieldRule::text().check(validators::validate_email))
        .field(
            "fecha_nacimiento",
            FieldRule::text().required().check(validators::validate_date),
        )
        .field("direccion", FieldRule::text().max_len(255).no_xss())
        .field("notas", FieldRule::text().max_len(2000).no_xss())
        .field(
            "telefonos",
            FieldRule::records().record_field(
                "telefono",
                FieldRule::text().required().check(validators::validate_phone),
            ),
        )
}

pub fn initial_data() -> FormData {
    [
        ("nombre".to_string(), FieldValue::from("")),
        ("apellido".to_string(), FieldValue::from("")),
        ("email".to_string(), FieldValue::from("")),
        ("fecha_nacimiento".to_string(), FieldValue::from("")),
        ("direccion".to_string(), FieldValue::from("")),
        ("notas".to_string(), FieldValue::from("")),
        ("telefonos".to_string(), FieldValue::Records(vec![])),
    ]
    .into_iter()
    .collect()
}

/// Template for one entry of the `telefonos` dynamic field.
pub fn phone_template() -> RecordTemplate {
    [("telefono".to_string(), FieldValue::from(""))]
        .into_iter()
        .collect()
}

pub fn config(user: Option<User>) -> ScopeConfig {
    super::config(FORM_TYPE, schema(), initial_data(), REQUIRED_PERMISSIONS, user)
}
