//! Treatment form.

use formcore::{validators, FieldRule, Schema, ScopeConfig};
use shared::{FieldValue, FormData, User};

pub const FORM_TYPE: &str = "treatment";
pub const REQUIRED_PERMISSIONS: &[&str] = &["create:treatments"];

pub fn schema() -> Schema {
    Schema::new()
        .field("paciente_id", FieldRule::text().required())
        .field(
            "descripcion",
            FieldRule::text().required().min_len(5).max_len(2000).no_xss(),
        )
        .field("costo", FieldRule::number().required().min(0.0))
        .field(
            "fecha",
            FieldRule::text().required().check(validators::validate_date),
        )
}

pub fn initial_data() -> FormData {
    [
        ("paciente_id".to_string(), FieldValue::from("")),
        ("descripcion".to_string(), FieldValue::from("")),
        ("fecha".to_string(), FieldValue::from("")),
    ]
    .into_iter()
    .collect()
}

pub fn config(user: Option<User>) -> ScopeConfig {
    super::config(FORM_TYPE, schema(), initial_data(), REQUIRED_PERMISSIONS, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formcore::SchemaValidator;

    #[test]
    fn cost_cannot_be_negative() {
        let mut data = initial_data();
        data.insert("paciente_id".to_string(), FieldValue::from("p-1"));
        data.insert("descripcion".to_string(), FieldValue::from("Limpieza dental"));
        data.insert("costo".to_string(), FieldValue::from(-10.0));
        data.insert("fecha".to_string(), FieldValue::from("2026-08-25"));

        let errors = schema().validate(&data).unwrap_err();
        assert_eq!(errors[0].field, "costo");
    }

    #[test]
    fn missing_cost_is_required() {
        let errors = schema().validate(&initial_data()).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "costo"));
    }
}
