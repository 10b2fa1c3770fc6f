//! Pharmacy product form.

use formcore::{validators, FieldRule, Schema, ScopeConfig};
use shared::{FieldValue, FormData, User};

pub const FORM_TYPE: &str = "product";
pub const REQUIRED_PERMISSIONS: &[&str] = &["create:products"];

pub fn schema() -> Schema {
    Schema::new()
        .field(
            "nombre",
            FieldRule::text().required().min_len(2).max_len(150).no_xss(),
        )
        .field("precio", FieldRule::number().required().min(0.0))
        .field("stock", FieldRule::number().required().min(0.0))
        .field("vencimiento", FieldRule::text().check(validators::validate_date))
}

pub fn initial_data() -> FormData {
    [
        ("nombre".to_string(), FieldValue::from("")),
        ("vencimiento".to_string(), FieldValue::from("")),
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
    fn expiry_date_is_optional_but_validated() {
        let mut data = initial_data();
        data.insert("nombre".to_string(), FieldValue::from("Ibuprofeno 400"));
        data.insert("precio".to_string(), FieldValue::from(1500.0));
        data.insert("stock".to_string(), FieldValue::from(20.0));
        assert!(schema().validate(&data).is_ok());

        data.insert("vencimiento".to_string(), FieldValue::from("pronto"));
        let errors = schema().validate(&data).unwrap_err();
        assert_eq!(errors[0].field, "vencimiento");
    }
}
