//! Admin user-management form.

use formcore::{validators, FieldRule, Schema, ScopeConfig};
use shared::{FieldValue, FormData, User};

use crate::patterns::USERNAME_REGEX;

pub const FORM_TYPE: &str = "user";
pub const REQUIRED_PERMISSIONS: &[&str] = &["create:users", "read:users"];

pub fn schema() -> Schema {
    Schema::new()
        .field(
            "username",
            FieldRule::text().required().matches(
                &USERNAME_REGEX,
                "el usuario debe tener 3 a 32 caracteres alfanuméricos",
            ),
        )
        .field(
            "email",
            FieldRule::text().required().check(validators::validate_email),
        )
        .field("rol", FieldRule::text().required().max_len(32))
        .field("activo", FieldRule::boolean())
}

pub fn initial_data() -> FormData {
    [
        ("username".to_string(), FieldValue::from("")),
        ("email".to_string(), FieldValue::from("")),
        ("rol".to_string(), FieldValue::from("")),
        ("activo".to_string(), FieldValue::from(true)),
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
    fn accepts_valid_staff_user() {
        let mut data = initial_data();
        data.insert("username".to_string(), FieldValue::from("ana.garcia"));
        data.insert("email".to_string(), FieldValue::from("ana@clinica.com"));
        data.insert("rol".to_string(), FieldValue::from("secretary"));
        assert!(schema().validate(&data).is_ok());
    }

    #[test]
    fn username_pattern_is_enforced() {
        let mut data = initial_data();
        data.insert("username".to_string(), FieldValue::from("a!"));
        data.insert("email".to_string(), FieldValue::from("ana@clinica.com"));
        data.insert("rol".to_string(), FieldValue::from("admin"));
        let errors = schema().validate(&data).unwrap_err();
        assert_eq!(errors[0].field, "username");
    }

    #[test]
    fn activo_must_be_boolean() {
        let mut data = initial_data();
        data.insert("username".to_string(), FieldValue::from("ana"));
        data.insert("email".to_string(), FieldValue::from("ana@clinica.com"));
        data.insert("rol".to_string(), FieldValue::from("admin"));
        data.insert("activo".to_string(), FieldValue::from("sí"));
        let errors = schema().validate(&data).unwrap_err();
        assert!(errors[0].message.contains("booleano"));
    }
}
