//! Doctor form: personal data, specialty, license number, and a dynamic
//! list of weekly schedule entries.

use formcore::{validators, FieldRule, Schema, ScopeConfig};
use shared::{FieldValue, FormData, RecordTemplate, User};

use crate::patterns::{LICENSE_REGEX, TIME_REGEX, WEEKDAY_REGEX};

pub const FORM_TYPE: &str = "doctor";
pub const REQUIRED_PERMISSIONS: &[&str] = &["create:doctors"];

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
            "especialidad",
            FieldRule::text().required().min_len(3).max_len(100).no_xss(),
        )
        .field(
            "matricula",
            FieldRule::text()
                .required()
                .matches(&LICENSE_REGEX, "la matrícula debe tener entre 4 y 10 dígitos"),
        )
        .field(
            "horarios",
            FieldRule::records()
                .record_field(
                    "dia",
                    FieldRule::text()
                        .required()
                        .matches(&WEEKDAY_REGEX, "debe ser un día de la semana"),
                )
                .record_field(
                    "desde",
                    FieldRule::text()
                        .required()
                        .matches(&TIME_REGEX, "debe ser una hora válida (HH:MM)"),
                )
                .record_field(
                    "hasta",
                    FieldRule::text()
                        .required()
                        .matches(&TIME_REGEX, "debe ser una hora válida (HH:MM)"),
                ),
        )
}

pub fn initial_data() -> FormData {
    [
        ("nombre".to_string(), FieldValue::from("")),
        ("apellido".to_string(), FieldValue::from("")),
        ("email".to_string(), FieldValue::from("")),
        ("especialidad".to_string(), FieldValue::from("")),
        ("matricula".to_string(), FieldValue::from("")),
        ("horarios".to_string(), FieldValue::Records(vec![])),
    ]
    .into_iter()
    .collect()
}

/// Template for one entry of the `horarios` dynamic field.
pub fn schedule_template() -> RecordTemplate {
    [
        ("dia".to_string(), FieldValue::from("")),
        ("desde".to_string(), FieldValue::from("")),
        ("hasta".to_string(), FieldValue::from("")),
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
    use shared::DynamicRecord;

    fn valid_doctor() -> FormData {
        let mut data = initial_data();
        data.insert("nombre".to_string(), FieldValue::from("Luis"));
        data.insert("apellido".to_string(), FieldValue::from("Pérez"));
        data.insert("especialidad".to_string(), FieldValue::from("Cardiología"));
        data.insert("matricula".to_string(), FieldValue::from("123456"));
        data
    }

    #[test]
    fn accepts_doctor_with_schedule() {
        let mut data = valid_doctor();
        data.insert(
            "horarios".to_string(),
            FieldValue::Records(vec![DynamicRecord::from_template(
                &[
                    ("dia".to_string(), FieldValue::from("lunes")),
                    ("desde".to_string(), FieldValue::from("09:00")),
                    ("hasta".to_string(), FieldValue::from("17:30")),
                ]
                .into_iter()
                .collect(),
            )]),
        );
        assert!(schema().validate(&data).is_ok());
    }

    #[test]
    fn rejects_malformed_schedule_entries() {
        let mut data = valid_doctor();
        data.insert(
            "horarios".to_string(),
            FieldValue::Records(vec![DynamicRecord::from_template(
                &[
                    ("dia".to_string(), FieldValue::from("algún día")),
                    ("desde".to_string(), FieldValue::from("25:00")),
                    ("hasta".to_string(), FieldValue::from("17:30")),
                ]
                .into_iter()
                .collect(),
            )]),
        );
        let errors = schema().validate(&data).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "horarios[0].dia"));
        assert!(errors.iter().any(|e| e.field == "horarios[0].desde"));
    }

    #[test]
    fn license_must_be_digits() {
        let mut data = valid_doctor();
        data.insert("matricula".to_string(), FieldValue::from("MN-12"));
        let errors = schema().validate(&data).unwrap_err();
        assert!(errors[0].message.contains("matrícula"));
    }
}
