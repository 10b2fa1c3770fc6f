//! Clinic form catalog
//!
//! One module per entity form: its `FORM_TYPE` (also the rate-limit
//! partition key), the permissions required to mount it, its schema, its
//! initial data, and the dynamic-record templates it uses. Feature screens
//! build a [`formcore::ScopeConfig`] through [`config`] and mount it against
//! the application's shared [`formcore::FormServices`].

use std::sync::Arc;

use formcore::{Schema, ScopeConfig};
use shared::{FormData, User};

pub mod doctor;
pub mod exam;
pub mod patient;
pub mod product;
pub mod staff_user;
pub mod treatment;

mod patterns;

/// Build a ready-to-mount config for one catalog form.
pub fn config(
    form_type: &str,
    schema: Schema,
    initial_data: FormData,
    required_permissions: &[&str],
    user: Option<User>,
) -> ScopeConfig {
    let mut config = ScopeConfig::new(form_type)
        .schema(Arc::new(schema))
        .initial_data(initial_data);
    for spec in required_permissions {
        config = config.require(*spec);
    }
    config.user = user;
    config
}

#[cfg(test)]
mod tests {
    use formcore::{FormScope, FormServices};
    use shared::Role;

    use super::*;

    #[test]
    fn every_catalog_form_mounts_for_admin() {
        let services = FormServices::default();
        let admin = User::new("admin", Role::Admin);

        let configs = vec![
            patient::config(Some(admin.clone())),
            doctor::config(Some(admin.clone())),
            staff_user::config(Some(admin.clone())),
            treatment::config(Some(admin.clone())),
            exam::config(Some(admin.clone())),
            product::config(Some(admin)),
        ];

        for config in configs {
            let form_type = config.form_type.clone();
            let access = FormScope::mount(config, &services).unwrap();
            assert!(access.is_granted(), "form {form_type}");
        }
    }

    #[test]
    fn guest_is_denied_everywhere() {
        let services = FormServices::default();
        let guest = User::new("invitado", Role::Guest);

        let access =
            FormScope::mount(patient::config(Some(guest)), &services).unwrap();
        assert!(!access.is_granted());
    }
}
