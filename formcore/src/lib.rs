//! Clinic form core
//!
//! The form-state/validation engine shared by every entity form in the
//! clinic application (patients, doctors, users, treatments, exams,
//! products).
//!
//! # Overview
//!
//! The core is two cooperating pieces:
//!
//! 1. **[`FormEngine`]** — owns one form's data, per-field and general
//!    errors, dynamic sub-records, and the validation/submission lifecycle.
//! 2. **[`FormScope`]/[`FormHandle`]** — scopes one engine to a mount behind
//!    a permission gate and hands field widgets a shared handle so no props
//!    need threading through the widget tree.
//!
//! Collaborators are seams: schema validation ([`SchemaValidator`]),
//! sanitization ([`Sanitize`]), admission control ([`SubmitRateLimiter`])
//! and authorization ([`PermissionChecker`]) are all injectable through
//! [`FormServices`].
//!
//! # Usage
//!
//! ```ignore
//! let services = FormServices::from_env();
//! let config = ScopeConfig::new("patient")
//!     .schema(Arc::new(schema))
//!     .require("create:patients")
//!     .user(user);
//!
//! match FormScope::mount(config, &services)? {
//!     ScopeAccess::Granted(scope) => {
//!         let handle = scope.handle();
//!         handle.handle_change("nombre", "Ana".into(), InputKind::Text);
//!         let saved = handle.submit(|data| api.create_patient(data)).await;
//!     }
//!     ScopeAccess::Denied { missing } => render_access_denied(&missing),
//! }
//! ```

pub mod debounce;
pub mod engine;
pub mod permissions;
pub mod rate_limit;
pub mod sanitizers;
pub mod schema;
pub mod scope;
pub mod validators;

pub use debounce::{FieldDebouncer, DEFAULT_DEBOUNCE};
pub use engine::{
    FormEngine, SubmitOptions, ValidationOutcome, SUBMIT_FALLBACK_MESSAGE, THROTTLE_MESSAGE,
};
pub use permissions::{Permission, PermissionChecker, RolePermissions};
pub use rate_limit::{submit_key, RateLimiterConfig, SubmitRateLimiter};
pub use sanitizers::{DefaultSanitizer, Sanitize};
pub use schema::{FieldRule, Schema, SchemaValidator, ValidationBuilder};
pub use scope::{
    FormChrome, FormHandle, FormScope, FormServices, ScopeAccess, ScopeConfig, Theme, ViewEnv,
    PERMISSION_MESSAGE,
};
