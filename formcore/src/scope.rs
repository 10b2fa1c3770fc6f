//! Form scope and handle
//!
//! The scoped-acquisition wrapper around one [`FormEngine`]: mounting a
//! scope runs the permission gate, and only a granted scope builds the
//! engine and debouncer for that mount. Field widgets receive a cloned
//! [`FormHandle`] when the form tree is wired up, so deeply nested widgets
//! talk to the same engine without any ambient lookup.
//!
//! Permission failures are terminal for the mount (no engine, no submit);
//! submission failures are recoverable in place — the scope stays mounted
//! and re-submittable after a general error is shown.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use shared::{FieldErrors, FieldValue, FormData, FormError, InputKind, RecordTemplate, User};

use crate::debounce::{debounce_from_env, FieldDebouncer};
use crate::engine::{FormEngine, SubmitOptions, ValidationOutcome};
use crate::permissions::{Permission, PermissionChecker, RolePermissions};
use crate::rate_limit::SubmitRateLimiter;
use crate::sanitizers::{DefaultSanitizer, Sanitize};
use crate::schema::SchemaValidator;

/// Message stored under `general` when a submit-time permission re-check
/// fails.
pub const PERMISSION_MESSAGE: &str = "No tiene permisos para realizar esta acción.";

/// UI-affecting derived state published alongside the engine API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEnv {
    pub is_mobile: bool,
    pub theme: Theme,
}

impl Default for ViewEnv {
    fn default() -> Self {
        Self {
            is_mobile: false,
            theme: Theme::Light,
        }
    }
}

/// Application-level collaborators, constructed once at startup and shared
/// by every mounted form.
pub struct FormServices {
    pub checker: Arc<dyn PermissionChecker>,
    pub limiter: Arc<SubmitRateLimiter>,
    pub sanitizer: Arc<dyn Sanitize>,
    pub debounce_delay: Duration,
}

impl FormServices {
    pub fn from_env() -> Self {
        Self {
            checker: Arc::new(RolePermissions),
            limiter: Arc::new(SubmitRateLimiter::from_env()),
            sanitizer: Arc::new(DefaultSanitizer),
            debounce_delay: debounce_from_env(),
        }
    }
}

impl Default for FormServices {
    fn default() -> Self {
        Self {
            checker: Arc::new(RolePermissions),
            limiter: Arc::new(SubmitRateLimiter::new(Default::default())),
            sanitizer: Arc::new(DefaultSanitizer),
            debounce_delay: crate::debounce::DEFAULT_DEBOUNCE,
        }
    }
}

/// Everything needed to mount one form.
pub struct ScopeConfig {
    pub schema: Option<Arc<dyn SchemaValidator>>,
    pub initial_data: FormData,
    pub form_type: String,
    /// Ordered `action:resource` specs; the gate is a pure AND over them.
    pub required_permissions: Vec<String>,
    pub user: Option<User>,
    pub view: ViewEnv,
}

impl ScopeConfig {
    pub fn new(form_type: impl Into<String>) -> Self {
        Self {
            schema: None,
            initial_data: FormData::new(),
            form_type: form_type.into(),
            required_permissions: vec![],
            user: None,
            view: ViewEnv::default(),
        }
    }

    pub fn schema(mut self, schema: Arc<dyn SchemaValidator>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn initial_data(mut self, data: FormData) -> Self {
        self.initial_data = data;
        self
    }

    pub fn require(mut self, spec: impl Into<String>) -> Self {
        self.required_permissions.push(spec.into());
        self
    }

    pub fn user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn view(mut self, view: ViewEnv) -> Self {
        self.view = view;
        self
    }
}

struct ScopeInner {
    engine: Arc<FormEngine>,
    debouncer: FieldDebouncer,
    checker: Arc<dyn PermissionChecker>,
    required: Vec<Permission>,
    user: Option<User>,
    view: ViewEnv,
}

impl ScopeInner {
    fn missing_permission(&self) -> Option<&Permission> {
        self.required.iter().find(|permission| {
            !self.checker.validate(
                self.user.as_ref(),
                &permission.action,
                &permission.resource,
            )
        })
    }
}

/// A mounted, permission-granted form.
pub struct FormScope {
    inner: Arc<ScopeInner>,
}

/// Outcome of the mount gate.
pub enum ScopeAccess {
    Granted(FormScope),
    /// Terminal for this mount: render the access-denied affordance and do
    /// no further work.
    Denied { missing: String },
}

impl std::fmt::Debug for ScopeAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeAccess::Granted(_) => f.debug_tuple("Granted").finish(),
            ScopeAccess::Denied { missing } => {
                f.debug_struct("Denied").field("missing", missing).finish()
            }
        }
    }
}

impl ScopeAccess {
    pub fn is_granted(&self) -> bool {
        matches!(self, ScopeAccess::Granted(_))
    }

    pub fn scope(&self) -> Option<&FormScope> {
        match self {
            ScopeAccess::Granted(scope) => Some(scope),
            ScopeAccess::Denied { .. } => None,
        }
    }

    /// The context accessor: loud failure when no granted scope surrounds
    /// the caller, never a silent default.
    pub fn handle(&self) -> Result<FormHandle, FormError> {
        match self {
            ScopeAccess::Granted(scope) => Ok(scope.handle()),
            ScopeAccess::Denied { .. } => Err(FormError::ScopeUnavailable),
        }
    }
}

impl FormScope {
    /// Run the permission gate and, when it passes, build the engine and
    /// debouncer for this mount. Malformed permission specs are programming
    /// errors and fail the mount outright.
    pub fn mount(config: ScopeConfig, services: &FormServices) -> Result<ScopeAccess, FormError> {
        let required = Permission::parse_all(&config.required_permissions)?;

        // Empty requirement list grants access regardless of user.
        if let Some(missing) = required.iter().find(|permission| {
            !services.checker.validate(
                config.user.as_ref(),
                &permission.action,
                &permission.resource,
            )
        }) {
            tracing::warn!(
                form_type = %config.form_type,
                permission = %missing,
                "Form mount denied"
            );
            return Ok(ScopeAccess::Denied {
                missing: missing.to_string(),
            });
        }

        let engine = Arc::new(FormEngine::with_services(
            config.schema,
            config.initial_data,
            config.form_type,
            Arc::clone(&services.sanitizer),
            Arc::clone(&services.limiter),
        ));
        let debouncer =
            FieldDebouncer::with_delay(Arc::clone(&engine), services.debounce_delay);

        Ok(ScopeAccess::Granted(FormScope {
            inner: Arc::new(ScopeInner {
                engine,
                debouncer,
                checker: Arc::clone(&services.checker),
                required,
                user: config.user,
                view: config.view,
            }),
        }))
    }

    /// The context value field widgets bind to.
    pub fn handle(&self) -> FormHandle {
        FormHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn engine(&self) -> &FormEngine {
        &self.inner.engine
    }

    /// Render chrome for the current state: the banner slot prefers the
    /// caller's own error and falls back to the form's general error.
    pub fn chrome(
        &self,
        loading: bool,
        external_error: Option<&str>,
        success: Option<&str>,
    ) -> FormChrome {
        FormChrome {
            loading,
            error_banner: external_error
                .map(str::to_string)
                .or_else(|| self.inner.engine.general_error()),
            success_banner: success.map(str::to_string),
        }
    }
}

/// Loading/error/success affordances around the form body. The native form
/// element's default submit is always prevented by the UI host; submission
/// routes exclusively through the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormChrome {
    pub loading: bool,
    pub error_banner: Option<String>,
    pub success_banner: Option<String>,
}

/// Cheap-to-clone handle a field widget holds onto for the lifetime of the
/// mount. Exposes the engine API plus the permission-rechecked submit.
#[derive(Clone)]
pub struct FormHandle {
    inner: Arc<ScopeInner>,
}

impl FormHandle {
    // ── engine pass-through ────────────────────────────────────────────

    pub fn form_data(&self) -> FormData {
        self.inner.engine.data()
    }

    pub fn value(&self, field: &str) -> Option<FieldValue> {
        self.inner.engine.value(field)
    }

    pub fn errors(&self) -> FieldErrors {
        self.inner.engine.errors()
    }

    pub fn error(&self, field: &str) -> Option<String> {
        self.inner.engine.error(field)
    }

    pub fn general_error(&self) -> Option<String> {
        self.inner.engine.general_error()
    }

    pub fn has_errors(&self) -> bool {
        self.inner.engine.has_errors()
    }

    pub fn is_form_valid(&self) -> bool {
        self.inner.engine.is_form_valid()
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.engine.is_submitting()
    }

    pub fn handle_change(&self, field: &str, value: FieldValue, kind: InputKind) {
        self.inner.engine.handle_change(field, value, kind);
    }

    pub fn handle_dynamic_change(
        &self,
        array_field: &str,
        record_id: Uuid,
        sub_field: &str,
        value: FieldValue,
    ) {
        self.inner
            .engine
            .handle_dynamic_change(array_field, record_id, sub_field, value);
    }

    pub fn add_dynamic_field(&self, array_field: &str, template: &RecordTemplate) -> Uuid {
        self.inner.engine.add_dynamic_field(array_field, template)
    }

    pub fn remove_dynamic_field(&self, array_field: &str, record_id: Uuid) {
        self.inner.engine.remove_dynamic_field(array_field, record_id);
    }

    pub fn validate(&self) -> ValidationOutcome {
        self.inner.engine.validate()
    }

    pub fn validate_field(&self, field: &str) -> bool {
        self.inner.engine.validate_field(field)
    }

    /// On-blur hook: schedule a debounced validation for one field.
    pub fn debounced_field_validation(&self, field: &str) {
        self.inner.debouncer.schedule(field);
    }

    pub fn reset_form(&self) {
        self.inner.debouncer.cancel_all();
        self.inner.engine.reset_form();
    }

    // ── scope-level state ──────────────────────────────────────────────

    /// Always true for a handle obtained through a granted scope; the
    /// accessor on [`ScopeAccess`] makes the denied case unrepresentable.
    pub fn has_permissions(&self) -> bool {
        true
    }

    pub fn view_env(&self) -> ViewEnv {
        self.inner.view
    }

    // ── submission ─────────────────────────────────────────────────────

    /// Submit with default options. Re-checks every required permission at
    /// submit time: a permission revoked since mount still blocks the
    /// callback.
    pub async fn submit<F, Fut>(&self, on_submit: F) -> Option<Value>
    where
        F: FnOnce(FormData) -> Fut,
        Fut: Future<Output = Result<Value, Value>>,
    {
        self.submit_with(on_submit, SubmitOptions::default()).await
    }

    pub async fn submit_with<F, Fut>(&self, on_submit: F, options: SubmitOptions) -> Option<Value>
    where
        F: FnOnce(FormData) -> Fut,
        Fut: Future<Output = Result<Value, Value>>,
    {
        if let Some(missing) = self.inner.missing_permission() {
            tracing::warn!(
                form_type = %self.inner.engine.form_type(),
                permission = %missing,
                "Submit blocked by permission re-check"
            );
            self.inner.engine.set_general_error(PERMISSION_MESSAGE);
            return None;
        }
        self.inner.engine.handle_submit(on_submit, options).await
    }
}
