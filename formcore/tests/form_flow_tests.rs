// tests/form_flow_tests.rs
// End-to-end lifecycle tests for the form engine: reset, dynamic fields,
// debounce coalescing, rate limiting, and the three submission paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use formcore::{
    FieldDebouncer, FieldRule, FormEngine, RateLimiterConfig, Schema, SchemaValidator,
    SubmitOptions, SubmitRateLimiter, DEFAULT_DEBOUNCE, THROTTLE_MESSAGE,
};
use shared::{FieldError, FieldValue, FormData, InputKind, RecordTemplate};

/// Route engine tracing through the test writer; `RUST_LOG` controls
/// verbosity. Safe to call from every test, only the first init wins.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Wraps a schema and counts how often each entry point runs.
struct CountingSchema {
    inner: Schema,
    full_validations: AtomicUsize,
    field_validations: AtomicUsize,
}

impl CountingSchema {
    fn new(inner: Schema) -> Self {
        Self {
            inner,
            full_validations: AtomicUsize::new(0),
            field_validations: AtomicUsize::new(0),
        }
    }
}

impl SchemaValidator for CountingSchema {
    fn validate(&self, data: &FormData) -> Result<(), Vec<FieldError>> {
        self.full_validations.fetch_add(1, Ordering::SeqCst);
        self.inner.validate(data)
    }

    fn validate_field(&self, field: &str, data: &FormData) -> Result<(), String> {
        self.field_validations.fetch_add(1, Ordering::SeqCst);
        self.inner.validate_field(field, data)
    }
}

fn nombre_schema() -> Schema {
    Schema::new().field("nombre", FieldRule::text().required())
}

fn strict_limiter(max_attempts: u32) -> Arc<SubmitRateLimiter> {
    Arc::new(SubmitRateLimiter::new(RateLimiterConfig::new(
        max_attempts,
        Duration::from_secs(900),
    )))
}

fn engine_with(
    schema: Arc<dyn SchemaValidator>,
    limiter: Arc<SubmitRateLimiter>,
) -> FormEngine {
    FormEngine::with_services(
        Some(schema),
        FormData::new(),
        "patient",
        Arc::new(formcore::DefaultSanitizer),
        limiter,
    )
}

#[test]
fn reset_is_idempotent_over_any_mutation_history() {
    init_tracing();
    let initial: FormData = [
        ("nombre".to_string(), FieldValue::from("Ana")),
        ("activo".to_string(), FieldValue::from(true)),
    ]
    .into_iter()
    .collect();
    let engine = FormEngine::new(Some(Arc::new(nombre_schema())), initial.clone(), "patient");

    engine.handle_change("nombre", FieldValue::from("Otra"), InputKind::Text);
    engine.handle_change("edad", FieldValue::from(30.0), InputKind::Number);
    let template: RecordTemplate =
        [("telefono".to_string(), FieldValue::from("011"))].into_iter().collect();
    let id = engine.add_dynamic_field("telefonos", &template);
    engine.handle_dynamic_change("telefonos", id, "telefono", FieldValue::from("099"));
    engine.validate();

    engine.reset_form();
    assert_eq!(engine.data(), initial);
    assert!(engine.errors().is_empty());

    // Reset again with an explicit override
    let override_data: FormData =
        [("nombre".to_string(), FieldValue::from("Luz"))].into_iter().collect();
    engine.reset_form_with(override_data.clone());
    assert_eq!(engine.data(), override_data);
    assert!(engine.errors().is_empty());
}

#[test]
fn change_clears_error_regardless_of_new_validity() {
    init_tracing();
    let engine = FormEngine::new(Some(Arc::new(nombre_schema())), FormData::new(), "patient");
    engine.validate();
    assert!(engine.error("nombre").is_some());

    // Still invalid, but the entry clears until the next blur/submit
    engine.handle_change("nombre", FieldValue::from("   "), InputKind::Text);
    assert!(engine.error("nombre").is_none());
}

#[test]
fn dynamic_add_then_remove_round_trips() {
    init_tracing();
    let engine = FormEngine::new(None, FormData::new(), "patient");
    let template: RecordTemplate =
        [("telefono".to_string(), FieldValue::from("011"))].into_iter().collect();

    engine.add_dynamic_field("telefonos", &template);
    engine.add_dynamic_field("telefonos", &template);
    let before = engine.data();

    let id = engine.add_dynamic_field("telefonos", &template);
    engine.remove_dynamic_field("telefonos", id);

    assert_eq!(engine.data(), before);
    let data = engine.data();
    let records = data["telefonos"].as_records().unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn debounce_coalesces_rapid_calls_into_one_validation() {
    init_tracing();
    let counting = Arc::new(CountingSchema::new(nombre_schema()));
    let engine = Arc::new(engine_with(counting.clone(), strict_limiter(5)));
    let debouncer = FieldDebouncer::new(Arc::clone(&engine));

    engine.handle_change("nombre", FieldValue::from(""), InputKind::Text);
    for _ in 0..5 {
        debouncer.schedule("nombre");
    }
    // The value current when the timer fires is what gets validated
    engine.handle_change("nombre", FieldValue::from("Ana"), InputKind::Text);

    tokio::time::sleep(DEFAULT_DEBOUNCE + Duration::from_millis(10)).await;

    assert_eq!(counting.field_validations.load(Ordering::SeqCst), 1);
    assert!(engine.error("nombre").is_none());
}

#[tokio::test(start_paused = true)]
async fn debounced_fields_are_independent() {
    init_tracing();
    let counting = Arc::new(CountingSchema::new(
        Schema::new()
            .field("nombre", FieldRule::text().required())
            .field("apellido", FieldRule::text().required()),
    ));
    let engine = Arc::new(engine_with(counting.clone(), strict_limiter(5)));
    let debouncer = FieldDebouncer::new(Arc::clone(&engine));

    debouncer.schedule("nombre");
    debouncer.schedule("apellido");
    tokio::time::sleep(DEFAULT_DEBOUNCE + Duration::from_millis(10)).await;

    assert_eq!(counting.field_validations.load(Ordering::SeqCst), 2);
    assert!(engine.error("nombre").is_some());
    assert!(engine.error("apellido").is_some());
}

#[tokio::test]
async fn rate_gate_runs_before_validation() {
    init_tracing();
    let counting = Arc::new(CountingSchema::new(nombre_schema()));
    let engine = engine_with(counting.clone(), strict_limiter(0));

    let submits = Arc::new(AtomicUsize::new(0));
    let submits_clone = submits.clone();
    let result = engine
        .handle_submit(
            move |_data| async move {
                submits_clone.fetch_add(1, Ordering::SeqCst);
                Ok(json!({}))
            },
            SubmitOptions::default(),
        )
        .await;

    assert_eq!(result, None);
    assert_eq!(counting.full_validations.load(Ordering::SeqCst), 0);
    assert_eq!(submits.load(Ordering::SeqCst), 0);
    assert!(!engine.is_submitting());
    assert_eq!(engine.general_error().as_deref(), Some(THROTTLE_MESSAGE));
    // The throttled attempt is not counted
    assert_eq!(engine.attempts(), 0);
}

#[tokio::test]
async fn disabled_rate_limit_skips_the_gate() {
    init_tracing();
    let counting = Arc::new(CountingSchema::new(nombre_schema()));
    let engine = engine_with(counting.clone(), strict_limiter(0));
    engine.handle_change("nombre", FieldValue::from("Ana"), InputKind::Text);

    let result = engine
        .handle_submit(
            |_data| async { Ok(json!({"id": 3})) },
            SubmitOptions {
                enable_rate_limit: false,
            },
        )
        .await;

    assert_eq!(result, Some(json!({"id": 3})));
}

#[tokio::test]
async fn submission_never_rejects_whatever_the_callback_throws() {
    init_tracing();
    let shapes = vec![
        json!({"message": "Error del servidor"}),
        json!({"error": "duplicado"}),
        json!({"code": 500}),
        json!("rechazo simple"),
        json!(null),
    ];

    for shape in shapes {
        let engine =
            FormEngine::new(Some(Arc::new(nombre_schema())), FormData::new(), "patient");
        engine.handle_change("nombre", FieldValue::from("Ana"), InputKind::Text);

        let rejection = shape.clone();
        let result = engine
            .handle_submit(
                move |_data| async move { Err(rejection) },
                SubmitOptions::default(),
            )
            .await;

        assert_eq!(result, None, "shape: {shape}");
        let general = engine.general_error().unwrap_or_default();
        assert!(!general.is_empty(), "shape: {shape}");
        assert!(!engine.is_submitting());
    }
}

#[tokio::test]
async fn success_path_resolves_with_result_and_no_errors() {
    init_tracing();
    let engine = FormEngine::new(Some(Arc::new(nombre_schema())), FormData::new(), "patient");
    engine.handle_change("nombre", FieldValue::from("Ana"), InputKind::Text);

    let result = engine
        .handle_submit(|_data| async { Ok(json!({"id": 1})) }, SubmitOptions::default())
        .await;

    assert_eq!(result, Some(json!({"id": 1})));
    assert!(engine.errors().is_empty());
    assert!(!engine.is_submitting());
}

#[tokio::test]
async fn validation_failure_path_never_calls_the_callback() {
    init_tracing();
    let engine = FormEngine::new(Some(Arc::new(nombre_schema())), FormData::new(), "patient");

    let submits = Arc::new(AtomicUsize::new(0));
    let submits_clone = submits.clone();
    let result = engine
        .handle_submit(
            move |_data| async move {
                submits_clone.fetch_add(1, Ordering::SeqCst);
                Ok(json!({}))
            },
            SubmitOptions::default(),
        )
        .await;

    assert_eq!(result, None);
    assert_eq!(submits.load(Ordering::SeqCst), 0);
    let error = engine.error("nombre").unwrap();
    assert!(!error.is_empty());
    assert!(!engine.is_submitting());
}

#[tokio::test]
async fn throttled_path_reports_the_same_banner_both_times() {
    init_tracing();
    let engine = engine_with(Arc::new(nombre_schema()), strict_limiter(0));
    engine.handle_change("nombre", FieldValue::from("Ana"), InputKind::Text);

    let submits = Arc::new(AtomicUsize::new(0));
    for _ in 0..2 {
        let submits_clone = submits.clone();
        let result = engine
            .handle_submit(
                move |_data| async move {
                    submits_clone.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({}))
                },
                SubmitOptions::default(),
            )
            .await;
        assert_eq!(result, None);
        assert_eq!(engine.general_error().as_deref(), Some(THROTTLE_MESSAGE));
    }
    assert_eq!(submits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_submit_resets_the_throttling_window() {
    init_tracing();
    let limiter = strict_limiter(1);
    let engine = engine_with(Arc::new(nombre_schema()), Arc::clone(&limiter));
    engine.handle_change("nombre", FieldValue::from("Ana"), InputKind::Text);

    for round in 0..3 {
        let result = engine
            .handle_submit(|_data| async { Ok(json!({})) }, SubmitOptions::default())
            .await;
        assert!(result.is_some(), "round {round}");
    }
}

#[tokio::test]
async fn failed_submit_keeps_spending_the_budget() {
    init_tracing();
    let limiter = strict_limiter(2);
    let engine = engine_with(Arc::new(nombre_schema()), Arc::clone(&limiter));
    engine.handle_change("nombre", FieldValue::from("Ana"), InputKind::Text);

    for _ in 0..2 {
        let result = engine
            .handle_submit(
                |_data| async { Err(json!({"message": "falló"})) },
                SubmitOptions::default(),
            )
            .await;
        assert_eq!(result, None);
        assert_eq!(engine.general_error().as_deref(), Some("falló"));
    }

    // Budget exhausted: the third attempt is throttled before validation
    let result = engine
        .handle_submit(|_data| async { Ok(json!({})) }, SubmitOptions::default())
        .await;
    assert_eq!(result, None);
    assert_eq!(engine.general_error().as_deref(), Some(THROTTLE_MESSAGE));
}

#[test]
fn dynamic_record_ids_are_locally_unique() {
    init_tracing();
    let engine = FormEngine::new(None, FormData::new(), "patient");
    let template = RecordTemplate::new();
    let ids: Vec<Uuid> = (0..50)
        .map(|_| engine.add_dynamic_field("telefonos", &template))
        .collect();
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}
