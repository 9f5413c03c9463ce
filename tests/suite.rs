//! Suite runner scenarios: skips, expected exceptions, and failure isolation.

use std::sync::Arc;

use serde_json::{json, Value};

use genai_replay::context::CaseContext;
use genai_replay::ports::{Transport, TransportFuture};
use genai_replay::replay::{
    MemorySessionStore, ReplayFile, ReplayInteraction, ReplayRequest, ReplayResponse, SessionKey,
    SessionStore,
};
use genai_replay::table::{expand, TestTableFile, TestTableItem};
use genai_replay::{
    Backend, CallFailure, CaseDriver, CaseOutcome, DriverFuture, HarnessConfig, ReplayError,
    RunMode, SuiteRunner,
};

/// Calls `models.generate_content` with the case's prompt and requires at
/// least one candidate back.
struct GenerateContent;

impl CaseDriver for GenerateContent {
    fn drive<'a>(&'a self, ctx: &'a CaseContext) -> DriverFuture<'a> {
        Box::pin(async move {
            let prompt = ctx.case().parameter("contents").and_then(Value::as_str).unwrap_or_default();
            let request = ReplayRequest::new(
                "POST",
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent",
            )
            .with_segment(json!({"contents": [{"parts": [{"text": prompt}]}]}));

            let decoded = ctx.send(&request).await?.into_decoded();
            if decoded.iter().any(|d| d.get("candidates").is_some()) {
                Ok(())
            } else {
                Err(CallFailure::Assertion("response has no candidates".into()))
            }
        })
    }
}

/// Live transport for runs that must stay offline.
struct Offline;

impl Transport for Offline {
    fn send(&self, _request: &ReplayRequest) -> TransportFuture<'_> {
        Box::pin(async { Err(ReplayError::Transport("network disabled".into())) })
    }
}

fn item(name: &str, prompt: &str) -> TestTableItem {
    TestTableItem {
        name: name.into(),
        parameters: [("contents".to_string(), json!(prompt))].into_iter().collect(),
        ..TestTableItem::default()
    }
}

fn table(items: Vec<TestTableItem>) -> TestTableFile {
    TestTableFile {
        test_method: "models.generate_content".into(),
        parameter_names: vec!["contents".into()],
        test_table: items,
        ..TestTableFile::default()
    }
}

fn session(replay_id: &str, prompt: &str, response: ReplayResponse) -> ReplayFile {
    ReplayFile {
        replay_id: replay_id.into(),
        interactions: vec![ReplayInteraction {
            request: ReplayRequest::new("POST", "/models/gemini-2.0-flash:generateContent")
                .with_segment(json!({"contents": [{"parts": [{"text": prompt}]}]})),
            response,
        }],
    }
}

fn ok_response() -> ReplayResponse {
    ReplayResponse::json(200, json!({"candidates": [{"content": {"parts": [{"text": "hello"}]}}]}))
}

fn quota_response() -> ReplayResponse {
    ReplayResponse::json(
        429,
        json!({"error": {"code": 429, "message": "Resource has been exhausted (e.g. check quota exceeded).", "status": "RESOURCE_EXHAUSTED"}}),
    )
}

fn seed(store: &MemorySessionStore, backend: Backend, file: ReplayFile) {
    store.save(&SessionKey::new(file.replay_id.clone(), backend), &file).unwrap();
}

fn runner(store: &Arc<MemorySessionStore>, config: HarnessConfig) -> SuiteRunner {
    SuiteRunner::new(config, store.clone(), Arc::new(Offline))
}

#[tokio::test]
async fn replayed_case_passes_without_network() {
    let store = Arc::new(MemorySessionStore::new());
    seed(&store, Backend::MlDev, session("models_generate_content/test_hi", "hi", ok_response()));

    let report = runner(&store, HarnessConfig::default())
        .run_table(&table(vec![item("test_hi", "hi")]), &GenerateContent)
        .await
        .unwrap();

    assert_eq!(report.passed(), 1);
    assert!(report.is_success());
}

#[tokio::test]
async fn skip_in_api_mode_applies_only_to_live_runs() {
    let store = Arc::new(MemorySessionStore::new());
    seed(&store, Backend::MlDev, session("models_generate_content/test_upload", "hi", ok_response()));
    let cases = expand(&table(vec![TestTableItem {
        skip_in_api_mode: Some("needs a local file".into()),
        ..item("test_upload", "hi")
    }]))
    .unwrap();

    let api = runner(&store, HarnessConfig::default().with_mode(RunMode::Api));
    let report = api.run(&cases, &GenerateContent).await;
    match &report.cases[0].outcome {
        CaseOutcome::Skipped(reason) => assert!(reason.contains("needs a local file")),
        other => panic!("expected skip, got {other}"),
    }

    let replay = runner(&store, HarnessConfig::default());
    assert_eq!(replay.run(&cases, &GenerateContent).await.passed(), 1);
}

#[tokio::test]
async fn expected_vertex_exception_is_satisfied_by_recorded_error() {
    let store = Arc::new(MemorySessionStore::new());
    seed(&store, Backend::Vertex, session("models_generate_content/test_quota", "hi", quota_response()));
    let quota = TestTableItem { exception_if_vertex: Some("quota exceeded".into()), ..item("test_quota", "hi") };

    let report = runner(&store, HarnessConfig::default().with_backend(Backend::Vertex))
        .run_table(&table(vec![quota]), &GenerateContent)
        .await
        .unwrap();

    assert_eq!(report.passed(), 1, "{:?}", report.cases);
}

#[tokio::test]
async fn expected_exception_that_never_happens_fails() {
    let store = Arc::new(MemorySessionStore::new());
    seed(&store, Backend::Vertex, session("models_generate_content/test_quota", "hi", ok_response()));
    seed(&store, Backend::MlDev, session("models_generate_content/test_quota", "hi", ok_response()));
    let quota = TestTableItem { exception_if_vertex: Some("quota exceeded".into()), ..item("test_quota", "hi") };
    let tables = table(vec![quota]);

    let vertex = runner(&store, HarnessConfig::default().with_backend(Backend::Vertex))
        .run_table(&tables, &GenerateContent)
        .await
        .unwrap();
    assert!(matches!(
        vertex.cases[0].outcome,
        CaseOutcome::Failed(ReplayError::MissingExpectedException { .. })
    ));

    // The expectation is Vertex-only, so MLDev success is correct.
    let mldev = runner(&store, HarnessConfig::default()).run_table(&tables, &GenerateContent).await.unwrap();
    assert_eq!(mldev.passed(), 1);
}

#[tokio::test]
async fn unexpected_error_fails_the_case() {
    let store = Arc::new(MemorySessionStore::new());
    seed(&store, Backend::MlDev, session("models_generate_content/test_hi", "hi", quota_response()));

    let report = runner(&store, HarnessConfig::default())
        .run_table(&table(vec![item("test_hi", "hi")]), &GenerateContent)
        .await
        .unwrap();

    match &report.cases[0].outcome {
        CaseOutcome::Failed(ReplayError::UnexpectedException { expected: None, actual }) => {
            assert!(actual.contains("RESOURCE_EXHAUSTED"));
        }
        other => panic!("unexpected outcome: {other}"),
    }
}

#[tokio::test]
async fn one_failing_case_does_not_affect_the_others() {
    let store = Arc::new(MemorySessionStore::new());
    seed(&store, Backend::MlDev, session("models_generate_content/test_first", "first", ok_response()));
    seed(&store, Backend::MlDev, session("models_generate_content/test_changed", "old prompt", ok_response()));
    seed(&store, Backend::MlDev, session("models_generate_content/test_last", "last", ok_response()));

    let report = runner(&store, HarnessConfig::default())
        .run_table(
            &table(vec![
                item("test_first", "first"),
                item("test_changed", "new prompt"),
                item("test_unrecorded", "x"),
                item("test_last", "last"),
            ]),
            &GenerateContent,
        )
        .await
        .unwrap();

    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 2);
    assert!(matches!(
        report.get("models_generate_content/test_changed").unwrap().outcome,
        CaseOutcome::Failed(ReplayError::RequestMismatch { .. })
    ));
    assert!(matches!(
        report.get("models_generate_content/test_unrecorded").unwrap().outcome,
        CaseOutcome::Failed(ReplayError::SessionNotFound { .. })
    ));
}

#[tokio::test]
async fn invalid_table_is_rejected_before_any_case_runs() {
    let store = Arc::new(MemorySessionStore::new());
    let duplicate = TestTableItem {
        override_replay_id: Some("models_generate_content/test_a".into()),
        ..item("test_b", "b")
    };

    let err = runner(&store, HarnessConfig::default())
        .run_table(&table(vec![item("test_a", "a"), duplicate]), &GenerateContent)
        .await
        .unwrap_err();
    assert!(matches!(err, ReplayError::DuplicateReplayIdentifier { .. }));
}

#[test]
fn run_blocking_needs_no_caller_runtime() {
    let store = Arc::new(MemorySessionStore::new());
    seed(&store, Backend::MlDev, session("models_generate_content/test_hi", "hi", ok_response()));
    let cases = expand(&table(vec![item("test_hi", "hi")])).unwrap();

    let report = runner(&store, HarnessConfig::default()).run_blocking(&cases, &GenerateContent).unwrap();
    assert!(report.is_success());
    assert_eq!(report.passed(), 1);
}
