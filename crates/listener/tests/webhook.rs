//! End-to-end behaviour of the build-event webhook against in-memory
//! capabilities.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use domain::{
    BuildState, CommitSha, ImageId, ImageTag, InMemoryCommitResolver, InMemoryStatusesRepository,
    InMemoryTagResolver, RecordingTagger, RepositoryId, Status, TagCall,
};
use listener::{router, AppState, WebhookConfig};
use orchestrator::{Capabilities, Orchestrator};
use rstest::rstest;
use tower::ServiceExt;

const PENDING_BUILD: &str = include_str!("fixtures/pending_build.json");
const MANUAL_BUILD: &str = include_str!("fixtures/pending_build.manual.json");

const STATSD_SHA: &str = "f1fb3b0e7e2a8ac6b8dbd14c4e1ff4f2b6f2b1a0";
const STATSD_BUILD_URL: &str =
    "https://quay.io/repository/ejholmes/docker-statsd/build?current=077f3664-35d3-48e6-9da7-889f9be73070";
const APP_SHA: &str = "abc1230000000000000000000000000000000042";

fn repo(value: &str) -> RepositoryId {
    RepositoryId::parse(value).expect("valid repository")
}

fn tag(value: &str) -> ImageTag {
    ImageTag::new(value).expect("non-empty tag")
}

fn image(value: &str) -> ImageId {
    ImageId::new(value).expect("non-empty image id")
}

fn sha(value: &str) -> CommitSha {
    CommitSha::parse(value).expect("valid sha")
}

/// A router wired to recording doubles.
struct Harness {
    app: Router,
    statuses: InMemoryStatusesRepository,
    tagger: RecordingTagger,
}

impl Harness {
    fn new() -> Self {
        Self::with_tagger(RecordingTagger::new())
    }

    fn with_tagger(tagger: RecordingTagger) -> Self {
        let statuses = InMemoryStatusesRepository::new();
        let orchestrator = Orchestrator::builder(Capabilities::offline())
            .commit_resolver(Arc::new(
                InMemoryCommitResolver::new()
                    .with_revision("f1fb3b0", sha(STATSD_SHA))
                    .with_revision("abc123", sha(APP_SHA)),
            ))
            .tag_resolver(Arc::new(
                InMemoryTagResolver::new()
                    .with_image(repo("ejholmes/docker-statsd"), tag("latest"), image("a1b2c3d4"))
                    .with_image(repo("org/app"), tag("v1"), image("sha256:deadbeef")),
            ))
            .statuses(Arc::new(statuses.clone()))
            .tagger(Arc::new(tagger.clone()))
            .build();
        let app = router(AppState::new(Arc::new(orchestrator), WebhookConfig::default()));
        Self {
            app,
            statuses,
            tagger,
        }
    }

    async fn post(&self, path: &str, body: impl Into<String>) -> (StatusCode, String) {
        let response = self
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .body(Body::from(body.into()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, String::from_utf8_lossy(&bytes).to_string())
    }
}

fn statsd_status(state: BuildState, description: &str) -> Status {
    Status {
        repository: repo("ejholmes/docker-statsd"),
        sha: sha(STATSD_SHA),
        state,
        context: "Docker Image".to_string(),
        target_url: Some(STATSD_BUILD_URL.to_string()),
        description: Some(description.to_string()),
    }
}

#[rstest]
#[case("pending", BuildState::Pending, "Image is building")]
#[case("success", BuildState::Success, "Image was built")]
#[case("error", BuildState::Error, "Image build errored")]
#[case("failure", BuildState::Failure, "Image failed to build")]
#[tokio::test]
async fn qualifying_event_creates_one_resolved_status(
    #[case] token: &str,
    #[case] state: BuildState,
    #[case] description: &str,
) {
    let harness = Harness::new();

    let (code, _) = harness
        .post(&format!("/build-events/{token}"), PENDING_BUILD)
        .await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        harness.statuses.statuses(),
        vec![statsd_status(state, description)]
    );
}

#[rstest]
#[case("pending")]
#[case("error")]
#[case("failure")]
#[tokio::test]
async fn non_success_states_do_not_retag(#[case] token: &str) {
    let harness = Harness::new();

    harness
        .post(&format!("/build-events/{token}"), PENDING_BUILD)
        .await;

    assert!(harness.tagger.calls().is_empty());
}

#[tokio::test]
async fn success_retags_image_with_commit_and_image_id() {
    let harness = Harness::new();

    let (code, _) = harness.post("/build-events/success", PENDING_BUILD).await;

    assert_eq!(code, StatusCode::OK);
    let applied: Vec<_> = harness
        .tagger
        .calls()
        .into_iter()
        .map(|call| (call.image, call.tag))
        .collect();
    assert_eq!(
        applied,
        vec![
            (image("a1b2c3d4"), tag(STATSD_SHA)),
            (image("a1b2c3d4"), tag("a1b2c3d4")),
        ]
    );
}

#[tokio::test]
async fn automated_success_event_tags_then_reports() {
    let harness = Harness::new();
    let body = r#"{"repository":"org/app","trigger_kind":"automated","is_manual":false,"docker_tags":["v1"],"build_name":"abc123"}"#;

    let (code, _) = harness.post("/build-events/success", body).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        harness.tagger.calls(),
        vec![
            TagCall {
                repository: repo("org/app"),
                image: image("sha256:deadbeef"),
                tag: tag(APP_SHA),
            },
            TagCall {
                repository: repo("org/app"),
                image: image("sha256:deadbeef"),
                tag: tag("sha256:deadbeef"),
            },
        ]
    );
    let statuses = harness.statuses.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].state, BuildState::Success);
    assert_eq!(statuses[0].sha, sha(APP_SHA));
    assert_eq!(statuses[0].target_url, None);
}

#[tokio::test]
async fn failed_retag_reports_no_status() {
    let harness = Harness::with_tagger(RecordingTagger::rejecting(tag("a1b2c3d4")));

    let (code, body) = harness.post("/build-events/success", PENDING_BUILD).await;

    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "tagging rejected (403): tag 'a1b2c3d4' is protected");
    assert!(harness.statuses.statuses().is_empty());
    assert_eq!(harness.tagger.calls().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deliveries_each_report_once() {
    let harness = Arc::new(Harness::new());

    let deliveries: Vec<_> = (0..32)
        .map(|_| {
            let harness = Arc::clone(&harness);
            tokio::spawn(async move { harness.post("/build-events/success", PENDING_BUILD).await })
        })
        .collect();
    for delivery in deliveries {
        let (code, _) = delivery.await.expect("delivery completes");
        assert_eq!(code, StatusCode::OK);
    }

    assert_eq!(harness.statuses.statuses().len(), 32);
    assert_eq!(harness.tagger.calls().len(), 64);
}

#[tokio::test]
async fn invalid_status_token_is_rejected() {
    let harness = Harness::new();

    let (code, body) = harness.post("/build-events/foo", PENDING_BUILD).await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid status: foo");
    assert!(harness.statuses.statuses().is_empty());
    assert!(harness.tagger.calls().is_empty());
}

#[rstest]
#[case("pending")]
#[case("success")]
#[tokio::test]
async fn manual_build_is_acknowledged_and_ignored(#[case] token: &str) {
    let harness = Harness::new();

    let (code, _) = harness
        .post(&format!("/build-events/{token}"), MANUAL_BUILD)
        .await;

    assert_eq!(code, StatusCode::NO_CONTENT);
    assert!(harness.statuses.statuses().is_empty());
    assert!(harness.tagger.calls().is_empty());
}

#[tokio::test]
async fn unrecognised_trigger_kind_is_acknowledged_and_ignored() {
    let harness = Harness::new();
    let body = PENDING_BUILD.replace(r#""trigger_kind": "github""#, r#""trigger_kind": "custom-git""#);

    let (code, _) = harness.post("/build-events/success", body).await;

    assert_eq!(code, StatusCode::NO_CONTENT);
    assert!(harness.statuses.statuses().is_empty());
    assert!(harness.tagger.calls().is_empty());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let harness = Harness::new();

    let (code, body) = harness.post("/build-events/pending", "{not json").await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("malformed event body:"));
    assert!(harness.statuses.statuses().is_empty());
}

#[tokio::test]
async fn success_without_tags_is_rejected() {
    let harness = Harness::new();
    let body = r#"{"repository":"org/app","trigger_kind":"automated","docker_tags":[],"build_name":"abc123"}"#;

    let (code, body) = harness.post("/build-events/success", body).await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body, "success event carries no docker tags");
    assert!(harness.statuses.statuses().is_empty());
}

#[tokio::test]
async fn event_without_revision_is_rejected() {
    let harness = Harness::new();
    let body = r#"{"repository":"org/app","trigger_kind":"automated","docker_tags":["v1"]}"#;

    let (code, body) = harness.post("/build-events/success", body).await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body, "event carries no build_name revision");
    assert!(harness.tagger.calls().is_empty());
}

#[tokio::test]
async fn malformed_repository_is_rejected() {
    let harness = Harness::new();
    let body = r#"{"repository":"app","trigger_kind":"automated","build_name":"abc123"}"#;

    let (code, body) = harness.post("/build-events/pending", body).await;

    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body, "invalid repository 'app': expected 'owner/name'");
}

#[tokio::test]
async fn unresolvable_revision_is_server_error() {
    let harness = Harness::new();
    let body = r#"{"repository":"org/app","trigger_kind":"automated","build_name":"main"}"#;

    let (code, body) = harness.post("/build-events/pending", body).await;

    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unknown revision 'main' in org/app");
    assert!(harness.statuses.statuses().is_empty());
}

#[tokio::test]
async fn offline_defaults_process_events_end_to_end() {
    let statuses = InMemoryStatusesRepository::new();
    let defaults = Capabilities {
        statuses: Arc::new(statuses.clone()),
        ..Capabilities::offline()
    };
    let app = router(AppState::new(
        Arc::new(Orchestrator::new(defaults)),
        WebhookConfig::default(),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/build-events/success")
                .body(Body::from(PENDING_BUILD))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let created = statuses.statuses();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].sha.as_str(), "f1fb3b0000000000000000000000000000000000");
}

#[tokio::test]
async fn health_probe_answers_ok() {
    let harness = Harness::new();

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn build_events_only_accept_post() {
    let harness = Harness::new();

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/build-events/pending")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
