use std::time::Duration;

use serde_json::json;

use guidebase::config::ExtractionConfig;
use guidebase::error::ExtractionError;
use guidebase::extraction::{ExtractionClient, JobStart};
use guidebase::poll::{DEFAULT_FAILURE_MESSAGE, JobState};
use guidebase::schema::ContentKind;

mod extraction_stub;
use extraction_stub::{ExtractionStub, ExtractionStubConfig, PollReply};

fn client_for(stub: &ExtractionStub) -> ExtractionClient {
    let config = ExtractionConfig::new(stub.base_url.clone(), "test-key")
        .with_referer("https://guidebase-demo.example.test")
        .with_sync_timeout(Duration::from_secs(5));
    ExtractionClient::new(config).expect("build client")
}

#[tokio::test]
async fn synchronous_extraction_normalizes_the_payload() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        extract_response: Some((
            200,
            json!({
                "data": {
                    "title": "Buttermilk Pancakes",
                    "servings": "4",
                    "ingredients": [{"name": "flour", "quantity": "2", "unit": "cups"}],
                    "instructions": ["Whisk everything", {"step": 2, "text": "Cook on a hot griddle"}],
                }
            }),
        )),
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let item = client
        .extract("https://example.test/pancakes", ContentKind::Recipe)
        .await
        .expect("extraction succeeds");

    assert_eq!(item.title, "Buttermilk Pancakes");
    assert_eq!(item.servings, Some(4));
    assert_eq!(item.materials[0].name, "flour");
    assert_eq!(item.steps.len(), 2);
    assert_eq!(item.steps[0].step_number, 1);
    assert_eq!(item.steps[0].title, "Step 1");
    assert_eq!(item.steps[1].instructions, "Cook on a hot griddle");
}

#[tokio::test]
async fn upstream_error_messages_pass_through() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        extract_response: Some((500, json!({"error": "crawler gave up"}))),
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let err = client
        .extract("https://example.test/guide", ContentKind::Tutorial)
        .await
        .expect_err("extraction fails");

    match err {
        ExtractionError::Upstream { status, message } => {
            assert_eq!(status, Some(500));
            assert!(message.contains("crawler gave up"), "message={message}");
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn embedded_error_in_a_success_body_is_an_upstream_failure() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        extract_response: Some((200, json!({"error": "page is paywalled"}))),
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let err = client
        .extract("https://example.test/guide", ContentKind::Tutorial)
        .await
        .expect_err("extraction fails");
    assert!(matches!(err, ExtractionError::Upstream { .. }));
    assert!(err.to_string().contains("page is paywalled"));
}

#[tokio::test]
async fn rejected_credentials_surface_as_auth_error() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        expected_bearer: "a-different-key".to_string(),
        extract_response: Some((200, json!({"data": {"title": "t"}}))),
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let err = client
        .extract("https://example.test/guide", ContentKind::Tutorial)
        .await
        .expect_err("extraction fails");
    assert!(matches!(err, ExtractionError::Auth));
}

#[tokio::test]
async fn invalid_urls_are_rejected_before_any_request() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig::default());
    let client = client_for(&stub);

    for bad in ["", "   ", "ftp://example.test/guide", "not a url"] {
        let err = client
            .extract(bad, ContentKind::Tutorial)
            .await
            .expect_err("validation fails");
        assert!(matches!(err, ExtractionError::Validation(_)), "url={bad:?}");
    }
}

#[tokio::test]
async fn fast_pages_complete_at_submission() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        start_response: Some((
            200,
            json!({
                "status": "completed",
                "data": {"title": "Quick Fix", "steps": [{"instructions": "Tighten the hinge"}]},
            }),
        )),
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let start = client
        .start_job("https://example.test/quick", ContentKind::Tutorial)
        .await
        .expect("job starts");

    match start {
        JobStart::Completed(item) => {
            assert_eq!(item.title, "Quick Fix");
            assert_eq!(item.steps[0].step_number, 1);
        }
        JobStart::Accepted(_) => panic!("expected an inline completion"),
    }
}

#[tokio::test]
async fn polling_tolerates_unmaterialized_jobs_and_is_idempotent() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        start_response: Some((200, json!({"job_id": "job-123"}))),
        poll_replies: vec![
            PollReply::NotFound,
            PollReply::Body(json!({"status": "pending"})),
            PollReply::Body(json!({"status": "running", "progress": 40})),
            PollReply::Body(json!({
                "status": "completed",
                "progress": 100,
                "data": {"title": "Bookshelf", "steps": [{"instructions": "Cut the sides"}]},
            })),
        ],
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let JobStart::Accepted(handle) = client
        .start_job("https://example.test/bookshelf", ContentKind::Tutorial)
        .await
        .expect("job starts")
    else {
        panic!("expected an accepted job");
    };
    assert_eq!(handle.job_id, "job-123");

    // First poll races the service's own bookkeeping: 404 means running.
    let first = client.poll_once(&handle).await.expect("first poll");
    assert_eq!(first.state, JobState::Running);
    assert!(first.error.is_none());

    let second = client.poll_once(&handle).await.expect("second poll");
    assert_eq!(second.state, JobState::Pending);

    let third = client.poll_once(&handle).await.expect("third poll");
    assert_eq!(third.state, JobState::Running);
    assert_eq!(third.progress, Some(40));

    let done = client.poll_once(&handle).await.expect("fourth poll");
    assert_eq!(done.state, JobState::Completed);
    let item = done.data.clone().expect("completed data");
    assert_eq!(item.title, "Bookshelf");

    // A terminal job answers every further poll identically.
    let again = client.poll_once(&handle).await.expect("fifth poll");
    assert_eq!(again.state, JobState::Completed);
    assert_eq!(again.data, done.data);
}

#[tokio::test]
async fn failed_jobs_default_their_error_message() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        poll_replies: vec![PollReply::Body(json!({"status": "failed"}))],
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let handle = guidebase::extraction::JobHandle {
        job_id: "job-9".to_string(),
        kind: ContentKind::Tutorial,
    };
    let snapshot = client.poll_once(&handle).await.expect("poll");
    assert_eq!(snapshot.state, JobState::Failed);
    assert_eq!(snapshot.error.as_deref(), Some(DEFAULT_FAILURE_MESSAGE));
    assert!(snapshot.data.is_none());
}

#[tokio::test]
async fn failed_jobs_carry_the_upstream_message_when_present() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        poll_replies: vec![PollReply::Body(json!({
            "status": "failed",
            "error_message": "target site blocked the crawler",
        }))],
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let handle = guidebase::extraction::JobHandle {
        job_id: "job-10".to_string(),
        kind: ContentKind::Tutorial,
    };
    let snapshot = client.poll_once(&handle).await.expect("poll");
    assert_eq!(snapshot.state, JobState::Failed);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("target site blocked the crawler")
    );
}

#[tokio::test]
async fn unexpected_job_status_is_an_upstream_error() {
    let stub = ExtractionStub::spawn(ExtractionStubConfig {
        poll_replies: vec![PollReply::Body(json!({"status": "paused"}))],
        ..ExtractionStubConfig::default()
    });
    let client = client_for(&stub);

    let handle = guidebase::extraction::JobHandle {
        job_id: "job-11".to_string(),
        kind: ContentKind::Tutorial,
    };
    let err = client.poll_once(&handle).await.expect_err("poll fails");
    assert!(matches!(err, ExtractionError::Upstream { .. }));
    assert!(err.to_string().contains("paused"));
}
