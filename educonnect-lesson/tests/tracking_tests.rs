//! Tracking client tests against an in-process backend

mod helpers;

use std::time::Duration;

use educonnect_lesson::tracking::EnterLesson;
use educonnect_lesson::Error;
use helpers::{tracking_client, wait_for, MockBackend, MockBehaviour};
use serde_json::json;

fn enter(tab_id: Option<&str>) -> EnterLesson {
    EnterLesson {
        user_id: "u1".to_string(),
        lesson_id: "l1".to_string(),
        series_id: "s1".to_string(),
        lesson_title: Some("Closures".to_string()),
        tab_id: tab_id.map(str::to_string),
    }
}

#[tokio::test]
async fn test_enter_body_and_bearer_header() {
    let backend = MockBackend::start(MockBehaviour::default()).await;
    let client = tracking_client(&backend, Some("tok-123"));

    let response = client.enter_lesson(enter(Some("tab_1"))).await;
    assert_eq!(response, Some(json!({ "success": true, "kind": "enter" })));

    let requests = backend.requests_to("/tracking/lesson/enter");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].body,
        json!({
            "user_id": "u1",
            "lesson_id": "l1",
            "serie_id": "s1",
            "lesson_title": "Closures",
            "tab_id": "tab_1",
        })
    );
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn test_no_authorization_header_without_session() {
    let backend = MockBackend::start(MockBehaviour::default()).await;
    let client = tracking_client(&backend, None);

    client.update_focus("u1", Some("tab_1")).await;
    let requests = backend.requests_to("/tracking/lesson/focus");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].authorization.is_none());
    assert_eq!(requests[0].body, json!({ "user_id": "u1", "tab_id": "tab_1" }));
}

#[tokio::test]
async fn test_missing_tab_id_uses_this_tabs_id() {
    let backend = MockBackend::start(MockBehaviour::default()).await;
    let client = tracking_client(&backend, None);
    let own = client.tab_ids().get_tab_id();

    client.enter_lesson(enter(None)).await;
    client.update_focus("u1", None).await;
    client.exit_lesson("u1", Some("")).await;

    let tabs: Vec<String> = backend
        .requests()
        .iter()
        .map(|r| r.body["tab_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tabs, vec![own.clone(), own.clone(), own]);
}

#[tokio::test]
async fn test_enter_without_title_omits_field() {
    let backend = MockBackend::start(MockBehaviour::default()).await;
    let client = tracking_client(&backend, None);

    client
        .enter_lesson(EnterLesson {
            lesson_title: None,
            ..enter(Some("tab_1"))
        })
        .await;
    let body = &backend.requests_to("/enter")[0].body;
    assert!(body.get("lesson_title").is_none());
}

#[tokio::test]
async fn test_writes_return_none_on_server_error() {
    let backend = MockBackend::start(MockBehaviour {
        fail_writes: true,
        ..MockBehaviour::default()
    })
    .await;
    let client = tracking_client(&backend, None);

    assert!(client.enter_lesson(enter(None)).await.is_none());
    assert!(client.update_focus("u1", None).await.is_none());
    assert!(client.exit_lesson("u1", None).await.is_none());
    assert_eq!(backend.requests().len(), 3);
}

#[tokio::test]
async fn test_current_lesson_decodes_view() {
    let backend = MockBackend::start(MockBehaviour {
        current: Some(json!({
            "user_id": "u1",
            "current_lesson": { "lesson_id": "l2", "serie_id": "s1", "tab_id": "tab_b" },
            "active_lessons": [
                { "lesson_id": "l1", "serie_id": "s1", "tab_id": "tab_a" },
                { "lesson_id": "l2", "serie_id": "s1", "tab_id": "tab_b" }
            ]
        })),
        ..MockBehaviour::default()
    })
    .await;
    let client = tracking_client(&backend, Some("tok"));

    let view = client.get_current_lesson("u1").await.unwrap();
    assert!(view.is_in_lesson());
    let current = view.current_lesson.unwrap();
    assert_eq!(current.lesson_id, "l2");
    assert_eq!(current.series_id.as_deref(), Some("s1"));
    assert_eq!(view.active_lessons.len(), 2);

    let read = &backend.requests_to("/tracking/user/u1/current")[0];
    assert_eq!(read.authorization.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_current_lesson_propagates_status() {
    let backend = MockBackend::start(MockBehaviour::default()).await;
    let client = tracking_client(&backend, None);

    let err = client.get_current_lesson("u1").await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 404, .. }));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_current_lesson_rejects_malformed_body() {
    let backend = MockBackend::start(MockBehaviour {
        current: Some(json!({ "current_lesson": "not an object" })),
        ..MockBehaviour::default()
    })
    .await;
    let client = tracking_client(&backend, None);

    let err = client.get_current_lesson("u1").await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_exit_completes_after_caller_is_dropped() {
    let backend = MockBackend::start(MockBehaviour {
        write_delay: Duration::from_millis(300),
        ..MockBehaviour::default()
    })
    .await;
    let client = tracking_client(&backend, None);

    // The caller gives up long before the server answers
    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), client.exit_lesson("u1", Some("tab_1")))
            .await;
    assert!(abandoned.is_err());

    assert!(
        wait_for(|| backend.completed_writes() == 1, Duration::from_secs(3)).await,
        "exit request did not complete"
    );
    let exits = backend.requests_to("/tracking/lesson/exit");
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].body, json!({ "user_id": "u1", "tab_id": "tab_1" }));
}
