//! Timeline fetch and navigation integration tests

mod helpers;

use std::collections::HashMap;
use std::time::Duration;

use educonnect_lesson::content::Lesson;
use educonnect_lesson::timeline::{fetch_and_parse_timeline, TimelineClient};
use educonnect_lesson::{Error, LessonNavigator, TimelineState};
use helpers::{MockBackend, MockBehaviour};

const DOC: &str = "# Lesson 1\n\
[00:02] - [00:39] : **Intro**\n\
> welcome text\n\
## Part two\n\
[00:40] - [01:00] : Setup\n\
> install steps\n";

async fn backend() -> MockBackend {
    let mut timelines = HashMap::new();
    timelines.insert("intro.txt".to_string(), DOC.to_string());
    timelines.insert("empty.txt".to_string(), "# nothing here\n\n".to_string());
    MockBackend::start(MockBehaviour {
        timelines,
        ..MockBehaviour::default()
    })
    .await
}

#[tokio::test]
async fn test_fetch_and_parse_document() {
    let backend = backend().await;
    let markers = fetch_and_parse_timeline(&backend.timeline_url("intro.txt"))
        .await
        .unwrap();

    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].time, "00:02");
    assert_eq!(markers[0].seconds, 2);
    assert_eq!(markers[0].label, "Intro");
    assert_eq!(markers[0].desc, "welcome text");
    assert_eq!(markers[1].seconds, 40);
    assert_eq!(markers[1].label, "Setup");
}

#[tokio::test]
async fn test_document_without_markers_is_empty_success() {
    let backend = backend().await;
    let client = TimelineClient::new(Duration::from_secs(5)).unwrap();
    let markers = client
        .fetch_and_parse(&backend.timeline_url("empty.txt"))
        .await
        .unwrap();
    assert!(markers.is_empty());
}

#[tokio::test]
async fn test_missing_document_is_error() {
    let backend = backend().await;
    let client = TimelineClient::new(Duration::from_secs(5)).unwrap();
    let err = client
        .fetch_and_parse(&backend.timeline_url("missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_unreachable_host_is_error() {
    let client = TimelineClient::new(Duration::from_secs(2)).unwrap();
    let err = client
        .fetch_and_parse("http://127.0.0.1:9/timeline.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn test_navigator_loads_timeline_per_lesson() {
    let backend = backend().await;
    let client = TimelineClient::new(Duration::from_secs(5)).unwrap();

    let lessons = vec![
        Lesson {
            lesson_id: "l1".to_string(),
            lesson_timeline: Some(backend.timeline_url("intro.txt")),
            ..Lesson::default()
        },
        Lesson {
            lesson_id: "l2".to_string(),
            lesson_timeline: Some(backend.timeline_url("missing.txt")),
            ..Lesson::default()
        },
        Lesson {
            lesson_id: "l3".to_string(),
            ..Lesson::default()
        },
    ];
    let mut nav = LessonNavigator::new(lessons);

    nav.open_lesson("l1").unwrap();
    nav.load_timeline(&client).await;
    assert_eq!(nav.markers().len(), 2);

    nav.next();
    assert!(matches!(
        nav.load_timeline(&client).await,
        TimelineState::Failed(_)
    ));
    assert!(nav.markers().is_empty());

    nav.next();
    assert_eq!(nav.load_timeline(&client).await, &TimelineState::NotProvided);
}
