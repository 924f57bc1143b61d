//! HTTP 전송 통합 테스트
//!
//! mockito 수집 서버 + 실제 reqwest 전송으로 매니저 전체 흐름 검증.

use mockito::Matcher;
use pulse_client::{Manager, ManagerDeps};
use pulse_core::config::ManagerConfig;
use pulse_core::models::device::DeviceMetrics;
use pulse_core::models::event::{serialize_events, Event, Segmentation};
use pulse_core::ports::clock::SystemClock;
use pulse_core::ports::device::DeviceInfoProvider;
use pulse_network::http_transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;

struct StaticDevice;

impl DeviceInfoProvider for StaticDevice {
    fn device_id(&self) -> String {
        "integration-device".to_string()
    }

    fn refresh(&self) {}

    fn metrics(&self) -> DeviceMetrics {
        DeviceMetrics {
            os: Some("Linux".to_string()),
            locale: Some("ja_JP".to_string()),
            ..Default::default()
        }
    }
}

fn manager_for(server: &mockito::ServerGuard) -> Manager {
    let config = ManagerConfig {
        app_host: server.url(),
        app_key: "integration-key".to_string(),
        update_interval_secs: 0.0,
        queue_uses_persistent_storage: false,
        ..ManagerConfig::default()
    };

    Manager::new(
        config,
        ManagerDeps {
            transport: Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap()),
            device: Arc::new(StaticDevice),
            clock: Arc::new(SystemClock),
            storage: None,
        },
    )
    .unwrap()
}

fn crazy_segmentation() -> Segmentation {
    let mut segmentation = Segmentation::new();
    segmentation.insert("demo1".to_string(), "someText".to_string());
    segmentation.insert(
        "demo3".to_string(),
        "Handles UTF8-テスト JSON\"\nstrings".to_string(),
    );
    segmentation.insert("demo4".to_string(), "Special Chars: \\ / \t &".to_string());
    segmentation
}

#[tokio::test]
async fn session_and_events_reach_collector() {
    let mut server = mockito::Server::new_async().await;

    let begin = server
        .mock("GET", "/i")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("app_key".into(), "integration-key".into()),
            Matcher::UrlEncoded("device_id".into(), "integration-device".into()),
            Matcher::UrlEncoded("begin_session".into(), "1".into()),
            Matcher::UrlEncoded(
                "metrics".into(),
                r#"{"_os":"Linux","_locale":"ja_JP"}"#.into(),
            ),
        ]))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let purchase = Event::new("purchase", 1)
        .unwrap()
        .with_sum(100.0)
        .with_segmentation(Segmentation::from([(
            "purchase_id".to_string(),
            "product01".to_string(),
        )]));
    let crazy = Event::new("UTF8こんにちは World", 1)
        .unwrap()
        .with_sum(10.25)
        .with_segmentation(crazy_segmentation());
    let expected_events = serialize_events(&[purchase.clone(), crazy.clone()]).unwrap();

    let events = server
        .mock("GET", "/i")
        .match_query(Matcher::UrlEncoded("events".into(), expected_events))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let end = server
        .mock("GET", "/i")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("end_session".into(), "1".into()),
            Matcher::Regex("session_duration=[0-9]+".into()),
        ]))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let manager = manager_for(&server);
    assert!(manager.init(None));
    manager.record_event(purchase);
    manager.record_event(crazy);
    manager.on_background().await;

    begin.assert_async().await;
    events.assert_async().await;
    end.assert_async().await;
    assert_eq!(manager.stats().queued_requests, 0);
}

#[tokio::test]
async fn failing_head_is_dropped_after_five_attempts() {
    let mut server = mockito::Server::new_async().await;

    let begin = server
        .mock("GET", "/i")
        .match_query(Matcher::UrlEncoded("begin_session".into(), "1".into()))
        .with_status(500)
        .expect(5)
        .create_async()
        .await;

    let manager = manager_for(&server);
    // 초기화 시 1회 시도
    assert!(manager.init(None));

    for _ in 0..3 {
        let report = manager.deliver_pending().await;
        assert!(report.stalled);
        assert_eq!(report.remaining, 1);
    }

    let report = manager.deliver_pending().await;
    assert_eq!(report.dropped, 1);
    assert_eq!(report.remaining, 0);
    assert!(!report.stalled);

    begin.assert_async().await;
}

#[tokio::test]
async fn recovered_collector_receives_request_once() {
    let mut server = mockito::Server::new_async().await;

    let down = server
        .mock("GET", "/i")
        .match_query(Matcher::UrlEncoded("begin_session".into(), "1".into()))
        .with_status(503)
        .expect(4)
        .create_async()
        .await;

    let manager = manager_for(&server);
    assert!(manager.init(None));
    for _ in 0..3 {
        assert!(manager.deliver_pending().await.stalled);
    }
    down.assert_async().await;
    down.remove_async().await;

    let up = server
        .mock("GET", "/i")
        .match_query(Matcher::UrlEncoded("begin_session".into(), "1".into()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let report = manager.deliver_pending().await;
    assert_eq!(report.delivered, 1);
    assert_eq!(report.dropped, 0);
    up.assert_async().await;
}
