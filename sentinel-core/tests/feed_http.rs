//! Event feed against a local fake DONKI upstream

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use sentinel_core::feed::{
    DateWindow, EventCategory, EventFeedClient, FeedConfig, FeedError, FeedStatus,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Flares echo the query they were asked with
async fn flares(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    Json(json!([
        {
            "flrID": "2023-09-20T14:11:00-FLR-001",
            "classType": "M1.2",
            "query": params,
        }
    ]))
}

async fn cme_broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

/// DONKI answers an empty window with 200 and no body
async fn storms_empty() -> impl IntoResponse {
    StatusCode::OK
}

async fn storms_slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(10)).await;
    Json(json!([]))
}

async fn not_json() -> impl IntoResponse {
    (StatusCode::OK, "<html>maintenance</html>")
}

async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr, timeout: Duration) -> EventFeedClient {
    let config = FeedConfig {
        base_url: format!("http://{}/DONKI", addr),
        api_key: "test-key".to_string(),
        timeout,
    };
    EventFeedClient::new(&config).unwrap()
}

fn window() -> DateWindow {
    DateWindow::ending_on(NaiveDate::from_ymd_opt(2023, 9, 23).unwrap(), 30)
}

#[tokio::test]
async fn test_partial_failure_over_http() {
    let app = Router::new()
        .route("/DONKI/FLR", get(flares))
        .route("/DONKI/CME", get(cme_broken))
        .route("/DONKI/GST", get(storms_empty));
    let addr = spawn_upstream(app).await;
    let client = client_for(addr, Duration::from_secs(5));

    let feed = client.fetch_all(&window()).await;

    assert_eq!(feed.status(), FeedStatus::Partial);
    assert_eq!(feed.solar_flares.records.len(), 1);
    assert!(feed.cme_events.records.is_empty());
    assert_eq!(
        feed.cme_events.error,
        Some(FeedError::Status { endpoint: "CME".into(), status: 500 })
    );
    assert!(feed.geomagnetic_storms.is_ok());
    assert!(feed.geomagnetic_storms.records.is_empty());

    let query = &feed.solar_flares.records[0]["query"];
    assert_eq!(query["startDate"], "2023-08-24");
    assert_eq!(query["endDate"], "2023-09-23");
    assert_eq!(query["api_key"], "test-key");
}

#[tokio::test]
async fn test_payload_keeps_records_opaque() {
    let app = Router::new().route("/DONKI/FLR", get(flares));
    let addr = spawn_upstream(app).await;
    let client = client_for(addr, Duration::from_secs(5));

    let report = client.fetch_category(EventCategory::SolarFlare, &window()).await;
    let value = serde_json::to_value(&report.records).unwrap();

    assert_eq!(value[0]["flrID"], "2023-09-20T14:11:00-FLR-001");
    assert_eq!(value[0]["classType"], "M1.2");
}

#[tokio::test]
async fn test_missing_route_is_status_error() {
    let addr = spawn_upstream(Router::new()).await;
    let client = client_for(addr, Duration::from_secs(5));

    let feed = client.fetch_all(&window()).await;

    assert_eq!(feed.status(), FeedStatus::Failed);
    for report in feed.reports() {
        assert!(matches!(report.error, Some(FeedError::Status { status: 404, .. })));
    }
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let app = Router::new().route("/DONKI/GST", get(not_json));
    let addr = spawn_upstream(app).await;
    let client = client_for(addr, Duration::from_secs(5));

    let report = client.fetch_category(EventCategory::GeomagneticStorm, &window()).await;
    assert!(matches!(report.error, Some(FeedError::Decode { .. })));
}

#[tokio::test]
async fn test_transport_timeout() {
    let app = Router::new()
        .route("/DONKI/FLR", get(flares))
        .route("/DONKI/GST", get(storms_slow));
    let addr = spawn_upstream(app).await;
    let client = client_for(addr, Duration::from_millis(300));

    let report = client.fetch_category(EventCategory::GeomagneticStorm, &window()).await;
    assert_eq!(report.error, Some(FeedError::Timeout { endpoint: "GST".into() }));

    let report = client.fetch_category(EventCategory::SolarFlare, &window()).await;
    assert!(report.is_ok());
}

#[tokio::test]
async fn test_caller_deadline() {
    let app = Router::new()
        .route("/DONKI/FLR", get(flares))
        .route("/DONKI/CME", get(storms_empty))
        .route("/DONKI/GST", get(storms_slow));
    let addr = spawn_upstream(app).await;
    let client = client_for(addr, Duration::from_secs(30));

    let feed = client
        .fetch_all_with_deadline(&window(), Some(Duration::from_millis(300)))
        .await;

    assert_eq!(feed.solar_flares.records.len(), 1);
    assert!(feed.cme_events.is_ok());
    assert_eq!(
        feed.geomagnetic_storms.error,
        Some(FeedError::Timeout { endpoint: "GST".into() })
    );
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Bind then drop to get a port with nobody listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(addr, Duration::from_secs(5));

    let feed = client.fetch_all_days(7).await;

    assert_eq!(feed.status(), FeedStatus::Failed);
    assert_eq!(feed.window.span_days(), 7);
    assert!(matches!(
        feed.solar_flares.error,
        Some(FeedError::Transport { .. })
    ));
}

#[tokio::test]
async fn test_transport_errors_do_not_carry_api_key() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = FeedConfig {
        base_url: format!("http://{}/DONKI", addr),
        api_key: "SUPERSECRET123".to_string(),
        timeout: Duration::from_secs(5),
    };
    let client = EventFeedClient::new(&config).unwrap();

    let feed = client.fetch_all(&window()).await;

    assert_eq!(feed.status(), FeedStatus::Failed);
    let payload = serde_json::to_string(&feed).unwrap();
    assert!(payload.contains("\"cme_events\""));
    assert!(!payload.contains("SUPERSECRET123"), "{}", payload);
    assert!(!payload.contains("api_key"), "{}", payload);
    for report in [&feed.solar_flares, &feed.cme_events, &feed.geomagnetic_storms] {
        let message = report.error.as_ref().unwrap().to_string();
        assert!(!message.contains("SUPERSECRET123"), "{}", message);
    }
}
