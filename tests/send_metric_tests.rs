use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metrics_loadgen::client::ServiceClient;
use metrics_loadgen::payload::MetricRecord;

fn test_client(uri: &str) -> ServiceClient {
    ServiceClient::new(uri, Duration::from_secs(5)).expect("client should build")
}

// --- send_metric status classification ---

#[tokio::test]
async fn send_metric_returns_true_on_202() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/metrics-data"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = MetricRecord::normal(&mut rand::thread_rng());

    assert!(client.send_metric(&record).await);
}

#[tokio::test]
async fn send_metric_returns_false_on_200() {
    let server = MockServer::start().await;

    // 200 is a success status but not the documented acknowledgement.
    Mock::given(method("POST"))
        .and(path("/metrics-data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = MetricRecord::normal(&mut rand::thread_rng());

    assert!(!client.send_metric(&record).await);
}

#[tokio::test]
async fn send_metric_returns_false_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/metrics-data"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = MetricRecord::anomaly(&mut rand::thread_rng());

    assert!(!client.send_metric(&record).await);
}

#[tokio::test]
async fn send_metric_returns_false_on_connection_failure() {
    // Port 1 refuses connections; the call must classify, not panic.
    let client = test_client("http://127.0.0.1:1");
    let record = MetricRecord::normal(&mut rand::thread_rng());

    assert!(!client.send_metric(&record).await);
}

// --- Wire format ---

#[tokio::test]
async fn send_metric_posts_the_record_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/metrics-data"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = MetricRecord::normal(&mut rand::thread_rng());
    assert!(client.send_metric(&record).await);

    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("body is JSON");
    assert_eq!(body["timestamp"].as_i64(), Some(record.timestamp));
    assert_eq!(body["cpu"].as_f64(), Some(record.cpu));
    assert_eq!(body["rps"].as_f64(), Some(record.rps));
    assert_eq!(body["memory"].as_f64(), Some(record.memory));
    assert_eq!(body["latency"].as_f64(), Some(record.latency));
}

// --- Final stats fetch ---

#[tokio::test]
async fn fetch_final_stats_returns_the_stats_object() {
    let server = MockServer::start().await;

    let stats_body = serde_json::json!({
        "total_requests": 120,
        "total_anomalies": 11,
        "rolling_average": 98.4,
        "uptime": "2m10s"
    });

    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stats_body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let stats = client.fetch_final_stats().await.expect("stats fetched");

    assert_eq!(stats, stats_body);
}

#[tokio::test]
async fn fetch_final_stats_swallows_error_statuses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(client.fetch_final_stats().await.is_none());
}

#[tokio::test]
async fn fetch_final_stats_swallows_transport_failures() {
    let client = test_client("http://127.0.0.1:1");
    assert!(client.fetch_final_stats().await.is_none());
}
