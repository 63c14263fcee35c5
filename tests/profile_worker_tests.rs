use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metrics_loadgen::behavior::{Behavior, BehaviorSelector, ThinkTime, WeightedBehavior};
use metrics_loadgen::client::ServiceClient;
use metrics_loadgen::errors::ErrorCategory;
use metrics_loadgen::report::BehaviorReport;
use metrics_loadgen::worker::{execute_behavior, run_user, UserConfig};

/// Mounts the full healthy service surface.
async fn mount_healthy_service(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/metrics-data"))
        .respond_with(ResponseTemplate::new(202))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"rolling_average": 100.2, "is_anomaly": false})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"total_requests": 1, "total_anomalies": 0})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn test_client(uri: &str) -> ServiceClient {
    ServiceClient::new(uri, Duration::from_secs(5)).expect("client should build")
}

fn quick_think() -> ThinkTime {
    ThinkTime::Random {
        min: Duration::from_millis(1),
        max: Duration::from_millis(3),
    }
}

fn single_behavior(behavior: Behavior) -> BehaviorSelector {
    BehaviorSelector::new(vec![WeightedBehavior::new(behavior, 1.0)])
}

async fn run_one_user(
    client: ServiceClient,
    selector: BehaviorSelector,
    duration: Duration,
) -> Arc<BehaviorReport> {
    let report = Arc::new(BehaviorReport::new());
    let config = UserConfig {
        user_id: 0,
        selector,
        think_time: quick_think(),
        test_duration: duration,
    };

    run_user(
        client,
        config,
        report.clone(),
        Instant::now(),
        Arc::new(AtomicBool::new(false)),
    )
    .await;

    report
}

// --- Startup health check ---

#[tokio::test]
async fn user_issues_one_health_check_on_start() {
    let server = MockServer::start().await;
    mount_healthy_service(&server).await;

    // The selector never picks HealthCheck, so any health execution must
    // come from the startup probe.
    let report = run_one_user(
        test_client(&server.uri()),
        single_behavior(Behavior::FetchStats),
        Duration::from_millis(300),
    )
    .await;

    assert_eq!(report.executions(Behavior::HealthCheck), 1);
    assert_eq!(report.successes(Behavior::HealthCheck), 1);
    assert!(report.executions(Behavior::FetchStats) > 0);
}

// --- Outcome classification ---

#[tokio::test]
async fn healthy_service_yields_no_failures() {
    let server = MockServer::start().await;
    mount_healthy_service(&server).await;

    let report = run_one_user(
        test_client(&server.uri()),
        BehaviorSelector::new(Behavior::default_weights()),
        Duration::from_secs(1),
    )
    .await;

    assert!(report.total_executions() > 10);
    for behavior in Behavior::all() {
        assert_eq!(
            report.failures(behavior),
            0,
            "unexpected failures for {}",
            behavior.label()
        );
    }
}

#[tokio::test]
async fn analytics_server_error_counts_as_failure() {
    let failing = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&failing)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&failing)
        .await;

    let report = run_one_user(
        test_client(&failing.uri()),
        single_behavior(Behavior::FetchAnalytics),
        Duration::from_millis(300),
    )
    .await;

    assert!(report.executions(Behavior::FetchAnalytics) > 0);
    assert_eq!(report.successes(Behavior::FetchAnalytics), 0);
    assert_eq!(
        report.failures(Behavior::FetchAnalytics),
        report.executions(Behavior::FetchAnalytics)
    );
}

#[tokio::test]
async fn submission_answered_with_200_is_a_failure() {
    let server = MockServer::start().await;

    // Submissions are only acknowledged by 202; a 200 is a protocol failure.
    Mock::given(method("POST"))
        .and(path("/metrics-data"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let report = run_one_user(
        test_client(&server.uri()),
        single_behavior(Behavior::SendNormalMetric),
        Duration::from_millis(300),
    )
    .await;

    assert!(report.executions(Behavior::SendNormalMetric) > 0);
    assert_eq!(report.successes(Behavior::SendNormalMetric), 0);
}

// --- execute_behavior outcomes ---

#[tokio::test]
async fn execute_behavior_reports_the_response_status() {
    let server = MockServer::start().await;
    mount_healthy_service(&server).await;

    let client = test_client(&server.uri());

    let outcome = execute_behavior(&client, Behavior::FetchStats).await;
    assert!(outcome.success);
    assert_eq!(outcome.status, Some(200));
    assert!(outcome.error.is_none());

    let outcome = execute_behavior(&client, Behavior::SendAnomalyMetric).await;
    assert!(outcome.success);
    assert_eq!(outcome.status, Some(202));
}

#[tokio::test]
async fn execute_behavior_classifies_transport_failures() {
    let client = test_client("http://127.0.0.1:1");

    let outcome = execute_behavior(&client, Behavior::HealthCheck).await;
    assert!(!outcome.success);
    assert_eq!(outcome.status, None);
    assert_eq!(outcome.error, Some(ErrorCategory::NetworkError));
}

// --- Stop signal ---

#[tokio::test]
async fn user_stops_when_stop_flag_is_raised() {
    let server = MockServer::start().await;
    mount_healthy_service(&server).await;

    let report = Arc::new(BehaviorReport::new());
    let stop = Arc::new(AtomicBool::new(false));
    let config = UserConfig {
        user_id: 0,
        selector: BehaviorSelector::new(Behavior::default_weights()),
        think_time: quick_think(),
        test_duration: Duration::from_secs(60),
    };

    let stop_clone = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop_clone.store(true, Ordering::Relaxed);
    });

    let start = Instant::now();
    run_user(
        test_client(&server.uri()),
        config,
        report.clone(),
        start,
        stop,
    )
    .await;

    assert!(
        start.elapsed() < Duration::from_secs(5),
        "user should stop shortly after the flag is raised, ran {:?}",
        start.elapsed()
    );
    assert!(report.total_executions() > 0);
}
