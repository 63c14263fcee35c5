use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{self, Duration, Instant};
use tracing::{debug, error, info};

use crate::behavior::{Behavior, BehaviorSelector, ThinkTime};
use crate::client::{drain_body, ServiceClient};
use crate::errors::ErrorCategory;
use crate::metrics::{
    BEHAVIOR_EXECUTIONS_TOTAL, CONCURRENT_USERS, METRICS_GENERATED_TOTAL,
    REQUEST_DURATION_SECONDS, REQUEST_ERRORS_BY_CATEGORY, REQUEST_STATUS_CODES, REQUEST_TOTAL,
};
use crate::payload::{MetricClass, MetricRecord};
use crate::report::BehaviorReport;

/// Configuration for one simulated user.
pub struct UserConfig {
    pub user_id: usize,
    pub selector: BehaviorSelector,
    pub think_time: ThinkTime,
    pub test_duration: Duration,
}

/// Classified result of a single behavior execution.
#[derive(Debug)]
pub struct BehaviorOutcome {
    pub behavior: Behavior,

    /// True iff the response status matched the behavior's expected status.
    pub success: bool,

    /// Response status, `None` on transport failure.
    pub status: Option<u16>,

    /// Transport error category, `None` when a response was received.
    pub error: Option<ErrorCategory>,

    pub latency_ms: u64,
}

/// Runs one simulated user until the duration elapses or `stop` is raised.
///
/// Each user issues one health check on start, then loops: think, pick a
/// weighted behavior, execute it, record the outcome. Users share nothing
/// mutable beyond the aggregate report and the Prometheus counters.
pub async fn run_user(
    client: ServiceClient,
    config: UserConfig,
    report: Arc<BehaviorReport>,
    start_time: Instant,
    stop: Arc<AtomicBool>,
) {
    debug!(user_id = config.user_id, "User starting");
    CONCURRENT_USERS.inc();

    // Liveness probe on start, recorded like any other behavior.
    let probe = execute_behavior(&client, Behavior::HealthCheck).await;
    record_outcome(&report, &probe);

    loop {
        if stop.load(Ordering::Relaxed) {
            info!(user_id = config.user_id, "User stopping on stop signal");
            break;
        }

        let elapsed = time::Instant::now().duration_since(start_time);
        if elapsed >= config.test_duration {
            info!(
                user_id = config.user_id,
                elapsed_secs = elapsed.as_secs_f64(),
                "User stopping after duration limit"
            );
            break;
        }

        time::sleep(config.think_time.delay()).await;

        let behavior = config.selector.select();
        let outcome = execute_behavior(&client, behavior).await;

        debug!(
            user_id = config.user_id,
            behavior = behavior.label(),
            success = outcome.success,
            status = outcome.status,
            latency_ms = outcome.latency_ms,
            "Behavior completed"
        );

        record_outcome(&report, &outcome);
    }

    CONCURRENT_USERS.dec();
}

/// Executes one behavior and classifies the result.
///
/// Success means the response status equals the behavior's expected status;
/// any other status is a protocol failure, any transport error a network
/// failure. Neither is retried.
pub async fn execute_behavior(client: &ServiceClient, behavior: Behavior) -> BehaviorOutcome {
    REQUEST_TOTAL.inc();
    let request_start = time::Instant::now();

    let result = match behavior {
        Behavior::SendNormalMetric => {
            METRICS_GENERATED_TOTAL
                .with_label_values(&[MetricClass::Normal.label()])
                .inc();
            let record = MetricRecord::normal(&mut rand::thread_rng());
            client.submit_metric(&record).await
        }
        Behavior::SendAnomalyMetric => {
            METRICS_GENERATED_TOTAL
                .with_label_values(&[MetricClass::Anomaly.label()])
                .inc();
            let record = MetricRecord::anomaly(&mut rand::thread_rng());
            client.submit_metric(&record).await
        }
        Behavior::FetchAnalytics => client.analytics().await,
        Behavior::FetchStats => client.stats().await,
        Behavior::HealthCheck => client.health().await,
    };

    let outcome = match result {
        Ok(response) => {
            let status = response.status().as_u16();
            drain_body(response).await;

            REQUEST_STATUS_CODES
                .with_label_values(&[status_code_label(status)])
                .inc();
            if let Some(category) = ErrorCategory::from_status(status) {
                REQUEST_ERRORS_BY_CATEGORY
                    .with_label_values(&[category.label()])
                    .inc();
            }

            BehaviorOutcome {
                behavior,
                success: status == behavior.expected_status(),
                status: Some(status),
                error: None,
                latency_ms: request_start.elapsed().as_millis() as u64,
            }
        }
        Err(e) => {
            let category = ErrorCategory::from_reqwest_error(&e);
            REQUEST_STATUS_CODES.with_label_values(&["error"]).inc();
            REQUEST_ERRORS_BY_CATEGORY
                .with_label_values(&[category.label()])
                .inc();

            error!(
                behavior = behavior.label(),
                error = %e,
                category = %category,
                "Request failed"
            );

            BehaviorOutcome {
                behavior,
                success: false,
                status: None,
                error: Some(category),
                latency_ms: request_start.elapsed().as_millis() as u64,
            }
        }
    };

    REQUEST_DURATION_SECONDS.observe(request_start.elapsed().as_secs_f64());
    outcome
}

fn record_outcome(report: &BehaviorReport, outcome: &BehaviorOutcome) {
    report.record(outcome.behavior, outcome.success, outcome.latency_ms);
    BEHAVIOR_EXECUTIONS_TOTAL
        .with_label_values(&[
            outcome.behavior.label(),
            if outcome.success { "success" } else { "failed" },
        ])
        .inc();
}

/// Static label for common status codes, avoiding a heap allocation per
/// request; uncommon codes collapse into "other".
fn status_code_label(code: u16) -> &'static str {
    match code {
        200 => "200",
        201 => "201",
        202 => "202",
        204 => "204",
        301 => "301",
        302 => "302",
        304 => "304",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        405 => "405",
        408 => "408",
        409 => "409",
        422 => "422",
        429 => "429",
        500 => "500",
        502 => "502",
        503 => "503",
        504 => "504",
        _ => "other",
    }
}
