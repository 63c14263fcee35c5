use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time;
use tracing_subscriber::EnvFilter;

use metrics_loadgen::behavior::{Behavior, BehaviorSelector, ThinkTime};
use metrics_loadgen::client::ServiceClient;
use metrics_loadgen::config::ProfileConfig;
use metrics_loadgen::metrics::{gather_metrics_string, register_metrics, start_metrics_server};
use metrics_loadgen::report::BehaviorReport;
use metrics_loadgen::worker::{run_user, UserConfig};

/// Prints helpful configuration documentation.
fn print_config_help() {
    eprintln!("Optional environment variables:");
    eprintln!("  SERVICE_URL             - Base URL of the metrics service (default: http://localhost:8080)");
    eprintln!("  REQUEST_TIMEOUT_SECS    - Per-request timeout in seconds (default: 5)");
    eprintln!("  NUM_USERS               - Number of simulated users (default: 10, must be > 0)");
    eprintln!("  TEST_DURATION           - Run duration: 30s, 10m, 2h, 1d (default: 1m)");
    eprintln!("  THINK_TIME_MIN_MS       - Minimum pause between user actions (default: 10)");
    eprintln!("  THINK_TIME_MAX_MS       - Maximum pause between user actions (default: 50)");
    eprintln!("  METRICS_PORT            - Prometheus exposition port (default: 9090)");
    eprintln!("  METRIC_NAMESPACE        - Prometheus metric namespace (default: metrics_loadgen)");
    eprintln!("  RUST_LOG                - Log filter (default: info)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Register Prometheus metrics
    register_metrics()?;

    let config = match ProfileConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}\n", e);
            print_config_help();
            std::process::exit(1);
        }
    };

    let client = ServiceClient::new(config.service_url.clone(), config.request_timeout)?;

    config.print_summary();

    // Start the Prometheus exposition server
    let registry_arc = Arc::new(Mutex::new(prometheus::default_registry().clone()));
    {
        let registry = registry_arc.clone();
        let port = config.metrics_port;
        tokio::spawn(async move {
            start_metrics_server(port, registry).await;
        });
    }

    let selector = BehaviorSelector::new(Behavior::default_weights());
    let think_time = ThinkTime::Random {
        min: config.think_time_min,
        max: config.think_time_max,
    };
    let report = Arc::new(BehaviorReport::new());
    let stop = Arc::new(AtomicBool::new(false));
    let start_time = time::Instant::now();

    let mut handles = Vec::new();
    for i in 0..config.num_users {
        let user_config = UserConfig {
            user_id: i,
            selector: selector.clone(),
            think_time: think_time.clone(),
            test_duration: config.test_duration,
        };

        let client_clone = client.clone();
        let report_clone = report.clone();
        let stop_clone = stop.clone();

        let handle = tokio::spawn(async move {
            run_user(client_clone, user_config, report_clone, start_time, stop_clone).await;
        });
        handles.push(handle);
    }

    // Run for the configured duration, or until interrupted.
    tokio::select! {
        _ = time::sleep(config.test_duration) => {
            println!("Test duration completed. Signalling users to stop.");
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted. Signalling users to stop.");
        }
    }
    stop.store(true, Ordering::Relaxed);

    for handle in handles {
        let _ = handle.await;
    }

    report.print_summary();

    let final_metrics = gather_metrics_string(&registry_arc);
    println!("--- FINAL METRICS ---\n{}", final_metrics);
    println!("--- END OF FINAL METRICS ---");

    Ok(())
}
