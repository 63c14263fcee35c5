use tracing_subscriber::EnvFilter;

use metrics_loadgen::client::ServiceClient;
use metrics_loadgen::config::GeneratorConfig;
use metrics_loadgen::generator::{run_generator, GeneratorStats};

/// Prints helpful configuration documentation.
fn print_config_help() {
    eprintln!("Optional environment variables:");
    eprintln!("  SERVICE_URL             - Base URL of the metrics service (default: http://localhost:8080)");
    eprintln!("  REQUEST_TIMEOUT_SECS    - Per-request timeout in seconds (default: 5)");
    eprintln!("  SEND_INTERVAL_MS        - Pause between sends in milliseconds (default: 100, ~10 records/sec)");
    eprintln!("  ANOMALY_RATIO           - Fraction of anomalous records, 0..1 (default: 0.1)");
    eprintln!("  SUMMARY_EVERY           - Progress line every N successful sends (default: 10)");
    eprintln!("  RUST_LOG                - Log filter (default: info)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match GeneratorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}\n", e);
            print_config_help();
            std::process::exit(1);
        }
    };

    let client = ServiceClient::new(config.service_url.clone(), config.request_timeout)?;

    config.print_summary();
    println!("Press Ctrl+C to stop\n");

    let stats = GeneratorStats::new();
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    run_generator(&client, &config, &stats, shutdown).await;

    println!("\nStopping...");
    stats.print_totals();

    // Best effort: ask the service what it saw. Silence on any failure.
    if let Some(server_stats) = client.fetch_final_stats().await {
        if let Ok(pretty) = serde_json::to_string_pretty(&server_stats) {
            println!("\nServer stats:");
            println!("{}", pretty);
        }
    }

    Ok(())
}
