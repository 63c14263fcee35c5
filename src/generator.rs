//! The sequential synthetic metric generator.
//!
//! One record per tick: sample a class, build the record, send it, count
//! the outcome. There is deliberately no concurrency, no retry and no
//! backpressure; the loop runs until the shutdown future resolves.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time;
use tracing::{debug, info};

use crate::client::ServiceClient;
use crate::config::GeneratorConfig;
use crate::payload::{MetricClass, MetricRecord};

/// Running counters for a generator session.
///
/// `anomalies` counts anomalous records at generation time, whether or not
/// the send succeeds; `sent` counts only successful sends.
#[derive(Debug, Default)]
pub struct GeneratorStats {
    sent: AtomicU64,
    errors: AtomicU64,
    anomalies: AtomicU64,
}

impl GeneratorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn anomalies(&self) -> u64 {
        self.anomalies.load(Ordering::Relaxed)
    }

    /// Prints the cumulative totals, as shown at shutdown.
    pub fn print_totals(&self) {
        println!("\nTotal sent: {}", self.sent());
        println!("Total errors: {}", self.errors());
        println!("Total anomalies: {}", self.anomalies());
    }
}

/// Runs the generator loop until `shutdown` resolves.
///
/// Pacing uses absolute fire times (`sleep_until`) rather than a relative
/// sleep after each send, so a slow send does not stretch the interval; the
/// loop catches up on the next tick instead.
pub async fn run_generator(
    client: &ServiceClient,
    config: &GeneratorConfig,
    stats: &GeneratorStats,
    shutdown: impl Future<Output = ()>,
) {
    info!(
        target_url = %client.base_url(),
        interval_ms = config.send_interval.as_millis() as u64,
        anomaly_ratio = config.anomaly_ratio,
        "Generator starting"
    );

    tokio::pin!(shutdown);
    let mut next_fire = time::Instant::now();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(sent = stats.sent(), errors = stats.errors(), "Generator stopping");
                break;
            }
            _ = time::sleep_until(next_fire) => {}
        }

        // Advance before the send so the tick period is independent of how
        // long the request takes. If a send overruns the interval, next_fire
        // is already in the past and sleep_until returns immediately.
        next_fire += config.send_interval;

        let class = MetricClass::sample(&mut rand::thread_rng(), config.anomaly_ratio);
        if class == MetricClass::Anomaly {
            stats.anomalies.fetch_add(1, Ordering::Relaxed);
        }

        let record = MetricRecord::for_class(class, &mut rand::thread_rng());
        debug!(class = class.label(), cpu = record.cpu, rps = record.rps, "Generated record");

        if client.send_metric(&record).await {
            let sent = stats.sent.fetch_add(1, Ordering::Relaxed) + 1;
            if sent % config.summary_every == 0 {
                println!(
                    "Sent: {}, Errors: {}, Anomalies: {}",
                    sent,
                    stats.errors(),
                    stats.anomalies()
                );
            }
        } else {
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_start_at_zero() {
        let stats = GeneratorStats::new();
        assert_eq!(stats.sent(), 0);
        assert_eq!(stats.errors(), 0);
        assert_eq!(stats.anomalies(), 0);
    }
}
