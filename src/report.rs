//! End-of-run aggregation for the load profile.
//!
//! Tracks executions, successes, failures and latency per behavior. The
//! behavior set is fixed, so counters are allocated once up front and
//! updated lock-free; only the latency histograms take a mutex.

use hdrhistogram::Histogram;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::behavior::Behavior;

/// Latency percentile statistics, in milliseconds.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
}

impl LatencyStats {
    /// Compact table row: label, count, p50..p99, mean, max.
    pub fn format_table_row(&self, label: &str) -> String {
        format!(
            "{:<22} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10.2} {:>8}",
            label, self.count, self.p50, self.p90, self.p95, self.p99, self.mean, self.max
        )
    }

    /// Header matching [`format_table_row`](Self::format_table_row).
    pub fn table_header() -> String {
        format!(
            "{:<22} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10} {:>8}",
            "behavior", "count", "p50", "p90", "p95", "p99", "mean", "max"
        )
    }
}

struct BehaviorCounters {
    executions: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    total_time_ms: AtomicU64,
    // 1ms..60s with 3 significant digits
    latency: Mutex<Histogram<u64>>,
}

impl BehaviorCounters {
    fn new() -> Self {
        let histogram =
            Histogram::new_with_bounds(1, 60_000, 3).expect("latency histogram bounds are static");
        Self {
            executions: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            total_time_ms: AtomicU64::new(0),
            latency: Mutex::new(histogram),
        }
    }
}

/// Aggregate counters for every behavior in the profile.
pub struct BehaviorReport {
    counters: HashMap<Behavior, BehaviorCounters>,
}

impl BehaviorReport {
    pub fn new() -> Self {
        let counters = Behavior::all()
            .into_iter()
            .map(|behavior| (behavior, BehaviorCounters::new()))
            .collect();
        Self { counters }
    }

    /// Records one behavior execution.
    pub fn record(&self, behavior: Behavior, success: bool, latency_ms: u64) {
        // Every behavior is pre-registered, so the lookup cannot miss.
        let counters = &self.counters[&behavior];

        counters.executions.fetch_add(1, Ordering::Relaxed);
        if success {
            counters.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.failures.fetch_add(1, Ordering::Relaxed);
        }
        counters.total_time_ms.fetch_add(latency_ms, Ordering::Relaxed);

        if let Ok(mut histogram) = counters.latency.lock() {
            histogram.saturating_record(latency_ms);
        }
    }

    pub fn executions(&self, behavior: Behavior) -> u64 {
        self.counters[&behavior].executions.load(Ordering::Relaxed)
    }

    pub fn successes(&self, behavior: Behavior) -> u64 {
        self.counters[&behavior].successes.load(Ordering::Relaxed)
    }

    pub fn failures(&self, behavior: Behavior) -> u64 {
        self.counters[&behavior].failures.load(Ordering::Relaxed)
    }

    pub fn total_executions(&self) -> u64 {
        Behavior::all()
            .into_iter()
            .map(|b| self.executions(b))
            .sum()
    }

    /// Success rate in [0, 1]; 0 when the behavior never ran.
    pub fn success_rate(&self, behavior: Behavior) -> f64 {
        let executions = self.executions(behavior);
        if executions == 0 {
            return 0.0;
        }
        self.successes(behavior) as f64 / executions as f64
    }

    pub fn mean_latency_ms(&self, behavior: Behavior) -> f64 {
        let executions = self.executions(behavior);
        if executions == 0 {
            return 0.0;
        }
        let total = self.counters[&behavior].total_time_ms.load(Ordering::Relaxed);
        total as f64 / executions as f64
    }

    /// Latency percentiles, `None` when the behavior never ran.
    pub fn latency_stats(&self, behavior: Behavior) -> Option<LatencyStats> {
        let histogram = self.counters[&behavior].latency.lock().ok()?;
        if histogram.is_empty() {
            return None;
        }

        Some(LatencyStats {
            count: histogram.len(),
            min: histogram.min(),
            max: histogram.max(),
            mean: histogram.mean(),
            p50: histogram.value_at_quantile(0.50),
            p90: histogram.value_at_quantile(0.90),
            p95: histogram.value_at_quantile(0.95),
            p99: histogram.value_at_quantile(0.99),
        })
    }

    /// Prints the per-behavior summary and latency table.
    pub fn print_summary(&self) {
        println!("\n=== Per-Behavior Results ===\n");

        for behavior in Behavior::all() {
            let executions = self.executions(behavior);
            println!("{}:", behavior.label());
            println!("  Executions: {}", executions);
            println!(
                "  Successes:  {} ({:.1}%)",
                self.successes(behavior),
                self.success_rate(behavior) * 100.0
            );
            println!("  Failures:   {}", self.failures(behavior));
            println!("  Avg Time:   {:.2}ms", self.mean_latency_ms(behavior));
            println!();
        }

        let rows: Vec<String> = Behavior::all()
            .into_iter()
            .filter_map(|b| self.latency_stats(b).map(|s| s.format_table_row(b.label())))
            .collect();

        if !rows.is_empty() {
            println!("=== Latency Percentiles (ms) ===\n");
            println!("{}", LatencyStats::table_header());
            for row in rows {
                println!("{}", row);
            }
            println!();
        }
    }
}

impl Default for BehaviorReport {
    fn default() -> Self {
        Self::new()
    }
}
