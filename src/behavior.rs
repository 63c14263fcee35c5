//! The load profile: weighted request behaviors and think time.
//!
//! A simulated user repeatedly picks one behavior from a weighted table and
//! executes it. The default table matches the traffic mix the service is
//! tuned for: mostly normal metric submissions, the occasional anomaly, and
//! a trickle of read requests.

use rand::Rng;
use std::time::Duration;

/// One request behavior a simulated user can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    /// POST /metrics-data with a normal-range record.
    SendNormalMetric,

    /// POST /metrics-data with an anomalous record.
    SendAnomalyMetric,

    /// GET /analyze.
    FetchAnalytics,

    /// GET /stats.
    FetchStats,

    /// GET /health.
    HealthCheck,
}

impl Behavior {
    /// Label value for metrics, logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Behavior::SendNormalMetric => "send_normal_metric",
            Behavior::SendAnomalyMetric => "send_anomaly_metric",
            Behavior::FetchAnalytics => "fetch_analytics",
            Behavior::FetchStats => "fetch_stats",
            Behavior::HealthCheck => "health_check",
        }
    }

    /// The only status code counted as success for this behavior.
    ///
    /// Submissions are acknowledged with 202 Accepted, every read endpoint
    /// answers 200 OK.
    pub fn expected_status(&self) -> u16 {
        match self {
            Behavior::SendNormalMetric | Behavior::SendAnomalyMetric => 202,
            Behavior::FetchAnalytics | Behavior::FetchStats | Behavior::HealthCheck => 200,
        }
    }

    /// All behaviors in a stable order.
    pub fn all() -> [Behavior; 5] {
        [
            Behavior::SendNormalMetric,
            Behavior::SendAnomalyMetric,
            Behavior::FetchAnalytics,
            Behavior::FetchStats,
            Behavior::HealthCheck,
        ]
    }

    /// The default profile: 10:1:2:1:1.
    pub fn default_weights() -> Vec<WeightedBehavior> {
        vec![
            WeightedBehavior::new(Behavior::SendNormalMetric, 10.0),
            WeightedBehavior::new(Behavior::SendAnomalyMetric, 1.0),
            WeightedBehavior::new(Behavior::FetchAnalytics, 2.0),
            WeightedBehavior::new(Behavior::FetchStats, 1.0),
            WeightedBehavior::new(Behavior::HealthCheck, 1.0),
        ]
    }
}

/// A behavior with its relative traffic weight.
#[derive(Debug, Clone, Copy)]
pub struct WeightedBehavior {
    pub behavior: Behavior,
    pub weight: f64,
}

impl WeightedBehavior {
    pub fn new(behavior: Behavior, weight: f64) -> Self {
        Self { behavior, weight }
    }
}

/// Weighted random behavior selection.
///
/// Uses cumulative weights and binary search, so selection is O(log n) and
/// the long-run behavior mix converges to weight / total_weight.
#[derive(Debug, Clone)]
pub struct BehaviorSelector {
    entries: Vec<WeightedBehavior>,
    cumulative: Vec<f64>,
    total_weight: f64,
}

impl BehaviorSelector {
    /// Builds a selector from a weighted behavior table.
    ///
    /// # Panics
    /// Panics if the table is empty or any weight is not strictly positive;
    /// a profile with unreachable behaviors is a programming error.
    pub fn new(entries: Vec<WeightedBehavior>) -> Self {
        assert!(
            !entries.is_empty(),
            "behavior table must contain at least one entry"
        );

        let mut cumulative = Vec::with_capacity(entries.len());
        let mut sum = 0.0;
        for entry in &entries {
            assert!(
                entry.weight > 0.0,
                "behavior '{}' has non-positive weight {}",
                entry.behavior.label(),
                entry.weight
            );
            sum += entry.weight;
            cumulative.push(sum);
        }

        Self {
            entries,
            cumulative,
            total_weight: sum,
        }
    }

    /// Selects a behavior using the thread-local RNG.
    pub fn select(&self) -> Behavior {
        self.select_with(&mut rand::thread_rng())
    }

    /// Selects a behavior using the given RNG.
    ///
    /// Seed the RNG to make a run's behavior sequence reproducible.
    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Behavior {
        let roll = rng.gen_range(0.0..self.total_weight);

        let index = self
            .cumulative
            .binary_search_by(|bound| {
                if *bound <= roll {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Greater
                }
            })
            .unwrap_or_else(|i| i);

        self.entries[index].behavior
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Selection probability per behavior.
    pub fn probabilities(&self) -> Vec<(Behavior, f64)> {
        self.entries
            .iter()
            .map(|e| (e.behavior, e.weight / self.total_weight))
            .collect()
    }
}

/// Delay between user actions.
#[derive(Debug, Clone)]
pub enum ThinkTime {
    Fixed(Duration),
    Random { min: Duration, max: Duration },
}

impl ThinkTime {
    /// The delay to apply before the next action.
    ///
    /// For `Random`, a uniform duration in `[min, max]`; if min >= max the
    /// minimum is returned as-is.
    pub fn delay(&self) -> Duration {
        match self {
            ThinkTime::Fixed(duration) => *duration,
            ThinkTime::Random { min, max } => {
                let min_ms = min.as_millis() as u64;
                let max_ms = max.as_millis() as u64;
                if min_ms >= max_ms {
                    return *min;
                }
                Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
            }
        }
    }
}
