//! Synthetic metric record generation.
//!
//! Records come in two profiles: normal traffic and deliberate anomalies
//! with out-of-range values, used to exercise the anomaly detection in the
//! target service. Generation takes a caller-supplied RNG so tests can use
//! a seeded one.

use rand::Rng;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// A single synthetic monitoring data point.
///
/// Serialized as the JSON body of `POST /metrics-data`. The record has no
/// identity beyond its contents and is discarded once sent.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRecord {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,

    /// CPU utilization percentage.
    pub cpu: f64,

    /// Requests per second observed by the (simulated) host.
    pub rps: f64,

    /// Memory utilization percentage.
    pub memory: f64,

    /// Request latency in milliseconds.
    pub latency: f64,
}

impl MetricRecord {
    /// Generates a record in the normal operating ranges:
    /// `cpu` 30-70, `rps` 80-120, `memory` 40-60, `latency` 10-30.
    pub fn normal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            timestamp: unix_timestamp(),
            cpu: rng.gen_range(30.0..70.0),
            rps: rng.gen_range(80.0..120.0),
            memory: rng.gen_range(40.0..60.0),
            latency: rng.gen_range(10.0..30.0),
        }
    }

    /// Generates an anomalous record:
    /// `cpu` 85-98, `rps` 300-500, `memory` 80-95, `latency` 100-200.
    pub fn anomaly<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            timestamp: unix_timestamp(),
            cpu: rng.gen_range(85.0..98.0),
            rps: rng.gen_range(300.0..500.0),
            memory: rng.gen_range(80.0..95.0),
            latency: rng.gen_range(100.0..200.0),
        }
    }

    /// Generates a record for the given class.
    pub fn for_class<R: Rng + ?Sized>(class: MetricClass, rng: &mut R) -> Self {
        match class {
            MetricClass::Normal => Self::normal(rng),
            MetricClass::Anomaly => Self::anomaly(rng),
        }
    }
}

/// Classification of a generated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricClass {
    Normal,
    Anomaly,
}

impl MetricClass {
    /// Weighted coin flip: anomaly with probability `anomaly_ratio`.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, anomaly_ratio: f64) -> Self {
        if rng.gen::<f64>() < anomaly_ratio {
            MetricClass::Anomaly
        } else {
            MetricClass::Normal
        }
    }

    /// Label value for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            MetricClass::Normal => "normal",
            MetricClass::Anomaly => "anomaly",
        }
    }
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
