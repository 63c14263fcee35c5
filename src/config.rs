//! Environment-driven configuration for both binaries.
//!
//! Every knob has a default, so a bare `metric-generator` run targets a
//! local service out of the box. Invalid values produce a [`ConfigError`]
//! which the binaries turn into a usage message and a non-zero exit.

use std::env;
use std::str::FromStr;

use thiserror::Error;
use tokio::time::Duration;

/// Default target when `SERVICE_URL` is not set.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";

/// Configuration parsing failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration for the sequential metric generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub service_url: String,
    pub request_timeout: Duration,
    /// Pause between sends; 100ms targets roughly 10 records/sec.
    pub send_interval: Duration,
    /// Probability that a generated record is anomalous.
    pub anomaly_ratio: f64,
    /// Print a progress line every this many successful sends.
    pub summary_every: u64,
}

impl GeneratorConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let service_url = service_url_from_env()?;
        let request_timeout = Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 5u64)?);
        let send_interval = Duration::from_millis(parse_var("SEND_INTERVAL_MS", 100u64)?);

        let anomaly_ratio: f64 = parse_var("ANOMALY_RATIO", 0.1)?;
        if !(0.0..=1.0).contains(&anomaly_ratio) {
            return Err(ConfigError::invalid(
                "ANOMALY_RATIO",
                anomaly_ratio.to_string(),
                "must be within [0, 1]",
            ));
        }

        let summary_every: u64 = parse_var("SUMMARY_EVERY", 10u64)?;
        if summary_every == 0 {
            return Err(ConfigError::invalid(
                "SUMMARY_EVERY",
                "0",
                "must be greater than zero",
            ));
        }

        Ok(GeneratorConfig {
            service_url,
            request_timeout,
            send_interval,
            anomaly_ratio,
            summary_every,
        })
    }

    /// Prints the effective configuration at startup.
    pub fn print_summary(&self) {
        println!("Starting metric generator:");
        println!("  Target: {}", self.service_url);
        println!("  Send interval: {:?}", self.send_interval);
        println!("  Anomaly ratio: {}", self.anomaly_ratio);
        println!("  Request timeout: {:?}", self.request_timeout);
    }
}

/// Configuration for the weighted load profile runner.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub service_url: String,
    pub request_timeout: Duration,
    /// Number of concurrently simulated users.
    pub num_users: usize,
    pub test_duration: Duration,
    /// Think time between iterations of a user loop.
    pub think_time_min: Duration,
    pub think_time_max: Duration,
    /// Port for the Prometheus exposition server.
    pub metrics_port: u16,
}

impl ProfileConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let service_url = service_url_from_env()?;
        let request_timeout = Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 5u64)?);

        let num_users: usize = parse_var("NUM_USERS", 10usize)?;
        if num_users == 0 {
            return Err(ConfigError::invalid(
                "NUM_USERS",
                "0",
                "must be greater than zero",
            ));
        }

        let duration_str = env::var("TEST_DURATION").unwrap_or_else(|_| "1m".to_string());
        let test_duration = parse_duration(&duration_str)
            .map_err(|reason| ConfigError::invalid("TEST_DURATION", duration_str, reason))?;

        let think_time_min = Duration::from_millis(parse_var("THINK_TIME_MIN_MS", 10u64)?);
        let think_time_max = Duration::from_millis(parse_var("THINK_TIME_MAX_MS", 50u64)?);
        if think_time_max < think_time_min {
            return Err(ConfigError::invalid(
                "THINK_TIME_MAX_MS",
                format!("{}", think_time_max.as_millis()),
                "must be >= THINK_TIME_MIN_MS",
            ));
        }

        let metrics_port: u16 = parse_var("METRICS_PORT", 9090u16)?;

        Ok(ProfileConfig {
            service_url,
            request_timeout,
            num_users,
            test_duration,
            think_time_min,
            think_time_max,
            metrics_port,
        })
    }

    /// Prints the effective configuration at startup.
    pub fn print_summary(&self) {
        println!("Starting load profile:");
        println!("  Target: {}", self.service_url);
        println!("  Simulated users: {}", self.num_users);
        println!("  Test duration: {:?}", self.test_duration);
        println!(
            "  Think time: {:?} - {:?}",
            self.think_time_min, self.think_time_max
        );
        println!("  Metrics port: {}", self.metrics_port);
    }
}

fn service_url_from_env() -> Result<String, ConfigError> {
    let url = env::var("SERVICE_URL").unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string());
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::invalid(
            "SERVICE_URL",
            url,
            "must start with http:// or https://",
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid(var, raw, "not a valid number")),
        Err(_) => Ok(default),
    }
}

/// Parses a duration string in the format "30s", "10m", "5h", "3d".
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    let (value_str, unit) = s.split_at(s.len() - 1);
    let value: u64 = value_str
        .parse()
        .map_err(|_| format!("invalid numeric value '{}'", value_str))?;

    match unit {
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        "d" => Ok(Duration::from_secs(value * 24 * 60 * 60)),
        _ => Err(format!(
            "unknown duration unit '{}', use 's', 'm', 'h' or 'd'",
            unit
        )),
    }
}
