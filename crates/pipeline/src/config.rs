//! Pipeline tuning loaded from environment variables.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::PipelineError;

/// What the writer does with readings still queued when it is told to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Persist everything still queued, then stop.
    #[default]
    Drain,
    /// Stop immediately and count queued readings as discarded.
    Discard,
}

impl FromStr for ShutdownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drain" => Ok(ShutdownPolicy::Drain),
            "discard" => Ok(ShutdownPolicy::Discard),
            other => Err(format!("unknown shutdown policy '{other}' (expected drain or discard)")),
        }
    }
}

impl fmt::Display for ShutdownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownPolicy::Drain => f.write_str("drain"),
            ShutdownPolicy::Discard => f.write_str("discard"),
        }
    }
}

/// What the writer does when persisting a reading fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistFailurePolicy {
    /// Log, back off, drop the reading.
    #[default]
    Drop,
    /// Try the same reading up to `max_attempts` times in total, then drop it.
    Retry { max_attempts: u32 },
}

impl PersistFailurePolicy {
    /// Total attempts per reading (always at least one).
    pub fn max_attempts(self) -> u32 {
        match self {
            PersistFailurePolicy::Drop => 1,
            PersistFailurePolicy::Retry { max_attempts } => max_attempts.max(1),
        }
    }
}

impl FromStr for PersistFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "drop" {
            return Ok(PersistFailurePolicy::Drop);
        }
        let attempts = s
            .strip_prefix("retry:")
            .ok_or_else(|| format!("unknown failure policy '{s}' (expected drop or retry:<n>)"))?;
        match attempts.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(PersistFailurePolicy::Retry { max_attempts: n }),
            _ => Err(format!("retry attempts must be a positive integer, got '{attempts}'")),
        }
    }
}

impl fmt::Display for PersistFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistFailurePolicy::Drop => f.write_str("drop"),
            PersistFailurePolicy::Retry { max_attempts } => write!(f, "retry:{max_attempts}"),
        }
    }
}

/// Runtime knobs for workers, queue and writer.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ingestion queue bound (default: `1024`).
    pub queue_capacity: usize,
    /// Multiplier applied to every nominal sampling interval (default: `2.0`).
    pub sampling_slowdown: f64,
    /// How long the writer waits on an empty queue per poll (default: 1 s).
    pub writer_poll_timeout: Duration,
    /// Pause after a failed generation, enqueue or persist (default: 1 s).
    pub retry_backoff: Duration,
    pub shutdown_policy: ShutdownPolicy,
    pub persist_failure_policy: PersistFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            sampling_slowdown: 2.0,
            writer_poll_timeout: Duration::from_millis(1000),
            retry_backoff: Duration::from_millis(1000),
            shutdown_policy: ShutdownPolicy::Drain,
            persist_failure_policy: PersistFailurePolicy::Drop,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `QUEUE_CAPACITY`         | `1024`  |
    /// | `SAMPLING_SLOWDOWN`      | `2.0`   |
    /// | `WRITER_POLL_TIMEOUT_MS` | `1000`  |
    /// | `RETRY_BACKOFF_MS`       | `1000`  |
    /// | `SHUTDOWN_POLICY`        | `drain` |
    /// | `PERSIST_FAILURE_POLICY` | `drop`  |
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let queue_capacity: usize = parse_or(&lookup, "QUEUE_CAPACITY", defaults.queue_capacity)?;
        if queue_capacity == 0 {
            return Err(PipelineError::Config("QUEUE_CAPACITY must be at least 1".into()));
        }

        let sampling_slowdown: f64 =
            parse_or(&lookup, "SAMPLING_SLOWDOWN", defaults.sampling_slowdown)?;
        if !sampling_slowdown.is_finite() || sampling_slowdown <= 0.0 {
            return Err(PipelineError::Config(format!(
                "SAMPLING_SLOWDOWN must be a positive number, got {sampling_slowdown}"
            )));
        }

        let poll_ms: u64 = parse_or(&lookup, "WRITER_POLL_TIMEOUT_MS", 1000)?;
        if poll_ms == 0 {
            return Err(PipelineError::Config("WRITER_POLL_TIMEOUT_MS must be at least 1".into()));
        }
        let backoff_ms: u64 = parse_or(&lookup, "RETRY_BACKOFF_MS", 1000)?;

        Ok(Self {
            queue_capacity,
            sampling_slowdown,
            writer_poll_timeout: Duration::from_millis(poll_ms),
            retry_backoff: Duration::from_millis(backoff_ms),
            shutdown_policy: parse_or(&lookup, "SHUTDOWN_POLICY", defaults.shutdown_policy)?,
            persist_failure_policy: parse_or(
                &lookup,
                "PERSIST_FAILURE_POLICY",
                defaults.persist_failure_policy,
            )?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, PipelineError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| PipelineError::Config(format!("{key}: {e}"))),
        _ => Ok(default),
    }
}
