use serverroom_pipeline::{PipelineConfig, PipelineError};

/// Process-level configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// SQLite URL (default: `sqlite://server_room.db`).
    pub database_url: String,
    /// Insert the stock sensor set into an empty database (default: `true`).
    pub seed_default_sensors: bool,
    /// Days of synthetic history written right after seeding a fresh
    /// database (default: `1`, `0` disables).
    pub seed_history_days: u32,
    /// Emit JSON log lines instead of human-readable ones (`LOG_FORMAT=json`).
    pub json_logs: bool,
    pub pipeline: PipelineConfig,
}

impl MonitorConfig {
    /// | Env Var                | Default                   |
    /// |------------------------|---------------------------|
    /// | `DATABASE_URL`         | `sqlite://server_room.db` |
    /// | `SEED_DEFAULT_SENSORS` | `true`                    |
    /// | `SEED_HISTORY_DAYS`    | `1`                       |
    /// | `LOG_FORMAT`           | `text`                    |
    ///
    /// plus everything read by [`PipelineConfig::from_env`].
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "sqlite://server_room.db".into());

        let seed_default_sensors = match lookup("SEED_DEFAULT_SENSORS") {
            None => true,
            Some(v) => parse_bool(&v).ok_or_else(|| {
                PipelineError::Config(format!("SEED_DEFAULT_SENSORS: expected a boolean, got '{v}'"))
            })?,
        };

        let seed_history_days: u32 = match lookup("SEED_HISTORY_DAYS") {
            Some(v) if !v.trim().is_empty() => v.trim().parse().map_err(|e| {
                PipelineError::Config(format!("SEED_HISTORY_DAYS: {e}"))
            })?,
            _ => 1,
        };

        let json_logs = lookup("LOG_FORMAT").is_some_and(|v| v.trim().eq_ignore_ascii_case("json"));

        Ok(Self {
            database_url,
            seed_default_sensors,
            seed_history_days,
            json_logs,
            pipeline: PipelineConfig::from_lookup(&lookup)?,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
