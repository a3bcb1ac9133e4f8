use std::path::PathBuf;
use std::time::Duration;

/// Default pause between a successful insert and the `Success` step.
const DEFAULT_SETTLE_MS: u64 = 1500;
const DEFAULT_CONFIRMATION_FUNCTION: &str = "send-confirmation-email";
const DEFAULT_CACHE_PATH: &str = "data/portal-cache.json";
const DEFAULT_SESSION_TTL_MINS: u64 = 120;

/// Intake and submission settings.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// JSON file backing the local mirror cache.
    pub cache_path: PathBuf,
    /// Delay before transitioning to `Success`.
    pub settle_delay: Duration,
    /// Platform function that sends the confirmation email.
    pub confirmation_function: String,
    /// Idle sessions older than this are pruned.
    pub session_ttl: Duration,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            confirmation_function: DEFAULT_CONFIRMATION_FUNCTION.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_MINS * 60),
        }
    }
}

impl IntakeConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Default                   |
    /// |----------------------------|---------------------------|
    /// | `CACHE_PATH`               | `data/portal-cache.json`  |
    /// | `SUBMIT_SETTLE_MS`         | `1500`                    |
    /// | `CONFIRMATION_FUNCTION`    | `send-confirmation-email` |
    /// | `INTAKE_SESSION_TTL_MINS`  | `120`                     |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_path = std::env::var("CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_path);

        let settle_delay = std::env::var("SUBMIT_SETTLE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.settle_delay);

        let confirmation_function = std::env::var("CONFIRMATION_FUNCTION")
            .unwrap_or(defaults.confirmation_function);

        let session_ttl = std::env::var("INTAKE_SESSION_TTL_MINS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|mins| Duration::from_secs(mins * 60))
            .unwrap_or(defaults.session_ttl);

        Self {
            cache_path,
            settle_delay,
            confirmation_function,
            session_ttl,
        }
    }
}
