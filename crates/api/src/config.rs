//! Process configuration for the portal API.

use std::str::FromStr;

use fellowship_pipeline::IntakeConfig;
use fellowship_platform::PlatformConfig;

use crate::auth::jwt::JwtConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the binary reads from the environment at startup.
///
/// Only the token secret is mandatory. Without `PLATFORM_URL` the server
/// runs against the in-memory platform, which is what local development
/// and the integration tests use.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Drain budget for background tasks once the listener has closed.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub platform: PlatformConfig,
    /// Intake sessions, submission pipeline and local cache.
    pub intake: IntakeConfig,
}

impl ServerConfig {
    /// Read the configuration from the environment.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    ///
    /// Nested settings come from [`JwtConfig::from_env`],
    /// [`PlatformConfig::from_env`] and [`IntakeConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on a value that does not parse, so a typo stops the process
    /// at startup instead of silently falling back.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.into()),
            port: parsed_var("PORT", DEFAULT_PORT),
            cors_origins: split_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
            ),
            request_timeout_secs: parsed_var("REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            shutdown_timeout_secs: parsed_var("SHUTDOWN_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            jwt: JwtConfig::from_env(),
            platform: PlatformConfig::from_env(),
            intake: IntakeConfig::from_env(),
        }
    }
}

fn parsed_var<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

/// Comma-separated origin list; blanks are skipped.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            split_origins(" https://a.example , ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(split_origins("").is_empty());
    }

    #[test]
    fn unset_variable_uses_default() {
        assert_eq!(parsed_var("FELLOWSHIP_TEST_SURELY_UNSET_PORT", 4242u16), 4242);
    }
}
