//! Process-wide configuration, read once at start.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::types::{Environment, EnvironmentTarget};

pub const SIGNING_SECRET_VAR: &str = "SLACK_SIGNING_SECRET";
pub const DEMO_BEARER_VAR: &str = "DEMO_BEARER_TOKEN";
pub const STAGING_BEARER_VAR: &str = "STAGING_BEARER_TOKEN";
pub const FETCH_TIMEOUT_VAR: &str = "TOKEN_FETCH_TIMEOUT_SECS";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Secrets and limits shared read-only by every invocation.
///
/// Implements `Debug` manually to redact secrets.
#[derive(Clone)]
pub struct Config {
    /// Slack app signing secret for webhook verification.
    pub signing_secret: SecretString,
    demo_bearer: SecretString,
    staging_bearer: SecretString,
    /// Upper bound on a single token-claim request.
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn new(
        signing_secret: SecretString,
        demo_bearer: SecretString,
        staging_bearer: SecretString,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            signing_secret,
            demo_bearer,
            staging_bearer,
            fetch_timeout,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if a secret is missing or empty, or the timeout is not a
    /// positive number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = |name: &'static str| -> Result<SecretString, ConfigError> {
            let value = lookup(name).ok_or(ConfigError::Missing(name))?;
            if value.is_empty() {
                return Err(ConfigError::Empty(name));
            }
            Ok(SecretString::from(value))
        };

        let fetch_timeout = match lookup(FETCH_TIMEOUT_VAR) {
            None => DEFAULT_FETCH_TIMEOUT,
            Some(raw) => parse_timeout(&raw)?,
        };

        Ok(Self::new(
            secret(SIGNING_SECRET_VAR)?,
            secret(DEMO_BEARER_VAR)?,
            secret(STAGING_BEARER_VAR)?,
            fetch_timeout,
        ))
    }

    /// Bearer secret used against the given environment's claim endpoint.
    pub fn bearer_for(&self, environment: Environment) -> &SecretString {
        match environment {
            Environment::Demo => &self.demo_bearer,
            Environment::Staging => &self.staging_bearer,
        }
    }

    pub fn target(&self, environment: Environment) -> EnvironmentTarget<'_> {
        EnvironmentTarget {
            environment,
            claim_url: environment.claim_url(),
            bearer: self.bearer_for(environment),
        }
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
        name: FETCH_TIMEOUT_VAR,
        reason: format!("{e}"),
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name: FETCH_TIMEOUT_VAR,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("signing_secret", &"[REDACTED]")
            .field("demo_bearer", &"[REDACTED]")
            .field("staging_bearer", &"[REDACTED]")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}
