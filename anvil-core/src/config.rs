//! Client configuration.

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "ANVIL_API_KEY";
/// Environment variable holding the webhook verification token.
pub const WEBHOOK_TOKEN_ENV: &str = "ANVIL_WEBHOOK_TOKEN";
/// Environment variable selecting the environment mode.
pub const ENVIRONMENT_ENV: &str = "ANVIL_ENV";

/// Default REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://app.useanvil.com/api/v1";
/// Default GraphQL endpoint.
pub const DEFAULT_GRAPHQL_URL: &str = "https://graphql.useanvil.com/";

/// Environment mode.
///
/// Development enables wire echo logging; production never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development and testing.
    Development,
    /// Live traffic.
    #[default]
    Production,
}

impl Environment {
    /// Infer the environment from `ANVIL_ENV`, defaulting to production.
    pub fn from_env() -> Self {
        match env_var(ENVIRONMENT_ENV) {
            Some(value) => value.parse().unwrap_or_default(),
            None => Self::Production,
        }
    }

    /// Get the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Check for development mode.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check for production mode.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(Error::Configuration(format!(
                "Invalid environment '{}': must be 'development' or 'production'",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection parameters for the Anvil API.
///
/// Explicitly assigned secrets take precedence over the environment; the
/// environment is consulted again on every read so rotated values are
/// picked up without reconfiguring.
#[derive(Debug, Clone)]
pub struct Configuration {
    api_key: Option<SecretString>,
    webhook_token: Option<SecretString>,
    /// Environment mode.
    pub environment: Environment,
    /// Base URL for REST requests.
    pub base_url: String,
    /// GraphQL endpoint URL.
    pub graphql_url: String,
    /// Read timeout for a single attempt.
    pub timeout: Duration,
    /// Connection timeout for a single attempt.
    pub open_timeout: Duration,
    /// Maximum number of retries on 429 and connection failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub retry_base_delay: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            api_key: None,
            webhook_token: None,
            environment: Environment::from_env(),
            base_url: DEFAULT_BASE_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            timeout: Duration::from_secs(120),
            open_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            user_agent: format!("anvil-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Configuration {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new configuration builder.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Get the API key: the assigned value, else `ANVIL_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
            .or_else(|| env_var(API_KEY_ENV))
    }

    /// Assign the API key.
    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = Some(SecretString::from(key.into()));
    }

    /// Forget the assigned API key, falling back to the environment.
    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    /// Get the webhook token: the assigned value, else `ANVIL_WEBHOOK_TOKEN`.
    pub fn webhook_token(&self) -> Option<String> {
        self.webhook_token
            .as_ref()
            .map(|t| t.expose_secret().to_string())
            .or_else(|| env_var(WEBHOOK_TOKEN_ENV))
    }

    /// Assign the webhook token.
    pub fn set_webhook_token(&mut self, token: impl Into<String>) {
        self.webhook_token = Some(SecretString::from(token.into()));
    }

    /// Set the environment from its name.
    pub fn set_environment(&mut self, name: &str) -> Result<()> {
        self.environment = name.parse()?;
        Ok(())
    }

    /// Check for development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }

    /// Check for production mode.
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Ensure the configuration can be used for requests.
    pub fn validate(&self) -> Result<()> {
        match self.api_key() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(Error::Configuration(format!(
                "No API key configured. Set the {} environment variable or assign one \
                 with Configuration::builder().api_key(..)",
                API_KEY_ENV
            ))),
        }
    }
}

/// Builder for [`Configuration`].
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    config: Configuration,
    environment: Option<String>,
}

impl ConfigurationBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.set_api_key(key);
        self
    }

    /// Set the webhook token.
    pub fn webhook_token(mut self, token: impl Into<String>) -> Self {
        self.config.set_webhook_token(token);
        self
    }

    /// Set the environment mode.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self.environment = None;
        self
    }

    /// Set the environment mode by name; validated in [`build`](Self::build).
    pub fn environment_name(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    /// Set the REST base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the GraphQL endpoint.
    pub fn graphql_url(mut self, url: impl Into<String>) -> Self {
        self.config.graphql_url = url.into();
        self
    }

    /// Set the read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.config.open_timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config.retry_base_delay = delay;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(mut self) -> Result<Configuration> {
        if let Some(name) = self.environment.take() {
            self.config.set_environment(&name)?;
        }
        Ok(self.config)
    }
}

/// Read an environment variable, treating empty values as unset.
pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
