//! Harness configuration.
//!
//! Everything is read from environment variables (a `.env` file is honoured)
//! and validated before the provider is touched.

use rust_common::{LogFormat, PollConfig, TracingConfig};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Zero startup attempts
    #[error("Invalid STARTUP_MAX_ATTEMPTS: must be greater than 0")]
    InvalidAttempts,

    /// Start command cannot be split into words
    #[error("Invalid PROVIDER_START_COMMAND: {0}")]
    InvalidCommand(String),

    /// Unrecognised verifier backend name
    #[error("Unknown PACT_VERIFIER backend: {0}")]
    UnknownBackend(String),

    /// Backend exists but was not compiled in
    #[error("Verifier backend '{0}' is not available in this build (enable the `pact` feature)")]
    BackendUnavailable(String),
}

/// Which Pact verifier replays the contracts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerifierBackend {
    /// Shell out to the `pact_verifier_cli` executable
    #[default]
    Cli,
    /// Call the `pact_verifier` crate in-process
    Native,
}

impl VerifierBackend {
    /// Configuration name of the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Native => "native",
        }
    }
}

impl FromStr for VerifierBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cli" => Ok(Self::Cli),
            "native" => Ok(Self::Native),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for VerifierBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to reach, start and stop the provider under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Base address of the provider (scheme, host, port, optional path)
    pub address: Url,
    /// Health endpoint path, always starting with `/`
    pub health_path: String,
    /// Start command split into words; the first word is the program
    pub start_command: Vec<String>,
    /// Working directory for the start command
    pub working_dir: PathBuf,
    /// Health polls after launch (default: 10)
    pub max_attempts: u32,
    /// Sleep before each health poll (default: 1s)
    pub poll_interval: Duration,
    /// Timeout of a single health check (default: 2s)
    pub health_timeout: Duration,
    /// Wait after SIGTERM before killing (default: 5s)
    pub grace_period: Duration,
}

impl ServiceSpec {
    /// Create a spec with default health path, timings and working directory.
    #[must_use]
    pub fn new(address: Url, start_command: Vec<String>) -> Self {
        Self {
            address,
            health_path: "/health".to_string(),
            start_command,
            working_dir: PathBuf::from("."),
            max_attempts: 10,
            poll_interval: Duration::from_secs(1),
            health_timeout: Duration::from_secs(2),
            grace_period: Duration::from_secs(5),
        }
    }

    /// Set the health endpoint path.
    #[must_use]
    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.health_path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Set the working directory of the start command.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Set the number of health polls after launch.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the sleep before each health poll.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the timeout of a single health check.
    #[must_use]
    pub const fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Set the shutdown grace period.
    #[must_use]
    pub const fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Address without a trailing slash, as handed to the verifier.
    #[must_use]
    pub fn base_address(&self) -> String {
        self.address.as_str().trim_end_matches('/').to_string()
    }

    /// Full health endpoint URL.
    #[must_use]
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_address(), self.health_path)
    }

    /// Start command as a single line, for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.start_command.join(" ")
    }

    /// Poll budget for the startup wait.
    #[must_use]
    pub fn poll_config(&self) -> PollConfig {
        PollConfig::default()
            .with_max_attempts(self.max_attempts)
            .with_interval(self.poll_interval)
    }
}

/// Harness configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider name the contracts are verified for
    pub provider_name: String,
    /// Provider lifecycle settings
    pub service: ServiceSpec,
    /// Directory holding the contract files
    pub pacts_dir: PathBuf,
    /// Verifier backend
    pub verifier: VerifierBackend,
    /// Verifier executable for the CLI backend
    pub verifier_bin: String,
    /// Upper bound on one verifier invocation
    pub verifier_timeout: Duration,
    /// Treat "no contracts found" as a failure
    pub strict: bool,
    /// Log filter directive
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let address = parse_url(&lookup, "PROVIDER_URL", "http://localhost:7001")?;
        let start_command = parse_command(&var("PROVIDER_START_COMMAND", "python3 app.py"))?;

        let service = ServiceSpec::new(address, start_command)
            .with_health_path(var("PROVIDER_HEALTH_PATH", "/health"))
            .with_working_dir(var("PROVIDER_WORKDIR", "."))
            .with_max_attempts(parse_env(&lookup, "STARTUP_MAX_ATTEMPTS", 10)?)
            .with_poll_interval(Duration::from_millis(parse_env(
                &lookup,
                "STARTUP_POLL_INTERVAL_MS",
                1000,
            )?))
            .with_health_timeout(Duration::from_millis(parse_env(
                &lookup,
                "HEALTH_TIMEOUT_MS",
                2000,
            )?))
            .with_grace_period(Duration::from_millis(parse_env(
                &lookup,
                "SHUTDOWN_GRACE_MS",
                5000,
            )?));

        let config = Self {
            provider_name: var("PROVIDER_NAME", "RiskAlgoService"),
            service,
            pacts_dir: PathBuf::from(var("PACTS_DIR", "pacts")),
            verifier: var("PACT_VERIFIER", "cli").parse()?,
            verifier_bin: var("PACT_VERIFIER_BIN", "pact_verifier_cli"),
            verifier_timeout: Duration::from_secs(parse_env(&lookup, "VERIFIER_TIMEOUT_SECS", 300)?),
            strict: parse_env(&lookup, "STRICT_CONTRACTS", false)?,
            log_level: var("LOG_LEVEL", "info"),
            log_format: parse_env(&lookup, "LOG_FORMAT", LogFormat::Text)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.max_attempts == 0 {
            return Err(ConfigError::InvalidAttempts);
        }
        if self.verifier_timeout.is_zero() {
            return Err(ConfigError::ParseError {
                name: "VERIFIER_TIMEOUT_SECS".to_string(),
                reason: "timeout must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Tracing settings derived from the log variables.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::default()
            .with_filter(&self.log_level)
            .with_format(self.log_format)
    }
}

/// Parse a variable with a default value.
fn parse_env<T, F>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse an http(s) URL variable with a default value.
fn parse_url<F>(lookup: &F, name: &str, default: &str) -> Result<Url, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Split a start command into words.
fn parse_command(line: &str) -> Result<Vec<String>, ConfigError> {
    let words = shlex::split(line)
        .ok_or_else(|| ConfigError::InvalidCommand(format!("unbalanced quoting in '{line}'")))?;
    if words.is_empty() {
        return Err(ConfigError::InvalidCommand("command is empty".to_string()));
    }
    Ok(words)
}
