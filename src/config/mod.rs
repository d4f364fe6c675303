//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `DALGURAK_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::fmt::Display;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::backend::RetryPolicy;
use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS, DEFAULT_GENERATION_RETRIES,
    DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_CONTEXT_CHARS,
    DEFAULT_MIN_COMPLETENESS, DEFAULT_MIN_RELEVANCE, DEFAULT_MODEL, DEFAULT_RATE_LIMIT,
    DEFAULT_RELEVANCE_THRESHOLD, DEFAULT_RETRIEVE_K, DEFAULT_SWEEP_INTERVAL_SECS,
};
use crate::engine::EngineConfig;
use crate::gate::spacing_for;
use crate::scoring::QualityGate;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `DALGURAK_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Gate width. Default: `5`.
    pub max_concurrent: usize,

    /// Admissions per second. Default: `10`.
    pub rate_limit: f64,

    /// Entry bound for each engine cache. Default: `5000`.
    pub cache_capacity: usize,

    /// Entry lifetime from write. Default: two hours.
    pub cache_ttl: Duration,

    /// Passage relevance cutoff during context assembly. Default: `0.3`.
    pub relevance_threshold: f32,

    /// Cache-write condition. Default: completeness and relevance `>= 0.5`.
    pub quality_gate: QualityGate,

    /// Passages retrieved per question. Default: `3`.
    pub retrieve_k: usize,

    /// Context length limit in characters. Default: `1500`.
    pub max_context_chars: usize,

    /// Background expiry sweep period; zero disables. Default: five minutes.
    pub sweep_interval: Duration,

    /// Chat model used by the LLM generator.
    pub model: String,

    /// Per-attempt generation timeout. Default: 30 seconds.
    pub generation_timeout: Duration,

    /// Extra generation attempts after the first. Default: `2`.
    pub generation_retries: usize,

    /// JSON passage corpus for the built-in retriever.
    pub corpus_path: Option<PathBuf>,

    /// Answer with the local template generator instead of a model provider.
    pub mock_provider: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            rate_limit: DEFAULT_RATE_LIMIT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            quality_gate: QualityGate {
                min_completeness: DEFAULT_MIN_COMPLETENESS,
                min_relevance: DEFAULT_MIN_RELEVANCE,
            },
            retrieve_k: DEFAULT_RETRIEVE_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            model: DEFAULT_MODEL.to_string(),
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            generation_retries: DEFAULT_GENERATION_RETRIES,
            corpus_path: None,
            mock_provider: false,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "DALGURAK_PORT";
    const ENV_BIND_ADDR: &'static str = "DALGURAK_BIND_ADDR";
    const ENV_MAX_CONCURRENT: &'static str = "DALGURAK_MAX_CONCURRENT";
    const ENV_RATE_LIMIT: &'static str = "DALGURAK_RATE_LIMIT";
    const ENV_CACHE_CAPACITY: &'static str = "DALGURAK_CACHE_CAPACITY";
    const ENV_CACHE_TTL_SECS: &'static str = "DALGURAK_CACHE_TTL_SECS";
    const ENV_RELEVANCE_THRESHOLD: &'static str = "DALGURAK_RELEVANCE_THRESHOLD";
    const ENV_MIN_COMPLETENESS: &'static str = "DALGURAK_MIN_COMPLETENESS";
    const ENV_MIN_RELEVANCE: &'static str = "DALGURAK_MIN_RELEVANCE";
    const ENV_RETRIEVE_K: &'static str = "DALGURAK_RETRIEVE_K";
    const ENV_MAX_CONTEXT_CHARS: &'static str = "DALGURAK_MAX_CONTEXT_CHARS";
    const ENV_SWEEP_INTERVAL_SECS: &'static str = "DALGURAK_SWEEP_INTERVAL_SECS";
    const ENV_MODEL: &'static str = "DALGURAK_MODEL";
    const ENV_GENERATION_TIMEOUT_SECS: &'static str = "DALGURAK_GENERATION_TIMEOUT_SECS";
    const ENV_GENERATION_RETRIES: &'static str = "DALGURAK_GENERATION_RETRIES";
    const ENV_CORPUS_PATH: &'static str = "DALGURAK_CORPUS_PATH";
    const ENV_MOCK_PROVIDER: &'static str = "DALGURAK_MOCK_PROVIDER";

    /// Every variable [`from_env`](Self::from_env) reads.
    pub const ENV_VARS: [&'static str; 17] = [
        Self::ENV_PORT,
        Self::ENV_BIND_ADDR,
        Self::ENV_MAX_CONCURRENT,
        Self::ENV_RATE_LIMIT,
        Self::ENV_CACHE_CAPACITY,
        Self::ENV_CACHE_TTL_SECS,
        Self::ENV_RELEVANCE_THRESHOLD,
        Self::ENV_MIN_COMPLETENESS,
        Self::ENV_MIN_RELEVANCE,
        Self::ENV_RETRIEVE_K,
        Self::ENV_MAX_CONTEXT_CHARS,
        Self::ENV_SWEEP_INTERVAL_SECS,
        Self::ENV_MODEL,
        Self::ENV_GENERATION_TIMEOUT_SECS,
        Self::ENV_GENERATION_RETRIES,
        Self::ENV_CORPUS_PATH,
        Self::ENV_MOCK_PROVIDER,
    ];

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Set but unparsable values are errors, not silently replaced by defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: Self::parse_port_from_env(defaults.port)?,
            bind_addr: Self::parse_bind_addr_from_env(defaults.bind_addr)?,
            max_concurrent: Self::parse_from_env(
                Self::ENV_MAX_CONCURRENT,
                defaults.max_concurrent,
            )?,
            rate_limit: Self::parse_from_env(Self::ENV_RATE_LIMIT, defaults.rate_limit)?,
            cache_capacity: Self::parse_from_env(
                Self::ENV_CACHE_CAPACITY,
                defaults.cache_capacity,
            )?,
            cache_ttl: Self::parse_secs_from_env(Self::ENV_CACHE_TTL_SECS, defaults.cache_ttl)?,
            relevance_threshold: Self::parse_from_env(
                Self::ENV_RELEVANCE_THRESHOLD,
                defaults.relevance_threshold,
            )?,
            quality_gate: QualityGate {
                min_completeness: Self::parse_from_env(
                    Self::ENV_MIN_COMPLETENESS,
                    defaults.quality_gate.min_completeness,
                )?,
                min_relevance: Self::parse_from_env(
                    Self::ENV_MIN_RELEVANCE,
                    defaults.quality_gate.min_relevance,
                )?,
            },
            retrieve_k: Self::parse_from_env(Self::ENV_RETRIEVE_K, defaults.retrieve_k)?,
            max_context_chars: Self::parse_from_env(
                Self::ENV_MAX_CONTEXT_CHARS,
                defaults.max_context_chars,
            )?,
            sweep_interval: Self::parse_secs_from_env(
                Self::ENV_SWEEP_INTERVAL_SECS,
                defaults.sweep_interval,
            )?,
            model: Self::parse_string_from_env(Self::ENV_MODEL, defaults.model),
            generation_timeout: Self::parse_secs_from_env(
                Self::ENV_GENERATION_TIMEOUT_SECS,
                defaults.generation_timeout,
            )?,
            generation_retries: Self::parse_from_env(
                Self::ENV_GENERATION_RETRIES,
                defaults.generation_retries,
            )?,
            corpus_path: Self::parse_optional_path_from_env(Self::ENV_CORPUS_PATH),
            mock_provider: Self::parse_bool_from_env(
                Self::ENV_MOCK_PROVIDER,
                defaults.mock_provider,
            )?,
        })
    }

    /// Validates ranges and the corpus path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require(
            Self::ENV_MAX_CONCURRENT,
            self.max_concurrent,
            self.max_concurrent > 0,
            "must be > 0",
        )?;
        Self::require(
            Self::ENV_RATE_LIMIT,
            self.rate_limit,
            self.rate_limit.is_finite() && self.rate_limit > 0.0,
            "must be a finite number > 0",
        )?;
        Self::require(
            Self::ENV_RATE_LIMIT,
            self.rate_limit,
            spacing_for(self.rate_limit).is_some(),
            "too small: the spacing between admissions overflows",
        )?;
        Self::require(
            Self::ENV_CACHE_CAPACITY,
            self.cache_capacity,
            self.cache_capacity > 0,
            "must be > 0",
        )?;
        Self::require(
            Self::ENV_CACHE_TTL_SECS,
            self.cache_ttl.as_secs(),
            !self.cache_ttl.is_zero(),
            "must be > 0",
        )?;
        Self::require_unit(Self::ENV_RELEVANCE_THRESHOLD, self.relevance_threshold)?;
        Self::require_unit(Self::ENV_MIN_COMPLETENESS, self.quality_gate.min_completeness)?;
        Self::require_unit(Self::ENV_MIN_RELEVANCE, self.quality_gate.min_relevance)?;
        Self::require(
            Self::ENV_RETRIEVE_K,
            self.retrieve_k,
            self.retrieve_k > 0,
            "must be > 0",
        )?;
        Self::require(
            Self::ENV_MAX_CONTEXT_CHARS,
            self.max_context_chars,
            self.max_context_chars > 0,
            "must be > 0",
        )?;
        Self::require(
            Self::ENV_MODEL,
            &self.model,
            !self.model.trim().is_empty(),
            "must not be empty",
        )?;
        Self::require(
            Self::ENV_GENERATION_TIMEOUT_SECS,
            self.generation_timeout.as_secs(),
            !self.generation_timeout.is_zero(),
            "must be > 0",
        )?;

        if let Some(ref path) = self.corpus_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// The engine-facing subset of this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::from(self)
    }

    /// Timeout and retry budget for the LLM generator.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: self.generation_timeout,
            retries: self.generation_retries,
            ..RetryPolicy::default()
        }
    }

    fn require(
        name: &'static str,
        value: impl Display,
        ok: bool,
        reason: &str,
    ) -> Result<(), ConfigError> {
        if ok {
            return Ok(());
        }
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        })
    }

    fn require_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
        Self::require(
            name,
            value,
            (0.0..=1.0).contains(&value),
            "must be within [0, 1]",
        )
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name,
                    reason: e.to_string(),
                    value,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_secs_from_env(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        match env::var(name) {
            Ok(_) => Self::parse_from_env::<u64>(name, 0).map(Duration::from_secs),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name,
                    value,
                    reason: "expected a boolean".to_string(),
                }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(name: &str) -> Option<PathBuf> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(name: &str, default: String) -> String {
        env::var(name).unwrap_or(default)
    }
}
