use serde::Deserialize;

use crate::infrastructure::auth::{
    AuthServiceConfig, JwtConfig, DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_AUDIENCE,
    MAX_ACCESS_TOKEN_TTL_MINUTES,
};
use crate::infrastructure::cache::{InMemoryTokenCacheConfig, ENTRY_HEADER_BYTES};
use crate::infrastructure::user::PasswordHashConfig;

const DEFAULT_CACHE_CAPACITY_BYTES: u64 = 100 * 1024 * 1024;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Application configuration
///
/// The `auth` section has no defaults: the signing secret and the refresh
/// token TTL must always be supplied.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub password: PasswordConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub jwt_secret: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: u64,
    /// 0 stores refresh records without expiry
    pub refresh_token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity_bytes")]
    pub capacity_bytes: u64,
    /// Defaults to 1/1024 of the capacity
    #[serde(default)]
    pub max_entry_bytes: Option<usize>,
    /// 0 disables the background sweep
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

fn default_access_token_ttl_minutes() -> u64 {
    DEFAULT_ACCESS_TOKEN_TTL_MINUTES
}

fn default_cache_capacity_bytes() -> u64 {
    DEFAULT_CACHE_CAPACITY_BYTES
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CACHE_CAPACITY_BYTES,
            max_entry_bytes: None,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        let defaults = PasswordHashConfig::default();
        Self {
            memory_kib: defaults.memory_kib,
            iterations: defaults.iterations,
            parallelism: defaults.parallelism,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[hidden]")
            .field("audience", &self.audience)
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .finish()
    }
}

impl AuthConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.jwt_secret.clone())
            .with_audience(self.audience.clone())
            .with_access_token_ttl_minutes(self.access_token_ttl_minutes)
    }

    pub fn service_config(&self) -> AuthServiceConfig {
        AuthServiceConfig::new(self.refresh_token_ttl_secs)
    }
}

impl From<&CacheConfig> for InMemoryTokenCacheConfig {
    fn from(config: &CacheConfig) -> Self {
        let cache_config = InMemoryTokenCacheConfig::default().with_capacity_bytes(config.capacity_bytes);

        match config.max_entry_bytes {
            Some(max) => cache_config.with_max_entry_bytes(max),
            None => cache_config,
        }
    }
}

impl From<&PasswordConfig> for PasswordHashConfig {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.memory_kib,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local`, then `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document, applying the same defaults and checks as `load`
    pub fn from_toml_str(source: &str) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values that deserialize but cannot work
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }

        if self.auth.audience.is_empty() {
            return Err(config::ConfigError::Message(
                "auth.audience must not be empty".to_string(),
            ));
        }

        if self.auth.access_token_ttl_minutes == 0
            || self.auth.access_token_ttl_minutes > MAX_ACCESS_TOKEN_TTL_MINUTES
        {
            return Err(config::ConfigError::Message(format!(
                "auth.access_token_ttl_minutes must be between 1 and {}",
                MAX_ACCESS_TOKEN_TTL_MINUTES
            )));
        }

        if self.cache.capacity_bytes <= ENTRY_HEADER_BYTES as u64 {
            return Err(config::ConfigError::Message(format!(
                "cache.capacity_bytes must be greater than {}",
                ENTRY_HEADER_BYTES
            )));
        }

        match self.cache.max_entry_bytes {
            Some(0) => {
                return Err(config::ConfigError::Message(
                    "cache.max_entry_bytes must be greater than zero".to_string(),
                ));
            }
            Some(max) if max as u64 + ENTRY_HEADER_BYTES as u64 > self.cache.capacity_bytes => {
                return Err(config::ConfigError::Message(format!(
                    "cache.max_entry_bytes plus the {}-byte entry header must fit in cache.capacity_bytes",
                    ENTRY_HEADER_BYTES
                )));
            }
            _ => {}
        }

        Ok(())
    }
}
