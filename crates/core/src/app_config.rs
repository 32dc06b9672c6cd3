use std::collections::HashMap;
use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Configuration trait implemented by every env-backed settings struct
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Where a configuration value came from
#[derive(Debug, Clone)]
pub enum ConfigSource {
    EnvVar(String),
    Default(String),
    Nested,
}

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                field: "environment".to_string(),
                value: s.to_string(),
                expected: "development, testing, or production".to_string(),
            }),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    /// Raw `APP_FRONTEND` value; may hold several comma-separated origins
    pub frontend: String,
    pub cors_credentials: bool,
    /// Reverse proxies whose `X-Forwarded-For` / `X-Real-IP` headers are believed
    pub trusted_proxies: Vec<IpAddr>,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl AppConfig {
    /// Allowed CORS origins, trailing slashes removed
    pub fn cors_origins(&self) -> Vec<String> {
        self.frontend
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }

    /// Base URL used for browser redirects back to the storefront
    pub fn frontend_base(&self) -> String {
        self.cors_origins().into_iter().next().unwrap_or_default()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl AppConfigTrait for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let name = get_env_or_default("APP_NAME", "bookstore");
        let environment = Environment::from_str(&get_env_or_default("APP_ENV", "development"))?;
        let frontend = get_env_or_default("APP_FRONTEND", "");
        let cors_credentials = get_env_parsed("CORS_CREDENTIALS", false)?;
        let trusted_proxies = parse_ip_list("trusted_proxies", &get_env_or_default("TRUSTED_PROXIES", ""))?;

        Ok(AppConfig {
            name,
            environment,
            frontend,
            cors_credentials,
            trusted_proxies,
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "name".to_string(),
                reason: "App name cannot be empty".to_string(),
            });
        }

        if self.environment.is_production() && self.cors_origins().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "frontend".to_string(),
                reason: "APP_FRONTEND is required in production".to_string(),
            });
        }

        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert("name".to_string(), ConfigSource::EnvVar("APP_NAME".to_string()));
        sources.insert("environment".to_string(), ConfigSource::EnvVar("APP_ENV".to_string()));
        sources.insert("frontend".to_string(), ConfigSource::EnvVar("APP_FRONTEND".to_string()));
        sources.insert(
            "cors_credentials".to_string(),
            ConfigSource::EnvVar("CORS_CREDENTIALS".to_string()),
        );
        sources.insert(
            "trusted_proxies".to_string(),
            ConfigSource::EnvVar("TRUSTED_PROXIES".to_string()),
        );
        sources.insert("server".to_string(), ConfigSource::Nested);
        sources.insert("database".to_string(), ConfigSource::Nested);
        sources.insert("logging".to_string(), ConfigSource::Nested);
        sources
    }
}

impl AppConfigTrait for ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let host = get_env_or_default("SERVER_HOST", "0.0.0.0");
        let port = get_env_or_default("SERVER_PORT", "8000");
        let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
            field: "port".to_string(),
            value: port,
            expected: "valid port number (0-65535)".to_string(),
        })?;

        Ok(ServerConfig { host, port })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "host".to_string(),
                reason: "Host cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "port".to_string(),
                reason: "Port cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert("host".to_string(), ConfigSource::EnvVar("SERVER_HOST".to_string()));
        sources.insert("port".to_string(), ConfigSource::EnvVar("SERVER_PORT".to_string()));
        sources
    }
}

impl AppConfigTrait for DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(DatabaseConfig {
            url: get_env_required("DATABASE_URL")?,
            max_connections: get_env_parsed("DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: get_env_parsed("DB_ACQUIRE_TIMEOUT", 5)?,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ConfigError::InvalidValue {
                field: "database_url".to_string(),
                value: "<redacted>".to_string(),
                expected: "a postgres:// connection string".to_string(),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "max_connections".to_string(),
                reason: "Pool needs at least one connection".to_string(),
            });
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert("url".to_string(), ConfigSource::EnvVar("DATABASE_URL".to_string()));
        sources.insert(
            "max_connections".to_string(),
            ConfigSource::EnvVar("DB_MAX_CONNECTIONS".to_string()),
        );
        sources.insert(
            "acquire_timeout_secs".to_string(),
            ConfigSource::EnvVar("DB_ACQUIRE_TIMEOUT".to_string()),
        );
        sources
    }
}

impl AppConfigTrait for LoggingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: get_env_or_default("LOG_LEVEL", "info"),
            format: get_env_or_default("LOG_FORMAT", "compact"),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "level".to_string(),
                value: self.level.clone(),
                expected: "trace, debug, info, warn, or error".to_string(),
            });
        }

        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "format".to_string(),
                value: self.format.clone(),
                expected: "compact, pretty, or json".to_string(),
            });
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert("level".to_string(), ConfigSource::EnvVar("LOG_LEVEL".to_string()));
        sources.insert("format".to_string(), ConfigSource::EnvVar("LOG_FORMAT".to_string()));
        sources
    }
}

/// Comma-separated IP addresses; blank entries are skipped
fn parse_ip_list(field: &str, raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<IpAddr>().map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                value: entry.to_string(),
                expected: "comma-separated IP addresses".to_string(),
            })
        })
        .collect()
}

pub fn get_env_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar {
            var: key.to_string(),
        }),
    }
}

pub fn get_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub fn get_env_or_default(key: &str, default: &str) -> String {
    get_env_optional(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional variable, falling back to `default` when unset
pub fn get_env_parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match get_env_optional(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            field: key.to_lowercase(),
            value: raw,
            expected: std::any::type_name::<T>().to_string(),
        }),
        None => Ok(default),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}
