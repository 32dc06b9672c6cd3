//! Authentication settings loaded from the environment

use bookstore_core::{
    get_env_optional, get_env_or_default, get_env_parsed, AppConfigTrait, ConfigError,
    ConfigSource, Environment,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use std::collections::HashMap;
use std::str::FromStr;

pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

/// HS256 signing settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds
    pub ttl_secs: i64,
    pub issuer: String,
    /// False when the secret was generated at startup
    pub secret_from_env: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Bcrypt,
    Argon2,
}

impl FromStr for HashAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bcrypt" => Ok(HashAlgorithm::Bcrypt),
            "argon2" | "argon2id" => Ok(HashAlgorithm::Argon2),
            _ => Err(ConfigError::InvalidValue {
                field: "password_hasher".to_string(),
                value: s.to_string(),
                expected: "bcrypt or argon2".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PasswordConfig {
    pub algorithm: HashAlgorithm,
    pub bcrypt_cost: u32,
    /// Argon2 memory cost in KiB
    pub argon2_memory: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Bcrypt,
            bcrypt_cost: 10,
            argon2_memory: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl AppConfigTrait for AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(AuthConfig {
            jwt: JwtConfig::from_env()?,
            password: PasswordConfig::from_env()?,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.password.validate()
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert("jwt".to_string(), ConfigSource::Nested);
        sources.insert("password".to_string(), ConfigSource::Nested);
        sources
    }
}

impl AppConfigTrait for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_str(&get_env_or_default("APP_ENV", "development"))?;
        let (secret, secret_from_env) = match get_env_optional("JWT_SECRET") {
            Some(secret) => (secret, true),
            None if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar {
                    var: "JWT_SECRET".to_string(),
                })
            }
            None => (random_secret(), false),
        };

        Ok(JwtConfig {
            secret,
            ttl_secs: get_env_parsed("JWT_TTL", 3600)?,
            issuer: get_env_or_default("JWT_ISSUER", "bookstore"),
            secret_from_env,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ValidationFailed {
                field: "jwt_secret".to_string(),
                reason: format!("JWT secret must be at least {} characters", MIN_SECRET_LEN),
            });
        }

        if self.ttl_secs <= 0 {
            return Err(ConfigError::ValidationFailed {
                field: "jwt_ttl".to_string(),
                reason: "Token lifetime must be positive".to_string(),
            });
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        let secret_source = if self.secret_from_env {
            ConfigSource::EnvVar("JWT_SECRET".to_string())
        } else {
            ConfigSource::Default("random per process".to_string())
        };
        sources.insert("secret".to_string(), secret_source);
        sources.insert("ttl_secs".to_string(), ConfigSource::EnvVar("JWT_TTL".to_string()));
        sources.insert("issuer".to_string(), ConfigSource::EnvVar("JWT_ISSUER".to_string()));
        sources
    }
}

impl AppConfigTrait for PasswordConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = PasswordConfig::default();
        Ok(PasswordConfig {
            algorithm: HashAlgorithm::from_str(&get_env_or_default("PASSWORD_HASHER", "bcrypt"))?,
            bcrypt_cost: get_env_parsed("BCRYPT_COST", defaults.bcrypt_cost)?,
            ..defaults
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                field: "bcrypt_cost".to_string(),
                value: self.bcrypt_cost.to_string(),
                expected: "a cost between 4 and 31".to_string(),
            });
        }
        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "algorithm".to_string(),
            ConfigSource::EnvVar("PASSWORD_HASHER".to_string()),
        );
        sources.insert(
            "bcrypt_cost".to_string(),
            ConfigSource::EnvVar("BCRYPT_COST".to_string()),
        );
        sources.insert(
            "argon2_memory".to_string(),
            ConfigSource::Default("19456".to_string()),
        );
        sources
    }
}

fn random_secret() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear() {
        for key in ["APP_ENV", "JWT_SECRET", "JWT_TTL", "JWT_ISSUER", "PASSWORD_HASHER", "BCRYPT_COST"] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_development_generates_a_secret() {
        clear();
        let config = JwtConfig::from_env().unwrap();
        assert!(!config.secret_from_env);
        assert_eq!(config.secret.len(), 64);
        assert_eq!(config.ttl_secs, 3600);
        assert_eq!(config.issuer, "bookstore");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_production_requires_secret() {
        clear();
        env::set_var("APP_ENV", "production");
        let result = JwtConfig::from_env();
        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingEnvVar {
                var: "JWT_SECRET".to_string()
            }
        );
        clear();
    }

    #[test]
    #[serial]
    fn test_short_secret_fails_validation() {
        clear();
        env::set_var("JWT_SECRET", "too-short");
        let config = JwtConfig::from_env().unwrap();
        assert!(config.secret_from_env);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
        clear();
    }

    #[test]
    #[serial]
    fn test_password_hasher_selection() {
        clear();
        env::set_var("PASSWORD_HASHER", "Argon2");
        env::set_var("BCRYPT_COST", "12");
        let config = PasswordConfig::from_env().unwrap();
        assert_eq!(config.algorithm, HashAlgorithm::Argon2);
        assert_eq!(config.bcrypt_cost, 12);

        env::set_var("PASSWORD_HASHER", "md5");
        assert!(PasswordConfig::from_env().is_err());
        clear();
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let config = PasswordConfig {
            bcrypt_cost: 3,
            ..PasswordConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(PasswordConfig::default().validate().is_ok());
    }
}
