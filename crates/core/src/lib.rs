//! # bookstore-core
//!
//! Environment-driven configuration and the domain vocabulary shared by
//! every other bookstore crate.

pub mod app_config;
pub mod domain;
pub mod money;
pub mod order_code;

pub use app_config::{
    get_env_optional, get_env_or_default, get_env_parsed, get_env_required, AppConfig,
    AppConfigTrait, ConfigError, ConfigSource, DatabaseConfig, Environment, LoggingConfig,
    ServerConfig,
};
pub use domain::{has_role, DomainError, OrderStatus, PaymentStatus, RoleName};
