//! Every configuration section the server needs, loaded together

use crate::routes::REQUEST_TIMEOUT;
use bookstore_auth::AuthConfig;
use bookstore_chatbot::ChatbotConfig;
use bookstore_core::{AppConfig, AppConfigTrait, ConfigError, ConfigSource};
use bookstore_payments::{FxConfig, VnpayConfig};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Settings {
    pub app: AppConfig,
    pub auth: AuthConfig,
    pub vnpay: VnpayConfig,
    pub fx: FxConfig,
    pub chatbot: ChatbotConfig,
}

impl AppConfigTrait for Settings {
    fn from_env() -> Result<Self, ConfigError> {
        let settings = Self {
            app: AppConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            vnpay: VnpayConfig::from_env()?,
            fx: FxConfig::from_env()?,
            chatbot: ChatbotConfig::from_env()?,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.app.validate()?;
        self.auth.validate()?;
        self.vnpay.validate()?;
        self.fx.validate()?;
        self.chatbot.validate()?;

        if self.chatbot.deadline_secs >= REQUEST_TIMEOUT.as_secs() {
            return Err(ConfigError::ValidationFailed {
                field: "chatbot_deadline".to_string(),
                reason: format!(
                    "Must be below the {}s request timeout so the unavailable answer is returned",
                    REQUEST_TIMEOUT.as_secs()
                ),
            });
        }
        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let sections = [
            ("app", self.app.config_sources()),
            ("auth", self.auth.config_sources()),
            ("vnpay", self.vnpay.config_sources()),
            ("fx", self.fx.config_sources()),
            ("chatbot", self.chatbot.config_sources()),
        ];

        sections
            .into_iter()
            .flat_map(|(section, sources)| {
                sources
                    .into_iter()
                    .map(move |(key, source)| (format!("{}.{}", section, key), source))
            })
            .collect()
    }
}
