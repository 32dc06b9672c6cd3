use bookstore_core::{
    get_env_or_default, get_env_parsed, AppConfigTrait, ConfigError, ConfigSource,
};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    /// llama.cpp / OpenAI-compatible server, without trailing slash
    pub llama_base_url: String,
    /// Books retrieved per question
    pub top_n: i64,
    /// Seconds, `/v1/chat/completions` and `/v1/completions`
    pub timeout_secs: u64,
    /// Seconds, llama.cpp `/completion`
    pub fallback_timeout_secs: u64,
    /// Seconds the whole endpoint chain may take before the question is
    /// answered as unavailable
    pub deadline_secs: u64,
    /// Asks per minute per client IP
    pub rate_limit_per_minute: u32,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            llama_base_url: "http://llama:8080".to_string(),
            top_n: 8,
            timeout_secs: 30,
            fallback_timeout_secs: 60,
            deadline_secs: 50,
            rate_limit_per_minute: 10,
        }
    }
}

impl AppConfigTrait for ChatbotConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = ChatbotConfig::default();
        let base = get_env_or_default("LLAMA_BASE_URL", &defaults.llama_base_url);
        Ok(ChatbotConfig {
            llama_base_url: base.trim_end_matches('/').to_string(),
            top_n: get_env_parsed("CHATBOT_TOP_N", defaults.top_n)?,
            timeout_secs: get_env_parsed("CHATBOT_TIMEOUT", defaults.timeout_secs)?,
            fallback_timeout_secs: get_env_parsed(
                "CHATBOT_FALLBACK_TIMEOUT",
                defaults.fallback_timeout_secs,
            )?,
            deadline_secs: get_env_parsed("CHATBOT_DEADLINE", defaults.deadline_secs)?,
            rate_limit_per_minute: get_env_parsed(
                "CHATBOT_RATE_LIMIT",
                defaults.rate_limit_per_minute,
            )?,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.llama_base_url.starts_with("http://") && !self.llama_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "llama_base_url".to_string(),
                value: self.llama_base_url.clone(),
                expected: "an http(s) URL".to_string(),
            });
        }
        if self.top_n < 1 {
            return Err(ConfigError::ValidationFailed {
                field: "chatbot_top_n".to_string(),
                reason: "At least one book must be retrieved".to_string(),
            });
        }
        if self.timeout_secs == 0 || self.fallback_timeout_secs == 0 || self.deadline_secs == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "chatbot_timeout".to_string(),
                reason: "Timeouts must be at least one second".to_string(),
            });
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "chatbot_rate_limit".to_string(),
                reason: "Rate limit must allow at least one request".to_string(),
            });
        }
        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        [
            ("llama_base_url", "LLAMA_BASE_URL"),
            ("top_n", "CHATBOT_TOP_N"),
            ("timeout_secs", "CHATBOT_TIMEOUT"),
            ("fallback_timeout_secs", "CHATBOT_FALLBACK_TIMEOUT"),
            ("deadline_secs", "CHATBOT_DEADLINE"),
            ("rate_limit_per_minute", "CHATBOT_RATE_LIMIT"),
        ]
        .into_iter()
        .map(|(field, var)| (field.to_string(), ConfigSource::EnvVar(var.to_string())))
        .collect()
    }
}
