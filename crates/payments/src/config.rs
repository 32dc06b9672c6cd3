//! Merchant and exchange-rate settings

use bookstore_core::{
    get_env_optional, get_env_or_default, get_env_parsed, AppConfigTrait, ConfigError,
    ConfigSource,
};
use std::collections::HashMap;

/// VNPAY merchant settings. All four values are needed to build payment URLs;
/// the hash secret alone is enough to verify callbacks.
#[derive(Debug, Clone, Default)]
pub struct VnpayConfig {
    pub tmn_code: String,
    /// Trimmed on load
    pub hash_secret: String,
    pub pay_url: String,
    pub return_url: String,
}

impl VnpayConfig {
    /// Name of the first missing setting, if any
    pub fn missing_setting(&self) -> Option<&'static str> {
        [
            ("VNP_TMN_CODE", &self.tmn_code),
            ("VNP_HASH_SECRET", &self.hash_secret),
            ("VNP_URL", &self.pay_url),
            ("VNP_RETURN_URL", &self.return_url),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
    }
}

impl AppConfigTrait for VnpayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let setting = |key: &str| get_env_optional(key).map(|v| v.trim().to_string()).unwrap_or_default();
        Ok(VnpayConfig {
            tmn_code: setting("VNP_TMN_CODE"),
            hash_secret: setting("VNP_HASH_SECRET"),
            pay_url: setting("VNP_URL"),
            return_url: setting("VNP_RETURN_URL"),
        })
    }

    /// Missing settings are reported when a payment is attempted, not at startup
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("vnp_url", &self.pay_url), ("vnp_return_url", &self.return_url)] {
            if !value.is_empty() && !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                    expected: "an http(s) URL".to_string(),
                });
            }
        }
        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert("tmn_code".to_string(), ConfigSource::EnvVar("VNP_TMN_CODE".to_string()));
        sources.insert(
            "hash_secret".to_string(),
            ConfigSource::EnvVar("VNP_HASH_SECRET".to_string()),
        );
        sources.insert("pay_url".to_string(), ConfigSource::EnvVar("VNP_URL".to_string()));
        sources.insert(
            "return_url".to_string(),
            ConfigSource::EnvVar("VNP_RETURN_URL".to_string()),
        );
        sources
    }
}

/// Exchange-rate API settings
#[derive(Debug, Clone)]
pub struct FxConfig {
    pub url: String,
    pub from: String,
    pub to: String,
    pub access_key: Option<String>,
    pub timeout_secs: u64,
    /// Extra attempts after a transport error
    pub retries: u32,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            url: "https://api.exchangerate.host/convert".to_string(),
            from: "USD".to_string(),
            to: "VND".to_string(),
            access_key: None,
            timeout_secs: 5,
            retries: 1,
        }
    }
}

impl AppConfigTrait for FxConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = FxConfig::default();
        Ok(FxConfig {
            url: get_env_or_default("FX_URL", &defaults.url),
            from: get_env_or_default("FX_FROM", &defaults.from),
            to: get_env_or_default("FX_TO", &defaults.to),
            access_key: get_env_optional("FX_KEY"),
            timeout_secs: get_env_parsed("FX_TIMEOUT", defaults.timeout_secs)?,
            retries: get_env_parsed("FX_RETRIES", defaults.retries)?,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "fx_timeout".to_string(),
                reason: "Timeout must be at least one second".to_string(),
            });
        }
        if self.from.is_empty() || self.to.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "fx_currency".to_string(),
                reason: "Currencies cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert("url".to_string(), ConfigSource::EnvVar("FX_URL".to_string()));
        sources.insert("from".to_string(), ConfigSource::EnvVar("FX_FROM".to_string()));
        sources.insert("to".to_string(), ConfigSource::EnvVar("FX_TO".to_string()));
        sources.insert("access_key".to_string(), ConfigSource::EnvVar("FX_KEY".to_string()));
        sources.insert(
            "timeout_secs".to_string(),
            ConfigSource::EnvVar("FX_TIMEOUT".to_string()),
        );
        sources.insert("retries".to_string(), ConfigSource::EnvVar("FX_RETRIES".to_string()));
        sources
    }
}
