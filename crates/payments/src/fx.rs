//! USD to VND conversion through an exchangerate.host-compatible API.

use crate::config::FxConfig;
use crate::error::{PaymentError, PaymentResult};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    result: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct FxClient {
    client: Client,
    config: FxConfig,
}

impl FxClient {
    pub fn new(config: FxConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::NotConfigured(format!("FX HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FxConfig {
        &self.config
    }

    /// Convert `amount` (in the source currency) to whole units of the target
    /// currency, rounded half away from zero
    pub async fn convert(&self, amount: f64) -> PaymentResult<i64> {
        let mut attempt = 0;
        loop {
            match self.request(amount).await {
                Err(PaymentError::FxTransport(message)) if attempt < self.config.retries => {
                    attempt += 1;
                    tracing::warn!(
                        target: "fx.convert",
                        attempt,
                        error = %message,
                        "FX_API_ERROR, retrying"
                    );
                }
                other => return other,
            }
        }
    }

    async fn request(&self, amount: f64) -> PaymentResult<i64> {
        let amount_param = amount.to_string();
        let mut query = vec![
            ("from", self.config.from.as_str()),
            ("to", self.config.to.as_str()),
            ("amount", amount_param.as_str()),
        ];
        if let Some(key) = self.config.access_key.as_deref() {
            query.push(("access_key", key));
        }

        let response = self
            .client
            .get(&self.config.url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "fx.convert", error = %e, "FX_API_ERROR");
                PaymentError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(target: "fx.convert", status = status.as_u16(), "FX_API_ERROR_STATUS");
            return Err(PaymentError::FxStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: ConvertResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(target: "fx.convert", body = %body, "FX_API_INVALID_RESPONSE");
            PaymentError::FxInvalidResponse(e.to_string())
        })?;

        match parsed {
            ConvertResponse {
                success: Some(true),
                result: Some(result),
            } if result.is_finite() => {
                let converted = result.round() as i64;
                tracing::info!(target: "fx.convert", amount, converted, "Converted order total");
                Ok(converted)
            }
            _ => {
                tracing::error!(target: "fx.convert", body = %body, "FX_API_INVALID_RESPONSE");
                Err(PaymentError::FxInvalidResponse(body))
            }
        }
    }
}
