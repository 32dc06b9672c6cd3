//! Shared application state handed to every handler

use crate::config::Settings;
use crate::error::{HttpError, HttpResult};
use crate::middleware::RateLimiter;
use bookstore_auth::{JwtManager, PasswordManager, TokenDenylist};
use bookstore_chatbot::{ChatbotService, LlamaClient, PgBookCatalog};
use bookstore_core::AppConfig;
use bookstore_orm::PgPool;
use bookstore_payments::{FxClient, VnpayGateway};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtManager>,
    pub passwords: Arc<PasswordManager>,
    pub denylist: Arc<TokenDenylist>,
    pub vnpay: Arc<VnpayGateway>,
    pub fx: Arc<FxClient>,
    pub chatbot: Arc<ChatbotService>,
    pub chatbot_limiter: RateLimiter,
}

impl AppState {
    pub fn new(pool: PgPool, settings: Settings) -> HttpResult<Self> {
        let fx = FxClient::new(settings.fx)?;
        let llm = LlamaClient::new(&settings.chatbot)
            .map_err(|e| HttpError::internal(e.to_string()))?;
        let chatbot = ChatbotService::new(
            Arc::new(PgBookCatalog::new(pool.clone())),
            Arc::new(llm),
            settings.chatbot.top_n,
        )
        .with_deadline(Duration::from_secs(settings.chatbot.deadline_secs));

        if let Some(missing) = settings.vnpay.missing_setting() {
            tracing::warn!(setting = missing, "VNPAY is not fully configured; checkout will fail");
        }

        Ok(Self {
            jwt: Arc::new(JwtManager::new(&settings.auth.jwt)),
            passwords: Arc::new(PasswordManager::new(&settings.auth.password)),
            denylist: Arc::new(TokenDenylist::new()),
            vnpay: Arc::new(VnpayGateway::new(settings.vnpay)),
            fx: Arc::new(fx),
            chatbot: Arc::new(chatbot),
            chatbot_limiter: RateLimiter::per_minute(settings.chatbot.rate_limit_per_minute),
            config: Arc::new(settings.app),
            pool,
        })
    }
}
