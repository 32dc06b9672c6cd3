use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// A merchant setting needed for the call is missing
    #[error("Payment gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid signature")]
    InvalidSignature,

    /// The VND amount does not fit the gateway's `amount * 100` encoding
    #[error("Amount out of range: {0} VND")]
    AmountOutOfRange(i64),

    /// Transport failure talking to the exchange-rate API
    #[error("Exchange rate request failed: {0}")]
    FxTransport(String),

    #[error("Exchange rate API returned HTTP {0}")]
    FxStatus(u16),

    #[error("Exchange rate API returned an unexpected body: {0}")]
    FxInvalidResponse(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::FxTransport(err.to_string())
    }
}
