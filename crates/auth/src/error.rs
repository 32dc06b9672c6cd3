//! Authentication and authorization error types

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No bearer token on a request that needs one
    #[error("Unauthenticated")]
    MissingToken,

    #[error("Token error: {message}")]
    TokenError { message: String },

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Authentication configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Cryptographic error: {message}")]
    CryptographicError { message: String },
}

impl AuthError {
    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::TokenError { .. } => "TOKEN_ERROR",
            AuthError::TokenRevoked => "TOKEN_REVOKED",
            AuthError::AccessDenied { .. } => "ACCESS_DENIED",
            AuthError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            AuthError::CryptographicError { .. } => "CRYPTOGRAPHIC_ERROR",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::TokenError { .. }
            | AuthError::TokenRevoked => 401,
            AuthError::AccessDenied { .. } => 403,
            AuthError::ConfigurationError { .. } | AuthError::CryptographicError { .. } => 500,
        }
    }

    pub fn token_error(message: impl Into<String>) -> Self {
        Self::TokenError {
            message: message.into(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn crypto_error(message: impl Into<String>) -> Self {
        Self::CryptographicError {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::token_error(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::crypto_error(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::crypto_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::MissingToken.status_code(), 401);
        assert_eq!(AuthError::TokenRevoked.status_code(), 401);
        assert_eq!(AuthError::access_denied("admin only").status_code(), 403);
        assert_eq!(AuthError::config_error("no secret").status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = AuthError::token_error("ExpiredSignature");
        assert_eq!(err.to_string(), "Token error: ExpiredSignature");
        assert_eq!(err.error_code(), "TOKEN_ERROR");
    }
}
