//! HS256 access tokens

use crate::config::JwtConfig;
use crate::{AuthError, AuthResult};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id, the key used for revocation
    pub jti: String,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> AuthResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AuthError::token_error("Subject is not a user id"))
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
    issuer: String,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("ttl_secs", &self.ttl_secs)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl_secs: config.ttl_secs,
            issuer: config.issuer.clone(),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a fresh token for the user
    pub fn issue(&self, user_id: i64, username: &str) -> AuthResult<IssuedToken> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
            jti: uuid::Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, claims })
    }

    /// Check signature, issuer and expiry and return the claims
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
/// `Ok(None)` when there is no header or the token part is blank.
pub fn extract_bearer(header: Option<&str>) -> AuthResult<Option<&str>> {
    match header {
        Some(value) => {
            let token = value
                .strip_prefix(BEARER_PREFIX)
                .or_else(|| value.strip_prefix("bearer "))
                .ok_or_else(|| AuthError::token_error("Token must start with 'Bearer '"))?
                .trim();

            if token.is_empty() {
                Ok(None)
            } else {
                Ok(Some(token))
            }
        }
        None => Ok(None),
    }
}
