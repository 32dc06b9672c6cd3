//! In-process denylist of logged-out tokens, keyed by `jti`

use chrono::Utc;
use dashmap::DashMap;

/// Revoked token ids and the unix time at which each token expires anyway
#[derive(Debug, Default)]
pub struct TokenDenylist {
    revoked: DashMap<String, i64>,
}

impl TokenDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the token until `expires_at`; also drops entries that already expired
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        self.purge_expired();
        self.revoked.insert(jti.to_string(), expires_at);
        tracing::debug!(jti = %jti, "Token revoked");
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        match self.revoked.get(jti) {
            Some(expires_at) => *expires_at > Utc::now().timestamp(),
            None => false,
        }
    }

    pub fn purge_expired(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, expires_at| *expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}
