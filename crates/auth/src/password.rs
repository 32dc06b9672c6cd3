//! Password hashing with bcrypt or argon2id

use crate::config::{HashAlgorithm, PasswordConfig};
use crate::{AuthError, AuthResult};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use rand::thread_rng;
use std::sync::Arc;

/// Hashes and verifies passwords in one algorithm's format
pub trait PasswordHasher: Send + Sync {
    fn hash_password(&self, password: &str) -> AuthResult<String>;

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool>;

    /// True when `hash` was produced by this algorithm
    fn recognizes(&self, hash: &str) -> bool;

    fn hasher_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Argon2Hasher {
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    fn argon2(&self) -> AuthResult<Argon2<'static>> {
        let params = argon2::Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| AuthError::crypto_error(e.to_string()))?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut thread_rng());
        let hash = self.argon2()?.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hash)?;
        // cost parameters are read from the stored hash
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn recognizes(&self, hash: &str) -> bool {
        hash.starts_with("$argon2")
    }

    fn hasher_name(&self) -> &str {
        "argon2"
    }
}

#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }

    fn recognizes(&self, hash: &str) -> bool {
        ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|prefix| hash.starts_with(prefix))
    }

    fn hasher_name(&self) -> &str {
        "bcrypt"
    }
}

/// Hashes new passwords with the configured algorithm and verifies stored
/// hashes in either format, so switching `PASSWORD_HASHER` keeps old logins working.
///
/// Both algorithms are deliberately slow. Request handlers use the `_async`
/// variants, which run on tokio's blocking pool.
#[derive(Clone)]
pub struct PasswordManager {
    primary: Arc<dyn PasswordHasher>,
    fallback: Arc<dyn PasswordHasher>,
}

impl PasswordManager {
    pub fn new(config: &PasswordConfig) -> Self {
        let bcrypt: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(config.bcrypt_cost));
        let argon2: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new(
            config.argon2_memory,
            config.argon2_iterations,
            config.argon2_parallelism,
        ));

        let (primary, fallback) = match config.algorithm {
            HashAlgorithm::Bcrypt => (bcrypt, argon2),
            HashAlgorithm::Argon2 => (argon2, bcrypt),
        };
        Self { primary, fallback }
    }

    pub fn algorithm(&self) -> &str {
        self.primary.hasher_name()
    }

    pub fn hash(&self, password: &str) -> AuthResult<String> {
        self.primary.hash_password(password)
    }

    /// Unknown hash formats verify as false rather than erroring
    pub fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        if self.primary.recognizes(hash) {
            self.primary.verify_password(password, hash)
        } else if self.fallback.recognizes(hash) {
            self.fallback.verify_password(password, hash)
        } else {
            tracing::warn!(hash_len = hash.len(), "Stored password hash has an unknown format");
            Ok(false)
        }
    }

    pub async fn hash_async(&self, password: &str) -> AuthResult<String> {
        let manager = self.clone();
        let password = password.to_string();
        run_blocking(move || manager.hash(&password)).await
    }

    pub async fn verify_async(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let manager = self.clone();
        let (password, hash) = (password.to_string(), hash.to_string());
        run_blocking(move || manager.verify(&password, &hash)).await
    }
}

async fn run_blocking<T, F>(work: F) -> AuthResult<T>
where
    F: FnOnce() -> AuthResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::crypto_error(format!("Password task failed: {}", e)))?
}

impl std::fmt::Debug for PasswordManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordManager")
            .field("primary", &self.primary.hasher_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(algorithm: HashAlgorithm) -> PasswordConfig {
        PasswordConfig {
            algorithm,
            bcrypt_cost: 4,
            argon2_memory: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn test_bcrypt_hash_and_verify() {
        let passwords = PasswordManager::new(&fast_config(HashAlgorithm::Bcrypt));
        let hash = passwords.hash("secret123").unwrap();

        assert!(hash.starts_with("$2"));
        assert!(passwords.verify("secret123", &hash).unwrap());
        assert!(!passwords.verify("secret124", &hash).unwrap());
    }

    #[test]
    fn test_argon2_hash_and_verify() {
        let passwords = PasswordManager::new(&fast_config(HashAlgorithm::Argon2));
        let hash = passwords.hash("secret123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify("secret123", &hash).unwrap());
        assert!(!passwords.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_switching_algorithms_keeps_old_hashes_valid() {
        let old = PasswordManager::new(&fast_config(HashAlgorithm::Bcrypt));
        let hash = old.hash("secret123").unwrap();

        let new = PasswordManager::new(&fast_config(HashAlgorithm::Argon2));
        assert_eq!(new.algorithm(), "argon2");
        assert!(new.verify("secret123", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_async_variants_run_off_the_runtime() {
        let passwords = PasswordManager::new(&fast_config(HashAlgorithm::Bcrypt));
        let hash = passwords.hash_async("secret123").await.unwrap();

        assert!(passwords.verify_async("secret123", &hash).await.unwrap());
        assert!(!passwords.verify_async("secret124", &hash).await.unwrap());
        assert!(passwords.verify("secret123", &hash).unwrap());
    }

    #[test]
    fn test_unknown_format_is_a_mismatch() {
        let passwords = PasswordManager::new(&fast_config(HashAlgorithm::Bcrypt));
        assert!(!passwords.verify("secret123", "plaintext").unwrap());
    }
}
