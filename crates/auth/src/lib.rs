//! # bookstore-auth
//!
//! Stateless JWT authentication with an in-process revocation list,
//! password hashing (bcrypt or argon2) and the admin/staff role checks.

pub mod config;
pub mod error;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod revocation;

pub use config::{AuthConfig, HashAlgorithm, JwtConfig, PasswordConfig};
pub use error::AuthError;
pub use jwt::{extract_bearer, Claims, IssuedToken, JwtManager};
pub use password::{Argon2Hasher, BcryptHasher, PasswordHasher, PasswordManager};
pub use rbac::{is_admin, is_staff, require_admin, require_staff};
pub use revocation::TokenDenylist;

/// Authentication result type alias
pub type AuthResult<T> = Result<T, AuthError>;
