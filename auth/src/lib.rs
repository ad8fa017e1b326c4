//! Credential and session-token core for the user service.
//!
//! - Password hashing (Argon2id)
//! - Signing key material (RS256 / EdDSA key pairs, legacy HS256 secret)
//! - Session token issuance and verification
//! - Structural validation of credential input
//! - Token extraction for protected requests
//!
//! Everything here is synchronous and free of I/O once keys are loaded, so it can be
//! shared across threads behind an `Arc` without locking.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::{Identity, KeyMaterial, TokenService, TokenSettings};
//!
//! let keys = KeyMaterial::shared_secret(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let tokens = TokenService::new(keys, TokenSettings::default());
//!
//! let token = tokens.issue(&Identity::new(1, "Lilly", "lilly@example.com")).unwrap();
//! let claims = tokens.verify(&token).unwrap();
//! assert_eq!(claims.subject_id(), 1);
//! ```
//!
//! ## Input Validation
//! ```
//! use auth::credentials::{validate_for_create, CredentialInput};
//!
//! let result = validate_for_create(&CredentialInput::new("", "bad", ""));
//! assert_eq!(result.errors().len(), 3);
//! ```

pub mod authenticator;
pub mod credentials;
pub mod header;
pub mod jwt;
pub mod keys;
pub mod password;

pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use credentials::CredentialInput;
pub use credentials::ValidationResult;
pub use header::AuthError;
pub use jwt::Identity;
pub use jwt::IssueOptions;
pub use jwt::TokenClaims;
pub use jwt::TokenError;
pub use jwt::TokenService;
pub use jwt::TokenSettings;
pub use keys::KeyLoadError;
pub use keys::KeyMaterial;
pub use keys::KeySource;
pub use keys::SigningAlgorithm;
pub use password::PasswordError;
pub use password::PasswordHasher;
