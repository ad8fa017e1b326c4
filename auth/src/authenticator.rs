use std::sync::OnceLock;

use crate::header;
use crate::header::AuthError;
use crate::jwt::Identity;
use crate::jwt::TokenClaims;
use crate::jwt::TokenError;
use crate::jwt::TokenService;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_service: TokenService,
    decoy_hash: OnceLock<String>,
}

const DECOY_PASSWORD: &str = "decoy-password-never-assigned";

/// Result of successful authentication.
pub struct AuthenticationResult {
    /// Signed session token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `password_hasher` - Hasher used for new passwords
    /// * `token_service` - Issues and verifies session tokens
    pub fn new(password_hasher: PasswordHasher, token_service: TokenService) -> Self {
        Self {
            password_hasher,
            token_service,
            decoy_hash: OnceLock::new(),
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `InvalidInput` - Password is empty
    /// * `HashingFailed` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Reject a login for which no account exists.
    ///
    /// Runs one full verification against a fixed hash built with the same cost
    /// parameters, so the rejection takes as long as a wrong password does.
    pub fn reject_unknown(&self, password: &str) -> AuthenticationError {
        let decoy = self
            .decoy_hash
            .get_or_init(|| self.password_hasher.hash(DECOY_PASSWORD).unwrap_or_default());
        if !decoy.is_empty() {
            let _ = self.password_hasher.verify(password, decoy);
        }

        AuthenticationError::InvalidCredentials
    }

    /// Verify credentials and issue a session token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `identity` - Identity to embed in the token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is malformed
    /// * `TokenError` - Token signing failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        identity: &Identity,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let is_valid = self.password_hasher.verify(password, stored_hash)?;

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.token_service.issue(identity)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Issue a token without password verification.
    pub fn generate_token(&self, identity: &Identity) -> Result<String, TokenError> {
        self.token_service.issue(identity)
    }

    /// Verify a token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.token_service.verify(token)
    }

    /// Extract a token from request headers and verify it.
    ///
    /// # Arguments
    /// * `token_header` - Value of the custom token header, if present
    /// * `authorization` - Value of the `Authorization` header, if present
    pub fn authorize(
        &self,
        token_header: Option<&str>,
        authorization: Option<&str>,
    ) -> Result<TokenClaims, AuthError> {
        header::authorize(&self.token_service, token_header, authorization)
    }
}
