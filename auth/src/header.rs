//! Token extraction and verification for protected requests.
//!
//! Transport-agnostic: callers hand over raw header values and get back either the
//! verified claims or an [`AuthError`] that deliberately hides why verification failed.

use thiserror::Error;

use crate::jwt::TokenClaims;
use crate::jwt::TokenError;
use crate::jwt::TokenService;

/// Custom header checked before `Authorization`.
pub const DEFAULT_TOKEN_HEADER: &str = "x-token";

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    /// The cause is kept for server-side logging only.
    #[error("Invalid token")]
    InvalidToken(#[source] TokenError),
}

/// Pick the token from the custom header, falling back to `Authorization: Bearer`.
///
/// # Errors
/// * `MissingToken` - Neither header carries a non-empty token
pub fn extract_token<'a>(
    token_header: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Result<&'a str, AuthError> {
    if let Some(token) = token_header.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token);
    }

    authorization
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Extract and verify a request token.
///
/// # Errors
/// * `MissingToken` - No token in either header
/// * `InvalidToken` - Any verification failure
pub fn authorize(
    tokens: &TokenService,
    token_header: Option<&str>,
    authorization: Option<&str>,
) -> Result<TokenClaims, AuthError> {
    let token = extract_token(token_header, authorization)?;
    tokens.verify(token).map_err(AuthError::InvalidToken)
}
