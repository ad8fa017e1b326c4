use auth::AuthError;
use auth::TokenClaims;
use auth::TokenError;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderName;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Verified identity of the caller, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

impl From<TokenClaims> for AuthenticatedUser {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: UserId(claims.uid),
            name: claims.name,
            email: claims.email,
        }
    }
}

/// Middleware that verifies the session token and adds the caller to request extensions.
///
/// The token is read from the configured custom header first, then from
/// `Authorization: Bearer`. Clients only ever see "No token provided" or "Invalid token".
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = custom_token_header(&req, &state.token_header)
        .and_then(|token_header| {
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok());
            state.authenticator.authorize(token_header, authorization)
        })
        .map_err(|e| {
            match &e {
                AuthError::MissingToken => tracing::debug!("Request without token rejected"),
                AuthError::InvalidToken(reason) => {
                    tracing::warn!(reason = %reason, "Token verification failed")
                }
            }
            ApiError::Unauthorized(e.to_string())
        })?;

    req.extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(req).await)
}

/// A custom header that is present but not readable as text is an invalid token, never
/// a reason to fall back to `Authorization`.
fn custom_token_header<'a>(
    req: &'a Request,
    name: &HeaderName,
) -> Result<Option<&'a str>, AuthError> {
    req.headers()
        .get(name)
        .map(|value| {
            value.to_str().map_err(|_| {
                AuthError::InvalidToken(TokenError::Malformed(
                    "token header is not valid text".to_string(),
                ))
            })
        })
        .transpose()
}
