use serde::Deserialize;
use serde::Serialize;

/// The identity a token is minted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: i64,
    pub display_name: String,
    pub email: String,
}

impl Identity {
    pub fn new(subject_id: i64, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject_id,
            display_name: display_name.into(),
            email: email.into(),
        }
    }
}

/// Claims carried by a session token.
///
/// Signed, not encrypted: anything placed here is readable by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user identifier)
    pub uid: i64,

    /// Display name
    pub name: String,

    pub email: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    pub fn subject_id(&self) -> i64 {
        self.uid
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.uid, self.name.clone(), self.email.clone())
    }

    /// Check if token is expired.
    ///
    /// The expiry instant itself already counts as expired, so a zero lifetime
    /// never yields a usable token.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }
}
