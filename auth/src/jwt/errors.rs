use jsonwebtoken::errors::Error as JwtLibError;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

/// Error type for token issuance and verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token is expired")]
    Expired,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token claim mismatch: {0}")]
    ClaimMismatch(String),

    #[error("Failed to sign token: {0}")]
    SigningFailed(String),
}

impl From<JwtLibError> for TokenError {
    fn from(err: JwtLibError) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer => TokenError::ClaimMismatch("issuer".to_string()),
            ErrorKind::InvalidAudience => TokenError::ClaimMismatch("audience".to_string()),
            ErrorKind::InvalidSubject => TokenError::ClaimMismatch("subject".to_string()),
            ErrorKind::ImmatureSignature => TokenError::ClaimMismatch("not before".to_string()),
            ErrorKind::MissingRequiredClaim(claim) => {
                TokenError::Malformed(format!("missing required claim '{}'", claim))
            }
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}
