use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Identity;
use super::claims::TokenClaims;
use super::errors::TokenError;
use crate::keys::KeyMaterial;

pub const DEFAULT_ISSUER: &str = "user-service";
pub const DEFAULT_AUDIENCE: &str = "user-service-clients";

/// Service-wide token defaults.
///
/// `issuer` and `audience` are also the values every verified token must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSettings {
    pub expires_in: Duration,
    pub issuer: String,
    pub audience: String,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            expires_in: Duration::hours(4),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

/// Per-token overrides of [`TokenSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueOptions {
    pub expires_in: Option<Duration>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl IssueOptions {
    pub fn expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// Issues and verifies signed, time-limited session tokens.
///
/// Tokens are stateless JWTs: validity depends only on the signature, the
/// issuer/audience claims and the current time. There is no revocation.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: KeyMaterial,
    settings: TokenSettings,
}

impl TokenService {
    pub fn new(keys: KeyMaterial, settings: TokenSettings) -> Self {
        Self { keys, settings }
    }

    /// Issue a token for `identity` using the service defaults.
    ///
    /// # Errors
    /// * `SigningFailed` - The signing key rejected the operation
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_with(identity, &IssueOptions::default())
    }

    /// Issue a token with per-token overrides.
    pub fn issue_with(
        &self,
        identity: &Identity,
        options: &IssueOptions,
    ) -> Result<String, TokenError> {
        self.issue_at(identity, options, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    /// * `SigningFailed` - Signing failed, or `now` plus the lifetime is out of range
    pub fn issue_at(
        &self,
        identity: &Identity,
        options: &IssueOptions,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_in = options.expires_in.unwrap_or(self.settings.expires_in);
        let expires_at = now.checked_add_signed(expires_in).ok_or_else(|| {
            TokenError::SigningFailed("token lifetime is out of range".to_string())
        })?;

        let claims = TokenClaims {
            uid: identity.subject_id,
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            iss: options
                .issuer
                .clone()
                .unwrap_or_else(|| self.settings.issuer.clone()),
            aud: options
                .audience
                .clone()
                .unwrap_or_else(|| self.settings.audience.clone()),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let header = Header::new(self.algorithm());

        encode(&header, &claims, self.keys.encoding_key())
            .map_err(|e| TokenError::SigningFailed(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// * `SignatureInvalid` - Signature does not verify against the held key
    /// * `Expired` - The current time is at or past the `exp` claim
    /// * `Malformed` - Token cannot be parsed or lacks required claims
    /// * `ClaimMismatch` - Issuer or audience differ from the service settings
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm());
        // Expiry is checked below against `now` with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[self.settings.issuer.as_str()]);
        validation.set_audience(&[self.settings.audience.as_str()]);

        let token_data = decode::<TokenClaims>(token, self.keys.decoding_key(), &validation)?;
        let claims = token_data.claims;

        if claims.is_expired(now.timestamp()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn algorithm(&self) -> Algorithm {
        self.keys.algorithm().into()
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::*;
    use crate::keys::SigningAlgorithm;

    const RSA_PRIVATE: &[u8] = include_bytes!("../../../fixtures/keys/rsa_private.pem");
    const RSA_PUBLIC: &[u8] = include_bytes!("../../../fixtures/keys/rsa_public.pem");
    const RSA_OTHER_PRIVATE: &[u8] =
        include_bytes!("../../../fixtures/keys/rsa_other_private.pem");
    const RSA_OTHER_PUBLIC: &[u8] = include_bytes!("../../../fixtures/keys/rsa_other_public.pem");
    const ED_PRIVATE: &[u8] = include_bytes!("../../../fixtures/keys/ed25519_private.pem");
    const ED_PUBLIC: &[u8] = include_bytes!("../../../fixtures/keys/ed25519_public.pem");

    fn rsa_service() -> TokenService {
        let keys = KeyMaterial::from_pem(SigningAlgorithm::Rs256, RSA_PRIVATE, RSA_PUBLIC)
            .expect("Failed to load RSA keys");
        TokenService::new(keys, TokenSettings::default())
    }

    fn lilly() -> Identity {
        Identity::new(1, "Lilly", "lilly@example.com")
    }

    fn flip_signature_byte(token: &str) -> String {
        let (signed, signature) = token.rsplit_once('.').expect("token has three parts");
        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
        bytes[0] ^= 0x01;
        format!("{}.{}", signed, URL_SAFE_NO_PAD.encode(bytes))
    }

    #[test]
    fn test_issue_and_verify() {
        let service = rsa_service();

        let token = service.issue(&lilly()).expect("Failed to issue token");
        let claims = service.verify(&token).expect("Failed to verify token");

        assert_eq!(claims.subject_id(), 1);
        assert_eq!(claims.name, "Lilly");
        assert_eq!(claims.email, "lilly@example.com");
        assert_eq!(claims.iss, DEFAULT_ISSUER);
        assert_eq!(claims.aud, DEFAULT_AUDIENCE);
    }

    #[test]
    fn test_default_lifetime_is_four_hours() {
        let service = rsa_service();
        let now = Utc::now();

        let token = service
            .issue_at(&lilly(), &IssueOptions::default(), now)
            .unwrap();
        let claims = service.verify_at(&token, now).unwrap();

        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 4 * 60 * 60);
    }

    #[test]
    fn test_custom_lifetime() {
        let service = rsa_service();
        let options = IssueOptions::default().expires_in(Duration::minutes(15));

        let token = service.issue_with(&lilly(), &options).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_zero_or_negative_lifetime_is_expired_immediately() {
        let service = rsa_service();

        for seconds in [0, -1, -3600] {
            let options = IssueOptions::default().expires_in(Duration::seconds(seconds));
            let token = service.issue_with(&lilly(), &options).unwrap();
            assert_eq!(service.verify(&token), Err(TokenError::Expired));
        }
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let service = rsa_service();

        for days in [100_000_000, -100_000_000] {
            let options = IssueOptions::default().expires_in(Duration::days(days));
            let result = service.issue_with(&lilly(), &options);
            assert!(
                matches!(result, Err(TokenError::SigningFailed(_))),
                "{} days should be rejected",
                days
            );
        }
    }

    #[test]
    fn test_token_expires_after_lifetime() {
        let service = rsa_service();
        let issued = Utc::now() - Duration::hours(5);

        let token = service
            .issue_at(&lilly(), &IssueOptions::default(), issued)
            .unwrap();

        assert!(service
            .verify_at(&token, issued + Duration::hours(3))
            .is_ok());
        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_other_key_pair_fails_signature() {
        let issuer = rsa_service();
        let other_keys =
            KeyMaterial::from_pem(SigningAlgorithm::Rs256, RSA_OTHER_PRIVATE, RSA_OTHER_PUBLIC)
                .unwrap();
        let verifier = TokenService::new(other_keys, TokenSettings::default());

        let token = issuer.issue(&lilly()).unwrap();
        assert_eq!(verifier.verify(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_flipped_signature_fails() {
        let service = rsa_service();
        let token = service.issue(&lilly()).unwrap();

        let tampered = flip_signature_byte(&token);
        assert_eq!(service.verify(&tampered), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let service = rsa_service();
        let token = service.issue(&lilly()).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let mut payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        payload["uid"] = serde_json::json!(999);
        let forged_payload = URL_SAFE_NO_PAD.encode(payload.to_string());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(service.verify(&forged), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_malformed_token() {
        let service = rsa_service();

        for token in ["", "invalid", "invalid.token.here"] {
            assert!(matches!(
                service.verify(token),
                Err(TokenError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_issuer_and_audience_must_match() {
        let service = rsa_service();

        let wrong_issuer = service
            .issue_with(&lilly(), &IssueOptions::default().issuer("someone-else"))
            .unwrap();
        assert!(matches!(
            service.verify(&wrong_issuer),
            Err(TokenError::ClaimMismatch(_))
        ));

        let wrong_audience = service
            .issue_with(&lilly(), &IssueOptions::default().audience("other-clients"))
            .unwrap();
        assert!(matches!(
            service.verify(&wrong_audience),
            Err(TokenError::ClaimMismatch(_))
        ));
    }

    #[test]
    fn test_ed25519_round_trip() {
        let keys = KeyMaterial::from_pem(SigningAlgorithm::EdDsa, ED_PRIVATE, ED_PUBLIC).unwrap();
        let service = TokenService::new(keys, TokenSettings::default());

        let token = service.issue(&lilly()).unwrap();
        assert_eq!(service.verify(&token).unwrap().subject_id(), 1);
        assert_eq!(
            service.verify(&flip_signature_byte(&token)),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_legacy_shared_secret_round_trip() {
        let keys = KeyMaterial::shared_secret(b"legacy_secret_at_least_32_bytes_long!").unwrap();
        let service = TokenService::new(keys, TokenSettings::default());

        let token = service.issue(&lilly()).unwrap();
        assert_eq!(service.verify(&token).unwrap().identity(), lilly());

        let other = KeyMaterial::shared_secret(b"another_secret_at_least_32_bytes_lo").unwrap();
        let verifier = TokenService::new(other, TokenSettings::default());
        assert_eq!(verifier.verify(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_shared_secret_token_rejected_by_asymmetric_verifier() {
        let legacy = TokenService::new(
            KeyMaterial::shared_secret(b"legacy_secret_at_least_32_bytes_long!").unwrap(),
            TokenSettings::default(),
        );
        let token = legacy.issue(&lilly()).unwrap();

        assert_eq!(rsa_service().verify(&token), Err(TokenError::SignatureInvalid));
    }
}
