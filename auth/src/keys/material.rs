use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::KeyLoadError;

/// Token signature algorithm.
///
/// `Hs256` is the legacy shared-secret variant and only exists for compatibility with
/// tokens minted by older deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[default]
    #[serde(rename = "RS256")]
    Rs256,

    #[serde(rename = "EdDSA")]
    EdDsa,

    #[serde(rename = "HS256")]
    Hs256,
}

impl SigningAlgorithm {
    pub fn is_asymmetric(self) -> bool {
        !matches!(self, SigningAlgorithm::Hs256)
    }
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(algorithm: SigningAlgorithm) -> Self {
        match algorithm {
            SigningAlgorithm::Rs256 => Algorithm::RS256,
            SigningAlgorithm::EdDsa => Algorithm::EdDSA,
            SigningAlgorithm::Hs256 => Algorithm::HS256,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SigningAlgorithm::Rs256 => "RS256",
            SigningAlgorithm::EdDsa => "EdDSA",
            SigningAlgorithm::Hs256 => "HS256",
        };
        f.write_str(name)
    }
}

/// Where signing keys come from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// PEM-encoded asymmetric key pair on disk.
    PemFiles {
        algorithm: SigningAlgorithm,
        private_key_path: PathBuf,
        public_key_path: PathBuf,
    },

    /// Legacy shared secret (HS256).
    SharedSecret(String),
}

impl KeySource {
    /// Pick the key source from optional configuration values.
    ///
    /// Exactly one of {private + public key paths, shared secret} must be present.
    ///
    /// # Errors
    /// * `NotConfigured` - Neither source is configured
    /// * `Ambiguous` - Both sources are configured
    /// * `Malformed` - Only one half of the key pair is configured, or the algorithm
    ///   does not match the source
    pub fn resolve(
        algorithm: SigningAlgorithm,
        private_key_path: Option<PathBuf>,
        public_key_path: Option<PathBuf>,
        secret: Option<String>,
    ) -> Result<Self, KeyLoadError> {
        let secret = secret.filter(|s| !s.is_empty());

        match (private_key_path, public_key_path, secret) {
            (None, None, None) => Err(KeyLoadError::NotConfigured),
            (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => Err(KeyLoadError::Ambiguous),
            (None, None, Some(secret)) => {
                if algorithm.is_asymmetric() {
                    return Err(KeyLoadError::Malformed(format!(
                        "{} requires a key pair, but only a shared secret is configured",
                        algorithm
                    )));
                }
                Ok(KeySource::SharedSecret(secret))
            }
            (Some(private_key_path), Some(public_key_path), None) => {
                if !algorithm.is_asymmetric() {
                    return Err(KeyLoadError::Malformed(
                        "HS256 requires a shared secret, but a key pair is configured".to_string(),
                    ));
                }
                Ok(KeySource::PemFiles {
                    algorithm,
                    private_key_path,
                    public_key_path,
                })
            }
            (Some(_), None, None) => Err(KeyLoadError::Malformed(
                "private key path is set but public key path is missing".to_string(),
            )),
            (None, Some(_), None) => Err(KeyLoadError::Malformed(
                "public key path is set but private key path is missing".to_string(),
            )),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::PemFiles {
                algorithm,
                private_key_path,
                public_key_path,
            } => f
                .debug_struct("PemFiles")
                .field("algorithm", algorithm)
                .field("private_key_path", private_key_path)
                .field("public_key_path", public_key_path)
                .finish(),
            KeySource::SharedSecret(_) => f.write_str("SharedSecret(<redacted>)"),
        }
    }
}

/// Signing and verification keys, loaded once and immutable afterwards.
#[derive(Clone)]
pub struct KeyMaterial {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl KeyMaterial {
    /// Load key material from a configured source.
    pub fn load(source: &KeySource) -> Result<Self, KeyLoadError> {
        match source {
            KeySource::PemFiles {
                algorithm,
                private_key_path,
                public_key_path,
            } => Self::from_pem_files(*algorithm, private_key_path, public_key_path),
            KeySource::SharedSecret(secret) => Self::shared_secret(secret.as_bytes()),
        }
    }

    /// Read a PEM key pair from disk.
    pub fn from_pem_files(
        algorithm: SigningAlgorithm,
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> Result<Self, KeyLoadError> {
        let private_pem = read_key_file(private_key_path)?;
        let public_pem = read_key_file(public_key_path)?;
        Self::from_pem(algorithm, &private_pem, &public_pem)
    }

    /// Build key material from an in-memory PEM key pair.
    ///
    /// The pair is checked by signing and verifying a probe token, so a private key
    /// paired with the wrong public key fails here instead of at request time.
    ///
    /// # Errors
    /// * `Malformed` - PEM cannot be parsed for the algorithm, or the algorithm is HS256
    /// * `Mismatch` - The public key does not verify signatures of the private key
    pub fn from_pem(
        algorithm: SigningAlgorithm,
        private_pem: &[u8],
        public_pem: &[u8],
    ) -> Result<Self, KeyLoadError> {
        let (encoding_key, decoding_key) = match algorithm {
            SigningAlgorithm::Rs256 => (
                EncodingKey::from_rsa_pem(private_pem),
                DecodingKey::from_rsa_pem(public_pem),
            ),
            SigningAlgorithm::EdDsa => (
                EncodingKey::from_ed_pem(private_pem),
                DecodingKey::from_ed_pem(public_pem),
            ),
            SigningAlgorithm::Hs256 => {
                return Err(KeyLoadError::Malformed(
                    "HS256 keys are shared secrets, not PEM pairs".to_string(),
                ))
            }
        };

        let material = Self {
            algorithm,
            encoding_key: encoding_key
                .map_err(|e| KeyLoadError::Malformed(format!("private key: {}", e)))?,
            decoding_key: decoding_key
                .map_err(|e| KeyLoadError::Malformed(format!("public key: {}", e)))?,
        };
        material.probe()?;

        Ok(material)
    }

    /// Build legacy HS256 key material from a shared secret.
    ///
    /// # Errors
    /// * `Malformed` - Secret is empty
    pub fn shared_secret(secret: &[u8]) -> Result<Self, KeyLoadError> {
        if secret.is_empty() {
            return Err(KeyLoadError::Malformed(
                "shared secret must not be empty".to_string(),
            ));
        }

        Ok(Self {
            algorithm: SigningAlgorithm::Hs256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn is_asymmetric(&self) -> bool {
        self.algorithm.is_asymmetric()
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    fn probe(&self) -> Result<(), KeyLoadError> {
        #[derive(Serialize, Deserialize)]
        struct Probe {
            probe: bool,
        }

        let algorithm = Algorithm::from(self.algorithm);
        let token = encode(
            &Header::new(algorithm),
            &Probe { probe: true },
            &self.encoding_key,
        )
        .map_err(|e| KeyLoadError::Malformed(format!("private key cannot sign: {}", e)))?;

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Probe>(&token, &self.decoding_key, &validation)
            .map(|_| ())
            .map_err(|e| KeyLoadError::Mismatch(e.to_string()))
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>, KeyLoadError> {
    fs::read(path).map_err(|source| KeyLoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}
