use std::env;
use std::fmt;
use std::path::PathBuf;

use auth::jwt::service::DEFAULT_AUDIENCE;
use auth::jwt::service::DEFAULT_ISSUER;
use auth::KeyLoadError;
use auth::KeySource;
use auth::PasswordError;
use auth::PasswordHasher;
use auth::SigningAlgorithm;
use auth::TokenSettings;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Without a `url` the service runs on the in-memory store.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    #[serde(default)]
    pub algorithm: SigningAlgorithm,
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: Option<PathBuf>,
    pub secret: Option<String>,
    #[serde(default = "default_expiration_minutes")]
    pub expiration_minutes: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_token_header")]
    pub token_header: String,
}

impl JwtConfig {
    /// Resolve where signing keys come from.
    ///
    /// # Errors
    /// * `NotConfigured` - Neither key pair paths nor a secret are set
    /// * `Ambiguous` - Both are set
    /// * `Malformed` - Half a key pair, or an algorithm that does not fit the source
    pub fn key_source(&self) -> Result<KeySource, KeyLoadError> {
        KeySource::resolve(
            self.algorithm,
            self.private_key_path.clone(),
            self.public_key_path.clone(),
            self.secret.clone(),
        )
    }

    /// # Errors
    /// * `Message` - `expiration_minutes` is not positive or is too large
    pub fn token_settings(&self) -> Result<TokenSettings, ConfigError> {
        let expires_in = Some(self.expiration_minutes)
            .filter(|minutes| *minutes > 0)
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "jwt.expiration_minutes must be a positive number of minutes, got {}",
                    self.expiration_minutes
                ))
            })?;

        Ok(TokenSettings {
            expires_in,
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        })
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("private_key_path", &self.private_key_path)
            .field("public_key_path", &self.public_key_path)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("expiration_minutes", &self.expiration_minutes)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("token_header", &self.token_header)
            .finish()
    }
}

/// Argon2id cost parameters. Defaults match the library defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    #[serde(default = "default_memory_cost_kib")]
    pub memory_cost_kib: u32,
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: default_memory_cost_kib(),
            time_cost: default_time_cost(),
            parallelism: default_parallelism(),
        }
    }
}

impl PasswordConfig {
    pub fn hasher(&self) -> Result<PasswordHasher, PasswordError> {
        PasswordHasher::with_params(self.memory_cost_kib, self.time_cost, self.parallelism)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HashingConfig {
    pub workers: Option<usize>,
}

impl HashingConfig {
    /// Configured worker count, or one per CPU core.
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|workers| *workers > 0)
            .unwrap_or_else(num_cpus::get)
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_expiration_minutes() -> i64 {
    240
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

fn default_token_header() -> String {
    auth::header::DEFAULT_TOKEN_HEADER.to_string()
}

fn default_memory_cost_kib() -> u32 {
    19 * 1024
}

fn default_time_cost() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__PRIVATE_KEY_PATH, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
