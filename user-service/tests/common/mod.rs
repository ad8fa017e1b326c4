use std::sync::Arc;

use auth::Authenticator;
use auth::Identity;
use auth::IssueOptions;
use auth::KeyMaterial;
use auth::PasswordHasher;
use auth::SigningAlgorithm;
use auth::TokenService;
use auth::TokenSettings;
use axum::http::HeaderName;
use serde_json::json;
use serde_json::Value;
use user_service::domain::user::hashing::HashingPool;
use user_service::domain::user::service::UserService;
use user_service::inbound::http::router::create_router;
use user_service::outbound::repositories::InMemoryUserRepository;

const RSA_PRIVATE_KEY: &[u8] = include_bytes!("../../../fixtures/keys/rsa_private.pem");
const RSA_PUBLIC_KEY: &[u8] = include_bytes!("../../../fixtures/keys/rsa_public.pem");
const RSA_OTHER_PRIVATE_KEY: &[u8] =
    include_bytes!("../../../fixtures/keys/rsa_other_private.pem");
const RSA_OTHER_PUBLIC_KEY: &[u8] = include_bytes!("../../../fixtures/keys/rsa_other_public.pem");

pub const TOKEN_HEADER: &str = "x-token";

/// Test application that spawns a real server backed by the in-memory store
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub token_service: TokenService,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let keys = KeyMaterial::from_pem(SigningAlgorithm::Rs256, RSA_PRIVATE_KEY, RSA_PUBLIC_KEY)
            .expect("Failed to load test keys");
        let token_service = TokenService::new(keys, TokenSettings::default());

        // Minimum Argon2 cost keeps the suite fast.
        let password_hasher =
            PasswordHasher::with_params(8, 1, 1).expect("Failed to build password hasher");
        let authenticator = Arc::new(Authenticator::new(password_hasher, token_service.clone()));

        let user_repository = Arc::new(InMemoryUserRepository::new());
        let user_service = Arc::new(UserService::new(
            user_repository,
            Arc::clone(&authenticator),
            HashingPool::new(2),
        ));

        let router = create_router(
            user_service,
            authenticator,
            HeaderName::from_static(TOKEN_HEADER),
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            token_service,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with the custom token header
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).header(TOKEN_HEADER, token)
    }

    /// Helper to make PUT request with the custom token header
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(&format!("{}{}", self.address, path))
            .header(TOKEN_HEADER, token)
    }

    /// Helper to make DELETE request with the custom token header
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .header(TOKEN_HEADER, token)
    }

    /// Register a user and return the response body
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Value {
        let response = self
            .post("/api/users/register")
            .json(&json!({
                "name": name,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the session token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/users/login")
            .json(&json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }

    /// Register a user and log in, returning the user id and a session token
    pub async fn register_and_login(&self, name: &str, email: &str, password: &str) -> (i64, String) {
        let body = self.register(name, email, password).await;
        let id = body["data"]["id"].as_i64().expect("Missing user id");
        (id, self.login(email, password).await)
    }

    /// Token for `identity` that expired a second ago
    pub fn expired_token(&self, identity: &Identity) -> String {
        self.token_service
            .issue_with(
                identity,
                &IssueOptions::default().expires_in(chrono::Duration::seconds(-1)),
            )
            .expect("Failed to issue token")
    }

    /// Token signed by a key pair the server does not trust
    pub fn foreign_token(&self, identity: &Identity) -> String {
        let keys = KeyMaterial::from_pem(
            SigningAlgorithm::Rs256,
            RSA_OTHER_PRIVATE_KEY,
            RSA_OTHER_PUBLIC_KEY,
        )
        .expect("Failed to load other test keys");
        TokenService::new(keys, TokenSettings::default())
            .issue(identity)
            .expect("Failed to issue token")
    }
}
