use std::sync::Arc;

use anyhow::Context;
use auth::Authenticator;
use auth::KeyMaterial;
use auth::KeySource;
use auth::TokenService;
use axum::http::HeaderName;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use user_service::config::Config;
use user_service::domain::user::hashing::HashingPool;
use user_service::domain::user::ports::UserServicePort;
use user_service::domain::user::service::UserService;
use user_service::inbound::http::router::create_router;
use user_service::outbound::repositories::InMemoryUserRepository;
use user_service::outbound::repositories::PostgresUserRepository;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "user-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        persistent = config.database.url.is_some(),
        algorithm = %config.jwt.algorithm,
        expiration_minutes = config.jwt.expiration_minutes,
        hashing_workers = config.hashing.worker_count(),
        "Configuration loaded"
    );

    // Missing or unusable keys are fatal: the service never starts without them.
    let key_source = config.jwt.key_source().context("Invalid signing key configuration")?;
    if let KeySource::SharedSecret(_) = key_source {
        tracing::warn!("Using legacy shared-secret (HS256) tokens; configure a key pair instead");
    }
    let keys = KeyMaterial::load(&key_source).context("Failed to load signing keys")?;
    tracing::info!(algorithm = %keys.algorithm(), "Signing keys loaded");

    let token_settings = config
        .jwt
        .token_settings()
        .context("Invalid token lifetime")?;
    let token_service = TokenService::new(keys, token_settings);
    let password_hasher = config
        .password
        .hasher()
        .context("Invalid password hashing parameters")?;
    let authenticator = Arc::new(Authenticator::new(password_hasher, token_service));

    let hashing_pool = HashingPool::new(config.hashing.worker_count());
    let token_header = HeaderName::try_from(config.jwt.token_header.as_str())
        .context("Invalid token header name")?;

    let user_service: Arc<dyn UserServicePort> = match &config.database.url {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
            Arc::new(UserService::new(
                user_repository,
                Arc::clone(&authenticator),
                hashing_pool,
            ))
        }
        None => {
            tracing::warn!("No database configured; users are kept in memory only");
            let user_repository = Arc::new(InMemoryUserRepository::new());
            Arc::new(UserService::new(
                user_repository,
                Arc::clone(&authenticator),
                hashing_pool,
            ))
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(user_service, authenticator, token_header);
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited");

    Ok(())
}
