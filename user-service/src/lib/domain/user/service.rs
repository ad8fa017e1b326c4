use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;

use crate::domain::user::hashing::HashingPool;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::LoginOutcome;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChanges;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
    hashing_pool: HashingPool,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    /// * `hashing_pool` - Bounded pool that runs password work off the async workers
    pub fn new(
        repository: Arc<UR>,
        authenticator: Arc<Authenticator>,
        hashing_pool: HashingPool,
    ) -> Self {
        Self {
            repository,
            authenticator,
            hashing_pool,
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, UserError> {
        let authenticator = Arc::clone(&self.authenticator);
        let hash = self
            .hashing_pool
            .run(move || authenticator.hash_password(&password))
            .await??;
        Ok(hash)
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn register_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(UserError::EmailAlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        let password_hash = self.hash_password(command.password).await?;

        let user = self
            .repository
            .create(NewUser {
                name: command.name,
                email: command.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    async fn authenticate(&self, command: LoginCommand) -> Result<LoginOutcome, UserError> {
        let Some(user) = self.repository.find_by_email(&command.email).await? else {
            let authenticator = Arc::clone(&self.authenticator);
            let password = command.password;
            let rejection = self
                .hashing_pool
                .run(move || authenticator.reject_unknown(&password))
                .await?;
            tracing::debug!("Login rejected: unknown email");
            return Err(UserError::from(rejection));
        };

        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let stored_hash = user.password_hash.clone();
        let identity = user.identity();

        let result = self
            .hashing_pool
            .run(move || authenticator.authenticate(&password, &stored_hash, &identity))
            .await?
            .map_err(|e| {
                tracing::debug!(user_id = %user.id, "Login rejected: {}", e);
                UserError::from(e)
            })?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            token: result.access_token,
        })
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.repository.list_all().await
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<(), UserError> {
        let password_hash = match command.password {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };

        let changes = UserChanges {
            name: command.name,
            email: command.email,
            password_hash,
        };

        // Nothing to write; still report a missing user.
        if changes.is_empty() {
            return self.get_user(id).await.map(|_| ());
        }

        let rows_affected = self.repository.update(id, changes).await?;
        if rows_affected == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        tracing::info!(user_id = %id, "User updated");

        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        let rows_affected = self.repository.delete(id).await?;
        if rows_affected == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }
}
