use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChanges;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user store for development and tests.
///
/// Ids are assigned from a counter starting at 1 and never reused. Email
/// uniqueness is enforced like the database constraint.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    last_id: i64,
    users: BTreeMap<UserId, User>,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|user| user.email.as_str() == email && Some(user.id) != except)
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut state = self.state.write().await;

        if state.email_taken(user.email.as_str(), None) {
            return Err(UserError::EmailAlreadyExists(
                user.email.as_str().to_string(),
            ));
        }

        state.last_id += 1;
        let created = User {
            id: UserId(state.last_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|user| user.email.as_str() == email)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update(&self, id: &UserId, changes: UserChanges) -> Result<u64, UserError> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(id) {
            return Ok(0);
        }

        if let Some(email) = &changes.email {
            if state.email_taken(email.as_str(), Some(*id)) {
                return Err(UserError::EmailAlreadyExists(email.as_str().to_string()));
            }
        }

        let Some(user) = state.users.get_mut(id) else {
            return Ok(0);
        };

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }

        Ok(1)
    }

    async fn delete(&self, id: &UserId) -> Result<u64, UserError> {
        let removed = self.state.write().await.users.remove(id);
        Ok(removed.map_or(0, |_| 1))
    }
}
