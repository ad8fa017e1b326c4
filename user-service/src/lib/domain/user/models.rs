use std::fmt;

use auth::credentials;
use auth::CredentialInput;
use auth::Identity;
use chrono::DateTime;
use chrono::Utc;

use crate::user::errors::EmailError;
use crate::user::errors::NameError;
use crate::user::errors::UserError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered user. The password hash never leaves the service:
/// `Debug` redacts it and response types leave it out.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub name: DisplayName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Identity carried in session tokens issued for this user.
    pub fn identity(&self) -> Identity {
        Identity::new(self.id.0, self.name.as_str(), self.email.as_str())
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// User unique identifier type. Assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl UserId {
    /// Parse a user ID from a path segment.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not an integer
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        s.trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| UserIdError::InvalidFormat(s.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Non-blank display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// # Errors
    /// * `Empty` - Name is empty or whitespace only
    pub fn new(name: String) -> Result<Self, NameError> {
        if name.trim().is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Accepts the same `local@domain.tld` shape as the credential validators, so a
/// command that passed validation always converts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// # Errors
    /// * `InvalidFormat` - Email is not `local@domain.tld` shaped
    pub fn new(email: String) -> Result<Self, EmailError> {
        if credentials::is_email_shaped(&email) {
            Ok(Self(email))
        } else {
            Err(EmailError::InvalidFormat(email))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// User to be inserted. The store assigns `id` and `created_at`.
#[derive(Clone)]
pub struct NewUser {
    pub name: DisplayName,
    pub email: EmailAddress,
    pub password_hash: String,
}

/// Partial update. `None` fields are left untouched.
#[derive(Clone, Default)]
pub struct UserChanges {
    pub name: Option<DisplayName>,
    pub email: Option<EmailAddress>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

/// Command to register a new user with domain types
#[derive(Debug)]
pub struct CreateUserCommand {
    pub name: DisplayName,
    pub email: EmailAddress,
    pub password: String,
}

impl CreateUserCommand {
    /// Validate raw input and convert it into a command.
    ///
    /// # Errors
    /// * `Validation` - One message per violated rule, in field order
    pub fn try_from_input(input: CredentialInput) -> Result<Self, UserError> {
        let result = credentials::validate_for_create(&input);
        if !result.is_valid() {
            return Err(UserError::Validation(result.into_errors()));
        }

        Ok(Self {
            name: DisplayName::new(input.name.unwrap_or_default())?,
            email: EmailAddress::new(input.email.unwrap_or_default())?,
            password: input.password.unwrap_or_default(),
        })
    }
}

/// Command to update an existing user with optional validated fields.
///
/// Only provided fields are validated and updated.
#[derive(Debug, Default)]
pub struct UpdateUserCommand {
    pub name: Option<DisplayName>,
    pub email: Option<EmailAddress>,
    pub password: Option<String>,
}

impl UpdateUserCommand {
    /// # Errors
    /// * `Validation` - A provided field is blank or malformed
    pub fn try_from_input(input: CredentialInput) -> Result<Self, UserError> {
        let result = credentials::validate_for_update(&input);
        if !result.is_valid() {
            return Err(UserError::Validation(result.into_errors()));
        }

        Ok(Self {
            name: input.name.map(DisplayName::new).transpose()?,
            email: input.email.map(EmailAddress::new).transpose()?,
            password: input.password,
        })
    }
}

/// Login attempt. Only presence is checked up front.
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl LoginCommand {
    /// # Errors
    /// * `Validation` - Email or password is missing
    pub fn try_from_input(input: CredentialInput) -> Result<Self, UserError> {
        let result = credentials::validate_for_login(&input);
        if !result.is_valid() {
            return Err(UserError::Validation(result.into_errors()));
        }

        Ok(Self {
            email: input.email.unwrap_or_default(),
            password: input.password.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Successful login: the user and a freshly issued session token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}
