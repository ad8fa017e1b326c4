//! Structural validation of registration, login and update input.
//!
//! Validators never short-circuit: every violated rule contributes one message, and
//! messages always come out in field order (name, email, password).

use std::str::FromStr;

use email_address::EmailAddress;
use serde::Deserialize;

pub const NAME_REQUIRED: &str = "name is required";
pub const EMAIL_REQUIRED: &str = "email is required";
pub const EMAIL_INVALID: &str = "email is not valid";
pub const PASSWORD_REQUIRED: &str = "password is required";

/// Raw user input as received from a client. Absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CredentialInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CredentialInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// Ordered list of human-readable violations. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    fn push(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

/// Every field is required.
pub fn validate_for_create(input: &CredentialInput) -> ValidationResult {
    validate(input, false)
}

/// Only fields present in `input` are checked.
pub fn validate_for_update(input: &CredentialInput) -> ValidationResult {
    validate(input, true)
}

/// Email and password must be present. The email shape is not checked, so a
/// login attempt never learns more than "bad credentials".
pub fn validate_for_login(input: &CredentialInput) -> ValidationResult {
    let mut result = ValidationResult::default();

    if is_blank(input.email.as_deref()) {
        result.push(EMAIL_REQUIRED);
    }
    if is_blank(input.password.as_deref()) {
        result.push(PASSWORD_REQUIRED);
    }

    result
}

fn validate(input: &CredentialInput, partial: bool) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !partial || input.name.is_some() {
        if is_blank(input.name.as_deref()) {
            result.push(NAME_REQUIRED);
        }
    }

    if !partial || input.email.is_some() {
        match input.email.as_deref() {
            email if is_blank(email) => result.push(EMAIL_REQUIRED),
            Some(email) if !is_email_shaped(email) => result.push(EMAIL_INVALID),
            _ => {}
        }
    }

    if !partial || input.password.is_some() {
        if is_blank(input.password.as_deref()) {
            result.push(PASSWORD_REQUIRED);
        }
    }

    result
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// `local@domain.tld`: an RFC 5322 address without display text whose domain has a
/// dot with at least one character on each side.
pub fn is_email_shaped(email: &str) -> bool {
    if email.contains(['<', '>']) || email.chars().any(char::is_whitespace) {
        return false;
    }

    match EmailAddress::from_str(email) {
        Ok(address) => {
            let domain = address.domain();
            domain
                .char_indices()
                .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
        }
        Err(_) => false,
    }
}
