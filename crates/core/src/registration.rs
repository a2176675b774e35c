//! Credentials and sign-up form validation.

use serde::Serialize;

use crate::error::{DomainError, DomainResult};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Username/password pair exchanged for a token pair.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Raw sign-up form input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Check the form locally and produce the credentials to submit.
    ///
    /// The first failing rule wins, in the order a user fills the form.
    pub fn validate(&self) -> DomainResult<Credentials> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("Username is required."));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        if self.password != self.confirm_password {
            return Err(DomainError::validation("Passwords do not match."));
        }

        Ok(Credentials::new(username, self.password.clone()))
    }
}
