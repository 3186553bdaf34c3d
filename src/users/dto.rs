use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::FieldError;
use crate::users::repo_types::birthday_format;

const USERNAME_MIN_LEN: usize = 5;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Body of `POST /users` and `PUT /users/:username`.
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    #[serde(alias = "Username", default)]
    pub username: String,
    #[serde(alias = "Password", default)]
    pub password: String,
    #[serde(alias = "Email", default)]
    pub email: String,
    #[serde(
        alias = "Birthday",
        with = "birthday_format::option",
        default
    )]
    pub birthday: Option<Date>,
}

impl UserPayload {
    /// Collects every failed rule instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.username.chars().count() < USERNAME_MIN_LEN {
            errors.push(FieldError {
                field: "username",
                message: "Username is required and must be at least 5 characters",
            });
        }
        if !self.username.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(FieldError {
                field: "username",
                message: "Username contains non alphanumeric characters - not allowed.",
            });
        }
        if self.password.is_empty() {
            errors.push(FieldError {
                field: "password",
                message: "Password is required",
            });
        }
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError {
                field: "email",
                message: "Email does not appear to be valid",
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Plain confirmation returned by delete and favorites endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
