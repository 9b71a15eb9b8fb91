use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::{AppError, ValidationError},
    signups::{
        dto::SignupRequest,
        repo::SignupStore,
        repo_types::{NewSignup, Signup},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Driver,
    Dispensary,
    Customer,
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "driver" => Ok(Role::Driver),
            "dispensary" => Ok(Role::Dispensary),
            "customer" => Ok(Role::Customer),
            _ => Err(ValidationError::InvalidRole),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Missing and empty values count as absent; anything else is checked as given.
fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// Checks fields in order (name, email, email shape, role) and stops at the
/// first failure. Email and role are checked untrimmed, so surrounding
/// whitespace fails the pattern or the enum. Stored values are trimmed and
/// role keeps the caller's casing.
pub fn validate(req: &SignupRequest) -> Result<NewSignup, ValidationError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ValidationError::NameRequired)?;
    let email = present(&req.email).ok_or(ValidationError::EmailRequired)?;
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    let role = match present(&req.role) {
        Some(role) => {
            role.parse::<Role>()?;
            Some(role.trim().to_string())
        }
        None => None,
    };

    Ok(NewSignup {
        name: name.to_string(),
        email: email.trim().to_string(),
        role,
    })
}

pub async fn create_signup(store: &dyn SignupStore, req: &SignupRequest) -> Result<Signup, AppError> {
    let new = validate(req)?;
    store.insert_unique(&new).await
}

pub async fn list_signups(store: &dyn SignupStore) -> Result<Vec<Signup>, AppError> {
    store.list_recent().await
}
