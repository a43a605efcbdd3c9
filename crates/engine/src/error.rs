//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a record is not found in the store.
//! - [`ExistingKey`] thrown when registering an email already in use.
//! - [`NotAuthorized`] thrown when a session deletes an event it did not create.
//! - [`NoCurrentUser`] thrown when an operation needs a logged-in user.
//! - [`InsufficientFunds`] thrown when a purchase exceeds the GoPoints balance.
//! - [`InvalidCredentials`] thrown when the login email or password do not match.
//! - [`Database`] wraps errors from the underlying store.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`NotAuthorized`]: EngineError::NotAuthorized
//!  [`NoCurrentUser`]: EngineError::NoCurrentUser
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`InvalidCredentials`]: EngineError::InvalidCredentials
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Not authorized: {0}")]
    NotAuthorized(String),
    #[error("Current user not found")]
    NoCurrentUser,
    #[error("Insufficient GoPoints: {0}")]
    InsufficientFunds(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::NotAuthorized(a), Self::NotAuthorized(b)) => a == b,
            (Self::NoCurrentUser, Self::NoCurrentUser) => true,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            _ => false,
        }
    }
}
