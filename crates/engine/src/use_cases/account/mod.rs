//! Account use cases: registration, login and session tokens.

use std::sync::Arc;

use emberhall_domain::DomainError;

use crate::infrastructure::ports::RepoError;

mod login;
mod register;

pub use login::{Login, Logout, ValidateSession};
pub use register::Register;

/// How long a login stays valid.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(#[from] DomainError),
    #[error("Username already exists")]
    UsernameTaken,
    #[error("User not found")]
    UnknownUser,
    #[error("Incorrect password")]
    WrongPassword,
    #[error("Invalid or expired session")]
    InvalidSession,
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Container for account use cases.
pub struct AccountUseCases {
    pub register: Arc<Register>,
    pub login: Arc<Login>,
    pub logout: Arc<Logout>,
    pub validate: Arc<ValidateSession>,
}

impl AccountUseCases {
    pub fn new(
        register: Arc<Register>,
        login: Arc<Login>,
        logout: Arc<Logout>,
        validate: Arc<ValidateSession>,
    ) -> Self {
        Self {
            register,
            login,
            logout,
            validate,
        }
    }
}
