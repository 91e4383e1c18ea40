//! Login, logout and session validation.

use std::sync::Arc;

use chrono::Duration;

use emberhall_domain::{DomainError, Session};

use super::{AccountError, SESSION_TTL_HOURS};
use crate::infrastructure::password::verify_password;
use crate::infrastructure::ports::{ClockPort, RandomPort, SessionRepo, UserRepo};

pub struct Login {
    users: Arc<dyn UserRepo>,
    sessions: Arc<dyn SessionRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl Login {
    pub fn new(
        users: Arc<dyn UserRepo>,
        sessions: Arc<dyn SessionRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            users,
            sessions,
            clock,
            random,
        }
    }

    /// Check the password and open a new session.
    pub async fn execute(&self, username: &str, password: &str) -> Result<Session, AccountError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(DomainError::validation("Username and password are required").into());
        }

        let account = self
            .users
            .get(username)
            .await?
            .ok_or(AccountError::UnknownUser)?;

        if !verify_password(password, &account.password_hash) {
            tracing::info!(username, "Login rejected: wrong password");
            return Err(AccountError::WrongPassword);
        }

        let now = self.clock.now();
        self.users.record_login(username, now).await?;

        let session = Session {
            token: self.random.gen_token(),
            username: account.username,
            created_at: now,
            expires_at: now + Duration::hours(SESSION_TTL_HOURS),
        };
        self.sessions.save(&session).await?;

        tracing::info!(username = %session.username, "User logged in");
        Ok(session)
    }
}

pub struct Logout {
    sessions: Arc<dyn SessionRepo>,
}

impl Logout {
    pub fn new(sessions: Arc<dyn SessionRepo>) -> Self {
        Self { sessions }
    }

    pub async fn execute(&self, token: &str) -> Result<(), AccountError> {
        self.sessions.delete(token).await?;
        Ok(())
    }
}

/// Resolves a session token to its username.
pub struct ValidateSession {
    sessions: Arc<dyn SessionRepo>,
    clock: Arc<dyn ClockPort>,
}

impl ValidateSession {
    pub fn new(sessions: Arc<dyn SessionRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { sessions, clock }
    }

    /// Expired sessions are deleted on sight.
    pub async fn execute(&self, token: &str) -> Result<String, AccountError> {
        if token.is_empty() {
            return Err(AccountError::InvalidSession);
        }

        let session = self
            .sessions
            .get(token)
            .await?
            .ok_or(AccountError::InvalidSession)?;

        if session.is_expired(self.clock.now()) {
            tracing::debug!(username = %session.username, "Session expired");
            self.sessions.delete(token).await?;
            return Err(AccountError::InvalidSession);
        }

        Ok(session.username)
    }
}
