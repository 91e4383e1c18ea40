//! Session authentication for HTTP routes.
//!
//! Clients send the token returned by `/login` in the `X-Session-Token`
//! header.
//!
//! ```rust,ignore
//! async fn handler(user: AuthUser) -> String {
//!     format!("Hello, {}", user.username)
//! }
//! ```

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;
use crate::app::App;

pub const SESSION_HEADER: &str = "X-Session-Token";

/// A caller whose session token was validated.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub token: String,
}

impl FromRequestParts<Arc<App>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        app: &Arc<App>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

        let username = app.use_cases.account.validate.execute(&token).await?;
        Ok(AuthUser { username, token })
    }
}
