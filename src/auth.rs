//! Session identity and password hashing.
//!
//! The signed-in user lives in the session as a typed [`SessionUser`]. Its
//! presence is the only gate on protected routes: handlers that take a
//! `SessionUser` argument redirect anonymous visitors to the landing page.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::AppError;

const SESSION_USER_KEY: &str = "user";

/// The authenticated identity carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i32,
    pub username: String,
}

impl SessionUser {
    /// The signed-in user, if any.
    pub async fn current(session: &Session) -> Result<Option<Self>, AppError> {
        Ok(session.get(SESSION_USER_KEY).await?)
    }

    /// Binds this identity to the session under a fresh session id.
    pub async fn sign_in(self, session: &Session) -> Result<(), AppError> {
        session.cycle_id().await?;
        session.insert(SESSION_USER_KEY, self).await?;
        Ok(())
    }
}

/// Clears all session state and deletes the stored record.
pub async fn sign_out(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    Ok(())
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match SessionUser::current(&session).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(Redirect::to("/").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Hashes `password` with Argon2id and a random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Whether `password` matches a PHC hash produced by [`hash_password`].
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
