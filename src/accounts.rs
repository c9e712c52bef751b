//! Registration and login against the `users` table.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{info, warn};

use crate::{
    auth::{hash_password, verify_password, SessionUser},
    entity::user,
    error::AppError,
};

/// Registration: password and confirmation differ.
pub const PASSWORDS_DO_NOT_MATCH: &str = "passwords do not match";
/// Registration: the username already belongs to an account.
pub const USERNAME_TAKEN: &str = "username taken";
/// Login: no account has this username.
pub const USERNAME_NOT_FOUND: &str = "username not found";
/// Login: the password does not match.
pub const INCORRECT_PASSWORD: &str = "incorrect password";

/// Creates an account and returns the identity to sign in with.
///
/// Nothing is written unless every check passes. The username check and the
/// insert share one transaction; the row is re-read after commit to obtain
/// its generated id.
pub async fn register(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<SessionUser, AppError> {
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation("username and password are required".into()));
    }
    if password != confirm {
        return Err(AppError::Validation(PASSWORDS_DO_NOT_MATCH.into()));
    }

    let password_hash = hash_password(password)?;
    let txn = db.begin().await?;

    if find_by_username(&txn, username).await?.is_some() {
        txn.rollback().await?;
        return Err(AppError::Conflict(USERNAME_TAKEN.into()));
    }

    // A concurrent registration can still win between the check and the insert.
    if let Err(e) = insert_user(&txn, username, &password_hash).await {
        txn.rollback().await?;
        return Err(e);
    }
    txn.commit().await?;

    let created = find_by_username(db, username)
        .await?
        .ok_or_else(|| AppError::Internal("registration failed".into()))?;

    info!(user_id = created.id, username, "registered new user");
    Ok(SessionUser {
        user_id: created.id,
        username: created.username,
    })
}

/// Checks credentials and returns the identity to sign in with.
pub async fn login(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<SessionUser, AppError> {
    let account = find_by_username(db, username)
        .await?
        .ok_or_else(|| AppError::NotFound(USERNAME_NOT_FOUND.into()))?;

    if !verify_password(password, &account.password)? {
        warn!(username, "rejected login with incorrect password");
        return Err(AppError::Auth(INCORRECT_PASSWORD.into()));
    }

    info!(user_id = account.id, username, "user logged in");
    Ok(SessionUser {
        user_id: account.id,
        username: account.username,
    })
}

async fn insert_user<C>(db: &C, username: &str, password_hash: &str) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    let new_user = user::ActiveModel {
        username: Set(username.to_owned()),
        password: Set(password_hash.to_owned()),
        ..Default::default()
    };
    user::Entity::insert(new_user)
        .exec_without_returning(db)
        .await
        .map(|_| ())
        .map_err(|e| AppError::conflict_on_duplicate(e, USERNAME_TAKEN))
}

async fn find_by_username<C>(db: &C, username: &str) -> Result<Option<user::Model>, AppError>
where
    C: ConnectionTrait,
{
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}
