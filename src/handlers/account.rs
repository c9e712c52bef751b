use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use maud::Markup;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{
    accounts,
    auth::{sign_out, SessionUser},
    error::AppError,
    state::AppState,
    views,
};

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// `GET /`: landing page, aware of whether someone is signed in.
pub async fn index(session: Session) -> Result<Markup, AppError> {
    let user = SessionUser::current(&session).await?;
    Ok(views::index(user.as_ref()))
}

/// `GET /register`.
pub async fn register_form() -> Markup {
    views::register(None)
}

/// `POST /register`: creates the account and signs it in, or re-renders the form with the error.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match accounts::register(&state.db, &form.username, &form.password, &form.confirm).await {
        Ok(user) => {
            user.sign_in(&session).await?;
            Ok(Redirect::to("/search").into_response())
        }
        Err(e) if e.is_user_facing() => {
            Ok((e.status(), views::register(Some(&e.to_string()))).into_response())
        }
        Err(e) => Err(e),
    }
}

/// `GET /login`.
pub async fn login_form() -> Markup {
    views::login(None)
}

/// `POST /login`: signs in on matching credentials, or re-renders the form with the error.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match accounts::login(&state.db, &form.username, &form.password).await {
        Ok(user) => {
            user.sign_in(&session).await?;
            Ok(Redirect::to("/search").into_response())
        }
        Err(e) if e.is_user_facing() => {
            Ok((e.status(), views::login(Some(&e.to_string()))).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Without a session this only redirects home.
pub async fn logout(session: Session) -> Result<Response, AppError> {
    let Some(user) = SessionUser::current(&session).await? else {
        return Ok(Redirect::to("/").into_response());
    };

    sign_out(&session).await?;
    info!(user_id = user.user_id, "user logged out");
    Ok(views::logged_out().into_response())
}
