//! Signing in with an email and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        cookie::{REMEMBER_ME_COOKIE_DURATION, set_auth_cookie},
        get_user_by_email,
    },
    extract::ApiJson,
};

/// The state needed to sign in.
#[derive(Debug, Clone)]
pub struct SignInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SignInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SignInState> for Key {
    fn from_ref(state: &SignInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent to sign in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInData {
    pub email: String,
    pub password: String,
    /// Keep the session alive for a week instead of the default duration.
    #[serde(default)]
    pub remember_me: bool,
}

/// Handler for sign-in requests.
///
/// On success the auth cookie is set and the user is returned.
///
/// # Errors
///
/// Returns an [Error::InvalidCredentials] if the email is not registered or
/// the password is wrong, so that clients cannot tell the two cases apart.
pub async fn sign_in(
    State(state): State<SignInState>,
    jar: PrivateCookieJar,
    ApiJson(data): ApiJson<SignInData>,
) -> Result<Response, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(&data.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&data.password)? {
        tracing::info!("Failed sign in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };
    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    Ok((jar, Json(json!({ "user": user }))).into_response())
}
