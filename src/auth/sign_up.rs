//! Registration of new user accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
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
        PasswordHash, ValidatedPassword,
        cookie::{REMEMBER_ME_COOKIE_DURATION, set_auth_cookie},
        create_user,
        user::{parse_email, validate_user_name},
    },
    category::seed_default_categories,
    db::UserScope,
    extract::ApiJson,
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct SignUpState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SignUpState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SignUpState> for Key {
    fn from_ref(state: &SignUpState) -> Self {
        state.cookie_key.clone()
    }
}

/// The details needed to create an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpData {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Register a new user, seed their default categories and sign them in.
///
/// The user and their categories are created in a single SQL transaction so
/// that a new account is never left without its categories.
pub async fn sign_up(
    State(state): State<SignUpState>,
    jar: PrivateCookieJar,
    ApiJson(data): ApiJson<SignUpData>,
) -> Result<Response, Error> {
    let email = parse_email(&data.email)?;
    let name = validate_user_name(&data.name)?;
    let validated_password =
        ValidatedPassword::new(&data.password, &[email.as_str(), name.as_str()])?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let user = {
        let mut connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;
        let transaction = connection.transaction()?;

        let user = create_user(&email, &name, password_hash, &transaction)?;
        seed_default_categories(&UserScope::new(user.id, &transaction))?;

        transaction.commit()?;
        user
    };

    tracing::info!("Registered user {}", user.id);

    let cookie_duration = if data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };
    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    Ok((StatusCode::CREATED, jar, Json(json!({ "user": user }))).into_response())
}
