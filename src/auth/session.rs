//! Reports who is signed in.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
};

/// The state needed to look up the signed-in user.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Return the user that owns the current session.
///
/// A session for a user that no longer exists is treated as no session.
pub async fn get_session(
    State(state): State<SessionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(user) => Ok(Json(json!({ "user": user }))),
        Err(Error::NotFound) => Err(Error::NotAuthenticated),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod session_tests {
    use axum::{
        Extension,
        extract::{FromRef, State},
        response::IntoResponse,
    };

    use crate::{
        Error,
        auth::{
            UserID,
            session::{SessionState, get_session},
        },
        test_utils::{TEST_EMAIL, create_test_user, get_test_app_state, parse_json_body},
    };

    #[tokio::test]
    async fn returns_signed_in_user() {
        let state = SessionState::from_ref(&get_test_app_state());
        let user = create_test_user(&state.db_connection.lock().unwrap());

        let response = get_session(State(state), Extension(user.id))
            .await
            .unwrap()
            .into_response();

        let body = parse_json_body(response).await;
        assert_eq!(body["user"]["id"], user.id.as_i64());
        assert_eq!(body["user"]["email"], TEST_EMAIL);
    }

    #[tokio::test]
    async fn deleted_user_is_not_authenticated() {
        let state = SessionState::from_ref(&get_test_app_state());

        let result = get_session(State(state), Extension(UserID::new(999))).await;

        assert!(matches!(result, Err(Error::NotAuthenticated)));
    }
}
