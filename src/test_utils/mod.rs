#![allow(missing_docs)]

use axum::{body::Body, response::Response};
use rusqlite::Connection;

use crate::{
    AppState,
    auth::{PasswordHash, User, ValidatedPassword, create_user, parse_email},
    db::initialize,
    pagination::PaginationConfig,
};

pub(crate) const TEST_EMAIL: &str = "test@test.com";
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// Cheap hashing so that tests which create users stay fast.
const TEST_BCRYPT_COST: u32 = 4;

/// An in-memory database with all the application tables.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    initialize(&connection).unwrap();
    connection
}

pub(crate) fn get_test_app_state() -> AppState {
    AppState::new(
        Connection::open_in_memory().unwrap(),
        "42",
        "Etc/UTC",
        PaginationConfig::default(),
    )
    .unwrap()
}

#[track_caller]
pub(crate) fn create_test_user(connection: &Connection) -> User {
    create_user_with_email(TEST_EMAIL, connection)
}

/// A user that is not the one from [create_test_user], for ownership tests.
#[track_caller]
pub(crate) fn create_second_user(connection: &Connection) -> User {
    create_user_with_email("other@test.com", connection)
}

#[track_caller]
fn create_user_with_email(email: &str, connection: &Connection) -> User {
    create_user(
        &parse_email(email).unwrap(),
        "Test User",
        PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), TEST_BCRYPT_COST)
            .unwrap(),
        connection,
    )
    .unwrap()
}

pub(crate) async fn parse_json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    serde_json::from_slice(&body).unwrap()
}
