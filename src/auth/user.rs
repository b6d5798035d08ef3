//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The longest display name a user may have, in graphemes.
const MAX_NAME_LENGTH: usize = 100;

/// Check that a display name is not blank and not too long, returning the trimmed name.
pub fn validate_user_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::Validation("Name is required".to_owned()));
    }

    if name.graphemes(true).count() > MAX_NAME_LENGTH {
        return Err(Error::Validation(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    Ok(name.to_owned())
}

/// Parse an email address and normalise it to lower case.
pub fn parse_email(raw_email: &str) -> Result<EmailAddress, Error> {
    let email = raw_email.trim().to_lowercase();

    email
        .parse::<EmailAddress>()
        .map_err(|_| Error::Validation("Email address is not valid".to_owned()))
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    pub email: String,
    pub name: String,
    /// The user's password hash, never sent to clients.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if `email` is already registered.
/// - [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    email: &EmailAddress,
    name: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (email, name, password, created_at) VALUES (?1, ?2, ?3, ?4)",
        (email.as_str(), name, password_hash.as_ref(), created_at),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.as_str().to_owned(),
        name: name.to_owned(),
        password_hash,
        created_at,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, password, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// The lookup is case-insensitive since addresses are stored in lower case.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no user has registered `email`.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    let email = email.trim().to_lowercase();

    connection
        .prepare("SELECT id, email, name, password, created_at FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_row)
        .map_err(|error| error.into())
}

/// Replace the password hash of the user with `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{
            PasswordHash, UserID, create_user, get_user_by_email, get_user_by_id,
            update_password,
            user::{parse_email, validate_user_name},
        },
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();
        let email = parse_email("foo@bar.baz").unwrap();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user =
            create_user(&email, "Foo", password_hash.clone(), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "foo@bar.baz");
        assert_eq!(inserted_user.password_hash, password_hash);
    }

    #[test]
    fn insert_duplicate_email_fails() {
        let db_connection = get_db_connection();
        let email = parse_email("foo@bar.baz").unwrap();
        create_user(
            &email,
            "Foo",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let result = create_user(
            &email,
            "Other Foo",
            PasswordHash::new_unchecked("hunter3"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let email = parse_email("foo@bar.baz").unwrap();
        let test_user = create_user(
            &email,
            "Foo",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user.id, test_user.id);
        assert_eq!(retrieved_user.email, test_user.email);
        assert_eq!(retrieved_user.name, test_user.name);
        assert_eq!(retrieved_user.password_hash, test_user.password_hash);
    }

    #[test]
    fn get_user_by_email_ignores_case() {
        let db_connection = get_db_connection();
        let email = parse_email("Foo@Bar.baz").unwrap();
        let test_user = create_user(
            &email,
            "Foo",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let retrieved_user = get_user_by_email("FOO@bar.BAZ", &db_connection).unwrap();

        assert_eq!(retrieved_user.id, test_user.id);
    }

    #[test]
    fn update_password_replaces_hash() {
        let db_connection = get_db_connection();
        let email = parse_email("foo@bar.baz").unwrap();
        let test_user = create_user(
            &email,
            "Foo",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();
        let new_hash = PasswordHash::new_unchecked("hunter3");

        update_password(test_user.id, &new_hash, &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();
        assert_eq!(retrieved_user.password_hash, new_hash);
    }

    #[test]
    fn update_password_fails_for_missing_user() {
        let db_connection = get_db_connection();

        let result = update_password(
            UserID::new(7),
            &PasswordHash::new_unchecked("hunter3"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn user_json_omits_password() {
        let db_connection = get_db_connection();
        let email = parse_email("foo@bar.baz").unwrap();
        let test_user = create_user(
            &email,
            "Foo",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let json = serde_json::to_value(&test_user).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "foo@bar.baz");
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn rejects_invalid_email() {
        assert!(matches!(parse_email("not-an-email"), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_blank_name() {
        assert!(matches!(validate_user_name("  "), Err(Error::Validation(_))));
    }
}
