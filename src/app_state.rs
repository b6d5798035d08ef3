//! The state shared by every route of the JSON API.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, auth::DEFAULT_COOKIE_DURATION, db::initialize, pagination::PaginationConfig,
    timezone::local_offset_or_error,
};

/// The state of the REST server.
///
/// Handlers do not take this directly. Each resource module defines a smaller
/// state struct that implements [FromRef] for [AppState].
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key used for signing and encrypting the session cookie.
    pub cookie_key: Key,

    /// How long a session lasts without activity when "remember me" is not set.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The default and maximum page sizes for list endpoints.
    pub pagination_config: PaginationConfig,

    /// The single database connection shared by all requests.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] from an open SQLite connection.
    ///
    /// The application tables are created if they do not exist yet.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezoneError] if `local_timezone` is not a canonical
    /// timezone name, or an [Error::SqlError] if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        local_offset_or_error(local_timezone)?;
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

// Lets `PrivateCookieJar` find the key in the state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie key from the server secret.
fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, pagination::PaginationConfig};

    use super::{AppState, create_cookie_key};

    #[test]
    fn new_creates_tables() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "secret",
            "Pacific/Auckland",
            PaginationConfig::default(),
        )
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'budget'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 1);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        let result = AppState::new(
            Connection::open_in_memory().unwrap(),
            "secret",
            "Mars/Olympus_Mons",
            PaginationConfig::default(),
        );

        assert!(matches!(result, Err(Error::InvalidTimezoneError(_))));
    }

    #[test]
    fn same_secret_gives_same_key() {
        assert_eq!(create_cookie_key("foo"), create_cookie_key("foo"));
        assert_ne!(create_cookie_key("foo"), create_cookie_key("bar"));
    }
}
