//! Bucketeer is a personal finance tracker built around the "50/30/20" budgeting method.
//!
//! Users record income and expense transactions, organise them into categories that belong to
//! an allocation bucket (needs, wants or future), set per-category budgets and compare their
//! actual spending against the income split configured in their financial profile.
//!
//! This library provides a JSON REST API, see [build_router] for the routes.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod budget;
mod category;
mod database_id;
mod db;
mod endpoints;
mod extract;
mod financial_profile;
mod health;
mod insights;
mod logging;
mod money;
mod pagination;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_email, parse_email,
    update_password,
};
pub use budget::{BudgetPeriod, NewBudget, create_budget};
pub use category::{AllocationBucket, get_all_categories, seed_default_categories};
pub use db::{UserScope, initialize as initialize_db};
pub use financial_profile::{
    AllocationSplit, IncomeTarget, NewFinancialProfile, create_financial_profile,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::{Amount, Percentage};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use transaction::{NewTransaction, TransactionType, create_transaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent input that is malformed or out of range.
    ///
    /// The string explains what was wrong and is safe to show to the client.
    #[error("{0}")]
    Validation(String),

    /// The request does not carry a valid session cookie.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The email and password combination does not match a registered user.
    ///
    /// The same error is used for an unknown email and a wrong password so
    /// that clients cannot probe which email addresses are registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is already registered to another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The caller already has a financial profile.
    #[error("financial profile already exists")]
    FinancialProfileExists,

    /// The requested resource was not found.
    ///
    /// Internally, this error occurs when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The category does not exist or is owned by another user.
    #[error("category not found")]
    CategoryNotFound,

    /// The transaction does not exist or is owned by another user.
    #[error("transaction not found")]
    TransactionNotFound,

    /// The budget does not exist or is owned by another user.
    #[error("budget not found")]
    BudgetNotFound,

    /// The caller has not created a financial profile yet.
    #[error("financial profile not found")]
    FinancialProfileNotFound,

    /// There was an error creating or reading the expiry date of a session.
    #[error("could not handle the session expiry date: {0}")]
    InvalidDateFormat(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::TooWeak(_) => StatusCode::BAD_REQUEST,
            Error::NotAuthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound
            | Error::CategoryNotFound
            | Error::TransactionNotFound
            | Error::BudgetNotFound
            | Error::FinancialProfileNotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail | Error::FinancialProfileExists => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::InvalidDateFormat(_)
            | Error::InvalidTimezoneError(_)
            | Error::JSONSerializationError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Error::Validation(message) => message.clone(),
            Error::NotAuthenticated => "Not authenticated".to_owned(),
            Error::InvalidCredentials => "Invalid email or password".to_owned(),
            Error::TooWeak(feedback) => format!("Password is too weak: {feedback}"),
            Error::DuplicateEmail => "Email address is already registered".to_owned(),
            Error::FinancialProfileExists => "Financial profile already exists".to_owned(),
            Error::NotFound => "Not found".to_owned(),
            Error::CategoryNotFound => "Category not found".to_owned(),
            Error::TransactionNotFound => "Transaction not found".to_owned(),
            Error::BudgetNotFound => "Budget not found".to_owned(),
            Error::FinancialProfileNotFound => "Financial profile not found".to_owned(),
            // Internal details are not intended to be shown to the client.
            _ => "Internal server error".to_owned(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
