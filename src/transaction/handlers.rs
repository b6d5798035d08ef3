//! JSON endpoints for the transaction resource.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::TransactionId,
    db::UserScope,
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::PaginationConfig,
    timezone::local_offset_or_error,
    transaction::{
        create_transaction, delete_transaction,
        domain::{CreateTransactionData, TransactionQueryParams, UpdateTransactionData},
        get_transaction, query_transactions, update_transaction,
    },
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone used to turn timestamps into calendar dates.
    pub local_timezone: String,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// List a page of the caller's transactions matching the query string filters.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(params): ApiQuery<TransactionQueryParams>,
) -> Result<Response, Error> {
    let page = state.pagination_config.resolve(params.limit, params.offset)?;
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let filter = params.into_filter(local_offset)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = query_transactions(&filter, page, &UserScope::new(user_id, &connection))?;

    Ok(Json(transactions).into_response())
}

/// Get one of the caller's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, &UserScope::new(user_id, &connection))?;

    Ok(Json(transaction).into_response())
}

/// Record a transaction and respond with it and 201 Created.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<CreateTransactionData>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let new_transaction = data.validate(local_offset)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction =
        create_transaction(new_transaction, &UserScope::new(user_id, &connection))?;
    tracing::debug!("Created transaction {} for user {user_id}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

/// Apply a partial update to a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(data): ApiJson<UpdateTransactionData>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let update = data.validate(local_offset)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction =
        update_transaction(transaction_id, update, &UserScope::new(user_id, &connection))?;

    Ok(Json(transaction).into_response())
}

/// Delete a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, &UserScope::new(user_id, &connection))?;
    tracing::debug!("Deleted transaction {transaction_id} for user {user_id}");

    Ok(Json(json!({ "message": "Transaction deleted successfully" })).into_response())
}
