//! JSON endpoints for the budget resource.

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
    budget::{
        create_budget, delete_budget,
        domain::{CreateBudgetData, UpdateBudgetData},
        get_all_budgets, get_budget, update_budget,
    },
    database_id::BudgetId,
    db::UserScope,
    extract::{ApiJson, ApiPath},
    timezone::local_offset_or_error,
};

/// The state needed by the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone used to turn timestamps into calendar dates.
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budgets = get_all_budgets(&UserScope::new(user_id, &connection))?;

    Ok(Json(budgets).into_response())
}

pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(budget_id): ApiPath<BudgetId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_budget(budget_id, &UserScope::new(user_id, &connection))?;

    Ok(Json(budget).into_response())
}

/// Create a budget for one of the caller's categories and respond with 201 Created.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<CreateBudgetData>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let new_budget = data.validate(local_offset)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = create_budget(new_budget, &UserScope::new(user_id, &connection))?;
    tracing::debug!("Created budget {} for user {user_id}", budget.id);

    Ok((StatusCode::CREATED, Json(budget)).into_response())
}

pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(budget_id): ApiPath<BudgetId>,
    ApiJson(data): ApiJson<UpdateBudgetData>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let update = data.validate(local_offset)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = update_budget(budget_id, update, &UserScope::new(user_id, &connection))?;

    Ok(Json(budget).into_response())
}

pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(budget_id): ApiPath<BudgetId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_budget(budget_id, &UserScope::new(user_id, &connection))?;
    tracing::debug!("Deleted budget {budget_id} for user {user_id}");

    Ok(Json(json!({ "message": "Budget deleted successfully" })).into_response())
}
