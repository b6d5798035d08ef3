//! JSON endpoints for the category resource.

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
    category::{
        CategoryUpdate, NewCategory, create_category, delete_category,
        domain::{CreateCategoryData, UpdateCategoryData},
        get_all_categories, get_category, update_category,
    },
    database_id::CategoryId,
    db::UserScope,
    extract::{ApiJson, ApiPath},
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the caller's categories.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&UserScope::new(user_id, &connection))?;

    Ok(Json(categories).into_response())
}

/// Get one of the caller's categories.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(category_id, &UserScope::new(user_id, &connection))?;

    Ok(Json(category).into_response())
}

/// Create a category and respond with it and 201 Created.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<CreateCategoryData>,
) -> Result<Response, Error> {
    let new_category = NewCategory::try_from(data)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(new_category, &UserScope::new(user_id, &connection))?;
    tracing::debug!("Created category {} for user {user_id}", category.id);

    Ok((StatusCode::CREATED, Json(category)).into_response())
}

/// Apply a partial update to a category.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(data): ApiJson<UpdateCategoryData>,
) -> Result<Response, Error> {
    let update = CategoryUpdate::try_from(data)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = update_category(category_id, update, &UserScope::new(user_id, &connection))?;

    Ok(Json(category).into_response())
}

/// Delete a category.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(category_id, &UserScope::new(user_id, &connection))?;
    tracing::debug!("Deleted category {category_id} for user {user_id}");

    Ok(Json(json!({ "message": "Category deleted successfully" })).into_response())
}
