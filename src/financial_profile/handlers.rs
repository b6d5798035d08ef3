//! JSON endpoints for the caller's financial profile.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    db::UserScope,
    extract::ApiJson,
    financial_profile::core::{
        CreateFinancialProfileData, FinancialProfileUpdate, NewFinancialProfile,
        UpdateFinancialProfileData, create_financial_profile, get_financial_profile,
        update_financial_profile,
    },
};

/// The state needed by the financial profile endpoints.
#[derive(Debug, Clone)]
pub struct FinancialProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for FinancialProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the caller's profile. A 404 tells the client that onboarding is incomplete.
pub async fn get_financial_profile_endpoint(
    State(state): State<FinancialProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let profile = get_financial_profile(&UserScope::new(user_id, &connection))?;

    Ok(Json(profile).into_response())
}

pub async fn create_financial_profile_endpoint(
    State(state): State<FinancialProfileState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<CreateFinancialProfileData>,
) -> Result<Response, Error> {
    let new_profile = NewFinancialProfile::try_from(data)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let profile = create_financial_profile(new_profile, &UserScope::new(user_id, &connection))?;
    tracing::info!("Created financial profile for user {user_id}");

    Ok((StatusCode::CREATED, Json(profile)).into_response())
}

pub async fn update_financial_profile_endpoint(
    State(state): State<FinancialProfileState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<UpdateFinancialProfileData>,
) -> Result<Response, Error> {
    let update = FinancialProfileUpdate::try_from(data)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let profile = update_financial_profile(update, &UserScope::new(user_id, &connection))?;

    Ok(Json(profile).into_response())
}
