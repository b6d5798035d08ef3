//! Ends the current session.

use axum::{Json, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use crate::auth::cookie::invalidate_auth_cookie;

/// Invalidate the auth cookie.
///
/// Signing out without a session is not an error, the cookie is expired either way.
pub async fn sign_out(jar: PrivateCookieJar) -> impl IntoResponse {
    (
        invalidate_auth_cookie(jar),
        Json(json!({ "message": "Signed out" })),
    )
}
