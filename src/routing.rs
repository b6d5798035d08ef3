//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{auth_guard, get_session, sign_in, sign_out, sign_up},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint, get_budgets_endpoint,
        update_budget_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
        get_category_endpoint, update_category_endpoint,
    },
    endpoints,
    financial_profile::{
        create_financial_profile_endpoint, get_financial_profile_endpoint,
        update_financial_profile_endpoint,
    },
    health::get_health,
    insights::{
        get_allocation_summary_endpoint, get_budget_status_endpoint, get_spending_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        get_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route under `/api/v1` except sign-up, sign-in and sign-out requires a
/// valid session cookie. Unknown routes get a JSON 404.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::SIGN_UP, post(sign_up))
        .route(endpoints::SIGN_IN, post(sign_in))
        .route(endpoints::SIGN_OUT, post(sign_out));

    let protected_routes = Router::new()
        .route(endpoints::SESSION, get(get_session))
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .patch(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .patch(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(
            endpoints::FINANCIAL_PROFILE,
            get(get_financial_profile_endpoint)
                .post(create_financial_profile_endpoint)
                .patch(update_financial_profile_endpoint),
        )
        .route(endpoints::SPENDING_INSIGHTS, get(get_spending_endpoint))
        .route(
            endpoints::BUDGET_STATUS_INSIGHTS,
            get(get_budget_status_endpoint),
        )
        .route(
            endpoints::ALLOCATION_SUMMARY_INSIGHTS,
            get(get_allocation_summary_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        auth::COOKIE_TOKEN,
        endpoints::{self, format_endpoint},
        test_utils::get_test_app_state,
    };

    use super::build_router;

    fn get_test_server() -> TestServer {
        TestServer::try_new(build_router(get_test_app_state())).expect("Could not create test server.")
    }

    /// Sign up a fresh user and return their session cookie.
    async fn sign_up(server: &TestServer) -> Cookie<'static> {
        let response = server
            .post(endpoints::SIGN_UP)
            .json(&json!({
                "email": "jane@example.com",
                "name": "Jane",
                "password": "averysafeandsecurepassword",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn health_is_unprotected() {
        let server = get_test_server();

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = get_test_server();

        let response = server.get("/api/v1/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn resources_require_session() {
        let server = get_test_server();

        for path in [
            endpoints::SESSION,
            endpoints::CATEGORIES,
            endpoints::TRANSACTIONS,
            endpoints::BUDGETS,
            endpoints::FINANCIAL_PROFILE,
            endpoints::SPENDING_INSIGHTS,
        ] {
            let response = server.get(path).await;

            response.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn sign_up_seeds_default_categories() {
        let server = get_test_server();
        let cookie = sign_up(&server).await;

        let response = server.get(endpoints::CATEGORIES).add_cookie(cookie).await;

        response.assert_status_ok();
        let categories: Vec<Value> = response.json();
        assert_eq!(categories.len(), 18);
    }

    #[tokio::test]
    async fn session_returns_user() {
        let server = get_test_server();
        let cookie = sign_up(&server).await;

        let response = server.get(endpoints::SESSION).add_cookie(cookie).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["email"], "jane@example.com");
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn budgeting_flow() {
        let server = get_test_server();
        let cookie = sign_up(&server).await;

        let response = server
            .post(endpoints::FINANCIAL_PROFILE)
            .add_cookie(cookie.clone())
            .json(&json!({ "monthlyIncomeTarget": "5000" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::CATEGORIES)
            .add_cookie(cookie.clone())
            .json(&json!({ "name": "Climbing", "type": "expense", "allocationBucket": "wants" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let category_id = response.json::<Value>()["id"].as_i64().unwrap();

        let response = server
            .post(endpoints::BUDGETS)
            .add_cookie(cookie.clone())
            .json(&json!({ "categoryId": category_id, "amount": 200, "startDate": "2025-01-01" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(cookie.clone())
            .json(&json!({
                "categoryId": category_id,
                "amount": "50.25",
                "type": "expense",
                "date": "2025-01-15",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let transaction_id = response.json::<Value>()["id"].as_i64().unwrap();

        let response = server
            .get(endpoints::BUDGET_STATUS_INSIGHTS)
            .add_query_param("month", "2025-01")
            .add_cookie(cookie.clone())
            .await;
        response.assert_status_ok();
        let statuses: Value = response.json();
        assert_eq!(statuses[0]["spentAmount"], json!(50.25));
        assert_eq!(statuses[0]["percentage"], json!(25.0));

        let response = server
            .get(endpoints::ALLOCATION_SUMMARY_INSIGHTS)
            .add_query_param("month", "2025-01")
            .add_cookie(cookie.clone())
            .await;
        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["actual"]["wants"], json!(50.25));
        assert_eq!(summary["percentages"]["wants"], json!(100.0));

        let response = server
            .delete(&format_endpoint(endpoints::TRANSACTION, transaction_id))
            .add_cookie(cookie.clone())
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Transaction deleted successfully" }));

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, transaction_id))
            .add_cookie(cookie)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let server = get_test_server();
        let cookie = sign_up(&server).await;

        let response = server
            .post(endpoints::CATEGORIES)
            .add_cookie(cookie)
            .text("{not json")
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let server = get_test_server();
        let cookie = sign_up(&server).await;

        let response = server.post(endpoints::SIGN_OUT).add_cookie(cookie).await;

        response.assert_status_ok();
        let cleared = response.cookie(COOKIE_TOKEN);
        assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));
    }
}
