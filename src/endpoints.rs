//! The API endpoints URIs.
//!
//! Endpoints that take a parameter, e.g. `/api/v1/budgets/{budget_id}`, are formatted in tests with `format_endpoint`.

/// The liveness check. Not versioned and not protected.
pub const HEALTH: &str = "/health";

/// The route for creating an account.
pub const SIGN_UP: &str = "/api/v1/auth/sign-up";
/// The route for signing in with an email and password.
pub const SIGN_IN: &str = "/api/v1/auth/sign-in";
/// The route for ending the current session.
pub const SIGN_OUT: &str = "/api/v1/auth/sign-out";
/// The route for getting the signed in user.
pub const SESSION: &str = "/api/v1/auth/session";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/v1/categories";
/// The route to access a single category.
pub const CATEGORY: &str = "/api/v1/categories/{category_id}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/v1/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/v1/transactions/{transaction_id}";
/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/v1/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/v1/budgets/{budget_id}";
/// The route to access the caller's financial profile.
pub const FINANCIAL_PROFILE: &str = "/api/v1/financial-profile";

/// Totals per category.
pub const SPENDING_INSIGHTS: &str = "/api/v1/insights/spending";
/// Monthly budgets compared with actual spending.
pub const BUDGET_STATUS_INSIGHTS: &str = "/api/v1/insights/budget-status";
/// Spending per allocation bucket compared with the financial profile.
pub const ALLOCATION_SUMMARY_INSIGHTS: &str = "/api/v1/insights/allocation-summary";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/categories/{category_id}', '{category_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
