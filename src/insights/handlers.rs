//! JSON endpoints for the spending and allocation insights.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::get_all_budgets,
    category::AllocationBucket,
    db::UserScope,
    extract::ApiQuery,
    financial_profile::get_financial_profile,
    insights::{
        aggregation::{allocation_summary, budget_statuses, spending_by_category},
        db::{AmountFilter, get_categorised_amounts, get_total_amount},
        month::MonthWindow,
    },
    timezone::{local_offset_or_error, parse_date_input},
    transaction::TransactionType,
};

/// The state needed by the insights endpoints.
#[derive(Debug, Clone)]
pub struct InsightsState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone used to turn timestamps into calendar dates.
    pub local_timezone: String,
}

impl FromRef<AppState> for InsightsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingQueryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub allocation_bucket: Option<AllocationBucket>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

impl MonthWindow {
    fn as_filter(&self, transaction_type: TransactionType) -> AmountFilter {
        AmountFilter {
            start_date: Some(self.first_day),
            end_date: Some(self.last_day),
            transaction_type: Some(transaction_type),
        }
    }
}

/// Totals per category for the caller's categorised transactions.
pub async fn get_spending_endpoint(
    State(state): State<InsightsState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(params): ApiQuery<SpendingQueryParams>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;
    let filter = AmountFilter {
        start_date: params
            .start_date
            .map(|raw| parse_date_input(&raw, "startDate", local_offset))
            .transpose()?,
        end_date: params
            .end_date
            .map(|raw| parse_date_input(&raw, "endDate", local_offset))
            .transpose()?,
        transaction_type: params.transaction_type,
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let amounts = get_categorised_amounts(&filter, &UserScope::new(user_id, &connection))?;

    Ok(Json(spending_by_category(&amounts, params.allocation_bucket)).into_response())
}

/// How much of each monthly budget was spent in the requested month.
pub async fn get_budget_status_endpoint(
    State(state): State<InsightsState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<Response, Error> {
    let window = MonthWindow::parse(query.month.as_deref())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let scope = UserScope::new(user_id, &connection);

    let budgets = get_all_budgets(&scope)?;
    let expenses = get_categorised_amounts(&window.as_filter(TransactionType::Expense), &scope)?;

    Ok(Json(budget_statuses(&budgets, &window, &expenses)).into_response())
}

/// Spending per allocation bucket in the requested month against the profile's targets.
pub async fn get_allocation_summary_endpoint(
    State(state): State<InsightsState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<Response, Error> {
    let window = MonthWindow::parse(query.month.as_deref())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;
    let scope = UserScope::new(user_id, &connection);

    let profile = get_financial_profile(&scope)?;
    let expenses = get_categorised_amounts(&window.as_filter(TransactionType::Expense), &scope)?;
    let income = get_total_amount(&window.as_filter(TransactionType::Income), &scope)?;

    Ok(Json(allocation_summary(&profile, &expenses, income)).into_response())
}

#[cfg(test)]
mod insights_endpoint_tests {
    use std::str::FromStr;

    use axum::{
        Extension,
        extract::{FromRef, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rust_decimal::Decimal;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        budget::{BudgetPeriod, NewBudget, create_budget},
        category::{AllocationBucket, CategoryName, NewCategory, create_category},
        db::UserScope,
        extract::ApiQuery,
        financial_profile::{
            AllocationSplit, IncomeTarget, NewFinancialProfile, create_financial_profile,
        },
        insights::handlers::{
            InsightsState, MonthQuery, SpendingQueryParams, get_allocation_summary_endpoint,
            get_budget_status_endpoint, get_spending_endpoint,
        },
        money::Amount,
        test_utils::{create_test_user, get_test_app_state, parse_json_body},
        transaction::{NewTransaction, TransactionType, create_transaction},
    };

    fn amount(value: &str) -> Amount {
        Amount::new(Decimal::from_str(value).unwrap()).unwrap()
    }

    /// Creates a user with a groceries budget, a dining out category and a few
    /// transactions in January 2025.
    fn get_state() -> (InsightsState, UserID) {
        let state = InsightsState::from_ref(&get_test_app_state());
        let connection = state.db_connection.lock().unwrap();
        let user = create_test_user(&connection);
        let scope = UserScope::new(user.id, &connection);

        let groceries = create_category(
            NewCategory::new(
                CategoryName::new_unchecked("Groceries"),
                TransactionType::Expense,
                Some(AllocationBucket::Needs),
                None,
            )
            .unwrap(),
            &scope,
        )
        .unwrap();
        let dining = create_category(
            NewCategory::new(
                CategoryName::new_unchecked("Dining Out"),
                TransactionType::Expense,
                Some(AllocationBucket::Wants),
                None,
            )
            .unwrap(),
            &scope,
        )
        .unwrap();

        for (category_id, value, transaction_type, date) in [
            (Some(groceries.id), "80", TransactionType::Expense, date!(2025 - 01 - 05)),
            (Some(groceries.id), "40", TransactionType::Expense, date!(2025 - 01 - 31)),
            (Some(groceries.id), "999", TransactionType::Expense, date!(2025 - 02 - 01)),
            (Some(dining.id), "30", TransactionType::Expense, date!(2025 - 01 - 10)),
            (None, "3000", TransactionType::Income, date!(2025 - 01 - 15)),
        ] {
            create_transaction(
                NewTransaction {
                    category_id,
                    amount: amount(value),
                    transaction_type,
                    description: None,
                    date,
                },
                &scope,
            )
            .unwrap();
        }

        create_budget(
            NewBudget {
                category_id: groceries.id,
                amount: amount("200"),
                period: BudgetPeriod::Monthly,
                start_date: date!(2025 - 01 - 01),
            },
            &scope,
        )
        .unwrap();

        drop(connection);
        (state, user.id)
    }

    fn month(raw: &str) -> ApiQuery<MonthQuery> {
        ApiQuery(MonthQuery {
            month: Some(raw.to_owned()),
        })
    }

    #[tokio::test]
    async fn spending_sums_per_category() {
        let (state, user_id) = get_state();

        let response = get_spending_endpoint(
            State(state),
            Extension(user_id),
            ApiQuery(SpendingQueryParams {
                start_date: Some("2025-01-01".to_owned()),
                end_date: Some("2025-01-31".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body[0]["categoryName"], "Dining Out");
        assert_eq!(body[0]["total"], "30.00");
        assert_eq!(body[1]["categoryName"], "Groceries");
        assert_eq!(body[1]["total"], "120.00");
    }

    #[tokio::test]
    async fn spending_filters_by_bucket() {
        let (state, user_id) = get_state();

        let response = get_spending_endpoint(
            State(state),
            Extension(user_id),
            ApiQuery(SpendingQueryParams {
                allocation_bucket: Some(AllocationBucket::Needs),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        let body = parse_json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["total"], "1119.00");
    }

    #[tokio::test]
    async fn spending_rejects_bad_date() {
        let (state, user_id) = get_state();

        let result = get_spending_endpoint(
            State(state),
            Extension(user_id),
            ApiQuery(SpendingQueryParams {
                start_date: Some("January".to_owned()),
                ..Default::default()
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn budget_status_for_month() {
        let (state, user_id) = get_state();

        let response = get_budget_status_endpoint(State(state), Extension(user_id), month("2025-01"))
            .await
            .unwrap();

        let body = parse_json_body(response).await;
        assert_eq!(body[0]["budgetAmount"], json!(200.0));
        assert_eq!(body[0]["spentAmount"], json!(120.0));
        assert_eq!(body[0]["remainingAmount"], json!(80.0));
        assert_eq!(body[0]["percentage"], json!(60.0));
    }

    #[tokio::test]
    async fn budget_status_requires_month() {
        let (state, user_id) = get_state();

        let result = get_budget_status_endpoint(
            State(state),
            Extension(user_id),
            ApiQuery(MonthQuery::default()),
        )
        .await;

        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn budget_status_rejects_month_thirteen() {
        let (state, user_id) = get_state();

        let result =
            get_budget_status_endpoint(State(state), Extension(user_id), month("2025-13")).await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn allocation_summary_requires_profile() {
        let (state, user_id) = get_state();

        let result =
            get_allocation_summary_endpoint(State(state), Extension(user_id), month("2025-01"))
                .await;

        assert_eq!(result.unwrap_err(), Error::FinancialProfileNotFound);
    }

    #[tokio::test]
    async fn allocation_summary_for_month() {
        let (state, user_id) = get_state();
        create_financial_profile(
            NewFinancialProfile {
                monthly_income_target: IncomeTarget::new(Decimal::from(4000)).unwrap(),
                split: AllocationSplit::default(),
            },
            &UserScope::new(user_id, &state.db_connection.lock().unwrap()),
        )
        .unwrap();

        let response =
            get_allocation_summary_endpoint(State(state), Extension(user_id), month("2025-01"))
                .await
                .unwrap();

        let body = parse_json_body(response).await;
        assert_eq!(body["income"], json!(3000.0));
        assert_eq!(body["targets"]["needs"], json!(2000.0));
        assert_eq!(body["actual"]["needs"], json!(120.0));
        assert_eq!(body["actual"]["wants"], json!(30.0));
        assert_eq!(body["percentages"]["needs"], json!(80.0));
        assert_eq!(body["percentages"]["wants"], json!(20.0));
        assert_eq!(body["profile"]["monthlyIncomeTarget"], json!(4000.0));
    }
}
