//! Database operations for budgets.

use rusqlite::{Connection, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    budget::{Budget, BudgetUpdate, NewBudget},
    category::{CATEGORY_SUMMARY_COLUMNS, get_category, map_category_summary},
    database_id::BudgetId,
    db::UserScope,
};

const BUDGET_COLUMNS: &str =
    "b.id, b.user_id, b.category_id, b.amount, b.period, b.start_date, b.created_at, b.updated_at";

const CATEGORY_COLUMN_OFFSET: usize = 8;

fn select_budgets() -> String {
    format!(
        "SELECT {BUDGET_COLUMNS}, {CATEGORY_SUMMARY_COLUMNS} FROM budget b \
         INNER JOIN category c ON c.id = b.category_id"
    )
}

/// Create a budget owned by the scope's user.
///
/// A user may have several budgets for the same category and period.
///
/// # Errors
///
/// Returns an [Error::CategoryNotFound] if the category does not exist or belongs to another
/// user.
pub fn create_budget(budget: NewBudget, scope: &UserScope) -> Result<Budget, Error> {
    get_category(budget.category_id, scope)?;

    let now = OffsetDateTime::now_utc();

    scope.connection().execute(
        "INSERT INTO budget (user_id, category_id, amount, period, start_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        (
            scope.user_id().as_i64(),
            budget.category_id,
            budget.amount,
            budget.period,
            budget.start_date,
            now,
        ),
    )?;

    let id = scope.connection().last_insert_rowid();

    get_budget(id, scope)
}

/// Retrieve a single budget, joined with its category.
///
/// # Errors
///
/// Returns an [Error::BudgetNotFound] if the budget does not exist or belongs to another user.
pub fn get_budget(id: BudgetId, scope: &UserScope) -> Result<Budget, Error> {
    scope
        .connection()
        .prepare(&format!(
            "{} WHERE b.id = :id AND b.user_id = :user_id",
            select_budgets()
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &scope.user_id().as_i64())],
            map_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::BudgetNotFound,
            error => error,
        })
}

/// Retrieve all of the user's budgets ordered by period and then start date.
pub fn get_all_budgets(scope: &UserScope) -> Result<Vec<Budget>, Error> {
    scope
        .connection()
        .prepare(&format!(
            "{} WHERE b.user_id = :user_id ORDER BY b.period ASC, b.start_date ASC, b.id ASC",
            select_budgets()
        ))?
        .query_map(&[(":user_id", &scope.user_id().as_i64())], map_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Apply `update` to a budget and return the updated budget.
///
/// # Errors
///
/// Returns an [Error::BudgetNotFound] if the budget does not exist or belongs to another user.
pub fn update_budget(
    id: BudgetId,
    update: BudgetUpdate,
    scope: &UserScope,
) -> Result<Budget, Error> {
    let mut budget = get_budget(id, scope)?;

    if let Some(amount) = update.amount {
        budget.amount = amount;
    }

    if let Some(period) = update.period {
        budget.period = period;
    }

    if let Some(start_date) = update.start_date {
        budget.start_date = start_date;
    }

    scope.connection().execute(
        "UPDATE budget SET amount = ?1, period = ?2, start_date = ?3, updated_at = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            budget.amount,
            budget.period,
            budget.start_date,
            OffsetDateTime::now_utc(),
            id,
            scope.user_id().as_i64(),
        ),
    )?;

    get_budget(id, scope)
}

/// Delete a budget.
///
/// # Errors
///
/// Returns an [Error::BudgetNotFound] if the budget does not exist or belongs to another user.
pub fn delete_budget(id: BudgetId, scope: &UserScope) -> Result<(), Error> {
    let rows_affected = scope.connection().execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, scope.user_id().as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::BudgetNotFound);
    }

    Ok(())
}

/// Initialize the budget table and indexes.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            amount TEXT NOT NULL,
            period TEXT NOT NULL DEFAULT 'monthly' CHECK (period IN ('monthly', 'weekly')),
            start_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_budget_user_id ON budget(user_id);
        CREATE INDEX IF NOT EXISTS idx_budget_category_id ON budget(category_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let category = map_category_summary(row, CATEGORY_COLUMN_OFFSET)?.ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(CATEGORY_COLUMN_OFFSET, "c.id".to_owned(), Type::Null)
    })?;

    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        amount: row.get(3)?,
        period: row.get(4)?,
        start_date: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        category,
    })
}
