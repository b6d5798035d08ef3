//! Database queries for the insights.
//!
//! Amounts are read as exact decimals and summed in Rust, since SQLite would sum
//! the stored text as binary floats.

use rusqlite::{params_from_iter, types::Value};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    category::{CATEGORY_SUMMARY_COLUMNS, CategorySummary, map_category_summary},
    db::UserScope,
    money::Amount,
    transaction::TransactionType,
};

/// A transaction amount together with the category it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategorisedAmount {
    pub category: CategorySummary,
    pub amount: Decimal,
}

/// Which transactions to include when reading amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct AmountFilter {
    /// Inclusive lower bound on the transaction date.
    pub start_date: Option<Date>,
    /// Inclusive upper bound on the transaction date.
    pub end_date: Option<Date>,
    pub transaction_type: Option<TransactionType>,
}

impl AmountFilter {
    /// Build the WHERE clause for the `"transaction"` table aliased as `t`.
    fn where_clause(&self, scope: &UserScope) -> (String, Vec<Value>) {
        let mut where_clause_parts = vec!["t.user_id = ?1".to_owned()];
        let mut query_parameters = vec![Value::Integer(scope.user_id().as_i64())];

        if let Some(start_date) = self.start_date {
            query_parameters.push(Value::Text(start_date.to_string()));
            where_clause_parts.push(format!("t.date >= ?{}", query_parameters.len()));
        }

        if let Some(end_date) = self.end_date {
            query_parameters.push(Value::Text(end_date.to_string()));
            where_clause_parts.push(format!("t.date <= ?{}", query_parameters.len()));
        }

        if let Some(transaction_type) = self.transaction_type {
            query_parameters.push(Value::Text(transaction_type.as_str().to_owned()));
            where_clause_parts.push(format!("t.type = ?{}", query_parameters.len()));
        }

        (where_clause_parts.join(" AND "), query_parameters)
    }
}

/// Get the amounts of the scope's categorised transactions that match `filter`.
///
/// Transactions without a category are left out.
pub(super) fn get_categorised_amounts(
    filter: &AmountFilter,
    scope: &UserScope,
) -> Result<Vec<CategorisedAmount>, Error> {
    let (where_clause, query_parameters) = filter.where_clause(scope);
    let query = format!(
        "SELECT t.amount, {CATEGORY_SUMMARY_COLUMNS}
         FROM \"transaction\" t
         INNER JOIN category c ON c.id = t.category_id
         WHERE {where_clause}"
    );

    scope
        .connection()
        .prepare(&query)?
        .query_map(params_from_iter(query_parameters.iter()), |row| {
            let amount: Amount = row.get(0)?;
            let category = map_category_summary(row, 1)?.ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    1,
                    "c.id".to_owned(),
                    rusqlite::types::Type::Null,
                )
            })?;

            Ok(CategorisedAmount {
                category,
                amount: amount.as_decimal(),
            })
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Sum the amounts of all the scope's transactions that match `filter`, categorised or not.
pub(super) fn get_total_amount(filter: &AmountFilter, scope: &UserScope) -> Result<Decimal, Error> {
    let (where_clause, query_parameters) = filter.where_clause(scope);
    let query = format!("SELECT t.amount FROM \"transaction\" t WHERE {where_clause}");

    scope
        .connection()
        .prepare(&query)?
        .query_map(params_from_iter(query_parameters.iter()), |row| {
            row.get::<_, Amount>(0)
        })?
        .try_fold(Decimal::ZERO, |total, amount| {
            Ok(total + amount?.as_decimal())
        })
}
