//! Transaction domain types and request validation.

use std::str::FromStr;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error,
    auth::UserID,
    category::CategorySummary,
    database_id::{CategoryId, TransactionId},
    extract::deserialize_some,
    money::Amount,
    timezone::parse_date_input,
};

const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Whether money went out or came in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money spent.
    Expense,
    /// Money earned.
    Income,
}

impl TransactionType {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            other => Err(Error::Validation(format!(
                "unknown transaction type {other:?}"
            ))),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An income or expense, joined with its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserID,
    /// `None` when the transaction was never categorised or its category was deleted.
    pub category_id: Option<CategoryId>,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: Option<String>,
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub category: Option<CategorySummary>,
}

/// The validated fields of a transaction that is about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Must be a category owned by the same user, if set.
    pub category_id: Option<CategoryId>,
    /// The amount of money, always positive.
    pub amount: Amount,
    /// Whether the money was spent or earned.
    pub transaction_type: TransactionType,
    /// Free text, at most 255 characters.
    pub description: Option<String>,
    /// The local calendar date of the transaction.
    pub date: Date,
}

/// Changes to apply to a transaction. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    /// `Some(None)` detaches the transaction from its category.
    pub category_id: Option<Option<CategoryId>>,
    pub amount: Option<Amount>,
    pub transaction_type: Option<TransactionType>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub date: Option<Date>,
}

/// Check that a description is at most 255 characters long.
pub fn validate_description(description: String) -> Result<String, Error> {
    if description.graphemes(true).count() > MAX_DESCRIPTION_LENGTH {
        return Err(Error::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }

    Ok(description)
}

/// The JSON body for creating a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionData {
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub description: Option<String>,
    /// A date or RFC 3339 timestamp.
    pub date: String,
}

impl CreateTransactionData {
    /// Validate the body, reading timestamps in the server's local timezone.
    pub fn validate(self, local_offset: UtcOffset) -> Result<NewTransaction, Error> {
        Ok(NewTransaction {
            category_id: self.category_id,
            amount: Amount::new(self.amount)?,
            transaction_type: self.transaction_type,
            description: self.description.map(validate_description).transpose()?,
            date: parse_date_input(&self.date, "date", local_offset)?,
        })
    }
}

/// The JSON body for a partial transaction update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionData {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<CategoryId>>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub date: Option<String>,
}

impl UpdateTransactionData {
    /// Validate the supplied fields, reading timestamps in the server's local timezone.
    pub fn validate(self, local_offset: UtcOffset) -> Result<TransactionUpdate, Error> {
        let description = match self.description {
            Some(Some(description)) => Some(Some(validate_description(description)?)),
            Some(None) => Some(None),
            None => None,
        };

        Ok(TransactionUpdate {
            category_id: self.category_id,
            amount: self.amount.map(Amount::new).transpose()?,
            transaction_type: self.transaction_type,
            description,
            date: self
                .date
                .map(|date| parse_date_input(&date, "date", local_offset))
                .transpose()?,
        })
    }
}

/// The query string accepted by the transaction list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQueryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Validated filters for listing transactions. Every filter that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Inclusive lower bound on the transaction date.
    pub start_date: Option<Date>,
    /// Inclusive upper bound on the transaction date.
    pub end_date: Option<Date>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl TransactionQueryParams {
    /// Validate the filters. `limit` and `offset` are resolved separately with a
    /// [PaginationConfig](crate::PaginationConfig).
    pub fn into_filter(self, local_offset: UtcOffset) -> Result<TransactionFilter, Error> {
        let start_date = self
            .start_date
            .map(|raw| parse_date_input(&raw, "startDate", local_offset))
            .transpose()?;
        let end_date = self
            .end_date
            .map(|raw| parse_date_input(&raw, "endDate", local_offset))
            .transpose()?;
        let search = self
            .search
            .map(|search| search.trim().to_owned())
            .filter(|search| !search.is_empty());

        Ok(TransactionFilter {
            start_date,
            end_date,
            transaction_type: self.transaction_type,
            category_id: self.category_id,
            search,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        })
    }
}
