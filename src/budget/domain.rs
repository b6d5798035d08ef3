//! Budget domain types and request validation.

use std::str::FromStr;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    auth::UserID,
    category::CategorySummary,
    database_id::{BudgetId, CategoryId},
    money::Amount,
    timezone::parse_date_input,
};

/// How often a budget's amount resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// The budget covers a calendar month.
    #[default]
    Monthly,
    /// The budget covers a week.
    Weekly,
}

impl BudgetPeriod {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Weekly => "weekly",
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BudgetPeriod::Monthly),
            "weekly" => Ok(BudgetPeriod::Weekly),
            other => Err(Error::Validation(format!("unknown budget period {other:?}"))),
        }
    }
}

impl ToSql for BudgetPeriod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A spending limit for one category, joined with that category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    pub amount: Amount,
    pub period: BudgetPeriod,
    pub start_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub category: CategorySummary,
}

/// The validated fields of a budget that is about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// Must be a category owned by the same user.
    pub category_id: CategoryId,
    /// The spending limit for each period.
    pub amount: Amount,
    /// How often the limit resets.
    pub period: BudgetPeriod,
    /// The first day the budget applies to.
    pub start_date: Date,
}

/// Changes to apply to a budget. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetUpdate {
    pub amount: Option<Amount>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<Date>,
}

/// The JSON body for creating a budget.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetData {
    pub category_id: CategoryId,
    pub amount: Decimal,
    #[serde(default)]
    pub period: BudgetPeriod,
    /// A date or RFC 3339 timestamp.
    pub start_date: String,
}

impl CreateBudgetData {
    /// Validate the body, reading timestamps in the server's local timezone.
    pub fn validate(self, local_offset: UtcOffset) -> Result<NewBudget, Error> {
        Ok(NewBudget {
            category_id: self.category_id,
            amount: Amount::new(self.amount)?,
            period: self.period,
            start_date: parse_date_input(&self.start_date, "startDate", local_offset)?,
        })
    }
}

/// The JSON body for a partial budget update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetData {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub period: Option<BudgetPeriod>,
    #[serde(default)]
    pub start_date: Option<String>,
}

impl UpdateBudgetData {
    /// Validate the supplied fields, reading timestamps in the server's local timezone.
    pub fn validate(self, local_offset: UtcOffset) -> Result<BudgetUpdate, Error> {
        Ok(BudgetUpdate {
            amount: self.amount.map(Amount::new).transpose()?,
            period: self.period,
            start_date: self
                .start_date
                .map(|raw| parse_date_input(&raw, "startDate", local_offset))
                .transpose()?,
        })
    }
}
