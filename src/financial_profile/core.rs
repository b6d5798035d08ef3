//! The financial profile: a user's monthly income target and how they want to split it.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    db::UserScope,
    money::{Percentage, decimal_from_sql, format_money, round_money},
};

/// The largest monthly income target a user may set.
const MAX_INCOME_TARGET: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// The three percentages must total strictly within this distance of 100.
const PERCENTAGE_SUM_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// A positive monthly income target of at most one billion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IncomeTarget(Decimal);

impl IncomeTarget {
    /// Create an income target, rounding `value` half away from zero to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if the rounded value is not positive or exceeds one billion.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let value = round_money(value);

        if value <= Decimal::ZERO {
            return Err(Error::Validation(
                "Monthly income must be positive".to_owned(),
            ));
        }

        if value > MAX_INCOME_TARGET {
            return Err(Error::Validation(
                "Monthly income seems too high".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Display for IncomeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_money(self.0))
    }
}

impl Serialize for IncomeTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl ToSql for IncomeTarget {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for IncomeTarget {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        decimal_from_sql(value).map(Self)
    }
}

/// The share of income assigned to each allocation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationSplit {
    /// Percentage of income for needs.
    pub needs: Percentage,
    /// Percentage of income for wants.
    pub wants: Percentage,
    /// Percentage of income for savings, investments and debt repayment.
    pub future: Percentage,
}

impl AllocationSplit {
    /// Validate three percentages that must add up to 100.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if any percentage is outside 0 to 100 or the
    /// total is not 100.
    pub fn new(needs: Decimal, wants: Decimal, future: Decimal) -> Result<Self, Error> {
        let split = Self {
            needs: Percentage::new(needs, "needsPercentage")?,
            wants: Percentage::new(wants, "wantsPercentage")?,
            future: Percentage::new(future, "futurePercentage")?,
        };

        let total =
            split.needs.as_decimal() + split.wants.as_decimal() + split.future.as_decimal();

        if (total - Decimal::ONE_HUNDRED).abs() >= PERCENTAGE_SUM_TOLERANCE {
            return Err(Error::Validation(
                "Percentages must sum to exactly 100%".to_owned(),
            ));
        }

        Ok(split)
    }
}

impl Default for AllocationSplit {
    /// The classic 50/30/20 split.
    fn default() -> Self {
        Self {
            needs: Percentage::new_unchecked(Decimal::from(50)),
            wants: Percentage::new_unchecked(Decimal::from(30)),
            future: Percentage::new_unchecked(Decimal::from(20)),
        }
    }
}

/// A user's financial profile. Each user has at most one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    pub user_id: UserID,
    pub monthly_income_target: IncomeTarget,
    pub needs_percentage: Percentage,
    pub wants_percentage: Percentage,
    pub future_percentage: Percentage,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl FinancialProfile {
    /// The profile's percentages.
    pub fn split(&self) -> AllocationSplit {
        AllocationSplit {
            needs: self.needs_percentage,
            wants: self.wants_percentage,
            future: self.future_percentage,
        }
    }
}

/// The validated fields of a profile that is about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFinancialProfile {
    /// The income the user expects each month.
    pub monthly_income_target: IncomeTarget,
    /// How the income should be split between the buckets.
    pub split: AllocationSplit,
}

/// Changes to apply to a profile. The split is replaced as a whole, never field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialProfileUpdate {
    pub monthly_income_target: Option<IncomeTarget>,
    pub split: Option<AllocationSplit>,
}

/// The JSON body for creating a profile. Missing percentages default to 50/30/20.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFinancialProfileData {
    pub monthly_income_target: Decimal,
    #[serde(default)]
    pub needs_percentage: Option<Decimal>,
    #[serde(default)]
    pub wants_percentage: Option<Decimal>,
    #[serde(default)]
    pub future_percentage: Option<Decimal>,
}

impl TryFrom<CreateFinancialProfileData> for NewFinancialProfile {
    type Error = Error;

    fn try_from(data: CreateFinancialProfileData) -> Result<Self, Self::Error> {
        let defaults = AllocationSplit::default();
        let split = AllocationSplit::new(
            data.needs_percentage.unwrap_or(defaults.needs.as_decimal()),
            data.wants_percentage.unwrap_or(defaults.wants.as_decimal()),
            data.future_percentage.unwrap_or(defaults.future.as_decimal()),
        )?;

        Ok(NewFinancialProfile {
            monthly_income_target: IncomeTarget::new(data.monthly_income_target)?,
            split,
        })
    }
}

/// The JSON body for a partial profile update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFinancialProfileData {
    #[serde(default)]
    pub monthly_income_target: Option<Decimal>,
    #[serde(default)]
    pub needs_percentage: Option<Decimal>,
    #[serde(default)]
    pub wants_percentage: Option<Decimal>,
    #[serde(default)]
    pub future_percentage: Option<Decimal>,
}

impl TryFrom<UpdateFinancialProfileData> for FinancialProfileUpdate {
    type Error = Error;

    fn try_from(data: UpdateFinancialProfileData) -> Result<Self, Self::Error> {
        let split = match (
            data.needs_percentage,
            data.wants_percentage,
            data.future_percentage,
        ) {
            (None, None, None) => None,
            (Some(needs), Some(wants), Some(future)) => {
                Some(AllocationSplit::new(needs, wants, future)?)
            }
            _ => return Err(partial_split_error()),
        };

        Ok(FinancialProfileUpdate {
            monthly_income_target: data
                .monthly_income_target
                .map(IncomeTarget::new)
                .transpose()?,
            split,
        })
    }
}

fn partial_split_error() -> Error {
    Error::Validation(
        "When updating percentages, all three must be provided and sum to 100%".to_owned(),
    )
}

/// Create the profile for the scope's user.
///
/// # Errors
///
/// Returns an [Error::FinancialProfileExists] if the user already has a profile.
pub fn create_financial_profile(
    profile: NewFinancialProfile,
    scope: &UserScope,
) -> Result<FinancialProfile, Error> {
    match get_financial_profile(scope) {
        Ok(_) => return Err(Error::FinancialProfileExists),
        Err(Error::FinancialProfileNotFound) => {}
        Err(error) => return Err(error),
    }

    let now = OffsetDateTime::now_utc();

    scope.connection().execute(
        "INSERT INTO financial_profile
            (user_id, monthly_income_target, needs_percentage, wants_percentage, future_percentage, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        (
            scope.user_id().as_i64(),
            profile.monthly_income_target,
            profile.split.needs,
            profile.split.wants,
            profile.split.future,
            now,
        ),
    )?;

    Ok(FinancialProfile {
        user_id: scope.user_id(),
        monthly_income_target: profile.monthly_income_target,
        needs_percentage: profile.split.needs,
        wants_percentage: profile.split.wants,
        future_percentage: profile.split.future,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve the scope's user's profile.
///
/// # Errors
///
/// Returns an [Error::FinancialProfileNotFound] if the user has not created a profile.
pub fn get_financial_profile(scope: &UserScope) -> Result<FinancialProfile, Error> {
    scope
        .connection()
        .prepare(
            "SELECT user_id, monthly_income_target, needs_percentage, wants_percentage,
                    future_percentage, created_at, updated_at
             FROM financial_profile WHERE user_id = :user_id",
        )?
        .query_row(&[(":user_id", &scope.user_id().as_i64())], map_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::FinancialProfileNotFound,
            error => error,
        })
}

/// Apply `update` to the scope's user's profile and return the updated profile.
///
/// # Errors
///
/// Returns an [Error::FinancialProfileNotFound] if the user has not created a profile.
pub fn update_financial_profile(
    update: FinancialProfileUpdate,
    scope: &UserScope,
) -> Result<FinancialProfile, Error> {
    let mut profile = get_financial_profile(scope)?;

    if let Some(monthly_income_target) = update.monthly_income_target {
        profile.monthly_income_target = monthly_income_target;
    }

    if let Some(split) = update.split {
        profile.needs_percentage = split.needs;
        profile.wants_percentage = split.wants;
        profile.future_percentage = split.future;
    }

    profile.updated_at = OffsetDateTime::now_utc();

    scope.connection().execute(
        "UPDATE financial_profile
         SET monthly_income_target = ?1, needs_percentage = ?2, wants_percentage = ?3,
             future_percentage = ?4, updated_at = ?5
         WHERE user_id = ?6",
        (
            profile.monthly_income_target,
            profile.needs_percentage,
            profile.wants_percentage,
            profile.future_percentage,
            profile.updated_at,
            scope.user_id().as_i64(),
        ),
    )?;

    Ok(profile)
}

pub fn create_financial_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS financial_profile (
            user_id INTEGER PRIMARY KEY REFERENCES user(id) ON DELETE CASCADE,
            monthly_income_target TEXT NOT NULL,
            needs_percentage TEXT NOT NULL DEFAULT '50.00',
            wants_percentage TEXT NOT NULL DEFAULT '30.00',
            future_percentage TEXT NOT NULL DEFAULT '20.00',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<FinancialProfile, rusqlite::Error> {
    Ok(FinancialProfile {
        user_id: UserID::new(row.get(0)?),
        monthly_income_target: row.get(1)?,
        needs_percentage: row.get(2)?,
        wants_percentage: row.get(3)?,
        future_percentage: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
