//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error, auth::UserID, database_id::CategoryId, extract::deserialize_some,
    transaction::TransactionType,
};

const MAX_NAME_LENGTH: usize = 50;
const MAX_ICON_LENGTH: usize = 10;

/// A validated category name, between 1 and 50 characters after trimming.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Length is counted in user-perceived characters, so "🏠" counts as one.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `name` is blank or longer than 50 characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::Validation("Name is required".to_owned()));
        }

        if name.graphemes(true).count() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        Ok(Self(name.to_owned()))
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A short icon for a category, usually a single emoji.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash)]
pub struct CategoryIcon(String);

impl CategoryIcon {
    /// Create an icon.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `icon` is longer than 10 characters.
    pub fn new(icon: &str) -> Result<Self, Error> {
        if icon.graphemes(true).count() > MAX_ICON_LENGTH {
            return Err(Error::Validation(format!(
                "Icon must be at most {MAX_ICON_LENGTH} characters"
            )));
        }

        Ok(Self(icon.to_owned()))
    }

    pub fn new_unchecked(icon: &str) -> Self {
        Self(icon.to_owned())
    }
}

impl AsRef<str> for CategoryIcon {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which part of the 50/30/20 split an expense category counts towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationBucket {
    /// Essentials such as rent, groceries and utilities.
    Needs,
    /// Discretionary spending such as dining out and hobbies.
    Wants,
    /// Savings, investments and debt repayment.
    Future,
}

impl AllocationBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationBucket::Needs => "needs",
            AllocationBucket::Wants => "wants",
            AllocationBucket::Future => "future",
        }
    }
}

impl FromStr for AllocationBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "needs" => Ok(AllocationBucket::Needs),
            "wants" => Ok(AllocationBucket::Wants),
            "future" => Ok(AllocationBucket::Future),
            other => Err(Error::Validation(format!(
                "unknown allocation bucket {other:?}"
            ))),
        }
    }
}

impl ToSql for AllocationBucket {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AllocationBucket {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A user's category for grouping transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserID,
    pub name: CategoryName,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    /// Always `None` for income categories.
    pub allocation_bucket: Option<AllocationBucket>,
    pub icon: Option<CategoryIcon>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The category attached to a transaction or budget in API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: CategoryName,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub allocation_bucket: Option<AllocationBucket>,
    pub icon: Option<CategoryIcon>,
}

/// The validated fields of a category that is about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: CategoryName,
    pub category_type: TransactionType,
    pub allocation_bucket: Option<AllocationBucket>,
    pub icon: Option<CategoryIcon>,
}

impl NewCategory {
    /// Build a new category.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if an income category is given an allocation bucket.
    pub fn new(
        name: CategoryName,
        category_type: TransactionType,
        allocation_bucket: Option<AllocationBucket>,
        icon: Option<CategoryIcon>,
    ) -> Result<Self, Error> {
        check_bucket_for_type(category_type, allocation_bucket)?;

        Ok(Self {
            name,
            category_type,
            allocation_bucket,
            icon,
        })
    }
}

/// Changes to apply to a category. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryUpdate {
    pub name: Option<CategoryName>,
    /// `Some(None)` clears the bucket.
    pub allocation_bucket: Option<Option<AllocationBucket>>,
    /// `Some(None)` clears the icon.
    pub icon: Option<Option<CategoryIcon>>,
}

/// Only expense categories belong to an allocation bucket.
pub fn check_bucket_for_type(
    category_type: TransactionType,
    allocation_bucket: Option<AllocationBucket>,
) -> Result<(), Error> {
    if category_type == TransactionType::Income && allocation_bucket.is_some() {
        return Err(Error::Validation(
            "Income categories cannot have an allocation bucket".to_owned(),
        ));
    }

    Ok(())
}

/// The JSON body for creating a category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryData {
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    #[serde(default)]
    pub allocation_bucket: Option<AllocationBucket>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl TryFrom<CreateCategoryData> for NewCategory {
    type Error = Error;

    fn try_from(data: CreateCategoryData) -> Result<Self, Self::Error> {
        let icon = data.icon.as_deref().map(CategoryIcon::new).transpose()?;

        NewCategory::new(
            CategoryName::new(&data.name)?,
            data.category_type,
            data.allocation_bucket,
            icon,
        )
    }
}

/// The JSON body for a partial category update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub allocation_bucket: Option<Option<AllocationBucket>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub icon: Option<Option<String>>,
}

impl TryFrom<UpdateCategoryData> for CategoryUpdate {
    type Error = Error;

    fn try_from(data: UpdateCategoryData) -> Result<Self, Self::Error> {
        let name = data.name.as_deref().map(CategoryName::new).transpose()?;
        let icon = match data.icon {
            Some(Some(icon)) => Some(Some(CategoryIcon::new(&icon)?)),
            Some(None) => Some(None),
            None => None,
        };

        Ok(CategoryUpdate {
            name,
            allocation_bucket: data.allocation_bucket,
            icon,
        })
    }
}
