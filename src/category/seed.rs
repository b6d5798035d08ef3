//! The categories every new user starts with.

use time::OffsetDateTime;

use crate::{Error, category::AllocationBucket, db::UserScope, transaction::TransactionType};

struct DefaultCategory {
    name: &'static str,
    category_type: TransactionType,
    allocation_bucket: Option<AllocationBucket>,
    icon: &'static str,
}

const fn expense(name: &'static str, bucket: AllocationBucket, icon: &'static str) -> DefaultCategory {
    DefaultCategory {
        name,
        category_type: TransactionType::Expense,
        allocation_bucket: Some(bucket),
        icon,
    }
}

const fn income(name: &'static str, icon: &'static str) -> DefaultCategory {
    DefaultCategory {
        name,
        category_type: TransactionType::Income,
        allocation_bucket: None,
        icon,
    }
}

const DEFAULT_CATEGORIES: [DefaultCategory; 18] = [
    expense("Rent/Mortgage", AllocationBucket::Needs, "🏠"),
    expense("Groceries", AllocationBucket::Needs, "🛒"),
    expense("Utilities", AllocationBucket::Needs, "⚡"),
    expense("Insurance", AllocationBucket::Needs, "🛡️"),
    expense("Transportation", AllocationBucket::Needs, "🚗"),
    expense("Healthcare", AllocationBucket::Needs, "🏥"),
    expense("Dining Out", AllocationBucket::Wants, "🍽️"),
    expense("Entertainment", AllocationBucket::Wants, "🎬"),
    expense("Shopping", AllocationBucket::Wants, "🛍️"),
    expense("Subscriptions", AllocationBucket::Wants, "📺"),
    expense("Hobbies", AllocationBucket::Wants, "🎨"),
    expense("Savings", AllocationBucket::Future, "💰"),
    expense("Investments", AllocationBucket::Future, "📈"),
    expense("Emergency Fund", AllocationBucket::Future, "🏦"),
    expense("Debt Repayment", AllocationBucket::Future, "💳"),
    income("Salary", "💵"),
    income("Freelance", "💼"),
    income("Other Income", "💸"),
];

/// Give the scope's user the standard 50/30/20 set of categories.
///
/// Callers registering a user should run this in the same SQL transaction
/// that creates the user.
pub fn seed_default_categories(scope: &UserScope) -> Result<(), Error> {
    let now = OffsetDateTime::now_utc();
    let mut statement = scope.connection().prepare(
        "INSERT INTO category (user_id, name, type, allocation_bucket, icon, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )?;

    for category in &DEFAULT_CATEGORIES {
        statement.execute((
            scope.user_id().as_i64(),
            category.name,
            category.category_type,
            category.allocation_bucket,
            category.icon,
            now,
        ))?;
    }

    tracing::debug!(
        "Seeded {} default categories for user {}",
        DEFAULT_CATEGORIES.len(),
        scope.user_id()
    );

    Ok(())
}
