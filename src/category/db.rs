//! Database operations for categories.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    category::{
        Category, CategoryIcon, CategoryName, CategorySummary, CategoryUpdate, NewCategory,
        domain::check_bucket_for_type,
    },
    database_id::CategoryId,
    db::UserScope,
};

const SELECT_COLUMNS: &str =
    "id, user_id, name, type, allocation_bucket, icon, created_at, updated_at";

/// Create a category owned by the scope's user and return it with its generated ID.
pub fn create_category(category: NewCategory, scope: &UserScope) -> Result<Category, Error> {
    let now = OffsetDateTime::now_utc();

    scope.connection().execute(
        "INSERT INTO category (user_id, name, type, allocation_bucket, icon, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        (
            scope.user_id().as_i64(),
            category.name.as_ref(),
            category.category_type,
            category.allocation_bucket,
            category.icon.as_ref().map(|icon| icon.as_ref()),
            now,
        ),
    )?;

    let id = scope.connection().last_insert_rowid();

    Ok(Category {
        id,
        user_id: scope.user_id(),
        name: category.name,
        category_type: category.category_type,
        allocation_bucket: category.allocation_bucket,
        icon: category.icon,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve a single category by ID.
///
/// # Errors
///
/// Returns an [Error::CategoryNotFound] if the category does not exist or belongs to another user.
pub fn get_category(category_id: CategoryId, scope: &UserScope) -> Result<Category, Error> {
    scope
        .connection()
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM category WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[
                (":id", &category_id),
                (":user_id", &scope.user_id().as_i64()),
            ],
            map_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::CategoryNotFound,
            error => error,
        })
}

/// Retrieve all of the user's categories ordered by type and then name.
pub fn get_all_categories(scope: &UserScope) -> Result<Vec<Category>, Error> {
    scope
        .connection()
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM category WHERE user_id = :user_id ORDER BY type ASC, name ASC"
        ))?
        .query_map(&[(":user_id", &scope.user_id().as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Apply `update` to a category and return the updated category.
///
/// # Errors
///
/// Returns an:
/// - [Error::CategoryNotFound] if the category does not exist or belongs to another user.
/// - [Error::Validation] if the update would give an income category an allocation bucket.
pub fn update_category(
    category_id: CategoryId,
    update: CategoryUpdate,
    scope: &UserScope,
) -> Result<Category, Error> {
    let mut category = get_category(category_id, scope)?;

    if let Some(allocation_bucket) = update.allocation_bucket {
        check_bucket_for_type(category.category_type, allocation_bucket)?;
        category.allocation_bucket = allocation_bucket;
    }

    if let Some(name) = update.name {
        category.name = name;
    }

    if let Some(icon) = update.icon {
        category.icon = icon;
    }

    category.updated_at = OffsetDateTime::now_utc();

    scope.connection().execute(
        "UPDATE category SET name = ?1, allocation_bucket = ?2, icon = ?3, updated_at = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            category.name.as_ref(),
            category.allocation_bucket,
            category.icon.as_ref().map(|icon| icon.as_ref()),
            category.updated_at,
            category_id,
            scope.user_id().as_i64(),
        ),
    )?;

    Ok(category)
}

/// Delete a category by ID.
///
/// The category's transactions are kept without a category and its budgets are deleted.
///
/// # Errors
///
/// Returns an [Error::CategoryNotFound] if the category does not exist or belongs to another user.
pub fn delete_category(category_id: CategoryId, scope: &UserScope) -> Result<(), Error> {
    let rows_affected = scope.connection().execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, scope.user_id().as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::CategoryNotFound);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
            allocation_bucket TEXT CHECK (allocation_bucket IN ('needs', 'wants', 'future')),
            icon TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id);",
    )?;

    Ok(())
}

/// The category columns to select, as `c.`-prefixed columns, when joining
/// another table with `LEFT JOIN category c`.
///
/// Read them back with [map_category_summary].
pub const CATEGORY_SUMMARY_COLUMNS: &str = "c.id, c.name, c.type, c.allocation_bucket, c.icon";

/// Read the columns listed in [CATEGORY_SUMMARY_COLUMNS] starting at column `start`.
///
/// Returns `None` when the joined category is missing.
pub fn map_category_summary(
    row: &Row,
    start: usize,
) -> Result<Option<CategorySummary>, rusqlite::Error> {
    let Some(id) = row.get::<_, Option<CategoryId>>(start)? else {
        return Ok(None);
    };
    let raw_name: String = row.get(start + 1)?;
    let raw_icon: Option<String> = row.get(start + 4)?;

    Ok(Some(CategorySummary {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        category_type: row.get(start + 2)?,
        allocation_bucket: row.get(start + 3)?,
        icon: raw_icon.as_deref().map(CategoryIcon::new_unchecked),
    }))
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;
    let raw_icon: Option<String> = row.get(5)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        category_type: row.get(3)?,
        allocation_bucket: row.get(4)?,
        icon: raw_icon.as_deref().map(CategoryIcon::new_unchecked),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
