//! Database operations for transactions.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    category::{CATEGORY_SUMMARY_COLUMNS, get_category, map_category_summary},
    database_id::TransactionId,
    db::UserScope,
    pagination::{PageRequest, Paginated, Pagination},
    transaction::{NewTransaction, Transaction, TransactionFilter, TransactionUpdate},
};

const TRANSACTION_COLUMNS: &str = "t.id, t.user_id, t.category_id, t.amount, t.type, \
     t.description, t.date, t.created_at, t.updated_at";

/// The index of the first category column in rows read by [map_row].
const CATEGORY_COLUMN_OFFSET: usize = 9;

fn select_transactions() -> String {
    format!(
        "SELECT {TRANSACTION_COLUMNS}, {CATEGORY_SUMMARY_COLUMNS} FROM \"transaction\" t \
         LEFT JOIN category c ON c.id = t.category_id"
    )
}

/// Create a transaction owned by the scope's user.
///
/// # Errors
///
/// Returns an [Error::CategoryNotFound] if `transaction.category_id` is set but the category
/// does not exist or belongs to another user.
pub fn create_transaction(
    transaction: NewTransaction,
    scope: &UserScope,
) -> Result<Transaction, Error> {
    if let Some(category_id) = transaction.category_id {
        get_category(category_id, scope)?;
    }

    let now = OffsetDateTime::now_utc();

    scope.connection().execute(
        "INSERT INTO \"transaction\" (user_id, category_id, amount, type, description, date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        (
            scope.user_id().as_i64(),
            transaction.category_id,
            transaction.amount,
            transaction.transaction_type,
            transaction.description,
            transaction.date,
            now,
        ),
    )?;

    let id = scope.connection().last_insert_rowid();

    get_transaction(id, scope)
}

/// Retrieve a single transaction, joined with its category.
///
/// # Errors
///
/// Returns an [Error::TransactionNotFound] if the transaction does not exist or belongs to
/// another user.
pub fn get_transaction(id: TransactionId, scope: &UserScope) -> Result<Transaction, Error> {
    scope
        .connection()
        .prepare(&format!(
            "{} WHERE t.id = :id AND t.user_id = :user_id",
            select_transactions()
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &scope.user_id().as_i64())],
            map_row,
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::TransactionNotFound,
            error => error,
        })
}

/// Retrieve one page of the scope's transactions that match `filter`.
///
/// Transactions are ordered newest first by date, then by creation time and then by ID.
pub fn query_transactions(
    filter: &TransactionFilter,
    page: PageRequest,
    scope: &UserScope,
) -> Result<Paginated<Transaction>, Error> {
    let mut where_clause_parts = vec!["t.user_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(scope.user_id().as_i64())];

    if let Some(start_date) = filter.start_date {
        query_parameters.push(Value::Text(start_date.to_string()));
        where_clause_parts.push(format!("t.date >= ?{}", query_parameters.len()));
    }

    if let Some(end_date) = filter.end_date {
        query_parameters.push(Value::Text(end_date.to_string()));
        where_clause_parts.push(format!("t.date <= ?{}", query_parameters.len()));
    }

    if let Some(transaction_type) = filter.transaction_type {
        query_parameters.push(Value::Text(transaction_type.as_str().to_owned()));
        where_clause_parts.push(format!("t.type = ?{}", query_parameters.len()));
    }

    if let Some(category_id) = filter.category_id {
        query_parameters.push(Value::Integer(category_id));
        where_clause_parts.push(format!("t.category_id = ?{}", query_parameters.len()));
    }

    if let Some(search) = &filter.search {
        query_parameters.push(Value::Text(search.clone()));
        where_clause_parts.push(format!(
            "instr(lower(t.description), lower(?{})) > 0",
            query_parameters.len()
        ));
    }

    if let Some(min_amount) = filter.min_amount {
        query_parameters.push(Value::Text(min_amount.to_string()));
        where_clause_parts.push(format!(
            "CAST(t.amount AS REAL) >= CAST(?{} AS REAL)",
            query_parameters.len()
        ));
    }

    if let Some(max_amount) = filter.max_amount {
        query_parameters.push(Value::Text(max_amount.to_string()));
        where_clause_parts.push(format!(
            "CAST(t.amount AS REAL) <= CAST(?{} AS REAL)",
            query_parameters.len()
        ));
    }

    let where_clause = where_clause_parts.join(" AND ");

    let total: i64 = scope.connection().query_row(
        &format!("SELECT COUNT(*) FROM \"transaction\" t WHERE {where_clause}"),
        params_from_iter(query_parameters.iter()),
        |row| row.get(0),
    )?;

    let query_string = format!(
        "{} WHERE {where_clause} ORDER BY t.date DESC, t.created_at DESC, t.id DESC LIMIT {} OFFSET {}",
        select_transactions(),
        page.limit,
        page.offset
    );

    let data = scope
        .connection()
        .prepare(&query_string)?
        .query_map(params_from_iter(query_parameters.iter()), map_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated {
        data,
        pagination: Pagination::new(page, total as u64),
    })
}

/// Apply `update` to a transaction and return the updated transaction.
///
/// # Errors
///
/// Returns an:
/// - [Error::TransactionNotFound] if the transaction does not exist or belongs to another user.
/// - [Error::CategoryNotFound] if the update moves the transaction to a category the user does
///   not own.
pub fn update_transaction(
    id: TransactionId,
    update: TransactionUpdate,
    scope: &UserScope,
) -> Result<Transaction, Error> {
    let mut transaction = get_transaction(id, scope)?;

    if let Some(category_id) = update.category_id {
        if let Some(category_id) = category_id {
            get_category(category_id, scope)?;
        }
        transaction.category_id = category_id;
    }

    if let Some(amount) = update.amount {
        transaction.amount = amount;
    }

    if let Some(transaction_type) = update.transaction_type {
        transaction.transaction_type = transaction_type;
    }

    if let Some(description) = update.description {
        transaction.description = description;
    }

    if let Some(date) = update.date {
        transaction.date = date;
    }

    scope.connection().execute(
        "UPDATE \"transaction\"
         SET category_id = ?1, amount = ?2, type = ?3, description = ?4, date = ?5, updated_at = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            transaction.category_id,
            transaction.amount,
            transaction.transaction_type,
            &transaction.description,
            transaction.date,
            OffsetDateTime::now_utc(),
            id,
            scope.user_id().as_i64(),
        ),
    )?;

    get_transaction(id, scope)
}

/// Delete a transaction.
///
/// # Errors
///
/// Returns an [Error::TransactionNotFound] if the transaction does not exist or belongs to
/// another user.
pub fn delete_transaction(id: TransactionId, scope: &UserScope) -> Result<(), Error> {
    let rows_affected = scope.connection().execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, scope.user_id().as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound);
    }

    Ok(())
}

/// Initialize the transaction table and indexes.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            amount TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('expense', 'income')),
            description TEXT,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category_id ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        amount: row.get(3)?,
        transaction_type: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        category: map_category_summary(row, CATEGORY_COLUMN_OFFSET)?,
    })
}
