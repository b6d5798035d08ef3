//! Database setup and the user-scoped handle used by the resource modules.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    auth::{UserID, create_user_table},
    budget::create_budget_table,
    category::create_category_table,
    financial_profile::create_financial_profile_table,
    transaction::create_transaction_table,
};

/// Create the application tables if they do not exist and enable foreign key enforcement.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside of a transaction, otherwise it is silently ignored.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_financial_profile_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// A database connection bound to a single user.
///
/// Every query on user-owned data goes through a [UserScope] so that the
/// owner filter is part of the function signature rather than something each
/// query has to remember.
#[derive(Debug, Clone, Copy)]
pub struct UserScope<'a> {
    user_id: UserID,
    connection: &'a Connection,
}

impl<'a> UserScope<'a> {
    /// Bind `connection` to the user with `user_id`.
    pub fn new(user_id: UserID, connection: &'a Connection) -> Self {
        Self {
            user_id,
            connection,
        }
    }

    /// The ID of the user that owns the data reachable through this scope.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// The underlying connection.
    pub fn connection(&self) -> &'a Connection {
        self.connection
    }
}
