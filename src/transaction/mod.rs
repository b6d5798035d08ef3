//! Income and expense transactions.

mod db;
mod domain;
mod handlers;

pub use db::{
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    query_transactions, update_transaction,
};
pub use domain::{
    NewTransaction, Transaction, TransactionFilter, TransactionType, TransactionUpdate,
};
pub use handlers::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    get_transactions_endpoint, update_transaction_endpoint,
};
