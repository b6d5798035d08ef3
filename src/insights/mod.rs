//! Read-only reports computed from a user's transactions, budgets and financial profile.

mod aggregation;
mod db;
mod handlers;
mod month;

pub use handlers::{
    get_allocation_summary_endpoint, get_budget_status_endpoint, get_spending_endpoint,
};
