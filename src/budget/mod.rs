//! Per-category spending limits.

mod db;
mod domain;
mod handlers;

pub use db::{
    create_budget, create_budget_table, delete_budget, get_all_budgets, get_budget, update_budget,
};
pub use domain::{Budget, BudgetPeriod, BudgetUpdate, NewBudget};
pub use handlers::{
    create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint, get_budgets_endpoint,
    update_budget_endpoint,
};
