//! Each user's monthly income target and 50/30/20 style split.

mod core;
mod handlers;

pub use core::{
    AllocationSplit, FinancialProfile, IncomeTarget, NewFinancialProfile,
    create_financial_profile, create_financial_profile_table, get_financial_profile,
};
pub use handlers::{
    create_financial_profile_endpoint, get_financial_profile_endpoint,
    update_financial_profile_endpoint,
};
