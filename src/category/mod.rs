//! Categories group transactions and assign expenses to a 50/30/20 allocation bucket.

mod db;
mod domain;
mod handlers;
mod seed;

pub use db::{
    CATEGORY_SUMMARY_COLUMNS, create_category, create_category_table, delete_category,
    get_all_categories, get_category, map_category_summary, update_category,
};
pub use domain::{
    AllocationBucket, Category, CategoryIcon, CategoryName, CategorySummary, CategoryUpdate,
    NewCategory,
};
pub use handlers::{
    create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
    get_category_endpoint, update_category_endpoint,
};
pub use seed::seed_default_categories;
