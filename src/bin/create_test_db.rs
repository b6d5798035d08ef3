use std::{collections::HashMap, error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use bucketeer_rs::{
    AllocationSplit, Amount, BudgetPeriod, IncomeTarget, NewBudget, NewFinancialProfile,
    NewTransaction, PasswordHash, TransactionType, UserScope, ValidatedPassword, create_budget,
    create_financial_profile, create_transaction, create_user, get_all_categories,
    initialize_db, parse_email, seed_default_categories,
};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "test";

/// A utility for creating a demo database for the REST API server of bucketeer_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut connection = Connection::open(output_path)?;
    initialize_db(&connection)?;

    let transaction = connection.transaction()?;

    println!("Creating demo user {DEMO_EMAIL} with the password '{DEMO_PASSWORD}'...");
    let user = create_user(
        &parse_email(DEMO_EMAIL)?,
        "Demo User",
        PasswordHash::new(
            ValidatedPassword::new_unchecked(DEMO_PASSWORD),
            PasswordHash::DEFAULT_COST,
        )?,
        &transaction,
    )?;
    let scope = UserScope::new(user.id, &transaction);

    println!("Creating default categories...");
    seed_default_categories(&scope)?;
    let category_ids: HashMap<String, i64> = get_all_categories(&scope)?
        .into_iter()
        .map(|category| (category.name.as_ref().to_owned(), category.id))
        .collect();

    println!("Creating financial profile...");
    create_financial_profile(
        NewFinancialProfile {
            monthly_income_target: IncomeTarget::new(Decimal::from(5000))?,
            split: AllocationSplit::default(),
        },
        &scope,
    )?;

    println!("Creating transactions...");
    let today = OffsetDateTime::now_utc().date();
    let mut transaction_count = 0;

    for months_ago in 0..3 {
        let month_start = first_of_month_before(today, months_ago)?;

        for (category, amount, transaction_type, day, description) in SAMPLE_TRANSACTIONS {
            let date = month_start.saturating_add(Duration::days(day - 1));
            if date > today {
                continue;
            }

            create_transaction(
                NewTransaction {
                    category_id: category_ids.get(*category).copied(),
                    amount: Amount::new(Decimal::from_str_exact(amount)?)?,
                    transaction_type: *transaction_type,
                    description: Some((*description).to_owned()),
                    date,
                },
                &scope,
            )?;
            transaction_count += 1;
        }
    }

    println!("Creating budgets...");
    let budget_start = first_of_month_before(today, 2)?;
    for (category, amount) in SAMPLE_BUDGETS {
        let category_id = category_ids
            .get(*category)
            .copied()
            .ok_or_else(|| format!("missing default category {category}"))?;

        create_budget(
            NewBudget {
                category_id,
                amount: Amount::new(Decimal::from(*amount))?,
                period: BudgetPeriod::Monthly,
                start_date: budget_start,
            },
            &scope,
        )?;
    }

    transaction.commit()?;

    println!(
        "Success! Created {transaction_count} transactions and {} budgets.",
        SAMPLE_BUDGETS.len()
    );

    Ok(())
}

/// The first day of the month `months_ago` months before the month of `date`.
fn first_of_month_before(date: Date, months_ago: u8) -> Result<Date, Box<dyn Error>> {
    let mut month_start = date.replace_day(1)?;

    for _ in 0..months_ago {
        month_start = month_start
            .previous_day()
            .ok_or("date out of range")?
            .replace_day(1)?;
    }

    Ok(month_start)
}

/// Category name, amount, type, day of month and description.
const SAMPLE_TRANSACTIONS: &[(&str, &str, TransactionType, i64, &str)] = &[
    ("Salary", "5200.00", TransactionType::Income, 1, "Monthly salary"),
    ("Rent/Mortgage", "1650.00", TransactionType::Expense, 1, "Rent"),
    ("Utilities", "142.37", TransactionType::Expense, 3, "Power bill"),
    ("Groceries", "186.45", TransactionType::Expense, 4, "Weekly shop"),
    ("Dining Out", "42.50", TransactionType::Expense, 6, "Dinner with friends"),
    ("Transportation", "60.00", TransactionType::Expense, 7, "Fuel"),
    ("Groceries", "203.10", TransactionType::Expense, 11, "Weekly shop"),
    ("Subscriptions", "22.99", TransactionType::Expense, 12, "Streaming"),
    ("Savings", "600.00", TransactionType::Expense, 15, "Automatic transfer"),
    ("Entertainment", "35.00", TransactionType::Expense, 16, "Concert tickets"),
    ("Groceries", "176.80", TransactionType::Expense, 18, "Weekly shop"),
    ("Investments", "400.00", TransactionType::Expense, 20, "Index fund"),
    ("Freelance", "750.00", TransactionType::Income, 22, "Website project"),
    ("Shopping", "129.95", TransactionType::Expense, 23, "New shoes"),
    ("Groceries", "194.25", TransactionType::Expense, 25, "Weekly shop"),
    ("Dining Out", "68.20", TransactionType::Expense, 27, "Takeaways"),
    ("Uncategorised", "15.00", TransactionType::Expense, 28, "Cash"),
];

/// Category name and monthly limit.
const SAMPLE_BUDGETS: &[(&str, i64)] = &[
    ("Groceries", 800),
    ("Dining Out", 150),
    ("Entertainment", 100),
    ("Shopping", 200),
];
