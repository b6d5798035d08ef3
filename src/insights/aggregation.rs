//! Pure aggregation of transaction amounts into the insight reports.
//!
//! Sums are exact [Decimal]s. Money is rounded to two decimal places only when a
//! report row is built.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    budget::{Budget, BudgetPeriod},
    category::{AllocationBucket, CategoryIcon, CategoryName, CategorySummary},
    database_id::{BudgetId, CategoryId},
    financial_profile::FinancialProfile,
    insights::{db::CategorisedAmount, month::MonthWindow},
    money::{round_money, serialize_money},
    transaction::TransactionType,
};

/// The total spent or earned in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category_id: CategoryId,
    pub category_name: CategoryName,
    pub category_type: TransactionType,
    pub allocation_bucket: Option<AllocationBucket>,
    pub icon: Option<CategoryIcon>,
    #[serde(serialize_with = "serialize_money")]
    pub total: Decimal,
}

/// How much of a monthly budget has been used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub budget_id: BudgetId,
    pub category_id: CategoryId,
    pub category_name: CategoryName,
    pub category_icon: Option<CategoryIcon>,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spent_amount: Decimal,
    /// Negative when the budget is overspent.
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_amount: Decimal,
    /// Share of the budget spent as a whole number, capped at 100.
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
}

/// One value per allocation bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketValues {
    #[serde(with = "rust_decimal::serde::float")]
    pub needs: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub wants: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub future: Decimal,
}

impl BucketValues {
    fn get_mut(&mut self, bucket: AllocationBucket) -> &mut Decimal {
        match bucket {
            AllocationBucket::Needs => &mut self.needs,
            AllocationBucket::Wants => &mut self.wants,
            AllocationBucket::Future => &mut self.future,
        }
    }

    fn total(&self) -> Decimal {
        self.needs + self.wants + self.future
    }

    fn map(self, f: impl Fn(Decimal) -> Decimal) -> Self {
        Self {
            needs: f(self.needs),
            wants: f(self.wants),
            future: f(self.future),
        }
    }
}

/// The profile values the allocation summary was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileValues {
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_income_target: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub needs_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub wants_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub future_percentage: Decimal,
}

/// Actual spending per bucket compared with the targets from the financial profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    pub targets: BucketValues,
    pub actual: BucketValues,
    pub percentages: BucketValues,
    pub profile: ProfileValues,
}

/// Groups amounts by category and sums each group.
///
/// # Arguments
/// * `amounts` - The categorised transaction amounts to group
/// * `bucket` - If set, only groups whose category is in this bucket are kept
///
/// # Returns
/// One row per category, sorted by category name.
pub(super) fn spending_by_category(
    amounts: &[CategorisedAmount],
    bucket: Option<AllocationBucket>,
) -> Vec<CategorySpending> {
    let mut totals: HashMap<CategoryId, (&CategorySummary, Decimal)> = HashMap::new();

    for amount in amounts {
        totals
            .entry(amount.category.id)
            .or_insert((&amount.category, Decimal::ZERO))
            .1 += amount.amount;
    }

    let mut rows: Vec<CategorySpending> = totals
        .into_values()
        .filter(|(category, _)| bucket.is_none() || category.allocation_bucket == bucket)
        .map(|(category, total)| CategorySpending {
            category_id: category.id,
            category_name: category.name.clone(),
            category_type: category.category_type,
            allocation_bucket: category.allocation_bucket,
            icon: category.icon.clone(),
            total,
        })
        .collect();

    rows.sort_by(|a, b| {
        a.category_name
            .as_ref()
            .cmp(b.category_name.as_ref())
            .then(a.category_id.cmp(&b.category_id))
    });
    rows
}

/// Compares each monthly budget active in `window` with the expenses in its category.
///
/// # Arguments
/// * `budgets` - All of the user's budgets
/// * `window` - The month being reported on
/// * `expenses` - The categorised expense amounts within `window`
///
/// # Returns
/// One row per monthly budget whose start date is on or before the last day of the month.
pub(super) fn budget_statuses(
    budgets: &[Budget],
    window: &MonthWindow,
    expenses: &[CategorisedAmount],
) -> Vec<BudgetStatus> {
    let mut spent_by_category: HashMap<CategoryId, Decimal> = HashMap::new();

    for expense in expenses {
        *spent_by_category
            .entry(expense.category.id)
            .or_insert(Decimal::ZERO) += expense.amount;
    }

    budgets
        .iter()
        .filter(|budget| budget.period == BudgetPeriod::Monthly)
        .filter(|budget| budget.start_date <= window.last_day)
        .map(|budget| {
            let budget_amount = budget.amount.as_decimal();
            let spent_amount = spent_by_category
                .get(&budget.category_id)
                .copied()
                .unwrap_or(Decimal::ZERO);

            BudgetStatus {
                budget_id: budget.id,
                category_id: budget.category_id,
                category_name: budget.category.name.clone(),
                category_icon: budget.category.icon.clone(),
                budget_amount,
                spent_amount: round_money(spent_amount),
                remaining_amount: round_money(budget_amount - spent_amount),
                percentage: budget_percentage(spent_amount, budget_amount),
            }
        })
        .collect()
}

/// Sums expenses per allocation bucket and compares them with the profile's targets.
///
/// # Arguments
/// * `profile` - The user's financial profile
/// * `expenses` - The categorised expense amounts in the month
/// * `income` - The total income in the month
pub(super) fn allocation_summary(
    profile: &FinancialProfile,
    expenses: &[CategorisedAmount],
    income: Decimal,
) -> AllocationSummary {
    let mut actual = BucketValues::default();

    for expense in expenses {
        if let Some(bucket) = expense.category.allocation_bucket {
            *actual.get_mut(bucket) += expense.amount;
        }
    }

    let income_target = profile.monthly_income_target.as_decimal();
    let split = profile.split();
    let percentages_of_target = BucketValues {
        needs: split.needs.as_decimal(),
        wants: split.wants.as_decimal(),
        future: split.future.as_decimal(),
    };
    let total_spent = actual.total();

    AllocationSummary {
        income: round_money(income),
        targets: percentages_of_target
            .map(|percentage| round_money(income_target * percentage / Decimal::ONE_HUNDRED)),
        actual: actual.map(round_money),
        percentages: actual.map(|bucket_total| share_of_total(bucket_total, total_spent)),
        profile: ProfileValues {
            monthly_income_target: income_target,
            needs_percentage: percentages_of_target.needs,
            wants_percentage: percentages_of_target.wants,
            future_percentage: percentages_of_target.future,
        },
    }
}

/// The share of `amount` that has been spent, as a whole number percentage capped at 100.
///
/// # Returns
/// Zero if `amount` is not positive.
fn budget_percentage(spent: Decimal, amount: Decimal) -> Decimal {
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    (spent / amount * Decimal::ONE_HUNDRED)
        .min(Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// `part` as a percentage of `total`, rounded to two decimal places.
///
/// # Returns
/// Zero if nothing was spent.
fn share_of_total(part: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    round_money(part / total * Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde_json::json;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        auth::UserID,
        budget::{Budget, BudgetPeriod},
        category::{AllocationBucket, CategoryName, CategorySummary},
        financial_profile::{AllocationSplit, FinancialProfile, IncomeTarget},
        insights::{db::CategorisedAmount, month::MonthWindow},
        money::Amount,
        transaction::TransactionType,
    };

    use super::{allocation_summary, budget_percentage, budget_statuses, spending_by_category};

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn category(id: i64, name: &str, bucket: Option<AllocationBucket>) -> CategorySummary {
        CategorySummary {
            id,
            name: CategoryName::new_unchecked(name),
            category_type: TransactionType::Expense,
            allocation_bucket: bucket,
            icon: None,
        }
    }

    fn amount(category: &CategorySummary, value: &str) -> CategorisedAmount {
        CategorisedAmount {
            category: category.clone(),
            amount: dec(value),
        }
    }

    fn budget(
        id: i64,
        category: &CategorySummary,
        amount: &str,
        period: BudgetPeriod,
        start_date: time::Date,
    ) -> Budget {
        Budget {
            id,
            user_id: UserID::new(1),
            category_id: category.id,
            amount: Amount::new(dec(amount)).unwrap(),
            period,
            start_date,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            category: category.clone(),
        }
    }

    fn profile(income_target: &str, split: AllocationSplit) -> FinancialProfile {
        FinancialProfile {
            user_id: UserID::new(1),
            monthly_income_target: IncomeTarget::new(dec(income_target)).unwrap(),
            needs_percentage: split.needs,
            wants_percentage: split.wants,
            future_percentage: split.future,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn spending_groups_and_sorts_by_name() {
        let rent = category(1, "Rent", Some(AllocationBucket::Needs));
        let dining = category(2, "Dining Out", Some(AllocationBucket::Wants));
        let amounts = [
            amount(&rent, "1200"),
            amount(&dining, "10.10"),
            amount(&dining, "20.20"),
        ];

        let rows = spending_by_category(&amounts, None);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category_name.as_ref(), "Dining Out");
        assert_eq!(rows[0].total, dec("30.30"));
        assert_eq!(rows[1].category_name.as_ref(), "Rent");
        assert_eq!(
            serde_json::to_value(&rows[1]).unwrap(),
            json!({
                "categoryId": 1,
                "categoryName": "Rent",
                "categoryType": "expense",
                "allocationBucket": "needs",
                "icon": null,
                "total": "1200.00",
            })
        );
    }

    #[test]
    fn spending_filters_bucket_after_grouping() {
        let rent = category(1, "Rent", Some(AllocationBucket::Needs));
        let dining = category(2, "Dining Out", Some(AllocationBucket::Wants));
        let amounts = [amount(&rent, "1200"), amount(&dining, "10")];

        let rows = spending_by_category(&amounts, Some(AllocationBucket::Wants));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category_id, 2);
    }

    #[test]
    fn spending_with_no_amounts_is_empty() {
        assert!(spending_by_category(&[], None).is_empty());
    }

    #[test]
    fn budget_status_reports_spent_and_remaining() {
        let groceries = category(1, "Groceries", Some(AllocationBucket::Needs));
        let window = MonthWindow::parse(Some("2025-01")).unwrap();
        let budgets = [budget(
            7,
            &groceries,
            "400",
            BudgetPeriod::Monthly,
            date!(2025 - 01 - 01),
        )];
        let expenses = [amount(&groceries, "100.50"), amount(&groceries, "50")];

        let statuses = budget_statuses(&budgets, &window, &expenses);

        assert_eq!(
            serde_json::to_value(&statuses).unwrap(),
            json!([{
                "budgetId": 7,
                "categoryId": 1,
                "categoryName": "Groceries",
                "categoryIcon": null,
                "budgetAmount": 400.0,
                "spentAmount": 150.5,
                "remainingAmount": 249.5,
                "percentage": 38.0,
            }])
        );
    }

    #[test]
    fn budget_status_caps_percentage_and_allows_negative_remaining() {
        let groceries = category(1, "Groceries", Some(AllocationBucket::Needs));
        let window = MonthWindow::parse(Some("2025-01")).unwrap();
        let budgets = [budget(
            1,
            &groceries,
            "100",
            BudgetPeriod::Monthly,
            date!(2024 - 06 - 01),
        )];
        let expenses = [amount(&groceries, "150")];

        let statuses = budget_statuses(&budgets, &window, &expenses);

        assert_eq!(statuses[0].percentage, Decimal::ONE_HUNDRED);
        assert_eq!(statuses[0].remaining_amount, dec("-50"));
    }

    #[test]
    fn budget_status_skips_weekly_and_future_budgets() {
        let groceries = category(1, "Groceries", Some(AllocationBucket::Needs));
        let window = MonthWindow::parse(Some("2025-01")).unwrap();
        let budgets = [
            budget(1, &groceries, "100", BudgetPeriod::Weekly, date!(2025 - 01 - 01)),
            budget(2, &groceries, "100", BudgetPeriod::Monthly, date!(2025 - 02 - 01)),
            budget(3, &groceries, "100", BudgetPeriod::Monthly, date!(2025 - 01 - 31)),
        ];

        let statuses = budget_statuses(&budgets, &window, &[]);

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].budget_id, 3);
        assert_eq!(statuses[0].spent_amount, Decimal::ZERO);
        assert_eq!(statuses[0].percentage, Decimal::ZERO);
    }

    #[test]
    fn budget_percentage_rounds_to_whole_number() {
        assert_eq!(budget_percentage(dec("1"), dec("3")), dec("33"));
        assert_eq!(budget_percentage(dec("2"), dec("3")), dec("67"));
        assert_eq!(budget_percentage(dec("5"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn allocation_summary_compares_actual_with_targets() {
        let rent = category(1, "Rent", Some(AllocationBucket::Needs));
        let dining = category(2, "Dining Out", Some(AllocationBucket::Wants));
        let savings = category(3, "Savings", Some(AllocationBucket::Future));
        let expenses = [
            amount(&rent, "1500"),
            amount(&dining, "300"),
            amount(&savings, "200"),
        ];

        let summary = allocation_summary(
            &profile("5000", AllocationSplit::default()),
            &expenses,
            dec("5200"),
        );

        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "income": 5200.0,
                "targets": { "needs": 2500.0, "wants": 1500.0, "future": 1000.0 },
                "actual": { "needs": 1500.0, "wants": 300.0, "future": 200.0 },
                "percentages": { "needs": 75.0, "wants": 15.0, "future": 10.0 },
                "profile": {
                    "monthlyIncomeTarget": 5000.0,
                    "needsPercentage": 50.0,
                    "wantsPercentage": 30.0,
                    "futurePercentage": 20.0,
                },
            })
        );
    }

    #[test]
    fn allocation_summary_with_no_spending_has_zero_percentages() {
        let summary = allocation_summary(
            &profile("1000", AllocationSplit::default()),
            &[],
            Decimal::ZERO,
        );

        assert_eq!(summary.percentages.needs, Decimal::ZERO);
        assert_eq!(summary.percentages.wants, Decimal::ZERO);
        assert_eq!(summary.percentages.future, Decimal::ZERO);
        assert_eq!(summary.targets.needs, dec("500"));
    }

    #[test]
    fn allocation_summary_rounds_percentages_to_two_places() {
        let rent = category(1, "Rent", Some(AllocationBucket::Needs));
        let dining = category(2, "Dining Out", Some(AllocationBucket::Wants));
        let expenses = [amount(&rent, "1"), amount(&dining, "2")];

        let summary = allocation_summary(
            &profile("1000", AllocationSplit::default()),
            &expenses,
            Decimal::ZERO,
        );

        assert_eq!(summary.percentages.needs, dec("33.33"));
        assert_eq!(summary.percentages.wants, dec("66.67"));
    }
}
