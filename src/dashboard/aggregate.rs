//! Totals and per-category statistics derived from a set of transactions.
//!
//! Everything here is a pure function of its input slice.

use crate::model::{Amount, Category, Transaction};
use serde::Serialize;
use std::collections::HashMap;

/// Income, spending and net over a set of transactions.
///
/// Zero-amount transactions are neither income nor spending and are not counted in either. Sums
/// saturate at the bounds of `i64`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_income: Amount,
    pub total_spend: Amount,
    pub net_amount: Amount,
    pub income_count: usize,
    pub spend_count: usize,
}

pub fn totals(transactions: &[Transaction]) -> Totals {
    let mut t = Totals::default();
    for amount in transactions.iter().map(Transaction::amount) {
        if amount.is_positive() {
            t.total_income += amount;
            t.income_count += 1;
        } else if amount.is_negative() {
            t.total_spend += amount.abs();
            t.spend_count += 1;
        }
    }
    t.net_amount = t.total_income - t.total_spend;
    t
}

/// Count and absolute amount of the transactions in one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub category: Category,
    pub count: usize,
    pub amount: Amount,
    /// `amount` as a rounded percentage of total spending, 0 when there is no spending.
    ///
    /// Income is grouped like any other category, so its share can exceed 100.
    pub share_of_spend: u64,
}

/// Groups every transaction, income included, by category using absolute amounts. The result is
/// sorted by amount, largest first.
pub fn category_stats(transactions: &[Transaction]) -> Vec<CategoryStat> {
    let mut order = Vec::new();
    let mut acc: HashMap<Category, (usize, Amount)> = HashMap::new();
    for t in transactions {
        let entry = acc.entry(t.category()).or_insert_with(|| {
            order.push(t.category());
            (0, Amount::ZERO)
        });
        entry.0 += 1;
        entry.1 += t.amount().abs();
    }

    let total_spend = totals(transactions).total_spend;
    let mut stats: Vec<CategoryStat> = order
        .into_iter()
        .filter_map(|category| {
            acc.get(&category).map(|&(count, amount)| CategoryStat {
                category,
                count,
                amount,
                share_of_spend: percent_of(amount.value(), total_spend.value()),
            })
        })
        .collect();
    stats.sort_by(|a, b| b.amount.cmp(&a.amount));
    stats
}

/// Number of recurring transactions and their rounded share of the whole list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecurringShare {
    pub total: usize,
    pub recurring: usize,
    pub percent: u64,
}

pub fn recurring_share(total: usize, recurring: usize) -> RecurringShare {
    RecurringShare {
        total,
        recurring,
        percent: percent_of(recurring as i64, total as i64),
    }
}

/// `part / whole` as a whole percentage, rounded half up. Returns 0 for a non-positive `whole`.
pub fn percent_of(part: i64, whole: i64) -> u64 {
    if whole <= 0 || part <= 0 {
        return 0;
    }
    let (part, whole) = (part as u128, whole as u128);
    ((part * 100 + whole / 2) / whole) as u64
}
