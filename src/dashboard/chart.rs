//! Data shaping for the spending trend and category charts. Drawing is somebody else's problem.

use crate::model::{Amount, Category, CategorySummary, Summary};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many periods the trend chart shows.
pub const TREND_PERIODS: usize = 10;

/// Which summary endpoint feeds the trend chart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

serde_plain::derive_display_from_serialize!(Period);
serde_plain::derive_fromstr_from_deserialize!(Period);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub label: String,
    pub income: Amount,
    pub spend: Amount,
    pub net: Amount,
}

/// The most recent `TREND_PERIODS` periods in ascending key order.
pub fn trend(summary: &BTreeMap<String, Summary>, period: Period) -> Vec<TrendPoint> {
    let skip = summary.len().saturating_sub(TREND_PERIODS);
    summary
        .iter()
        .skip(skip)
        .map(|(key, s)| TrendPoint {
            period: key.clone(),
            label: period_label(key, period),
            income: s.income,
            spend: s.spend,
            net: s.net,
        })
        .collect()
}

/// Axis label for a period key: `15 Jan`, `2024-Week 03` or `Jan 24`. Keys that do not parse are
/// returned unchanged.
pub fn period_label(key: &str, period: Period) -> String {
    match period {
        Period::Daily => NaiveDate::parse_from_str(key, "%Y-%m-%d")
            .map(|d| d.format("%d %b").to_string())
            .unwrap_or_else(|_| key.to_string()),
        Period::Weekly => key.replacen('W', "Week ", 1),
        Period::Monthly => NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
            .map(|d| d.format("%b %y").to_string())
            .unwrap_or_else(|_| key.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: Amount,
    pub count: u64,
}

/// Spending categories for the pie chart: no income, no empty slices, largest first.
pub fn category_slices(summary: &BTreeMap<String, CategorySummary>) -> Vec<CategorySlice> {
    let income = Category::Income.to_string();
    let mut slices: Vec<CategorySlice> = summary
        .iter()
        .filter(|(name, s)| **name != income && s.spend.is_positive())
        .map(|(name, s)| CategorySlice {
            name: name.clone(),
            value: s.spend,
            count: s.count,
        })
        .collect();
    slices.sort_by(|a, b| b.value.cmp(&a.value));
    slices
}
