use crate::api::Mode;
use crate::args::CategoriesArgs;
use crate::commands::{new_table, open_session, Out, NO_DATA};
use crate::dashboard::chart::{category_slices, CategorySlice};
use crate::dashboard::{category_stats, CategoryStat, DateRange};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CategoriesReport {
    pub range: DateRange,
    /// Grouped from the transactions in the range, income included.
    pub stats: Vec<CategoryStat>,
    /// The spending chart, from the backend's category summary.
    pub slices: Vec<CategorySlice>,
}

/// The category breakdown for the selected range and the all-time spending chart data.
pub async fn categories(
    config: Config,
    mode: Mode,
    args: CategoriesArgs,
) -> Result<Out<CategoriesReport>> {
    let today = args.range().today();
    let mut session = open_session(&config, mode, today).pub_result(ErrorType::Config)?;
    let range = session.select_preset(args.range().range(), today).clone();
    let transactions = session
        .transactions()
        .await
        .pub_result(ErrorType::Request)?;
    let summary = session
        .category_summary()
        .await
        .pub_result(ErrorType::Request)?;

    let stats = category_stats(&transactions);
    let slices = category_slices(&summary);

    let breakdown = if stats.is_empty() {
        NO_DATA.to_string()
    } else {
        let mut table = new_table(&["Category", "Transactions", "Amount", "Of Spending"]);
        for s in &stats {
            table.add_row(vec![
                s.category.to_string(),
                s.count.to_string(),
                s.amount.to_string(),
                format!("{}%", s.share_of_spend),
            ]);
        }
        table.to_string()
    };
    let chart = if slices.is_empty() {
        NO_DATA.to_string()
    } else {
        let mut table = new_table(&["Category", "Spending", "Transactions"]);
        for s in &slices {
            table.add_row(vec![s.name.clone(), s.value.to_string(), s.count.to_string()]);
        }
        table.to_string()
    };
    let message = format!("{range}\n{breakdown}\n\nSpending by Category (all time)\n{chart}");
    Ok(Out::new(
        message,
        CategoriesReport {
            range,
            stats,
            slices,
        },
    ))
}
