use crate::api::Mode;
use crate::args::TransactionsArgs;
use crate::commands::{open_session, transaction_table, Out};
use crate::dashboard::aggregate::{recurring_share, RecurringShare};
use crate::dashboard::{DateRange, TableState, TableView};
use crate::error::{ErrorType, IntoResult};
use crate::model::Transaction;
use crate::{Config, Result};
use serde::Serialize;

const NO_TRANSACTIONS: &str = "No transactions found";
const NO_RECURRING: &str = "No Recurring Transactions";

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsReport {
    pub range: DateRange,
    pub state: TableState,
    pub view: TableView,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringReport {
    pub share: RecurringShare,
    pub transactions: Vec<Transaction>,
}

/// Either one page of the transaction table or, with `--recurring`, the recurring list.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TransactionsOut {
    Table(TransactionsReport),
    Recurring(RecurringReport),
}

/// Renders one page of the transaction table for the selected range.
pub async fn transactions(
    config: Config,
    mode: Mode,
    args: TransactionsArgs,
) -> Result<Out<TransactionsOut>> {
    let today = args.range().today();
    let mut session = open_session(&config, mode, today).pub_result(ErrorType::Config)?;
    if args.recurring() {
        return recurring(&mut session).await;
    }

    let range = session.select_preset(args.range().range(), today).clone();
    let transactions = session
        .transactions()
        .await
        .pub_result(ErrorType::Request)?;
    let state = TableState::default()
        .with_search(args.search())
        .with_category(args.category())
        .with_sort(args.sort(), args.direction())
        .with_page(args.page());
    let view = state.view(&transactions);

    let message = if view.is_empty() {
        format!("{range}\n{NO_TRANSACTIONS}")
    } else {
        format!(
            "{range}\n{}\n\nShowing {} to {} of {} transactions\nPage {} of {}",
            transaction_table(&view.rows),
            view.first,
            view.last,
            view.filtered_count,
            view.page,
            view.total_pages,
        )
    };
    Ok(Out::new(
        message,
        TransactionsOut::Table(TransactionsReport { range, state, view }),
    ))
}

/// The recurring tab: every recurring transaction and its share of all transactions.
async fn recurring(session: &mut crate::session::Session) -> Result<Out<TransactionsOut>> {
    let all = session
        .all_transactions()
        .await
        .pub_result(ErrorType::Request)?;
    let recurring = session.recurring().await.pub_result(ErrorType::Request)?;
    let share = recurring_share(all.len(), recurring.len());
    let message = if recurring.is_empty() {
        NO_RECURRING.to_string()
    } else {
        format!(
            "{}\n\n{} recurring transactions, {}% of all transactions",
            transaction_table(&recurring),
            share.recurring,
            share.percent,
        )
    };
    Ok(Out::new(
        message,
        TransactionsOut::Recurring(RecurringReport {
            share,
            transactions: recurring,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::RangeArgs;
    use crate::dashboard::{Preset, SortDirection, SortField};
    use crate::model::{Category, CategoryFilter};
    use crate::test::TestEnv;
    use chrono::NaiveDate;

    fn jan() -> TransactionsArgs {
        TransactionsArgs::new(RangeArgs::new(
            Preset::ThisMonth,
            NaiveDate::from_ymd_opt(2024, 1, 31),
        ))
    }

    fn table(out: &Out<TransactionsOut>) -> &TransactionsReport {
        match out.structure().unwrap() {
            TransactionsOut::Table(report) => report,
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_food_and_dining() {
        let env = TestEnv::new("http://localhost:8000").await;
        let args = jan()
            .with_category(CategoryFilter::Only(Category::FoodAndDining))
            .with_sort(SortField::Date, SortDirection::Asc);
        let out = transactions(env.config(), Mode::Testing, args)
            .await
            .unwrap();
        let ids: Vec<&str> = table(&out).view.rows.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["2", "4", "7"]);
        assert!(out.message().contains("Showing 1 to 3 of 3 transactions"));
        assert!(out.message().contains("Page 1 of 1"));
        assert!(out.message().contains("Sushi Tei"));
    }

    #[tokio::test]
    async fn test_no_matches() {
        let env = TestEnv::new("http://localhost:8000").await;
        let out = transactions(env.config(), Mode::Testing, jan().with_search("zzz"))
            .await
            .unwrap();
        assert!(out.message().ends_with(NO_TRANSACTIONS));
        assert_eq!(table(&out).view.filtered_count, 0);
    }

    #[tokio::test]
    async fn test_page_past_the_end_shows_last_page() {
        let env = TestEnv::new("http://localhost:8000").await;
        let out = transactions(env.config(), Mode::Testing, jan().with_page(9))
            .await
            .unwrap();
        assert_eq!(table(&out).view.page, 1);
        assert_eq!(table(&out).view.rows.len(), 10);
    }

    #[tokio::test]
    async fn test_recurring_tab() {
        let env = TestEnv::new("http://localhost:8000").await;
        let out = transactions(env.config(), Mode::Testing, jan().with_recurring(true))
            .await
            .unwrap();
        let TransactionsOut::Recurring(report) = out.structure().unwrap() else {
            panic!("expected the recurring list");
        };
        assert_eq!(report.share.recurring, 4);
        assert_eq!(report.share.percent, 40);
        assert!(out.message().contains("40% of all transactions"));
    }
}
