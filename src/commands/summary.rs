use crate::api::Mode;
use crate::args::SummaryArgs;
use crate::commands::{open_session, Out};
use crate::dashboard::{totals, DateRange, Totals};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub range: DateRange,
    pub totals: Totals,
}

/// The KPI cards: income, spending and net for the selected range.
pub async fn summary(config: Config, mode: Mode, args: SummaryArgs) -> Result<Out<SummaryReport>> {
    let today = args.range().today();
    let mut session = open_session(&config, mode, today).pub_result(ErrorType::Config)?;
    let range = session.select_preset(args.range().range(), today).clone();
    let transactions = session
        .transactions()
        .await
        .pub_result(ErrorType::Request)?;
    let t = totals(&transactions);
    let message = format!(
        "{range}\n\
         Total Income    {}  ({} transactions)\n\
         Total Spending  {}  ({} transactions)\n\
         Net Amount      {}",
        t.total_income, t.income_count, t.total_spend, t.spend_count, t.net_amount,
    );
    Ok(Out::new(message, SummaryReport { range, totals: t }))
}
