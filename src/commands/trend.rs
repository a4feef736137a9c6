use crate::api::Mode;
use crate::args::TrendArgs;
use crate::commands::{new_table, open_session, Out, NO_DATA};
use crate::dashboard::chart::{trend as trend_points, TrendPoint};
use crate::dashboard::Period;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub view: Period,
    pub points: Vec<TrendPoint>,
}

/// Income, spending and net for the most recent periods of `view`.
pub async fn trend(config: Config, mode: Mode, args: TrendArgs) -> Result<Out<TrendReport>> {
    let today = chrono::Local::now().date_naive();
    let mut session = open_session(&config, mode, today).pub_result(ErrorType::Config)?;
    let view = args.view();
    let summary = session.summary(view).await.pub_result(ErrorType::Request)?;
    let points = trend_points(&summary, view);

    let message = if points.is_empty() {
        NO_DATA.to_string()
    } else {
        let mut table = new_table(&["Period", "Income", "Spending", "Net"]);
        for p in &points {
            table.add_row(vec![
                p.label.clone(),
                p.income.to_string(),
                p.spend.to_string(),
                p.net.to_string(),
            ]);
        }
        format!("Spending Trend ({view})\n{table}")
    };
    Ok(Out::new(message, TrendReport { view, points }))
}
