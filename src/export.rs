//! CSV export of the transaction list.

use crate::model::Transaction;
use crate::{utils, Result};
use anyhow::Context;
use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const EXPORT_HEADER: [&str; 6] = [
    "Date",
    "Description",
    "Amount",
    "Category",
    "Merchant",
    "Recurring",
];

/// `transactions-2024-01-31.csv` for a `today` of 2024-01-31.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("transactions-{}.csv", today.format("%Y-%m-%d"))
}

/// Renders `transactions` as CSV.
///
/// Description and merchant are always quoted, with embedded quotes doubled. The writer itself never
/// quotes, so the remaining fields go out exactly as formatted: the raw integer amount, the category
/// name and `Yes` or `No` for recurring.
pub fn to_csv(transactions: &[Transaction]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADER)
        .context("Unable to write the CSV header")?;
    for t in transactions {
        let record = [
            t.date().format("%Y-%m-%d").to_string(),
            quoted(t.description()),
            i64::from(t.amount()).to_string(),
            t.category().to_string(),
            quoted(t.merchant_canonical()),
            if t.recurring() { "Yes" } else { "No" }.to_string(),
        ];
        writer
            .write_record(&record)
            .with_context(|| format!("Unable to write transaction '{}' as CSV", t.id()))?;
    }
    let bytes = writer
        .into_inner()
        .context("Unable to finish writing the CSV")?;
    String::from_utf8(bytes).context("The CSV output was not UTF-8")
}

/// Writes the export into `dir`, named for `today`, and returns its path.
pub async fn write_csv(
    dir: &Path,
    transactions: &[Transaction],
    today: NaiveDate,
) -> Result<PathBuf> {
    let contents = to_csv(transactions)?;
    utils::make_dir(dir).await?;
    let path = dir.join(export_file_name(today));
    utils::write(&path, contents).await?;
    debug!(
        "Wrote {} transactions to {}",
        transactions.len(),
        path.display()
    );
    Ok(path)
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
