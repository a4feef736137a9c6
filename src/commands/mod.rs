//! Command handlers for the spend-dash CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod categories;
mod export;
mod init;
mod summary;
mod transactions;
mod trend;
mod upload;

use crate::api::{self, Mode};
use crate::model::Transaction;
use crate::session::Session;
use crate::{Config, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use categories::{categories, CategoriesReport};
pub use export::{export, ExportReport};
pub use init::init;
pub use summary::{summary, SummaryReport};
pub use transactions::{transactions, RecurringReport, TransactionsOut, TransactionsReport};
pub use trend::{trend, TrendReport};
pub use upload::upload;

/// Dates in tables and range labels look like `15/01/2024`.
const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Shown instead of a chart or breakdown that has nothing in it.
const NO_DATA: &str = "No data available for the selected period";

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Opens a session against the backend selected by `mode`.
fn open_session(config: &Config, mode: Mode, today: chrono::NaiveDate) -> Result<Session> {
    let backend = api::backend(config, mode)?;
    debug!("Opened a {mode:?} session against '{}'", config.api_url());
    Ok(Session::new(backend, today))
}

/// A table with the box-drawing preset and `headers` as its header row.
fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(headers.to_vec());
    table
}

/// One row per transaction, with the columns of the transaction table.
fn transaction_table(transactions: &[Transaction]) -> Table {
    let mut table = new_table(&[
        "Date",
        "Description",
        "Merchant",
        "Category",
        "Amount",
        "Recurring",
    ]);
    for t in transactions {
        table.add_row(vec![
            Cell::new(t.date().format(DISPLAY_DATE_FORMAT)),
            Cell::new(t.description()),
            Cell::new(t.merchant_canonical()),
            Cell::new(t.category()),
            Cell::new(t.amount()).set_alignment(CellAlignment::Right),
            Cell::new(if t.recurring() { "Yes" } else { "" }),
        ]);
    }
    table
}
