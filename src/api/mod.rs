//! The data fetch layer: everything that talks to the statement-parsing backend.
//!
//! `Backend` is implemented by `HttpBackend`, which calls the real service with `reqwest`, and by
//! `TestBackend`, which serves seed data from memory.

mod http;
mod test_backend;

use crate::dashboard::{DateRange, Period, PdfFile};
use crate::model::{CategorySummary, Summary, Transaction, UploadResponse};
use crate::{Config, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use http::HttpBackend;
pub use test_backend::{seed_transactions, TestBackend};

/// The environment variable that switches the program to the in-memory backend.
pub const TEST_MODE_VAR: &str = "SPEND_DASH_IN_TEST_MODE";

/// The operations the dashboard needs from the backend.
///
/// Methods take `&self` so that independent queries can be in flight at the same time.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Sends every file in one multipart request.
    async fn upload(&self, files: &[PdfFile]) -> Result<UploadResponse>;

    async fn transactions(&self, query: &TransactionsQuery) -> Result<Vec<Transaction>>;

    async fn summary(&self, period: Period) -> Result<BTreeMap<String, Summary>>;

    async fn category_summary(&self) -> Result<BTreeMap<String, CategorySummary>>;

    /// The subset of transactions the server has flagged as recurring.
    async fn recurring(&self) -> Result<Vec<Transaction>>;
}

/// Optional inclusive date bounds for `GET /transactions`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TransactionsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TransactionsQuery {
    /// No bounds: every transaction.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| s <= date) && self.end.is_none_or(|e| date <= e)
    }
}

impl From<&DateRange> for TransactionsQuery {
    fn from(range: &DateRange) -> Self {
        Self {
            start: Some(range.start),
            end: Some(range.end),
        }
    }
}

/// The backend endpoints, with the message shown when each of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Upload,
    Transactions,
    DailySummary,
    WeeklySummary,
    MonthlySummary,
    CategorySummary,
    Recurring,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Upload => "upload",
            Endpoint::Transactions => "transactions",
            Endpoint::DailySummary => "summary/daily",
            Endpoint::WeeklySummary => "summary/weekly",
            Endpoint::MonthlySummary => "summary/monthly",
            Endpoint::CategorySummary => "summary/category",
            Endpoint::Recurring => "recurring",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::Upload => "Failed to upload PDFs",
            Endpoint::Transactions => "Failed to fetch transactions",
            Endpoint::DailySummary => "Failed to fetch daily summary",
            Endpoint::WeeklySummary => "Failed to fetch weekly summary",
            Endpoint::MonthlySummary => "Failed to fetch monthly summary",
            Endpoint::CategorySummary => "Failed to fetch category summary",
            Endpoint::Recurring => "Failed to fetch recurring transactions",
        }
    }
}

impl From<Period> for Endpoint {
    fn from(period: Period) -> Self {
        match period {
            Period::Daily => Endpoint::DailySummary,
            Period::Weekly => Endpoint::WeeklySummary,
            Period::Monthly => Endpoint::MonthlySummary,
        }
    }
}

/// Whether we are talking to a real server or to in-memory seed data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Http,
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `SPEND_DASH_IN_TEST_MODE` is set to anything non-empty.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_VAR) {
            Ok(v) if !v.is_empty() => Mode::Testing,
            _ => Mode::Http,
        }
    }
}

/// Creates the backend for `mode`.
pub fn backend(config: &Config, mode: Mode) -> Result<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match mode {
        Mode::Http => Arc::new(HttpBackend::new(config.api_url())?),
        Mode::Testing => Arc::new(TestBackend::seeded()?),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_query_bounds_are_inclusive() {
        let q = TransactionsQuery {
            start: Some(d("2024-01-16")),
            end: Some(d("2024-01-18")),
        };
        assert!(!q.contains(d("2024-01-15")));
        assert!(q.contains(d("2024-01-16")));
        assert!(q.contains(d("2024-01-18")));
        assert!(!q.contains(d("2024-01-19")));
        assert!(TransactionsQuery::all().contains(d("1999-01-01")));
    }

    #[test]
    fn test_summary_endpoints() {
        assert_eq!(Endpoint::from(Period::Weekly).path(), "summary/weekly");
        assert_eq!(
            Endpoint::from(Period::Monthly).failure_message(),
            "Failed to fetch monthly summary"
        );
    }
}
