//! Implements the `Backend` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so that the whole program
//! can be run, top-to-bottom, without a statement-parsing server. The summaries are bucketed the
//! same way the server buckets them.

use crate::api::{Backend, Endpoint, TransactionsQuery};
use crate::dashboard::{Period, PdfFile};
use crate::model::{CategorySummary, Summary, Transaction, UploadResponse};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// An implementation of `Backend` that holds its transactions in memory and can be seeded
/// with the data from this module.
pub struct TestBackend {
    transactions: Vec<Transaction>,
    upload_response: Mutex<Option<UploadResponse>>,
    failing: Mutex<HashSet<Endpoint>>,
    calls: Mutex<Vec<Endpoint>>,
}

impl TestBackend {
    /// A backend serving the seed data from this module.
    pub fn seeded() -> Result<Self> {
        Ok(Self::new(seed_transactions()?))
    }

    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            upload_response: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The response that the next uploads will return. Without one, an upload gets a fresh
    /// import id and a `parsed_count` of zero.
    pub fn set_upload_response(&self, response: UploadResponse) {
        if let Ok(mut guard) = self.upload_response.lock() {
            *guard = Some(response);
        }
    }

    /// Makes every later call to `endpoint` fail with that endpoint's message.
    pub fn fail(&self, endpoint: Endpoint) {
        if let Ok(mut guard) = self.failing.lock() {
            guard.insert(endpoint);
        }
    }

    /// How many times `endpoint` has been called.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|&&e| e == endpoint).count())
            .unwrap_or_default()
    }

    fn record(&self, endpoint: Endpoint) -> Result<()> {
        debug!("TestBackend call to '{}'", endpoint.path());
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(endpoint);
        }
        let failing = self
            .failing
            .lock()
            .map(|f| f.contains(&endpoint))
            .unwrap_or_default();
        if failing {
            bail!(endpoint.failure_message());
        }
        Ok(())
    }
}


#[async_trait::async_trait]
impl Backend for TestBackend {
    async fn upload(&self, files: &[PdfFile]) -> Result<UploadResponse> {
        self.record(Endpoint::Upload)?;
        debug!("TestBackend received {} files", files.len());
        let configured = self
            .upload_response
            .lock()
            .ok()
            .and_then(|guard| guard.clone());
        Ok(configured.unwrap_or_else(|| UploadResponse {
            import_id: Uuid::new_v4().to_string(),
            parsed_count: 0,
        }))
    }

    async fn transactions(&self, query: &TransactionsQuery) -> Result<Vec<Transaction>> {
        self.record(Endpoint::Transactions)?;
        Ok(self
            .transactions
            .iter()
            .filter(|t| query.contains(t.date()))
            .cloned()
            .collect())
    }

    async fn summary(&self, period: Period) -> Result<BTreeMap<String, Summary>> {
        self.record(Endpoint::from(period))?;
        let mut buckets: BTreeMap<String, Summary> = BTreeMap::new();
        for t in &self.transactions {
            let bucket = buckets.entry(period_key(t.date(), period)).or_default();
            if t.amount().is_positive() {
                bucket.income += t.amount();
            } else {
                bucket.spend += t.amount().abs();
            }
        }
        for bucket in buckets.values_mut() {
            bucket.net = bucket.income - bucket.spend;
        }
        Ok(buckets)
    }

    async fn category_summary(&self) -> Result<BTreeMap<String, CategorySummary>> {
        self.record(Endpoint::CategorySummary)?;
        let mut buckets: BTreeMap<String, CategorySummary> = BTreeMap::new();
        for t in &self.transactions {
            let bucket = buckets.entry(t.category().to_string()).or_default();
            if t.amount().is_positive() {
                bucket.income += t.amount();
            } else {
                bucket.spend += t.amount().abs();
            }
            bucket.count += 1;
        }
        for bucket in buckets.values_mut() {
            bucket.net = bucket.income - bucket.spend;
        }
        Ok(buckets)
    }

    async fn recurring(&self) -> Result<Vec<Transaction>> {
        self.record(Endpoint::Recurring)?;
        Ok(self
            .transactions
            .iter()
            .filter(|t| t.recurring())
            .cloned()
            .collect())
    }
}

/// `2024-01-15`, `2024-W03` (ISO week) or `2024-01`.
fn period_key(date: NaiveDate, period: Period) -> String {
    match period {
        Period::Daily => date.format("%Y-%m-%d").to_string(),
        Period::Weekly => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Period::Monthly => date.format("%Y-%m").to_string(),
    }
}

/// The seed transactions that `TestBackend::seeded()` serves.
pub fn seed_transactions() -> Result<Vec<Transaction>> {
    load_csv(TRANSACTION_DATA).context("Unable to load the test mode seed data")
}

fn load_csv(csv_data: &str) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    let mut transactions = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let t: Transaction = result.with_context(|| format!("Bad seed row {}", i + 1))?;
        transactions.push(t);
    }
    Ok(transactions)
}

/// Seed transaction data.
const TRANSACTION_DATA: &str = r##"id,date,description,amount,merchant_canonical,category,confidence,recurring,import_id
1,2024-01-15,Salary Payment,5000000,PT Maju Jaya,Income,0.98,true,mock-1
2,2024-01-16,Grocery Shopping - Supermarket,-450000,Supermarket,Food & Dining,0.95,false,mock-1
3,2024-01-17,Electric Bill Payment,-280000,PLN,Bills & Utilities,0.97,true,mock-1
4,2024-01-18,Coffee Shop - Daily Brew,-45000,Daily Brew,Food & Dining,0.9,false,mock-1
5,2024-01-19,Gas Station Fill Up,-320000,Pertamina,Transport & Mobility,0.93,false,mock-1
6,2024-01-20,Netflix Subscription,-199000,Netflix,Shopping & Entertainment,0.99,true,mock-1
7,2024-01-21,Restaurant Dinner,-650000,Sushi Tei,Food & Dining,0.92,false,mock-1
8,2024-01-22,Online Shopping - Electronics,-1200000,Tokopedia,Shopping & Entertainment,0.88,false,mock-1
9,2024-01-23,Gym Membership,-350000,Fitness First,Bills & Utilities,0.91,true,mock-1
10,2024-01-24,Freelance Project Payment,1500000,Upwork,Income,0.85,false,mock-1
"##;
