//! A dashboard session: the backend, the query cache and the selected date range.

use crate::api::{Backend, TransactionsQuery};
use crate::cache::{QueryCache, QueryData, QueryKey, QueryKind};
use crate::dashboard::{DateRange, Period, Preset, UploadQueue};
use crate::model::{CategorySummary, Summary, Transaction};
use crate::Result;
use anyhow::bail;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// What a refetch of stale queries achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Refresh {
    pub refreshed: usize,
    pub failed: usize,
}

pub struct Session {
    backend: Arc<dyn Backend>,
    cache: QueryCache,
    invalidations: broadcast::Receiver<QueryKind>,
    range: DateRange,
}

impl Session {
    /// Starts with the default preset, resolved against `today`.
    pub fn new(backend: Arc<dyn Backend>, today: NaiveDate) -> Self {
        let cache = QueryCache::new();
        let invalidations = cache.subscribe();
        Self {
            backend,
            cache,
            invalidations,
            range: Preset::default().range(today),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn select_preset(&mut self, preset: Preset, today: NaiveDate) -> &DateRange {
        self.range = preset.range(today);
        debug!("Selected range {}", self.range);
        &self.range
    }

    /// Transactions within the selected range.
    pub async fn transactions(&mut self) -> Result<Vec<Transaction>> {
        let query = TransactionsQuery::from(&self.range);
        self.load_transactions(QueryKey::Transactions(query)).await
    }

    /// Every transaction the backend holds.
    pub async fn all_transactions(&mut self) -> Result<Vec<Transaction>> {
        self.load_transactions(QueryKey::Transactions(TransactionsQuery::all()))
            .await
    }

    pub async fn recurring(&mut self) -> Result<Vec<Transaction>> {
        self.load_transactions(QueryKey::Recurring).await
    }

    pub async fn summary(&mut self, period: Period) -> Result<BTreeMap<String, Summary>> {
        match self.load(QueryKey::Summary(period)).await? {
            QueryData::Summary(summary) => Ok(summary),
            other => bail!("Unexpected data for the {period} summary: {other:?}"),
        }
    }

    pub async fn category_summary(&mut self) -> Result<BTreeMap<String, CategorySummary>> {
        match self.load(QueryKey::CategorySummary).await? {
            QueryData::CategorySummary(summary) => Ok(summary),
            other => bail!("Unexpected data for the category summary: {other:?}"),
        }
    }

    /// Sends the selected files. On success the transaction and category queries are invalidated
    /// and refetched. The outcome is recorded in the returned queue.
    pub async fn upload(&mut self, queue: UploadQueue) -> UploadQueue {
        let (queue, batch) = queue.begin();
        let Some(batch) = batch else {
            debug!("Nothing to upload");
            return queue;
        };
        info!("Uploading {} files", batch.len());
        match self.backend.upload(&batch).await {
            Ok(result) => {
                info!(
                    "Import {} extracted {} transactions",
                    result.import_id, result.parsed_count
                );
                let queue = queue.complete(Ok(result));
                self.invalidate(QueryKind::Transactions);
                self.invalidate(QueryKind::CategorySummary);
                let refresh = self.refresh_stale().await;
                debug!("Refetched {refresh:?} after upload");
                queue
            }
            Err(e) => {
                warn!("Upload failed: {e:#}");
                queue.complete(Err(e.to_string()))
            }
        }
    }

    /// Marks every query of `kind` stale. The next `refresh_stale` refetches them.
    pub fn invalidate(&mut self, kind: QueryKind) -> usize {
        self.cache.invalidate(kind)
    }

    /// Refetches, concurrently, the stale queries of every kind the cache has announced as
    /// invalidated since the last refresh. Failures are stored in the cache per query.
    pub async fn refresh_stale(&mut self) -> Refresh {
        let kinds = self.invalidated_kinds();
        let keys: Vec<QueryKey> = self
            .cache
            .stale_keys()
            .into_iter()
            .filter(|key| kinds.as_ref().is_none_or(|kinds| kinds.contains(&key.kind())))
            .collect();
        if keys.is_empty() {
            debug!("Nothing to refresh");
            return Refresh::default();
        }
        let mut set = JoinSet::new();
        for key in keys {
            let ticket = self.cache.begin(key);
            let backend = self.backend.clone();
            set.spawn(async move {
                let outcome = fetch(backend.as_ref(), ticket.key()).await;
                (ticket, outcome)
            });
        }
        let mut refresh = Refresh::default();
        while let Some(joined) = set.join_next().await {
            let (ticket, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    error!("A refetch task did not finish: {e}");
                    refresh.failed += 1;
                    continue;
                }
            };
            match outcome {
                Ok(data) => {
                    if self.cache.complete(ticket, Ok(data)) {
                        refresh.refreshed += 1;
                    }
                }
                Err(e) => {
                    warn!("Refetch of {:?} failed: {e:#}", ticket.key());
                    self.cache.complete(ticket, Err(e.to_string()));
                    refresh.failed += 1;
                }
            }
        }
        refresh
    }

    /// Drains the invalidation events. `None` when events were dropped and every stale query has
    /// to be considered.
    fn invalidated_kinds(&mut self) -> Option<HashSet<QueryKind>> {
        let mut kinds = HashSet::new();
        loop {
            match self.invalidations.try_recv() {
                Ok(kind) => {
                    kinds.insert(kind);
                }
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("Missed {missed} invalidation events, refreshing everything stale");
                    return None;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return Some(kinds),
            }
        }
    }

    async fn load_transactions(&mut self, key: QueryKey) -> Result<Vec<Transaction>> {
        match self.load(key).await? {
            QueryData::Transactions(transactions) => Ok(transactions),
            other => bail!("Unexpected data for {key:?}: {other:?}"),
        }
    }

    /// Serves `key` from the cache when it is fresh, otherwise fetches it.
    async fn load(&mut self, key: QueryKey) -> Result<QueryData> {
        if let Some(data) = self.cache.fresh(&key) {
            debug!("Cache hit for {key:?}");
            return Ok(data.clone());
        }
        let ticket = self.cache.begin(key);
        match fetch(self.backend.as_ref(), &key).await {
            Ok(data) => {
                self.cache.complete(ticket, Ok(data.clone()));
                Ok(data)
            }
            Err(e) => {
                self.cache.complete(ticket, Err(e.to_string()));
                Err(e)
            }
        }
    }
}

/// Runs the backend call that `key` stands for.
async fn fetch(backend: &dyn Backend, key: &QueryKey) -> Result<QueryData> {
    Ok(match key {
        QueryKey::Transactions(query) => QueryData::Transactions(backend.transactions(query).await?),
        QueryKey::Summary(period) => QueryData::Summary(backend.summary(*period).await?),
        QueryKey::CategorySummary => QueryData::CategorySummary(backend.category_summary().await?),
        QueryKey::Recurring => QueryData::Transactions(backend.recurring().await?),
    })
}
