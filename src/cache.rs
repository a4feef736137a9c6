//! Keyed storage for the results of backend queries.
//!
//! Every fetch takes a `Ticket` from `QueryCache::begin`. Only the ticket from the most recent
//! `begin` for a key may write its result, so a slow response for an old request can never
//! overwrite a newer one. Invalidating a kind of query marks its entries stale and notifies any
//! subscribers, who are expected to refetch.

use crate::api::TransactionsQuery;
use crate::dashboard::Period;
use crate::model::{CategorySummary, Summary, Transaction};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Identifies one backend query, including its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKey {
    Transactions(TransactionsQuery),
    Summary(Period),
    CategorySummary,
    Recurring,
}

impl QueryKey {
    pub fn kind(&self) -> QueryKind {
        match self {
            QueryKey::Transactions(_) => QueryKind::Transactions,
            QueryKey::Summary(_) => QueryKind::Summary,
            QueryKey::CategorySummary => QueryKind::CategorySummary,
            QueryKey::Recurring => QueryKind::Recurring,
        }
    }
}

/// A family of queries, regardless of parameters. This is what gets invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Transactions,
    Summary,
    CategorySummary,
    Recurring,
}

serde_plain::derive_display_from_serialize!(QueryKind);

#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Transactions(Vec<Transaction>),
    Summary(BTreeMap<String, Summary>),
    CategorySummary(BTreeMap<String, CategorySummary>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Loading,
    Ready(QueryData),
    Failed(String),
}

/// Permission to write the result of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: QueryKey,
    seq: u64,
}

impl Ticket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

#[derive(Debug)]
struct Entry {
    latest: u64,
    state: QueryState,
    stale: bool,
}

#[derive(Debug)]
pub struct QueryCache {
    next_seq: u64,
    entries: HashMap<QueryKey, Entry>,
    events: broadcast::Sender<QueryKind>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            next_seq: 0,
            entries: HashMap::new(),
            events,
        }
    }

    pub fn state(&self, key: &QueryKey) -> Option<&QueryState> {
        self.entries.get(key).map(|e| &e.state)
    }

    /// The cached data for `key` if it is loaded and has not been invalidated since.
    pub fn fresh(&self, key: &QueryKey) -> Option<&QueryData> {
        match self.entries.get(key) {
            Some(Entry {
                state: QueryState::Ready(data),
                stale: false,
                ..
            }) => Some(data),
            _ => None,
        }
    }

    /// Starts a fetch for `key`. Any ticket handed out earlier for the same key is superseded.
    pub fn begin(&mut self, key: QueryKey) -> Ticket {
        self.next_seq += 1;
        let seq = self.next_seq;
        let entry = self.entries.entry(key).or_insert(Entry {
            latest: seq,
            state: QueryState::Loading,
            stale: false,
        });
        entry.latest = seq;
        entry.state = QueryState::Loading;
        entry.stale = false;
        trace!("Fetch {seq} started for {key:?}");
        Ticket { key, seq }
    }

    /// Stores the outcome of a fetch. Returns `false`, and stores nothing, when the ticket has been
    /// superseded by a later `begin`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<QueryData, String>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            return false;
        };
        if entry.latest != ticket.seq {
            debug!(
                "Discarding response {} for {:?}, {} is newer",
                ticket.seq, ticket.key, entry.latest
            );
            return false;
        }
        entry.state = match outcome {
            Ok(data) => QueryState::Ready(data),
            Err(message) => QueryState::Failed(message),
        };
        true
    }

    /// Marks every entry of `kind` stale and tells subscribers. Returns the number of entries
    /// marked.
    pub fn invalidate(&mut self, kind: QueryKind) -> usize {
        let mut marked = 0;
        for (_, entry) in self.entries.iter_mut().filter(|(k, _)| k.kind() == kind) {
            entry.stale = true;
            marked += 1;
        }
        debug!("Invalidated {marked} '{kind}' queries");
        // Nobody listening is fine.
        let _ = self.events.send(kind);
        marked
    }

    /// Keys that have been invalidated and not fetched again since.
    pub fn stale_keys(&self) -> Vec<QueryKey> {
        self.entries
            .iter()
            .filter(|(_, e)| e.stale)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Receives the kind of each invalidation made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKind> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::mock_transactions;

    fn data(n: usize) -> QueryData {
        QueryData::Transactions(mock_transactions().into_iter().take(n).collect())
    }

    #[test]
    fn test_begin_then_complete() {
        let mut cache = QueryCache::new();
        let key = QueryKey::Transactions(TransactionsQuery::all());
        assert!(cache.state(&key).is_none());

        let ticket = cache.begin(key);
        assert_eq!(cache.state(&key), Some(&QueryState::Loading));
        assert!(cache.fresh(&key).is_none());

        assert!(cache.complete(ticket, Ok(data(2))));
        assert_eq!(cache.fresh(&key), Some(&data(2)));
    }

    #[test]
    fn test_late_response_is_discarded() {
        let mut cache = QueryCache::new();
        let key = QueryKey::Transactions(TransactionsQuery::all());
        let first = cache.begin(key);
        let second = cache.begin(key);

        assert!(cache.complete(second, Ok(data(3))));
        assert!(!cache.complete(first, Ok(data(1))));
        assert_eq!(cache.fresh(&key), Some(&data(3)));
    }

    #[test]
    fn test_failure_is_stored_per_query() {
        let mut cache = QueryCache::new();
        let ok = cache.begin(QueryKey::Recurring);
        let bad = cache.begin(QueryKey::CategorySummary);
        cache.complete(ok, Ok(data(1)));
        cache.complete(bad, Err("Failed to fetch category summary".to_string()));

        assert!(cache.fresh(&QueryKey::Recurring).is_some());
        assert_eq!(
            cache.state(&QueryKey::CategorySummary),
            Some(&QueryState::Failed(
                "Failed to fetch category summary".to_string()
            ))
        );
    }

    #[test]
    fn test_invalidate_marks_only_that_kind() {
        let mut cache = QueryCache::new();
        let jan = QueryKey::Transactions(TransactionsQuery::all());
        let daily = QueryKey::Summary(Period::Daily);
        for key in [jan, daily] {
            let ticket = cache.begin(key);
            cache.complete(ticket, Ok(data(1)));
        }

        assert_eq!(cache.invalidate(QueryKind::Transactions), 1);
        assert!(cache.fresh(&jan).is_none());
        assert!(cache.fresh(&daily).is_some());
        assert_eq!(cache.stale_keys(), vec![jan]);

        let ticket = cache.begin(jan);
        assert!(cache.stale_keys().is_empty());
        cache.complete(ticket, Ok(data(4)));
        assert_eq!(cache.fresh(&jan), Some(&data(4)));
    }

    #[test]
    fn test_invalidate_during_fetch_stays_stale() {
        let mut cache = QueryCache::new();
        let key = QueryKey::CategorySummary;
        let ticket = cache.begin(key);
        cache.invalidate(QueryKind::CategorySummary);
        cache.complete(ticket, Ok(data(1)));
        assert!(cache.fresh(&key).is_none());
        assert_eq!(cache.stale_keys(), vec![key]);
    }

    #[tokio::test]
    async fn test_subscribers_hear_invalidations() {
        let mut cache = QueryCache::new();
        let mut rx = cache.subscribe();
        cache.invalidate(QueryKind::CategorySummary);
        cache.invalidate(QueryKind::Transactions);
        assert_eq!(rx.recv().await.unwrap(), QueryKind::CategorySummary);
        assert_eq!(rx.recv().await.unwrap(), QueryKind::Transactions);
    }
}
