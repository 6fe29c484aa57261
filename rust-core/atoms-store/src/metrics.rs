// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metrics-collecting store decorator.
//
// Wraps any `Store` and transparently counts operations, create conflicts,
// shape rejections and failures, and sums wall-clock latency. Can sit at any
// point of a decorator stack.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::Store;
use crate::value::{Item, Value};

/// Accumulated statistics for a store layer.
///
/// All counters are monotonically increasing until [`MetricsStore::reset_stats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of `read` operations performed.
    pub read_count: u64,
    /// Number of `add` operations performed.
    pub add_count: u64,
    /// Number of `replace` operations performed.
    pub replace_count: u64,
    /// Number of `delete` operations performed.
    pub delete_count: u64,
    /// Number of `search` operations performed.
    pub search_count: u64,
    /// `add` calls that found the name taken and returned the existing item.
    pub add_conflicts: u64,
    /// Calls rejected because of the caller's input (shape, name, null value).
    pub rejections: u64,
    /// Calls that failed for any other reason.
    pub failures: u64,
    /// Total items returned by `search`.
    pub items_searched: u64,
    /// Cumulative latency of `read` and `search`, in milliseconds.
    pub read_latency_sum_ms: f64,
    /// Cumulative latency of `add`, `replace` and `delete`, in milliseconds.
    pub write_latency_sum_ms: f64,
}

#[derive(Clone, Copy)]
enum Op {
    Read,
    Add,
    Replace,
    Delete,
    Search,
}

/// A store decorator that collects operation metrics.
///
/// # Example
///
/// ```rust
/// use atoms_store::{InMemoryTable, MetricsStore, Store, TableStore, Value};
///
/// # tokio_test::block_on(async {
/// let metered = MetricsStore::new(TableStore::new(InMemoryTable::new()));
///
/// metered.add("k", Value::list(["v"])).await.unwrap();
/// metered.add("k", Value::list(["w"])).await.unwrap();
/// metered.read("k").await.unwrap();
///
/// let stats = metered.stats().await;
/// assert_eq!(stats.add_count, 2);
/// assert_eq!(stats.add_conflicts, 1);
/// assert_eq!(stats.read_count, 1);
/// # });
/// ```
pub struct MetricsStore<S: Store> {
    inner: S,
    stats: Arc<RwLock<StoreStats>>,
}

impl<S: Store> MetricsStore<S> {
    /// Wrap `inner` with metrics collection.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stats: Arc::new(RwLock::new(StoreStats::default())),
        }
    }

    /// Return a snapshot of the current statistics.
    pub async fn stats(&self) -> StoreStats {
        self.stats.read().await.clone()
    }

    /// Reset all statistics to zero.
    pub async fn reset_stats(&self) {
        let mut s = self.stats.write().await;
        *s = StoreStats::default();
    }

    /// Return a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn record<T>(&self, op: Op, start: Instant, result: &Result<T, StoreError>) {
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let mut s = self.stats.write().await;

        match op {
            Op::Read => s.read_count += 1,
            Op::Add => s.add_count += 1,
            Op::Replace => s.replace_count += 1,
            Op::Delete => s.delete_count += 1,
            Op::Search => s.search_count += 1,
        }
        match op {
            Op::Read | Op::Search => s.read_latency_sum_ms += elapsed_ms,
            Op::Add | Op::Replace | Op::Delete => s.write_latency_sum_ms += elapsed_ms,
        }
        match result {
            Err(err) if err.is_rejection() => s.rejections += 1,
            Err(_) => s.failures += 1,
            Ok(_) => {}
        }
    }
}

#[async_trait]
impl<S: Store> Store for MetricsStore<S> {
    async fn read(&self, name: &str) -> Result<Option<Item>, StoreError> {
        let start = Instant::now();
        let result = self.inner.read(name).await;
        self.record(Op::Read, start, &result).await;
        result
    }

    async fn add(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        let start = Instant::now();
        let result = self.inner.add(name, value).await;
        self.record(Op::Add, start, &result).await;
        if let Ok(Some(_)) = result {
            self.stats.write().await.add_conflicts += 1;
        }
        result
    }

    async fn replace(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        let start = Instant::now();
        let result = self.inner.replace(name, value).await;
        self.record(Op::Replace, start, &result).await;
        result
    }

    async fn delete(&self, name: &str) -> Result<Option<Item>, StoreError> {
        let start = Instant::now();
        let result = self.inner.delete(name).await;
        self.record(Op::Delete, start, &result).await;
        result
    }

    async fn search(&self, pattern: &str) -> Result<BTreeMap<String, Item>, StoreError> {
        let start = Instant::now();
        let result = self.inner.search(pattern).await;
        self.record(Op::Search, start, &result).await;
        if let Ok(ref items) = result {
            self.stats.write().await.items_searched += items.len() as u64;
        }
        result
    }

    fn describe(&self) -> String {
        format!("metered({})", self.inner.describe())
    }
}
