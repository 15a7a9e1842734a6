//! Concurrent name-to-entry map walked by the reporter on every flush.

use crate::core::{MetricsError, Result};
use crate::metrics::Metric;
use crate::stats::{Instrument, Stat};
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A registered value.
#[derive(Clone)]
pub enum Entry {
    /// A metric adapter, reported as is
    Metric(Arc<dyn Metric>),
    /// A bare statistic, wrapped in its adapter at flush time
    Stat(Stat),
    /// Anything else; kept but never reported
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Metric(_) => f.write_str("Entry::Metric"),
            Entry::Stat(stat) => write!(f, "Entry::Stat({:?})", stat.kind()),
            Entry::Opaque(_) => f.write_str("Entry::Opaque"),
        }
    }
}

/// Thread-safe metric registry.
#[derive(Debug, Default)]
pub struct Registry {
    entries: DashMap<String, Entry>,
}

static DEFAULT_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// Process-wide registry used when a reporter is built without one.
pub fn default_registry() -> Arc<Registry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` under `key`; fails if the key is taken.
    pub fn register(&self, key: impl Into<String>, entry: Entry) -> Result<()> {
        match self.entries.entry(key.into()) {
            MapEntry::Occupied(occupied) => Err(MetricsError::DuplicateMetric(occupied.key().clone())),
            MapEntry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(())
            },
        }
    }

    /// Register a metric adapter under `key`.
    pub fn register_metric(&self, key: impl Into<String>, metric: Arc<dyn Metric>) -> Result<()> {
        self.register(key, Entry::Metric(metric))
    }

    /// Register an object under `key`, as a bare statistic when it resolves
    /// to a known kind and as an opaque value otherwise.
    pub fn register_instrument<I: Instrument>(&self, key: impl Into<String>, instrument: Arc<I>) -> Result<()> {
        let as_instrument: Arc<dyn Instrument> = Arc::clone(&instrument) as Arc<dyn Instrument>;
        let entry = match Stat::resolve(as_instrument) {
            Some(stat) => Entry::Stat(stat),
            None => Entry::Opaque(instrument),
        };
        self.register(key, entry)
    }

    pub fn get(&self, key: &str) -> Option<Entry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Remove and return the entry under `key`.
    pub fn unregister(&self, key: &str) -> Option<Entry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    /// Snapshot of all entries. Order is unspecified.
    pub fn entries(&self) -> Vec<(String, Entry)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Sorted keys
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
