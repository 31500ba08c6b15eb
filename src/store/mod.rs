//! Graph storage port and its backends.
//!
//! The augmentation engine and traversal queries talk to storage only through
//! the [`GraphStore`] trait. Two adapters ship with the crate:
//!
//! - [`MemGraphStore`]: ordered in-memory maps with undo-log transactions
//! - [`DurableGraphStore`]: ACID transactions and MVCC snapshots on redb
//!
//! Both keep edges ordered by `(source, rel_name, target)` so the
//! per-source lookups issued by the closure join are range scans.

pub mod durable;
pub mod mem;

use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::relation::{Edge, EdgeKey};
use crate::synset::{Synset, SynsetId};

pub use durable::DurableGraphStore;
pub use mem::MemGraphStore;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Predicate on the `depth` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthFilter {
    #[default]
    Any,
    Exactly(u32),
    AtMost(u32),
}

impl DepthFilter {
    pub fn matches(self, depth: u32) -> bool {
        match self {
            DepthFilter::Any => true,
            DepthFilter::Exactly(d) => depth == d,
            DepthFilter::AtMost(d) => depth <= d,
        }
    }
}

/// Edge predicate used by scans and per-source lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    pub depth: DepthFilter,
    /// Only these relation names (`None` = any).
    pub rel_names: Option<BTreeSet<String>>,
}

impl EdgeFilter {
    /// Match every edge.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn at_depth(depth: u32) -> Self {
        Self {
            depth: DepthFilter::Exactly(depth),
            rel_names: None,
        }
    }

    pub fn with_depth(mut self, depth: DepthFilter) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_relations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rel_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn matches(&self, edge: &Edge) -> bool {
        self.depth.matches(edge.depth) && self.matches_relation(&edge.rel_name)
    }

    pub fn matches_relation(&self, rel_name: &str) -> bool {
        self.rel_names
            .as_ref()
            .is_none_or(|names| names.contains(rel_name))
    }
}

/// Persistence substrate for the synset graph.
///
/// Reads take `&self`; mutations take `&mut self`, so a store has a single
/// writer at a time. While a transaction is active, reads observe the
/// transaction's own writes; other handles see nothing until `commit`.
pub trait GraphStore {
    /// Insert (or replace) a synset.
    fn insert_synset(&mut self, synset: &Synset) -> StoreResult<()>;

    fn synset(&self, id: &SynsetId) -> StoreResult<Option<Synset>>;

    fn synset_count(&self) -> StoreResult<usize>;

    /// All edges matching `filter`, materialized before returning.
    ///
    /// The result is a snapshot: inserts made while the caller iterates it
    /// are never observed.
    fn scan_edges(&self, filter: &EdgeFilter) -> StoreResult<Vec<Edge>>;

    /// Edges leaving `source` that match `filter`, ordered by relation then target.
    fn outgoing(&self, source: &SynsetId, filter: &EdgeFilter) -> StoreResult<Vec<Edge>>;

    fn edge_exists(&self, key: &EdgeKey) -> StoreResult<bool>;

    /// Insert a new edge. Both endpoints must exist and the key must be unused.
    fn insert_edge(&mut self, edge: &Edge) -> StoreResult<()>;

    /// Delete every engine-provenance edge, returning how many were removed.
    fn remove_derived(&mut self) -> StoreResult<usize>;

    fn edge_count(&self) -> StoreResult<usize>;

    fn begin_transaction(&mut self) -> StoreResult<()>;

    fn commit(&mut self) -> StoreResult<()>;

    fn rollback(&mut self) -> StoreResult<()>;

    /// Push buffered writes down to the storage engine. No-op by default.
    fn flush(&mut self) -> StoreResult<()> {
        Ok(())
    }

    /// Drop any per-session read cache. No-op by default.
    fn clear_session_cache(&mut self) {}
}

pub(crate) fn duplicate(key: &EdgeKey) -> StoreError {
    StoreError::DuplicateEdge {
        source_id: key.source.to_string(),
        target_id: key.target.to_string(),
        rel_name: key.rel_name.clone(),
    }
}
