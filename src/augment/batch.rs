//! Buffered edge writer with a flush threshold.
//!
//! Augmentation passes queue derived edges here instead of inserting them one
//! by one. Every `threshold` processed items the buffer is written to the
//! store, the store's own buffers are flushed and its session cache is
//! cleared, so the working set stays bounded on large lexicons.

use std::collections::HashSet;

use crate::error::{AugmentError, Phase};
use crate::relation::{Edge, EdgeKey};
use crate::store::{GraphStore, StoreResult};

#[derive(Debug)]
pub struct BatchWriter {
    threshold: usize,
    pending: Vec<Edge>,
    pending_keys: HashSet<EdgeKey>,
    processed: usize,
    flushes: usize,
}

impl BatchWriter {
    /// A writer flushing every `threshold` processed items (at least 1).
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            pending: Vec::new(),
            pending_keys: HashSet::new(),
            processed: 0,
            flushes: 0,
        }
    }

    /// Whether `key` is already present, either in the store or queued here.
    pub fn is_known<S: GraphStore>(&self, store: &S, key: &EdgeKey) -> StoreResult<bool> {
        if self.pending_keys.contains(key) {
            return Ok(true);
        }
        store.edge_exists(key)
    }

    /// Queue an edge. Callers check [`is_known`](Self::is_known) first.
    pub fn push(&mut self, edge: Edge) {
        self.pending_keys.insert(edge.key());
        self.pending.push(edge);
    }

    /// Record one processed item and flush when the threshold is reached.
    pub fn tick<S: GraphStore>(&mut self, store: &mut S, phase: Phase) -> Result<(), AugmentError> {
        self.processed += 1;
        if self.processed % self.threshold == 0 {
            self.flush(store, phase)?;
        }
        Ok(())
    }

    /// Write every queued edge, then flush the store and clear its session cache.
    ///
    /// Returns the number of edges written.
    pub fn flush<S: GraphStore>(&mut self, store: &mut S, phase: Phase) -> Result<usize, AugmentError> {
        let written = self.pending.len();
        for edge in self.pending.drain(..) {
            store
                .insert_edge(&edge)
                .map_err(|e| AugmentError::new(phase, e).with_relation(edge.rel_name.clone()))?;
        }
        self.pending_keys.clear();
        store.flush().map_err(|e| AugmentError::new(phase, e))?;
        store.clear_session_cache();
        self.flushes += 1;
        tracing::debug!(%phase, written, processed = self.processed, "batch flushed");
        Ok(written)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}
