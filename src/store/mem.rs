//! In-memory graph store.
//!
//! Edges live in ordered maps keyed by source, then `(rel_name, target)`.
//! Transactions are implemented with an undo log: writes apply in place and
//! `rollback` replays the log backwards. All data is lost on process exit.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::relation::{Edge, EdgeKey, Provenance, RelType};
use crate::synset::{Synset, SynsetId};

use super::{EdgeFilter, GraphStore, StoreResult, duplicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeRecord {
    rel_type: RelType,
    depth: u32,
    provenance: Provenance,
}

type Adjacency = BTreeMap<(String, SynsetId), EdgeRecord>;

#[derive(Debug)]
enum Undo {
    InsertedEdge(EdgeKey),
    RemovedEdge(EdgeKey, EdgeRecord),
    Synset(SynsetId, Option<Synset>),
}

/// Ordered in-memory store with undo-log transactions.
#[derive(Debug, Default)]
pub struct MemGraphStore {
    synsets: BTreeMap<SynsetId, Synset>,
    edges: BTreeMap<SynsetId, Adjacency>,
    undo: Option<Vec<Undo>>,
}

impl MemGraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.undo.is_some()
    }

    fn log(&mut self, entry: Undo) {
        if let Some(undo) = self.undo.as_mut() {
            undo.push(entry);
        }
    }

    fn remove_edge_raw(&mut self, key: &EdgeKey) -> Option<EdgeRecord> {
        let adjacency = self.edges.get_mut(&key.source)?;
        let removed = adjacency.remove(&(key.rel_name.clone(), key.target.clone()));
        if adjacency.is_empty() {
            self.edges.remove(&key.source);
        }
        removed
    }

    fn insert_edge_raw(&mut self, key: EdgeKey, record: EdgeRecord) {
        self.edges
            .entry(key.source)
            .or_default()
            .insert((key.rel_name, key.target), record);
    }
}

fn to_edge(source: &SynsetId, rel_name: &str, target: &SynsetId, record: &EdgeRecord) -> Edge {
    Edge {
        source: source.clone(),
        target: target.clone(),
        rel_name: rel_name.to_string(),
        rel_type: record.rel_type,
        depth: record.depth,
        provenance: record.provenance,
    }
}

impl GraphStore for MemGraphStore {
    fn insert_synset(&mut self, synset: &Synset) -> StoreResult<()> {
        let previous = self.synsets.insert(synset.id.clone(), synset.clone());
        self.log(Undo::Synset(synset.id.clone(), previous));
        Ok(())
    }

    fn synset(&self, id: &SynsetId) -> StoreResult<Option<Synset>> {
        Ok(self.synsets.get(id).cloned())
    }

    fn synset_count(&self) -> StoreResult<usize> {
        Ok(self.synsets.len())
    }

    fn scan_edges(&self, filter: &EdgeFilter) -> StoreResult<Vec<Edge>> {
        let mut out = Vec::new();
        for (source, adjacency) in &self.edges {
            for ((rel_name, target), record) in adjacency {
                if filter.depth.matches(record.depth) && filter.matches_relation(rel_name) {
                    out.push(to_edge(source, rel_name, target, record));
                }
            }
        }
        Ok(out)
    }

    fn outgoing(&self, source: &SynsetId, filter: &EdgeFilter) -> StoreResult<Vec<Edge>> {
        let Some(adjacency) = self.edges.get(source) else {
            return Ok(Vec::new());
        };
        Ok(adjacency
            .iter()
            .filter(|((rel_name, _), record)| {
                filter.depth.matches(record.depth) && filter.matches_relation(rel_name)
            })
            .map(|((rel_name, target), record)| to_edge(source, rel_name, target, record))
            .collect())
    }

    fn edge_exists(&self, key: &EdgeKey) -> StoreResult<bool> {
        Ok(self.edges.get(&key.source).is_some_and(|adjacency| {
            adjacency.contains_key(&(key.rel_name.clone(), key.target.clone()))
        }))
    }

    fn insert_edge(&mut self, edge: &Edge) -> StoreResult<()> {
        for id in [&edge.source, &edge.target] {
            if !self.synsets.contains_key(id) {
                return Err(StoreError::MissingSynset { id: id.to_string() });
            }
        }
        let key = edge.key();
        if self.edge_exists(&key)? {
            return Err(duplicate(&key));
        }
        let record = EdgeRecord {
            rel_type: edge.rel_type,
            depth: edge.depth,
            provenance: edge.provenance,
        };
        self.insert_edge_raw(key.clone(), record);
        self.log(Undo::InsertedEdge(key));
        Ok(())
    }

    fn remove_derived(&mut self) -> StoreResult<usize> {
        let derived: Vec<EdgeKey> = self
            .edges
            .iter()
            .flat_map(|(source, adjacency)| {
                adjacency
                    .iter()
                    .filter(|(_, record)| record.provenance == Provenance::Engine)
                    .map(|((rel_name, target), _)| {
                        EdgeKey::new(source.clone(), target.clone(), rel_name.clone())
                    })
            })
            .collect();

        for key in &derived {
            if let Some(record) = self.remove_edge_raw(key) {
                self.log(Undo::RemovedEdge(key.clone(), record));
            }
        }
        Ok(derived.len())
    }

    fn edge_count(&self) -> StoreResult<usize> {
        Ok(self.edges.values().map(BTreeMap::len).sum())
    }

    fn begin_transaction(&mut self) -> StoreResult<()> {
        if self.undo.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.undo = Some(Vec::new());
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.undo.take().ok_or(StoreError::NoTransaction)?;
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        let undo = self.undo.take().ok_or(StoreError::NoTransaction)?;
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::InsertedEdge(key) => {
                    self.remove_edge_raw(&key);
                }
                Undo::RemovedEdge(key, record) => self.insert_edge_raw(key, record),
                Undo::Synset(id, Some(previous)) => {
                    self.synsets.insert(id, previous);
                }
                Undo::Synset(id, None) => {
                    self.synsets.remove(&id);
                }
            }
        }
        Ok(())
    }
}
