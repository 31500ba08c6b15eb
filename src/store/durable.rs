//! ACID-durable graph store backed by redb.
//!
//! Edges are keyed by `source \0 rel_name \0 target` so that every edge
//! leaving a synset (optionally restricted to one relation) is a contiguous
//! key range. Values are bincode-encoded [`EdgeRecord`]s.
//!
//! While a transaction is open all reads and writes go through the same redb
//! write transaction, so the augmentation engine observes its own inserts and
//! other readers observe nothing until commit.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::relation::{Edge, EdgeKey, Provenance, RelType};
use crate::synset::{Synset, SynsetId};

use super::{EdgeFilter, GraphStore, StoreResult, duplicate};

/// Synset id → bincode `Option<String>` label.
const SYNSETS: TableDefinition<&str, &[u8]> = TableDefinition::new("synsets");

/// `source \0 rel \0 target` → bincode `EdgeRecord`.
const EDGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("edges");

const SEPARATOR: u8 = 0;

/// Stored columns of an edge besides its key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct EdgeRecord {
    rel_type: RelType,
    depth: u32,
    provenance: Provenance,
}

fn redb_err<E: std::fmt::Display>(op: &'static str) -> impl Fn(E) -> StoreError {
    move |e| StoreError::Redb {
        message: format!("{op} failed: {e}"),
    }
}

fn serde_err<E: std::fmt::Display>(what: &'static str) -> impl Fn(E) -> StoreError {
    move |e| StoreError::Serialization {
        message: format!("{what}: {e}"),
    }
}

fn encode_key(source: &str, rel_name: &str, target: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(source.len() + rel_name.len() + target.len() + 2);
    key.extend_from_slice(source.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(rel_name.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(target.as_bytes());
    key
}

fn decode_key(bytes: &[u8]) -> StoreResult<(SynsetId, String, SynsetId)> {
    let mut parts = bytes.splitn(3, |b| *b == SEPARATOR);
    let (Some(source), Some(rel_name), Some(target)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(StoreError::Serialization {
            message: "malformed edge key".into(),
        });
    };
    let text = |part: &[u8]| {
        std::str::from_utf8(part)
            .map(str::to_string)
            .map_err(serde_err("edge key is not UTF-8"))
    };
    let source = SynsetId::new(text(source)?).map_err(serde_err("edge key source"))?;
    let target = SynsetId::new(text(target)?).map_err(serde_err("edge key target"))?;
    Ok((source, text(rel_name)?, target))
}

fn decode_record(bytes: &[u8]) -> StoreResult<EdgeRecord> {
    bincode::deserialize(bytes).map_err(serde_err("failed to decode edge record"))
}

fn to_edge(key: &[u8], value: &[u8]) -> StoreResult<Edge> {
    let (source, rel_name, target) = decode_key(key)?;
    let record = decode_record(value)?;
    Ok(Edge {
        source,
        target,
        rel_name,
        rel_type: record.rel_type,
        depth: record.depth,
        provenance: record.provenance,
    })
}

fn scan_prefix<T>(table: &T, prefix: &[u8], filter: &EdgeFilter) -> StoreResult<Vec<Edge>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut out = Vec::new();
    for entry in table.range::<&[u8]>(prefix..).map_err(redb_err("range"))? {
        let (key, value) = entry.map_err(redb_err("range read"))?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        let edge = to_edge(key, value.value())?;
        if filter.matches(&edge) {
            out.push(edge);
        }
    }
    Ok(out)
}

fn contains_key<T>(table: &T, key: &[u8]) -> StoreResult<bool>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    Ok(table.get(key).map_err(redb_err("get"))?.is_some())
}

fn count_entries<K, V, T>(table: &T) -> StoreResult<usize>
where
    K: redb::Key + 'static,
    V: redb::Value + 'static,
    T: ReadableTable<K, V>,
{
    let mut count = 0;
    for entry in table.iter().map_err(redb_err("iter"))? {
        entry.map_err(redb_err("iter read"))?;
        count += 1;
    }
    Ok(count)
}

/// Open `$table` on the active write transaction, or on a fresh read
/// snapshot when no transaction is open, and evaluate `$body` with it.
macro_rules! with_table {
    ($store:expr, $def:expr, |$table:ident| $body:expr) => {
        match $store.txn.as_ref() {
            Some(txn) => {
                let $table = txn.open_table($def).map_err(redb_err("open_table"))?;
                $body
            }
            None => {
                let txn = $store.db.begin_read().map_err(redb_err("begin_read"))?;
                let $table = txn.open_table($def).map_err(redb_err("open_table"))?;
                $body
            }
        }
    };
}

/// Graph store persisted in a redb database file.
pub struct DurableGraphStore {
    db: Arc<Database>,
    txn: Option<WriteTransaction>,
    /// Keys inserted during the current session, consulted before the table.
    inserted: HashSet<EdgeKey>,
}

impl DurableGraphStore {
    /// Open or create a store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join("lexigraph.redb");
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        let txn = db.begin_write().map_err(redb_err("begin_write"))?;
        txn.open_table(SYNSETS).map_err(redb_err("open_table"))?;
        txn.open_table(EDGES).map_err(redb_err("open_table"))?;
        txn.commit().map_err(redb_err("commit"))?;

        Ok(Self {
            db: Arc::new(db),
            txn: None,
            inserted: HashSet::new(),
        })
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Run `f` inside the open transaction, or inside a one-shot transaction
    /// committed immediately when none is open.
    fn write<R>(&mut self, f: impl FnOnce(&WriteTransaction) -> StoreResult<R>) -> StoreResult<R> {
        if let Some(txn) = self.txn.as_ref() {
            return f(txn);
        }
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        let result = f(&txn)?;
        txn.commit().map_err(redb_err("commit"))?;
        Ok(result)
    }
}

impl GraphStore for DurableGraphStore {
    fn insert_synset(&mut self, synset: &Synset) -> StoreResult<()> {
        // The id is the key; only the label is stored.
        let encoded =
            bincode::serialize(&synset.label).map_err(serde_err("failed to encode synset"))?;
        self.write(|txn| {
            let mut table = txn.open_table(SYNSETS).map_err(redb_err("open_table"))?;
            table
                .insert(synset.id.as_str(), encoded.as_slice())
                .map_err(redb_err("insert"))?;
            Ok(())
        })
    }

    fn synset(&self, id: &SynsetId) -> StoreResult<Option<Synset>> {
        with_table!(self, SYNSETS, |table| {
            let found = table.get(id.as_str()).map_err(redb_err("get"))?;
            let synset = match found {
                Some(guard) => {
                    let label: Option<String> = bincode::deserialize(guard.value())
                        .map_err(serde_err("failed to decode synset"))?;
                    Some(Synset {
                        id: id.clone(),
                        label,
                    })
                }
                None => None,
            };
            Ok(synset)
        })
    }

    fn synset_count(&self) -> StoreResult<usize> {
        with_table!(self, SYNSETS, |table| count_entries(&table))
    }

    fn scan_edges(&self, filter: &EdgeFilter) -> StoreResult<Vec<Edge>> {
        with_table!(self, EDGES, |table| scan_prefix(&table, &[], filter))
    }

    fn outgoing(&self, source: &SynsetId, filter: &EdgeFilter) -> StoreResult<Vec<Edge>> {
        // A single-relation filter narrows the range to `source \0 rel \0`.
        let mut prefix = source.as_str().as_bytes().to_vec();
        prefix.push(SEPARATOR);
        if let Some(names) = &filter.rel_names {
            if names.len() == 1 {
                if let Some(name) = names.iter().next() {
                    prefix.extend_from_slice(name.as_bytes());
                    prefix.push(SEPARATOR);
                }
            }
        }
        with_table!(self, EDGES, |table| scan_prefix(&table, &prefix, filter))
    }

    fn edge_exists(&self, key: &EdgeKey) -> StoreResult<bool> {
        if self.inserted.contains(key) {
            return Ok(true);
        }
        let encoded = encode_key(key.source.as_str(), &key.rel_name, key.target.as_str());
        with_table!(self, EDGES, |table| contains_key(&table, &encoded))
    }

    fn insert_edge(&mut self, edge: &Edge) -> StoreResult<()> {
        if edge.rel_name.as_bytes().contains(&SEPARATOR) {
            return Err(StoreError::Serialization {
                message: format!("relation name {:?} contains a NUL byte", edge.rel_name),
            });
        }
        let key = edge.key();
        if self.inserted.contains(&key) {
            return Err(duplicate(&key));
        }
        let encoded_key = encode_key(edge.source.as_str(), &edge.rel_name, edge.target.as_str());
        let record = EdgeRecord {
            rel_type: edge.rel_type,
            depth: edge.depth,
            provenance: edge.provenance,
        };
        let value = bincode::serialize(&record).map_err(serde_err("failed to encode edge"))?;

        self.write(|txn| {
            {
                let synsets = txn.open_table(SYNSETS).map_err(redb_err("open_table"))?;
                for id in [&edge.source, &edge.target] {
                    if synsets.get(id.as_str()).map_err(redb_err("get"))?.is_none() {
                        return Err(StoreError::MissingSynset { id: id.to_string() });
                    }
                }
            }
            let mut table = txn.open_table(EDGES).map_err(redb_err("open_table"))?;
            if table
                .get(encoded_key.as_slice())
                .map_err(redb_err("get"))?
                .is_some()
            {
                return Err(duplicate(&key));
            }
            table
                .insert(encoded_key.as_slice(), value.as_slice())
                .map_err(redb_err("insert"))?;
            Ok(())
        })?;

        if self.txn.is_some() {
            self.inserted.insert(key);
        }
        Ok(())
    }

    fn remove_derived(&mut self) -> StoreResult<usize> {
        self.inserted.clear();
        self.write(|txn| {
            let mut table = txn.open_table(EDGES).map_err(redb_err("open_table"))?;
            let mut derived: Vec<Vec<u8>> = Vec::new();
            for entry in table.iter().map_err(redb_err("iter"))? {
                let (key, value) = entry.map_err(redb_err("iter read"))?;
                if decode_record(value.value())?.provenance == Provenance::Engine {
                    derived.push(key.value().to_vec());
                }
            }
            for key in &derived {
                table.remove(key.as_slice()).map_err(redb_err("remove"))?;
            }
            Ok(derived.len())
        })
    }

    fn edge_count(&self) -> StoreResult<usize> {
        with_table!(self, EDGES, |table| count_entries(&table))
    }

    fn begin_transaction(&mut self) -> StoreResult<()> {
        if self.txn.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.txn = Some(self.db.begin_write().map_err(redb_err("begin_write"))?);
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        let txn = self.txn.take().ok_or(StoreError::NoTransaction)?;
        self.inserted.clear();
        txn.commit().map_err(redb_err("commit"))
    }

    fn rollback(&mut self) -> StoreResult<()> {
        let txn = self.txn.take().ok_or(StoreError::NoTransaction)?;
        self.inserted.clear();
        txn.abort().map_err(redb_err("abort"))
    }

    fn clear_session_cache(&mut self) {
        self.inserted.clear();
    }
}

impl std::fmt::Debug for DurableGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableGraphStore")
            .field("in_transaction", &self.txn.is_some())
            .field("session_cache", &self.inserted.len())
            .finish()
    }
}
