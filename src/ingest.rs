//! Import of external edges from JSON.
//!
//! The input is an array of `{"source", "target", "rel"}` records. Synsets
//! are created on first mention; every edge is stored at depth 1 with
//! external provenance. Records that repeat an existing external edge are
//! skipped, so importing the same file twice is harmless.
//!
//! New input invalidates the cached closure. The first new edge of an import
//! therefore removes every engine-derived edge in the same transaction, which
//! also frees a triple the engine had derived for the imported depth-1 edge.
//! The next augmentation recomputes the closure with correct depths.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::relation::{Edge, Provenance, RelationTaxonomy};
use crate::store::{EdgeFilter, GraphStore};
use crate::synset::{Synset, SynsetId};

pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// One edge as it appears in an import file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub rel: String,
}

/// Counts from one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub synsets_created: usize,
    pub edges_inserted: usize,
    pub edges_skipped: usize,
    /// Engine-derived edges removed because the closure went stale.
    pub derived_purged: usize,
}

pub fn parse_records(json: &str) -> IngestResult<Vec<EdgeRecord>> {
    serde_json::from_str(json).map_err(|e| IngestError::Parse {
        message: e.to_string(),
    })
}

pub fn read_records(path: &Path) -> IngestResult<Vec<EdgeRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| IngestError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_records(&content)
}

/// Insert `records` as external edges in a single transaction.
///
/// Every id is validated before the store is touched.
pub fn ingest<S: GraphStore>(
    store: &mut S,
    records: &[EdgeRecord],
    taxonomy: &RelationTaxonomy,
) -> IngestResult<IngestReport> {
    let edges = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let source = SynsetId::new(record.source.as_str())
                .map_err(|source| IngestError::InvalidId { index, source })?;
            let target = SynsetId::new(record.target.as_str())
                .map_err(|source| IngestError::InvalidId { index, source })?;
            Ok(Edge::external(source, target, record.rel.as_str(), taxonomy))
        })
        .collect::<IngestResult<Vec<Edge>>>()?;

    store.begin_transaction()?;
    match insert_all(store, &edges) {
        Ok(report) => {
            store.commit()?;
            tracing::info!(
                synsets = report.synsets_created,
                purged = report.derived_purged,
                inserted = report.edges_inserted,
                skipped = report.edges_skipped,
                "edges imported"
            );
            Ok(report)
        }
        Err(e) => {
            if let Err(rollback) = store.rollback() {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}

fn insert_all<S: GraphStore>(store: &mut S, edges: &[Edge]) -> IngestResult<IngestReport> {
    let mut report = IngestReport::default();
    let mut purged = false;
    for edge in edges {
        for id in [&edge.source, &edge.target] {
            if store.synset(id)?.is_none() {
                store.insert_synset(&Synset::new(id.clone()))?;
                report.synsets_created += 1;
            }
        }
        let filter = EdgeFilter::any().with_relations([edge.rel_name.as_str()]);
        let existing = store
            .outgoing(&edge.source, &filter)?
            .into_iter()
            .find(|e| e.target == edge.target);
        if existing.is_some_and(|e| e.provenance == Provenance::External) {
            tracing::trace!(key = %edge.key(), "edge already present");
            report.edges_skipped += 1;
            continue;
        }
        if !purged {
            report.derived_purged = store.remove_derived()?;
            purged = true;
        }
        store.insert_edge(edge)?;
        report.edges_inserted += 1;
    }
    Ok(report)
}
