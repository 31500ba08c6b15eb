//! Graph augmentation: inverse completion followed by transitive closure.
//!
//! [`GraphAugmentor`] is the single entry point. It runs the
//! [`Normalizer`](normalize::Normalizer) and then the
//! [`ClosureComputer`](closure::ClosureComputer) inside one store
//! transaction; any failure rolls the whole run back.

pub mod batch;
pub mod closure;
pub mod normalize;
pub mod stats;

use crate::error::{AugmentError, Phase};
use crate::relation::RelationTaxonomy;
use crate::store::GraphStore;

pub use batch::BatchWriter;
pub use closure::{ClosureComputer, RoundSummary};
pub use normalize::Normalizer;
pub use stats::InsertionStats;

/// Tuning knobs for an augmentation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugmentConfig {
    /// Items processed between batch flushes (source synsets during
    /// normalization, frontier edges during closure).
    pub batch_size: usize,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

/// Completes and closes the canonical-relation subgraph of a store.
///
/// Runs must be serialized per store; `augment` takes the store mutably.
#[derive(Debug, Clone)]
pub struct GraphAugmentor<'a> {
    taxonomy: &'a RelationTaxonomy,
    config: AugmentConfig,
}

impl<'a> GraphAugmentor<'a> {
    pub fn new(taxonomy: &'a RelationTaxonomy, config: AugmentConfig) -> Self {
        Self { taxonomy, config }
    }

    pub fn taxonomy(&self) -> &RelationTaxonomy {
        self.taxonomy
    }

    pub fn config(&self) -> &AugmentConfig {
        &self.config
    }

    /// Insert missing inverses, then compute the transitive closure.
    ///
    /// Running it again on an augmented graph inserts nothing.
    pub fn augment<S: GraphStore>(&self, store: &mut S) -> Result<InsertionStats, AugmentError> {
        tracing::info!(
            batch_size = self.config.batch_size,
            canonical = self.taxonomy.canonical_names().len(),
            "augmenting graph"
        );

        let stats = transactional(store, |store| {
            let mut stats = InsertionStats::new();
            Normalizer::new(self.taxonomy, self.config.batch_size).run(store, &mut stats)?;
            ClosureComputer::new(self.taxonomy, self.config.batch_size).run(store, &mut stats)?;
            Ok(stats)
        })?;

        tracing::info!(
            inverses = stats.inverses,
            closure = stats.closure,
            rounds = stats.rounds,
            "augmentation complete"
        );
        Ok(stats)
    }

    /// Delete every engine-inserted edge, leaving only imported data.
    pub fn purge_derived<S: GraphStore>(&self, store: &mut S) -> Result<usize, AugmentError> {
        let removed = transactional(store, |store| {
            store
                .remove_derived()
                .map_err(|e| AugmentError::new(Phase::Purge, e))
        })?;
        tracing::info!(removed, "derived edges purged");
        Ok(removed)
    }
}

/// Run `f` between `begin_transaction` and `commit`, rolling back on error.
fn transactional<S, R>(
    store: &mut S,
    f: impl FnOnce(&mut S) -> Result<R, AugmentError>,
) -> Result<R, AugmentError>
where
    S: GraphStore,
{
    store
        .begin_transaction()
        .map_err(|e| AugmentError::new(Phase::Begin, e))?;

    match f(store) {
        Ok(value) => {
            store
                .commit()
                .map_err(|e| AugmentError::new(Phase::Commit, e))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = store.rollback() {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            tracing::warn!(
                phase = %err.phase,
                relation = err.relation.as_deref().unwrap_or("-"),
                error = %err.source,
                "augmentation rolled back"
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::relation::{Edge, EdgeKey, Provenance};
    use crate::store::{EdgeFilter, MemGraphStore, StoreResult};
    use crate::synset::{Synset, SynsetId};

    fn id(raw: &str) -> SynsetId {
        SynsetId::new(raw).unwrap()
    }

    fn graph(edges: &[(&str, &str, &str)]) -> MemGraphStore {
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = MemGraphStore::new();
        for (s, t, _) in edges {
            for raw in [s, t] {
                store.insert_synset(&Synset::new(id(raw))).unwrap();
            }
        }
        for (s, t, rel) in edges {
            store
                .insert_edge(&Edge::external(id(s), id(t), *rel, &taxonomy))
                .unwrap();
        }
        store
    }

    /// Delegates to a memory store but fails inserts after a budget runs out.
    struct FailingStore {
        inner: MemGraphStore,
        inserts_left: usize,
    }

    impl GraphStore for FailingStore {
        fn insert_synset(&mut self, synset: &Synset) -> StoreResult<()> {
            self.inner.insert_synset(synset)
        }
        fn synset(&self, id: &SynsetId) -> StoreResult<Option<Synset>> {
            self.inner.synset(id)
        }
        fn synset_count(&self) -> StoreResult<usize> {
            self.inner.synset_count()
        }
        fn scan_edges(&self, filter: &EdgeFilter) -> StoreResult<Vec<Edge>> {
            self.inner.scan_edges(filter)
        }
        fn outgoing(&self, source: &SynsetId, filter: &EdgeFilter) -> StoreResult<Vec<Edge>> {
            self.inner.outgoing(source, filter)
        }
        fn edge_exists(&self, key: &EdgeKey) -> StoreResult<bool> {
            self.inner.edge_exists(key)
        }
        fn insert_edge(&mut self, edge: &Edge) -> StoreResult<()> {
            if self.inserts_left == 0 {
                return Err(StoreError::Redb {
                    message: "simulated write failure".into(),
                });
            }
            self.inserts_left -= 1;
            self.inner.insert_edge(edge)
        }
        fn remove_derived(&mut self) -> StoreResult<usize> {
            self.inner.remove_derived()
        }
        fn edge_count(&self) -> StoreResult<usize> {
            self.inner.edge_count()
        }
        fn begin_transaction(&mut self) -> StoreResult<()> {
            self.inner.begin_transaction()
        }
        fn commit(&mut self) -> StoreResult<()> {
            self.inner.commit()
        }
        fn rollback(&mut self) -> StoreResult<()> {
            self.inner.rollback()
        }
    }

    #[test]
    fn augment_then_idempotent() {
        let taxonomy = RelationTaxonomy::wordnet();
        let augmentor = GraphAugmentor::new(&taxonomy, AugmentConfig::default());
        let mut store = graph(&[("2", "1", "hypernym"), ("3", "2", "hypernym")]);

        let first = augmentor.augment(&mut store).unwrap();
        assert_eq!(first.inverses, 2);
        assert_eq!(first.closure, 2);

        let second = augmentor.augment(&mut store).unwrap();
        assert!(second.is_empty());
        assert_eq!(second.rounds, 1);
    }

    #[test]
    fn failure_mid_closure_rolls_back_everything() {
        let taxonomy = RelationTaxonomy::wordnet();
        let augmentor = GraphAugmentor::new(&taxonomy, AugmentConfig { batch_size: 1 });
        // Two inverses succeed, the first closure insert fails.
        let mut store = FailingStore {
            inner: graph(&[("2", "1", "hypernym"), ("3", "2", "hypernym")]),
            inserts_left: 2,
        };

        let err = augmentor.augment(&mut store).unwrap_err();
        assert_eq!(err.phase, Phase::Closure { round: 1 });
        assert!(err.relation.is_some());
        assert_eq!(store.edge_count().unwrap(), 2);
        assert!(store
            .scan_edges(&EdgeFilter::any())
            .unwrap()
            .iter()
            .all(|e| e.provenance == Provenance::External));
    }

    #[test]
    fn failure_during_normalization_names_phase() {
        let taxonomy = RelationTaxonomy::wordnet();
        let augmentor = GraphAugmentor::new(&taxonomy, AugmentConfig::default());
        let mut store = FailingStore {
            inner: graph(&[("2", "1", "hypernym")]),
            inserts_left: 0,
        };

        let err = augmentor.augment(&mut store).unwrap_err();
        assert_eq!(err.phase, Phase::Normalize);
        assert_eq!(err.relation.as_deref(), Some("hyponym"));
        assert_eq!(store.edge_count().unwrap(), 1);
    }

    #[test]
    fn purge_then_augment_restores_edges() {
        let taxonomy = RelationTaxonomy::wordnet();
        let augmentor = GraphAugmentor::new(&taxonomy, AugmentConfig::default());
        let mut store = graph(&[("2", "1", "hypernym"), ("3", "2", "hypernym")]);

        augmentor.augment(&mut store).unwrap();
        let augmented = store.scan_edges(&EdgeFilter::any()).unwrap();

        let removed = augmentor.purge_derived(&mut store).unwrap();
        assert_eq!(removed, augmented.len() - 2);
        assert_eq!(store.edge_count().unwrap(), 2);

        augmentor.augment(&mut store).unwrap();
        assert_eq!(store.scan_edges(&EdgeFilter::any()).unwrap(), augmented);
    }

    #[test]
    fn open_transaction_is_reported_as_begin_failure() {
        let taxonomy = RelationTaxonomy::wordnet();
        let augmentor = GraphAugmentor::new(&taxonomy, AugmentConfig::default());
        let mut store = graph(&[("2", "1", "hypernym")]);
        store.begin_transaction().unwrap();

        let err = augmentor.augment(&mut store).unwrap_err();
        assert_eq!(err.phase, Phase::Begin);
        assert!(matches!(err.source, StoreError::TransactionActive));
    }
}
