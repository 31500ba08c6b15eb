//! Inverse completion for canonical relations.
//!
//! For every depth-1 edge `(s, t, r)` whose relation has an inverse `r'`, the
//! normalizer makes sure `(t, s, r')` exists at depth 1. One pass over a
//! snapshot of the depth-1 edges reaches the fixed point: an inserted inverse
//! is itself answered by the edge that produced it.

use crate::error::{AugmentError, Phase};
use crate::relation::{Edge, EdgeKey, RelationTaxonomy};
use crate::store::{EdgeFilter, GraphStore};

use super::batch::BatchWriter;
use super::stats::InsertionStats;

#[derive(Debug)]
pub struct Normalizer<'a> {
    taxonomy: &'a RelationTaxonomy,
    batch_size: usize,
}

impl<'a> Normalizer<'a> {
    pub fn new(taxonomy: &'a RelationTaxonomy, batch_size: usize) -> Self {
        Self {
            taxonomy,
            batch_size,
        }
    }

    /// Insert every missing inverse edge. Returns the number inserted.
    ///
    /// Flushes every `batch_size` processed source synsets.
    pub fn run<S: GraphStore>(
        &self,
        store: &mut S,
        stats: &mut InsertionStats,
    ) -> Result<usize, AugmentError> {
        let phase = Phase::Normalize;
        let filter =
            EdgeFilter::at_depth(1).with_relations(self.taxonomy.invertible_names());
        let snapshot = store
            .scan_edges(&filter)
            .map_err(|e| AugmentError::new(phase, e))?;

        tracing::debug!(edges = snapshot.len(), "normalizing canonical relations");

        let mut writer = BatchWriter::new(self.batch_size);
        let mut inserted = 0;
        let mut current_source = None;

        for edge in &snapshot {
            if current_source != Some(&edge.source) {
                if current_source.is_some() {
                    writer.tick(store, phase)?;
                }
                current_source = Some(&edge.source);
            }
            if !self.taxonomy.is_canonical(&edge.rel_name) {
                continue;
            }
            let Some(inverse) = self.taxonomy.inverse_of(&edge.rel_name) else {
                continue;
            };

            let key = EdgeKey::new(edge.target.clone(), edge.source.clone(), inverse);
            let known = writer
                .is_known(&*store, &key)
                .map_err(|e| AugmentError::new(phase, e).with_relation(inverse))?;
            if known {
                continue;
            }

            writer.push(Edge::derived(
                edge.target.clone(),
                edge.source.clone(),
                inverse,
                1,
                self.taxonomy,
            ));
            stats.record_inverse(inverse);
            inserted += 1;
        }

        writer.flush(store, phase)?;
        tracing::debug!(inserted, flushes = writer.flushes(), "normalization complete");
        Ok(inserted)
    }
}
