//! Transitive closure of canonical relations.
//!
//! Level-synchronous expansion: round `n` joins every canonical edge of depth
//! `n` with the depth-1 edges of the same relation leaving its target, and
//! inserts each resulting `(source, target, relation)` triple that does not
//! yet exist at any depth as a depth `n + 1` edge. A round that inserts
//! nothing is the fixed point.
//!
//! The anti-duplicate check is keyed on the triple alone, so a fact is never
//! re-derived at a higher depth and the number of rounds is bounded by the
//! number of distinct triples. The recorded depth is the round in which a
//! triple was first discovered.

use std::collections::HashMap;

use crate::error::{AugmentError, Phase};
use crate::relation::{Edge, EdgeKey, RelationTaxonomy};
use crate::store::{EdgeFilter, GraphStore};
use crate::synset::SynsetId;

use super::batch::BatchWriter;
use super::stats::InsertionStats;

#[derive(Debug)]
pub struct ClosureComputer<'a> {
    taxonomy: &'a RelationTaxonomy,
    batch_size: usize,
}

/// Outcome of one closure round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub frontier: usize,
    pub inserted: usize,
}

impl<'a> ClosureComputer<'a> {
    pub fn new(taxonomy: &'a RelationTaxonomy, batch_size: usize) -> Self {
        Self {
            taxonomy,
            batch_size,
        }
    }

    /// Expand until a round inserts nothing. Returns the summary of every round run.
    pub fn run<S: GraphStore>(
        &self,
        store: &mut S,
        stats: &mut InsertionStats,
    ) -> Result<Vec<RoundSummary>, AugmentError> {
        let mut rounds = Vec::new();
        let mut depth_to_search: u32 = 1;

        loop {
            let summary = self.round(store, depth_to_search, stats)?;
            stats.rounds += 1;
            tracing::debug!(
                round = summary.round,
                frontier = summary.frontier,
                inserted = summary.inserted,
                "closure round complete"
            );
            rounds.push(summary);
            if summary.inserted == 0 {
                break;
            }
            depth_to_search += 1;
        }

        Ok(rounds)
    }

    /// Run a single round joining depth-`depth` edges with depth-1 edges.
    pub fn round<S: GraphStore>(
        &self,
        store: &mut S,
        depth: u32,
        stats: &mut InsertionStats,
    ) -> Result<RoundSummary, AugmentError> {
        let phase = Phase::Closure { round: depth };
        let canonical = self.taxonomy.canonical_names();
        let frontier = store
            .scan_edges(&EdgeFilter::at_depth(depth).with_relations(canonical))
            .map_err(|e| AugmentError::new(phase, e))?;

        let mut writer = BatchWriter::new(self.batch_size);
        // Depth-1 hops are immutable during closure, so they can be cached
        // for the round; the cache is dropped with each batch flush.
        let mut hops: HashMap<(SynsetId, String), Vec<SynsetId>> = HashMap::new();
        let mut inserted = 0;

        for edge in &frontier {
            let hop_key = (edge.target.clone(), edge.rel_name.clone());
            if !hops.contains_key(&hop_key) {
                let filter = EdgeFilter::at_depth(1).with_relations([edge.rel_name.as_str()]);
                let targets = store
                    .outgoing(&edge.target, &filter)
                    .map_err(|e| AugmentError::new(phase, e).with_relation(&edge.rel_name))?
                    .into_iter()
                    .map(|hop| hop.target)
                    .collect();
                hops.insert(hop_key.clone(), targets);
            }

            for target in hops.get(&hop_key).into_iter().flatten() {
                let key = EdgeKey::new(edge.source.clone(), target.clone(), &edge.rel_name);
                let known = writer
                    .is_known(&*store, &key)
                    .map_err(|e| AugmentError::new(phase, e).with_relation(&edge.rel_name))?;
                if known {
                    continue;
                }
                writer.push(Edge::derived(
                    edge.source.clone(),
                    target.clone(),
                    &edge.rel_name,
                    depth + 1,
                    self.taxonomy,
                ));
                stats.record_closure(&edge.rel_name);
                inserted += 1;
            }

            let flushes = writer.flushes();
            writer.tick(store, phase)?;
            if writer.flushes() != flushes {
                hops.clear();
            }
        }

        writer.flush(store, phase)?;

        Ok(RoundSummary {
            round: depth,
            frontier: frontier.len(),
            inserted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::normalize::Normalizer;
    use crate::store::MemGraphStore;
    use crate::synset::Synset;

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

    fn depth_of(store: &MemGraphStore, s: &str, t: &str, rel: &str) -> Option<u32> {
        store
            .outgoing(&id(s), &EdgeFilter::any().with_relations([rel]))
            .unwrap()
            .into_iter()
            .find(|e| e.target == id(t))
            .map(|e| e.depth)
    }

    #[test]
    fn chain_closes_at_increasing_depth() {
        // 4 -> 3 -> 2 -> 1 via hypernym
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = graph(&[
            ("2", "1", "hypernym"),
            ("3", "2", "hypernym"),
            ("4", "3", "hypernym"),
        ]);
        let mut stats = InsertionStats::new();

        let rounds = ClosureComputer::new(&taxonomy, 100)
            .run(&mut store, &mut stats)
            .unwrap();

        assert_eq!(depth_of(&store, "3", "1", "hypernym"), Some(2));
        assert_eq!(depth_of(&store, "4", "2", "hypernym"), Some(2));
        assert_eq!(depth_of(&store, "4", "1", "hypernym"), Some(3));
        assert_eq!(stats.closure, 3);
        assert_eq!(rounds.len(), 3);
        assert_eq!(rounds.last().unwrap().inserted, 0);
        assert_eq!(stats.rounds, 3);
    }

    #[test]
    fn short_chain_produces_nothing() {
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = graph(&[("2", "1", "hypernym")]);
        let mut stats = InsertionStats::new();

        let rounds = ClosureComputer::new(&taxonomy, 100)
            .run(&mut store, &mut stats)
            .unwrap();
        assert_eq!(rounds.len(), 1);
        assert!(stats.is_empty());
    }

    #[test]
    fn relations_are_not_mixed() {
        // 3 -hypernym-> 2 -holonym-> 1 is not a chain of one relation.
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = graph(&[("3", "2", "hypernym"), ("2", "1", "holonym")]);
        let mut stats = InsertionStats::new();

        ClosureComputer::new(&taxonomy, 100)
            .run(&mut store, &mut stats)
            .unwrap();
        assert!(stats.is_empty());
        assert_eq!(depth_of(&store, "3", "1", "hypernym"), None);
        assert_eq!(depth_of(&store, "3", "1", "holonym"), None);
    }

    #[test]
    fn cycle_terminates() {
        // 1 -> 2 -> 3 -> 1
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = graph(&[
            ("1", "2", "holonym"),
            ("2", "3", "holonym"),
            ("3", "1", "holonym"),
        ]);
        let mut stats = InsertionStats::new();

        ClosureComputer::new(&taxonomy, 2)
            .run(&mut store, &mut stats)
            .unwrap();

        // Every node reaches every node, itself included.
        for s in ["1", "2", "3"] {
            for t in ["1", "2", "3"] {
                assert!(depth_of(&store, s, t, "holonym").is_some(), "{s} -> {t}");
            }
        }
        assert_eq!(store.edge_count().unwrap(), 9);
    }

    #[test]
    fn non_canonical_relations_are_not_closed() {
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = graph(&[("1", "2", "foo"), ("2", "3", "foo")]);
        let mut stats = InsertionStats::new();

        ClosureComputer::new(&taxonomy, 100)
            .run(&mut store, &mut stats)
            .unwrap();
        assert_eq!(store.edge_count().unwrap(), 2);
    }

    #[test]
    fn shortcut_keeps_lower_depth() {
        // 1 -> 2 -> 3 plus a direct 1 -> 3: the direct edge is never re-derived.
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = graph(&[
            ("1", "2", "hypernym"),
            ("2", "3", "hypernym"),
            ("1", "3", "hypernym"),
        ]);
        let mut stats = InsertionStats::new();

        ClosureComputer::new(&taxonomy, 100)
            .run(&mut store, &mut stats)
            .unwrap();
        assert_eq!(depth_of(&store, "1", "3", "hypernym"), Some(1));
        assert!(stats.is_empty());
    }

    #[test]
    fn normalized_chain_closes_both_directions() {
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = graph(&[("2", "1", "hypernym"), ("3", "2", "hypernym")]);
        let mut stats = InsertionStats::new();

        Normalizer::new(&taxonomy, 100)
            .run(&mut store, &mut stats)
            .unwrap();
        ClosureComputer::new(&taxonomy, 100)
            .run(&mut store, &mut stats)
            .unwrap();

        assert_eq!(depth_of(&store, "3", "1", "hypernym"), Some(2));
        assert_eq!(depth_of(&store, "1", "3", "hyponym"), Some(2));
    }
}
