//! Transitive neighborhood and reachability queries.
//!
//! For canonical relations the closure edges written by augmentation are
//! already in the store, so a neighborhood is one per-source lookup filtered
//! by depth. Any other relation set falls back to breadth-first walks over
//! depth-1 edges, one walk per relation name, so a path never mixes names and
//! both strategies agree on an augmented graph. An empty relation list means
//! "any relation": that single walk follows every edge and may mix names.
//! Both strategies are exposed through the same lazy [`Neighbors`] iterator.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::error::{QueryError, SynsetError};
use crate::relation::RelationTaxonomy;
use crate::store::{DepthFilter, EdgeFilter, GraphStore, StoreResult};
use crate::synset::SynsetId;

/// Result type for traversal queries.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Hop limit of a traversal. `-1` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthLimit {
    Unbounded,
    Hops(u32),
}

impl DepthLimit {
    /// Whether a path of `hops` edges is within the limit.
    pub fn allows(self, hops: u32) -> bool {
        match self {
            DepthLimit::Unbounded => true,
            DepthLimit::Hops(max) => hops <= max,
        }
    }

    fn depth_filter(self) -> DepthFilter {
        match self {
            DepthLimit::Unbounded => DepthFilter::Any,
            DepthLimit::Hops(max) => DepthFilter::AtMost(max),
        }
    }
}

impl TryFrom<i64> for DepthLimit {
    type Error = QueryError;

    fn try_from(max_depth: i64) -> Result<Self, Self::Error> {
        match max_depth {
            -1 => Ok(DepthLimit::Unbounded),
            d if d < -1 => Err(QueryError::InvalidDepth { max_depth }),
            d => Ok(DepthLimit::Hops(u32::try_from(d).unwrap_or(u32::MAX))),
        }
    }
}

/// Read-only queries over an (augmented) graph.
#[derive(Debug)]
pub struct TraversalQueries<'a, S> {
    store: &'a S,
    taxonomy: &'a RelationTaxonomy,
}

impl<'a, S: GraphStore> TraversalQueries<'a, S> {
    pub fn new(store: &'a S, taxonomy: &'a RelationTaxonomy) -> Self {
        Self { store, taxonomy }
    }

    /// Distinct synsets reachable from `source` in at most `max_depth` hops of
    /// the named relations (any relation when `rel_names` is empty).
    ///
    /// The source itself is only yielded when a cycle leads back to it.
    /// Arguments are validated before the store is touched.
    pub fn transitive_neighbors(
        &self,
        source: &str,
        max_depth: i64,
        rel_names: &[&str],
    ) -> QueryResult<Neighbors<'a, S>> {
        let limit = DepthLimit::try_from(max_depth)?;
        let source = parse_id(source, "source")?;

        let precomputed =
            !rel_names.is_empty() && rel_names.iter().all(|n| self.taxonomy.is_canonical(n));
        let strategy = if precomputed {
            Strategy::Precomputed {
                filter: EdgeFilter::any()
                    .with_depth(limit.depth_filter())
                    .with_relations(rel_names.iter().copied()),
            }
        } else if rel_names.is_empty() {
            Strategy::Bfs {
                limit,
                walks: vec![Walk::new(&source, EdgeFilter::at_depth(1))],
            }
        } else {
            let names: BTreeSet<&str> = rel_names.iter().copied().collect();
            Strategy::Bfs {
                limit,
                walks: names
                    .into_iter()
                    .map(|name| Walk::new(&source, EdgeFilter::at_depth(1).with_relations([name])))
                    .collect(),
            }
        };

        tracing::trace!(%source, ?limit, precomputed, "transitive neighbors");

        Ok(Neighbors {
            store: self.store,
            source,
            strategy,
            ready: VecDeque::new(),
            emitted: HashSet::new(),
            done: limit == DepthLimit::Hops(0),
        })
    }

    /// Whether `target` is among the transitive neighbors of `source`.
    ///
    /// A synset always reaches itself.
    pub fn is_reachable(
        &self,
        source: &str,
        target: &str,
        max_depth: i64,
        rel_names: &[&str],
    ) -> QueryResult<bool> {
        DepthLimit::try_from(max_depth)?;
        let source_id = parse_id(source, "source")?;
        let target_id = parse_id(target, "target")?;
        if source_id == target_id {
            return Ok(true);
        }

        for neighbor in self.transitive_neighbors(source, max_depth, rel_names)? {
            if neighbor? == target_id {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn parse_id(raw: &str, argument: &'static str) -> QueryResult<SynsetId> {
    SynsetId::new(raw).map_err(|source| match source {
        SynsetError::BlankId => QueryError::BlankId { argument },
        source => QueryError::InvalidId { argument, source },
    })
}

#[derive(Debug)]
enum Strategy {
    /// One lookup of closure edges leaving the source.
    Precomputed { filter: EdgeFilter },
    /// Breadth-first walks over depth-1 edges, drained one after another.
    Bfs { limit: DepthLimit, walks: Vec<Walk> },
}

/// One breadth-first walk restricted by its own edge filter.
#[derive(Debug)]
struct Walk {
    filter: EdgeFilter,
    queue: VecDeque<(SynsetId, u32)>,
    expanded: HashSet<SynsetId>,
}

impl Walk {
    fn new(source: &SynsetId, filter: EdgeFilter) -> Self {
        Self {
            filter,
            queue: VecDeque::from([(source.clone(), 0)]),
            expanded: HashSet::from([source.clone()]),
        }
    }
}

/// Lazy, deduplicated stream of reachable synsets.
///
/// Store reads happen as the iterator is advanced. A store error is yielded
/// once and ends the stream.
#[derive(Debug)]
pub struct Neighbors<'a, S> {
    store: &'a S,
    source: SynsetId,
    strategy: Strategy,
    ready: VecDeque<SynsetId>,
    emitted: HashSet<SynsetId>,
    done: bool,
}

impl<S: GraphStore> Neighbors<'_, S> {
    /// Pull the next batch of candidates into `ready`.
    fn advance(&mut self) -> StoreResult<()> {
        match &mut self.strategy {
            Strategy::Precomputed { filter } => {
                self.done = true;
                for edge in self.store.outgoing(&self.source, filter)? {
                    if self.emitted.insert(edge.target.clone()) {
                        self.ready.push_back(edge.target);
                    }
                }
            }
            Strategy::Bfs { limit, walks } => {
                let Some(walk) = walks.iter_mut().find(|w| !w.queue.is_empty()) else {
                    self.done = true;
                    return Ok(());
                };
                let Some((node, hops)) = walk.queue.pop_front() else {
                    return Ok(());
                };
                let next = hops.saturating_add(1);
                for edge in self.store.outgoing(&node, &walk.filter)? {
                    if limit.allows(next.saturating_add(1))
                        && walk.expanded.insert(edge.target.clone())
                    {
                        walk.queue.push_back((edge.target.clone(), next));
                    }
                    if self.emitted.insert(edge.target.clone()) {
                        self.ready.push_back(edge.target);
                    }
                }
            }
        }
        Ok(())
    }
}

impl<S: GraphStore> Iterator for Neighbors<'_, S> {
    type Item = QueryResult<SynsetId>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.ready.pop_front() {
                return Some(Ok(id));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.advance() {
                self.done = true;
                return Some(Err(e.into()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{AugmentConfig, GraphAugmentor};
    use crate::relation::Edge;
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

    fn augmented(edges: &[(&str, &str, &str)]) -> MemGraphStore {
        let taxonomy = RelationTaxonomy::wordnet();
        let mut store = graph(edges);
        GraphAugmentor::new(&taxonomy, AugmentConfig::default())
            .augment(&mut store)
            .unwrap();
        store
    }

    fn sorted(neighbors: Neighbors<'_, MemGraphStore>) -> Vec<String> {
        let mut out: Vec<String> = neighbors.map(|n| n.unwrap().to_string()).collect();
        out.sort();
        out
    }

    const CHAIN: &[(&str, &str, &str)] = &[
        ("2", "1", "hypernym"),
        ("3", "2", "hypernym"),
        ("4", "3", "hypernym"),
    ];

    #[test]
    fn depth_limits_on_precomputed_closure() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = augmented(CHAIN);
        let queries = TraversalQueries::new(&store, &taxonomy);

        let q = |depth| sorted(queries.transitive_neighbors("4", depth, &["hypernym"]).unwrap());
        assert_eq!(q(1), ["3"]);
        assert_eq!(q(2), ["2", "3"]);
        assert_eq!(q(-1), ["1", "2", "3"]);
        assert!(q(0).is_empty());
    }

    #[test]
    fn bfs_over_non_canonical_relation() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = graph(&[("a", "b", "foo"), ("b", "c", "foo"), ("c", "d", "foo")]);
        let queries = TraversalQueries::new(&store, &taxonomy);

        let q = |depth| sorted(queries.transitive_neighbors("a", depth, &["foo"]).unwrap());
        assert_eq!(q(1), ["b"]);
        assert_eq!(q(2), ["b", "c"]);
        assert_eq!(q(-1), ["b", "c", "d"]);
    }

    #[test]
    fn empty_relation_list_follows_everything() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = graph(&[("a", "b", "foo"), ("b", "c", "hypernym")]);
        let queries = TraversalQueries::new(&store, &taxonomy);

        assert_eq!(sorted(queries.transitive_neighbors("a", -1, &[]).unwrap()), ["b", "c"]);
    }

    #[test]
    fn bfs_handles_cycles_and_deduplicates() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = graph(&[
            ("a", "b", "foo"),
            ("a", "c", "foo"),
            ("b", "c", "foo"),
            ("c", "a", "foo"),
        ]);
        let queries = TraversalQueries::new(&store, &taxonomy);

        assert_eq!(
            sorted(queries.transitive_neighbors("a", -1, &["foo"]).unwrap()),
            ["a", "b", "c"]
        );
        assert_eq!(sorted(queries.transitive_neighbors("a", 1, &["foo"]).unwrap()), ["b", "c"]);
    }

    #[test]
    fn invalid_depth_rejected() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = MemGraphStore::new();
        let queries = TraversalQueries::new(&store, &taxonomy);

        assert!(matches!(
            queries.transitive_neighbors("a", -2, &[]),
            Err(QueryError::InvalidDepth { max_depth: -2 })
        ));
        assert!(matches!(
            queries.is_reachable("a", "a", -5, &[]),
            Err(QueryError::InvalidDepth { .. })
        ));
    }

    #[test]
    fn blank_ids_rejected() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = MemGraphStore::new();
        let queries = TraversalQueries::new(&store, &taxonomy);

        assert!(matches!(
            queries.transitive_neighbors("  ", 1, &[]),
            Err(QueryError::BlankId { argument: "source" })
        ));
        assert!(matches!(
            queries.is_reachable("a", "", 1, &[]),
            Err(QueryError::BlankId { argument: "target" })
        ));
        assert!(matches!(
            queries.is_reachable("a\0b", "a", 1, &[]),
            Err(QueryError::InvalidId { argument: "source", .. })
        ));
    }

    #[test]
    fn reachability() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = augmented(CHAIN);
        let queries = TraversalQueries::new(&store, &taxonomy);

        assert!(queries.is_reachable("4", "1", 3, &["hypernym"]).unwrap());
        assert!(!queries.is_reachable("4", "1", 2, &["hypernym"]).unwrap());
        assert!(queries.is_reachable("1", "4", -1, &["hyponym"]).unwrap());
        assert!(!queries.is_reachable("1", "4", -1, &["hypernym"]).unwrap());
        assert!(queries.is_reachable("4", "4", 0, &[]).unwrap());
        assert!(queries.is_reachable("unknown", "unknown", -1, &[]).unwrap());
        assert!(!queries.is_reachable("unknown", "1", -1, &["hypernym"]).unwrap());
    }

    #[test]
    fn reachability_is_monotone_in_depth() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = augmented(CHAIN);
        let queries = TraversalQueries::new(&store, &taxonomy);

        for (s, t) in [("4", "1"), ("4", "2"), ("3", "1"), ("1", "4")] {
            let mut seen = false;
            for depth in 0..5 {
                let now = queries.is_reachable(s, t, depth, &["hypernym"]).unwrap();
                assert!(!seen || now, "{s} -> {t} lost at depth {depth}");
                seen = now;
            }
            assert_eq!(seen, queries.is_reachable(s, t, -1, &["hypernym"]).unwrap());
        }
    }

    #[test]
    fn precomputed_and_bfs_agree_after_augmentation() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = augmented(&[
            ("2", "1", "holonym"),
            ("3", "2", "holonym"),
            ("1", "3", "holonym"),
            ("4", "3", "holonym"),
        ]);
        let queries = TraversalQueries::new(&store, &taxonomy);

        for source in ["1", "2", "3", "4"] {
            for depth in [1, 2, 3, -1] {
                let lookup = sorted(queries.transitive_neighbors(source, depth, &["holonym"]).unwrap());
                // "foo" is unknown, so this forces the depth-1 walk over holonym edges.
                let walk = sorted(
                    queries
                        .transitive_neighbors(source, depth, &["holonym", "foo"])
                        .unwrap(),
                );
                assert_eq!(lookup, walk, "source {source} depth {depth}");
            }
        }
    }

    #[test]
    fn named_relations_are_walked_separately() {
        // 3 -hypernym-> 2 -holonym-> 1: no single relation leads from 3 to 1.
        let taxonomy = RelationTaxonomy::wordnet();
        let store = augmented(&[("3", "2", "hypernym"), ("2", "1", "holonym")]);
        let queries = TraversalQueries::new(&store, &taxonomy);

        let canonical = sorted(
            queries
                .transitive_neighbors("3", -1, &["hypernym", "holonym"])
                .unwrap(),
        );
        let with_unknown = sorted(
            queries
                .transitive_neighbors("3", -1, &["hypernym", "holonym", "foo"])
                .unwrap(),
        );
        assert_eq!(canonical, ["2"]);
        assert_eq!(with_unknown, canonical);
        assert!(!queries.is_reachable("3", "1", -1, &["hypernym", "holonym", "foo"]).unwrap());

        // Only the empty "any relation" list mixes names along a path.
        assert_eq!(sorted(queries.transitive_neighbors("3", -1, &[]).unwrap()), ["1", "2"]);
    }

    #[test]
    fn precomputed_lookup_deduplicates_targets() {
        let taxonomy = RelationTaxonomy::wordnet();
        let store = augmented(&[("2", "1", "hypernym"), ("2", "1", "holonym")]);
        let queries = TraversalQueries::new(&store, &taxonomy);

        let found: Vec<_> = queries
            .transitive_neighbors("2", -1, &["hypernym", "holonym"])
            .unwrap()
            .map(|n| n.unwrap())
            .collect();
        assert_eq!(found, [id("1")]);
    }
}
