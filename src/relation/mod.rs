//! Relations: directed, labeled edges between synsets.
//!
//! Every edge carries its relation name, a descriptive [`RelType`], the
//! derivation [`depth`](Edge::depth) and a [`Provenance`] tag. Depth 1 edges
//! come from the imported lexicon (or one symmetrization step); deeper edges
//! are cached transitive-closure facts.

pub mod taxonomy;

use serde::{Deserialize, Serialize};

use crate::synset::SynsetId;

pub use taxonomy::{RelationSpec, RelationTaxonomy};

/// Semantic classification of a relation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelType {
    /// Is-a hierarchy (hypernym/hyponym).
    Taxonomic,
    /// Part-whole hierarchy (holonym/meronym).
    Partonomic,
    /// Similarity or near-synonymy.
    Similarity,
    /// Lexical opposition (antonym).
    Opposition,
    /// Entailment and causation between verb senses.
    Entailment,
    /// Topical, regional or usage domains.
    Domain,
    /// Anything the taxonomy does not classify.
    Generic,
}

impl std::fmt::Display for RelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RelType::Taxonomic => "taxonomic",
            RelType::Partonomic => "partonomic",
            RelType::Similarity => "similarity",
            RelType::Opposition => "opposition",
            RelType::Entailment => "entailment",
            RelType::Domain => "domain",
            RelType::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Who created an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Imported from the source lexicon.
    External,
    /// Inserted by the augmentation engine; disposable and recomputable.
    Engine,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::External => "external",
            Provenance::Engine => "lexigraph-augmentor",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity of an edge. At most one edge exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: SynsetId,
    pub target: SynsetId,
    pub rel_name: String,
}

impl EdgeKey {
    pub fn new(source: SynsetId, target: SynsetId, rel_name: impl Into<String>) -> Self {
        Self {
            source,
            target,
            rel_name: rel_name.into(),
        }
    }
}

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.source, self.target, self.rel_name)
    }
}

/// A directed relation between two synsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: SynsetId,
    pub target: SynsetId,
    pub rel_name: String,
    pub rel_type: RelType,
    /// Number of same-relation depth-1 hops this edge stands for (>= 1).
    pub depth: u32,
    pub provenance: Provenance,
}

impl Edge {
    /// An imported depth-1 edge, typed through the taxonomy.
    pub fn external(
        source: SynsetId,
        target: SynsetId,
        rel_name: impl Into<String>,
        taxonomy: &RelationTaxonomy,
    ) -> Self {
        let rel_name = rel_name.into();
        Self {
            rel_type: taxonomy.type_of(&rel_name),
            source,
            target,
            rel_name,
            depth: 1,
            provenance: Provenance::External,
        }
    }

    /// An engine-inserted edge at the given depth.
    pub fn derived(
        source: SynsetId,
        target: SynsetId,
        rel_name: impl Into<String>,
        depth: u32,
        taxonomy: &RelationTaxonomy,
    ) -> Self {
        let rel_name = rel_name.into();
        Self {
            rel_type: taxonomy.type_of(&rel_name),
            source,
            target,
            rel_name,
            depth,
            provenance: Provenance::Engine,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source.clone(), self.target.clone(), self.rel_name.clone())
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
