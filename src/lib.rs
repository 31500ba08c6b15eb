// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # lexigraph
//!
//! Augmentation engine for lexical-semantic graphs (WordNet-style synset
//! networks). Given imported relation edges, it adds the missing inverse of
//! every canonical relation and materializes the transitive closure of each
//! canonical relation as depth-annotated edges, so later reachability queries
//! are single lookups.
//!
//! ## Architecture
//!
//! - **Relations** (`relation`): edge model and the relation taxonomy
//! - **Storage** (`store`): the `GraphStore` port, in-memory and redb backends
//! - **Augmentation** (`augment`): normalization, closure, batched writes
//! - **Queries** (`traverse`): transitive neighbors and reachability
//!
//! ## Library usage
//!
//! ```no_run
//! use lexigraph::augment::{AugmentConfig, GraphAugmentor};
//! use lexigraph::relation::{Edge, RelationTaxonomy};
//! use lexigraph::store::{GraphStore, MemGraphStore};
//! use lexigraph::synset::{Synset, SynsetId};
//! use lexigraph::traverse::TraversalQueries;
//!
//! let taxonomy = RelationTaxonomy::wordnet();
//! let mut store = MemGraphStore::new();
//! let dog = SynsetId::new("dog").unwrap();
//! let canine = SynsetId::new("canine").unwrap();
//! store.insert_synset(&Synset::new(dog.clone())).unwrap();
//! store.insert_synset(&Synset::new(canine.clone())).unwrap();
//! store
//!     .insert_edge(&Edge::external(dog, canine, "hypernym", &taxonomy))
//!     .unwrap();
//!
//! let stats = GraphAugmentor::new(&taxonomy, AugmentConfig::default())
//!     .augment(&mut store)
//!     .unwrap();
//! assert_eq!(stats.inverses, 1);
//!
//! let queries = TraversalQueries::new(&store, &taxonomy);
//! assert!(queries.is_reachable("canine", "dog", 1, &["hyponym"]).unwrap());
//! ```

pub mod augment;
pub mod config;
pub mod error;
pub mod ingest;
pub mod relation;
pub mod store;
pub mod synset;
pub mod traverse;
