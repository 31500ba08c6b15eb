//! Rich diagnostic error types for lexigraph.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers know exactly
//! what went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for lexigraph.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum LexiError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Augment(#[from] AugmentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Synset(#[from] SynsetError),
}

// ---------------------------------------------------------------------------
// Synset errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SynsetError {
    #[error("synset id is blank")]
    #[diagnostic(
        code(lexigraph::synset::blank_id),
        help("Synset identifiers are assigned at import time and must contain visible characters.")
    )]
    BlankId,

    #[error("synset id {id:?} contains a NUL byte")]
    #[diagnostic(
        code(lexigraph::synset::nul_byte),
        help("NUL is reserved as a key separator by the durable store. Strip it from the identifier.")
    )]
    NulByte { id: String },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(lexigraph::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(lexigraph::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption; try re-importing into a fresh data directory."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(lexigraph::store::serde),
        help(
            "Failed to serialize or deserialize an edge record. \
             The stored format may have changed between versions; re-import the lexicon."
        )
    )]
    Serialization { message: String },

    #[error("duplicate edge: ({source_id}, {target_id}, {rel_name})")]
    #[diagnostic(
        code(lexigraph::store::duplicate_edge),
        help("An edge with this (source, target, relation) triple already exists.")
    )]
    DuplicateEdge {
        source_id: String,
        target_id: String,
        rel_name: String,
    },

    #[error("edge references unknown synset {id}")]
    #[diagnostic(
        code(lexigraph::store::missing_synset),
        help("Insert both endpoint synsets before inserting an edge between them.")
    )]
    MissingSynset { id: String },

    #[error("no transaction is active")]
    #[diagnostic(
        code(lexigraph::store::no_transaction),
        help("Call `begin_transaction()` before commit or rollback.")
    )]
    NoTransaction,

    #[error("a transaction is already active")]
    #[diagnostic(
        code(lexigraph::store::transaction_active),
        help(
            "Transactions do not nest. Commit or roll back the current transaction \
             before starting another augmentation."
        )
    )]
    TransactionActive,
}

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("invalid max depth {max_depth}")]
    #[diagnostic(
        code(lexigraph::query::invalid_depth),
        help("Use -1 for unbounded traversal, 0 for none, or a positive hop count.")
    )]
    InvalidDepth { max_depth: i64 },

    #[error("{argument} synset id is blank")]
    #[diagnostic(
        code(lexigraph::query::blank_id),
        help("Pass the identifier of an imported synset.")
    )]
    BlankId { argument: &'static str },

    #[error("{argument} synset id is not a valid identifier")]
    #[diagnostic(code(lexigraph::query::invalid_id))]
    InvalidId {
        argument: &'static str,
        #[source]
        source: SynsetError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Augmentation errors
// ---------------------------------------------------------------------------

/// Stage of an augmentation run, recorded on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    Normalize,
    Closure { round: u32 },
    Purge,
    Commit,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Begin => write!(f, "begin"),
            Phase::Normalize => write!(f, "normalization"),
            Phase::Closure { round } => write!(f, "closure round {round}"),
            Phase::Purge => write!(f, "purge"),
            Phase::Commit => write!(f, "commit"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("augmentation failed during {phase}{}", relation_suffix(.relation))]
#[diagnostic(
    code(lexigraph::augment::failed),
    help(
        "The enclosing transaction was rolled back; the graph is unchanged. \
         Fix the underlying storage problem and run the augmentation again."
    )
)]
pub struct AugmentError {
    pub phase: Phase,
    pub relation: Option<String>,
    #[source]
    pub source: StoreError,
}

impl AugmentError {
    pub fn new(phase: Phase, source: StoreError) -> Self {
        Self {
            phase,
            relation: None,
            source,
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }
}

fn relation_suffix(relation: &Option<String>) -> String {
    match relation {
        Some(name) => format!(" (relation {name:?})"),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(lexigraph::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(lexigraph::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(lexigraph::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("relation {name:?} cannot take inverse {declared:?}: already paired with {existing:?}")]
    #[diagnostic(
        code(lexigraph::config::conflicting_inverse),
        help("Each relation may have at most one inverse. Fix the [[relations]] table.")
    )]
    ConflictingInverse {
        name: String,
        declared: String,
        existing: String,
    },

    #[error("batch size must be greater than zero")]
    #[diagnostic(
        code(lexigraph::config::batch_size),
        help("Set `batch_size` to a positive number of items processed between flushes.")
    )]
    InvalidBatchSize,
}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("failed to read {path}")]
    #[diagnostic(
        code(lexigraph::ingest::read),
        help("Check that the edge file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse edge records: {message}")]
    #[diagnostic(
        code(lexigraph::ingest::parse),
        help("The file must contain a JSON array of {{\"source\", \"target\", \"rel\"}} objects.")
    )]
    Parse { message: String },

    #[error("record {index} has an invalid synset id")]
    #[diagnostic(code(lexigraph::ingest::invalid_id))]
    InvalidId {
        index: usize,
        #[source]
        source: SynsetError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for functions returning lexigraph results.
pub type LexiResult<T> = std::result::Result<T, LexiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_lexi_error() {
        let err = StoreError::MissingSynset { id: "n1".into() };
        let lexi: LexiError = err.into();
        assert!(matches!(
            lexi,
            LexiError::Store(StoreError::MissingSynset { .. })
        ));
    }

    #[test]
    fn query_error_wraps_store_error() {
        let query: QueryError = StoreError::NoTransaction.into();
        assert!(matches!(query, QueryError::Store(StoreError::NoTransaction)));
    }

    #[test]
    fn augment_error_names_phase_and_relation() {
        let err = AugmentError::new(
            Phase::Closure { round: 3 },
            StoreError::Redb {
                message: "disk full".into(),
            },
        )
        .with_relation("hypernym");
        let msg = format!("{err}");
        assert!(msg.contains("closure round 3"));
        assert!(msg.contains("hypernym"));
    }

    #[test]
    fn augment_error_without_relation() {
        let err = AugmentError::new(Phase::Commit, StoreError::NoTransaction);
        assert_eq!(format!("{err}"), "augmentation failed during commit");
    }
}
