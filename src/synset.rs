//! Synsets: the concept nodes of the lexical graph.
//!
//! A synset is identified by a [`SynsetId`] assigned by the importer. The
//! identifier is the only structural attribute the augmentation engine looks
//! at; everything else about a synset belongs to the import collaborator.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use crate::error::SynsetError;

/// Stable, globally unique synset identifier (e.g. `"oewn-02084071-n"`).
///
/// Always non-blank and free of NUL bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SynsetId(String);

impl SynsetId {
    /// Validate and wrap a raw identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, SynsetError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(SynsetError::BlankId);
        }
        if raw.contains('\0') {
            return Err(SynsetError::NulByte { id: raw });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SynsetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SynsetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SynsetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SynsetId {
    type Error = SynsetError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl TryFrom<&str> for SynsetId {
    type Error = SynsetError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<SynsetId> for String {
    fn from(id: SynsetId) -> Self {
        id.0
    }
}

/// A concept node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synset {
    pub id: SynsetId,
    /// Optional display label (a lemma or gloss excerpt). Not used by the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Synset {
    pub fn new(id: SynsetId) -> Self {
        Self { id, label: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
