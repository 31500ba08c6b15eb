//! Relation taxonomy: which relation names are canonical, their inverses and types.
//!
//! The taxonomy is a plain value built once at startup and handed to the
//! augmentation engine by reference. Canonical relations are eligible for
//! inverse completion and transitive closure; every other name, known or not,
//! is left alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::RelType;

/// One row of the relation table, as written in the `[[relations]]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
    #[serde(default = "default_rel_type")]
    pub rel_type: RelType,
    #[serde(default)]
    pub canonical: bool,
}

fn default_rel_type() -> RelType {
    RelType::Generic
}

impl RelationSpec {
    fn canonical(name: &str, inverse: &str, rel_type: RelType) -> Self {
        Self {
            name: name.into(),
            inverse: Some(inverse.into()),
            rel_type,
            canonical: true,
        }
    }

    fn plain(name: &str, rel_type: RelType) -> Self {
        Self {
            name: name.into(),
            inverse: None,
            rel_type,
            canonical: false,
        }
    }
}

#[derive(Debug, Clone)]
struct RelationInfo {
    canonical: bool,
    inverse: Option<String>,
    rel_type: RelType,
}

/// Static lookup table over relation names.
#[derive(Debug, Clone, Default)]
pub struct RelationTaxonomy {
    relations: HashMap<String, RelationInfo>,
}

impl RelationTaxonomy {
    /// The WordNet relation inventory (LMF relation names).
    pub fn wordnet() -> Self {
        // The built-in table is conflict-free; see `wordnet_table_has_no_conflicts`.
        Self::from_specs(&wordnet_specs()).unwrap_or_default()
    }

    /// Build a taxonomy from explicit relation rows.
    ///
    /// Inverse declarations are mirrored: declaring `a` with inverse `b` also
    /// makes `b` canonical with inverse `a`. A name paired with two different
    /// inverses is rejected.
    pub fn from_specs(specs: &[RelationSpec]) -> Result<Self, ConfigError> {
        let mut relations: HashMap<String, RelationInfo> = HashMap::new();

        for spec in specs {
            let entry = relations
                .entry(spec.name.clone())
                .or_insert_with(|| RelationInfo {
                    canonical: false,
                    inverse: None,
                    rel_type: spec.rel_type,
                });
            entry.canonical |= spec.canonical;
            entry.rel_type = spec.rel_type;
        }

        for spec in specs {
            let Some(inverse) = &spec.inverse else {
                continue;
            };
            pair(&mut relations, &spec.name, inverse, spec)?;
            pair(&mut relations, inverse, &spec.name, spec)?;
        }

        Ok(Self { relations })
    }

    pub fn is_canonical(&self, name: &str) -> bool {
        self.relations.get(name).is_some_and(|r| r.canonical)
    }

    pub fn inverse_of(&self, name: &str) -> Option<&str> {
        self.relations.get(name).and_then(|r| r.inverse.as_deref())
    }

    pub fn type_of(&self, name: &str) -> RelType {
        self.relations
            .get(name)
            .map(|r| r.rel_type)
            .unwrap_or(RelType::Generic)
    }

    /// All canonical relation names, sorted.
    pub fn canonical_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .relations
            .iter()
            .filter(|(_, info)| info.canonical)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Canonical relation names that have an inverse, sorted.
    pub fn invertible_names(&self) -> Vec<&str> {
        self.canonical_names()
            .into_iter()
            .filter(|name| self.inverse_of(name).is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// The built-in WordNet relation table (LMF relation names).
fn wordnet_specs() -> Vec<RelationSpec> {
    use RelType::*;
    vec![
        RelationSpec::canonical("hypernym", "hyponym", Taxonomic),
        RelationSpec::canonical("instance_hypernym", "instance_hyponym", Taxonomic),
        RelationSpec::canonical("holonym", "meronym", Partonomic),
        RelationSpec::canonical("holo_member", "mero_member", Partonomic),
        RelationSpec::canonical("holo_part", "mero_part", Partonomic),
        RelationSpec::canonical("holo_substance", "mero_substance", Partonomic),
        RelationSpec::canonical("similar", "similar", Similarity),
        RelationSpec::plain("antonym", Opposition),
        RelationSpec::plain("also", Similarity),
        RelationSpec::plain("attribute", Generic),
        RelationSpec::plain("entails", Entailment),
        RelationSpec::plain("causes", Entailment),
        RelationSpec::plain("domain_topic", Domain),
        RelationSpec::plain("domain_region", Domain),
        RelationSpec::plain("exemplifies", Domain),
    ]
}

fn pair(
    relations: &mut HashMap<String, RelationInfo>,
    name: &str,
    inverse: &str,
    declared_by: &RelationSpec,
) -> Result<(), ConfigError> {
    let entry = relations
        .entry(name.to_string())
        .or_insert_with(|| RelationInfo {
            canonical: declared_by.canonical,
            inverse: None,
            rel_type: declared_by.rel_type,
        });
    match &entry.inverse {
        Some(existing) if existing != inverse => {
            return Err(ConfigError::ConflictingInverse {
                name: name.to_string(),
                declared: inverse.to_string(),
                existing: existing.clone(),
            });
        }
        _ => entry.inverse = Some(inverse.to_string()),
    }
    entry.canonical |= declared_by.canonical;
    Ok(())
}
