//! Per-relation counts of edges inserted by an augmentation run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionStats {
    /// Edges inserted, keyed by relation name.
    pub by_relation: BTreeMap<String, usize>,
    /// Inverse edges added by normalization.
    pub inverses: usize,
    /// Transitive edges added by the closure pass.
    pub closure: usize,
    /// Closure rounds executed, including the final round that found nothing.
    pub rounds: u32,
}

impl InsertionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_inverse(&mut self, rel_name: &str) {
        self.inverses += 1;
        self.bump(rel_name);
    }

    pub fn record_closure(&mut self, rel_name: &str) {
        self.closure += 1;
        self.bump(rel_name);
    }

    fn bump(&mut self, rel_name: &str) {
        *self.by_relation.entry(rel_name.to_string()).or_default() += 1;
    }

    /// Inserted edges for one relation name.
    pub fn count(&self, rel_name: &str) -> usize {
        self.by_relation.get(rel_name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.inverses + self.closure
    }

    /// True when the run inserted nothing.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl std::fmt::Display for InsertionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "inserted {} edges", self.total())?;
        writeln!(f, "  inverses:  {}", self.inverses)?;
        writeln!(f, "  closure:   {} ({} rounds)", self.closure, self.rounds)?;
        for (name, count) in &self.by_relation {
            writeln!(f, "  {name:<20} {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_relation() {
        let mut stats = InsertionStats::new();
        stats.record_inverse("hyponym");
        stats.record_inverse("hyponym");
        stats.record_closure("hypernym");

        assert_eq!(stats.count("hyponym"), 2);
        assert_eq!(stats.count("hypernym"), 1);
        assert_eq!(stats.count("meronym"), 0);
        assert_eq!(stats.total(), 3);
        assert!(!stats.is_empty());
    }

    #[test]
    fn empty_stats() {
        let stats = InsertionStats::new();
        assert!(stats.is_empty());
        assert!(stats.to_string().starts_with("inserted 0 edges"));
    }
}
