//! Frequency counting with deterministic top-K extraction

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use crate::analysis::models::RankedItem;

/// Percentage of `count` in `total`, or 0.0 when nothing was counted
pub(crate) fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Key to count accumulator
///
/// `Clone` produces an independent deep copy, so a long-lived counter can be
/// snapshotted repeatedly without the snapshots observing later increments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCounter<K: Eq + Hash> {
    counts: HashMap<K, u64>,
    total: u64,
}

impl<K: Eq + Hash> RankedCounter<K> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            total: 0,
        }
    }

    /// Record one occurrence of `key`
    ///
    /// Only allocates an owned key the first time it is seen.
    pub fn increment<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        match self.counts.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(key.to_owned(), 1);
            }
        }
        self.total += 1;
    }

    /// Sum of all increments
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<K: Eq + Hash + Ord + Display> RankedCounter<K> {
    /// Return at most `limit` keys, highest count first, ties by ascending key
    pub fn top(&self, limit: usize) -> Vec<RankedItem> {
        let mut entries: Vec<(&K, u64)> = self.counts.iter().map(|(k, c)| (k, *c)).collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        entries
            .into_iter()
            .take(limit)
            .map(|(key, count)| RankedItem {
                value: key.to_string(),
                count,
                percentage: percentage(count, self.total),
            })
            .collect()
    }
}

impl<K: Eq + Hash> Default for RankedCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_of(keys: &[&str]) -> RankedCounter<String> {
        let mut counter = RankedCounter::new();
        for key in keys {
            counter.increment(*key);
        }
        counter
    }

    #[test]
    fn test_top_orders_by_count_then_key() {
        let counter = counter_of(&["b", "a", "c", "c", "b", "c", "d"]);

        let top = counter.top(10);
        let keys: Vec<&str> = top.iter().map(|item| item.value.as_str()).collect();
        assert_eq!(keys, vec!["c", "b", "a", "d"]);
        assert_eq!(top[0].count, 3);
        assert_eq!(counter.total(), 7);
    }

    #[test]
    fn test_top_respects_limit() {
        let counter = counter_of(&["a", "b", "c"]);
        assert_eq!(counter.top(2).len(), 2);
        assert!(counter.top(0).is_empty());
    }

    #[test]
    fn test_percentage_is_relative_to_total() {
        let counter = counter_of(&["1.1.1.1", "1.1.1.1", "2.2.2.2"]);
        let top = counter.top(2);

        assert_eq!(top[0].value, "1.1.1.1");
        assert!((top[0].percentage - 66.666_666).abs() < 0.001);
        assert!((top[1].percentage - 33.333_333).abs() < 0.001);
        for item in &top {
            assert!((item.percentage - 100.0 * item.count as f64 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_counter() {
        let counter: RankedCounter<String> = RankedCounter::new();
        assert_eq!(counter.total(), 0);
        assert!(counter.top(5).is_empty());
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut counter = counter_of(&["a"]);
        let snapshot = counter.clone();

        counter.increment("a");
        counter.increment("b");

        assert_eq!(snapshot.total(), 1);
        assert_eq!(snapshot.count("a"), 1);
        assert_eq!(snapshot.count("b"), 0);
        assert_eq!(counter.total(), 3);
    }

    #[test]
    fn test_numeric_keys_tie_break_ascending() {
        let mut counter: RankedCounter<u16> = RankedCounter::new();
        for code in [500, 200, 404] {
            counter.increment(&code);
        }
        let values: Vec<String> = counter.top(3).into_iter().map(|i| i.value).collect();
        assert_eq!(values, vec!["200", "404", "500"]);
    }
}
