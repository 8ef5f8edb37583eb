//! Order-preserving per-key truncation
//!
//! Keeps the first N items of every group in the order they are offered.
//! Nothing is sorted, so the result depends only on input order and is
//! reproducible run to run.

use ahash::AHashMap;
use std::hash::Hash;

/// Admits at most `limit` items per key
#[derive(Debug, Clone)]
pub struct PerKeyCap<K> {
    limit: Option<usize>,
    counts: AHashMap<K, usize>,
    rejected: usize,
}

impl<K: Hash + Eq> PerKeyCap<K> {
    /// `None` or `Some(0)` admits everything
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit: limit.filter(|&n| n > 0),
            counts: AHashMap::new(),
            rejected: 0,
        }
    }

    /// Record one item for `key`, returning whether it is within the cap
    pub fn admit(&mut self, key: K) -> bool {
        let Some(limit) = self.limit else {
            return true;
        };

        let count = self.counts.entry(key).or_insert(0);
        if *count < limit {
            *count += 1;
            true
        } else {
            self.rejected += 1;
            false
        }
    }

    /// Items refused so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

/// Keep the first `limit` items of each key, returning kept items and the drop count
pub fn truncate_per_key<T, K, F>(items: Vec<T>, limit: Option<usize>, mut key: F) -> (Vec<T>, usize)
where
    K: Hash + Eq,
    F: FnMut(&T) -> K,
{
    let mut cap = PerKeyCap::new(limit);
    let kept: Vec<T> = items.into_iter().filter(|item| cap.admit(key(item))).collect();
    (kept, cap.rejected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_kept() {
        let items = vec![(1, 'a'), (1, 'b'), (2, 'c'), (1, 'd'), (2, 'e')];
        let (kept, dropped) = truncate_per_key(items, Some(1), |item| item.0);

        assert_eq!(kept, vec![(1, 'a'), (2, 'c')]);
        assert_eq!(dropped, 3);
    }

    #[test]
    fn test_uncapped() {
        let items = vec![1, 1, 1];
        let (kept, dropped) = truncate_per_key(items.clone(), None, |item| *item);
        assert_eq!(kept, items);
        assert_eq!(dropped, 0);

        let (kept, _) = truncate_per_key(items.clone(), Some(0), |item| *item);
        assert_eq!(kept, items);
    }

    #[test]
    fn test_interleaved_groups_keep_order() {
        let items = vec![(2, 1), (1, 2), (2, 3), (1, 4), (2, 5), (1, 6)];
        let (kept, _) = truncate_per_key(items, Some(2), |item| item.0);
        assert_eq!(kept, vec![(2, 1), (1, 2), (2, 3), (1, 4)]);
    }

    #[test]
    fn test_rejected_counts() {
        let mut cap = PerKeyCap::new(Some(2));
        assert!(cap.admit("a"));
        assert!(cap.admit("a"));
        assert!(!cap.admit("a"));
        assert!(cap.admit("b"));
        assert!(cap.admit("b"));
        assert!(!cap.admit("b"));
        assert_eq!(cap.rejected(), 2);
    }
}
