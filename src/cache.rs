use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::{table::PositionTable, time::Step};

/// Fixed-capacity store of parsed position tables, ordered most recently
/// used first. A lookup hit promotes the entry to the front; insertion at
/// capacity evicts the current back. Lives for the whole process unless
/// explicitly flushed.
///
/// Storage is a hash map keyed by [Step] plus an explicit recency deque,
/// so lookups stay O(1) average while preserving the MRU contract.
#[derive(Debug)]
pub(crate) struct PositionCache {
    capacity: usize,
    /// Front = most recently used
    recency: VecDeque<Step>,
    tables: HashMap<Step, PositionTable>,
}

impl PositionCache {
    /// New empty cache bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recency: VecDeque::with_capacity(capacity),
            tables: HashMap::with_capacity(capacity),
        }
    }

    /// True when a table for `step` is held.
    pub fn contains(&self, step: Step) -> bool {
        self.tables.contains_key(&step)
    }

    /// Table for `step`, promoted to most-recently-used on hit.
    pub fn lookup(&mut self, step: Step) -> Option<&PositionTable> {
        if !self.tables.contains_key(&step) {
            debug!("no luck finding step {} in cache", step);
            return None;
        }
        if let Some(position) = self.recency.iter().position(|s| *s == step) {
            if let Some(found) = self.recency.remove(position) {
                self.recency.push_front(found);
            }
        }
        debug!("found step {} in cache", step);
        self.tables.get(&step)
    }

    /// Insert a table for `step` at the most-recently-used position,
    /// evicting the least-recently-used entry when full. Callers must
    /// check [Self::contains] first: duplicate steps are not coalesced.
    pub fn insert(&mut self, step: Step, table: PositionTable) {
        if self.tables.len() == self.capacity {
            if let Some(evicted) = self.recency.pop_back() {
                self.tables.remove(&evicted);
                debug!("evicted step {} from cache", evicted);
            }
        }
        self.recency.push_front(step);
        self.tables.insert(step, table);
    }

    /// Frees every entry. Called at shutdown, or between unrelated
    /// invocations in long-running hosts.
    pub fn flush(&mut self) {
        debug!("flushing {} cached steps", self.tables.len());
        self.recency.clear();
        self.tables.clear();
    }

    /// Number of steps held.
    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

#[cfg(test)]
mod test {
    use super::PositionCache;
    use crate::table::PositionTable;
    use crate::time::Step;
    use nalgebra::Vector3;

    fn table_with(index: usize, x: f64) -> PositionTable {
        let mut table = PositionTable::new();
        table.set(index, Vector3::new(x, 0.0, 0.0));
        table
    }

    #[test]
    fn hit_promotes_to_front() {
        let mut cache = PositionCache::new(3);
        for step in 0..3 {
            cache.insert(Step(step), table_with(0, step as f64));
        }
        // front is now [2, 1, 0]: promote 0 and evict the new back (1)
        let hit = cache.lookup(Step(0)).unwrap();
        assert_eq!(hit.sample(0), Some(Vector3::new(0.0, 0.0, 0.0)));
        cache.insert(Step(3), table_with(0, 3.0));
        assert!(cache.contains(Step(0)));
        assert!(cache.contains(Step(2)));
        assert!(cache.contains(Step(3)));
        assert!(!cache.contains(Step(1)));
    }

    #[test]
    fn eviction_past_capacity() {
        let mut cache = PositionCache::new(4);
        for step in 0..10 {
            cache.insert(Step(step), table_with(0, step as f64));
        }
        assert_eq!(cache.len(), 4);
        for step in 0..6 {
            assert!(!cache.contains(Step(step)));
        }
        for step in 6..10 {
            let table = cache.lookup(Step(step)).unwrap();
            assert_eq!(table.sample(0), Some(Vector3::new(step as f64, 0.0, 0.0)));
        }
    }

    #[test]
    fn flush_frees_everything() {
        let mut cache = PositionCache::new(8);
        cache.insert(Step(42), table_with(3, 1.0));
        assert_eq!(cache.len(), 1);
        cache.flush();
        assert_eq!(cache.len(), 0);
        assert!(cache.lookup(Step(42)).is_none());
    }
}
