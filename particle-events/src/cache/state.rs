//! Cache contents
//!
//! The record set plus its age index. `CacheState` is a plain data
//! structure: it knows nothing about locking, vetoes or notification, which
//! live in the writer task.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::record::EventRecord;

/// Position of a record in eviction order
///
/// Records are ordered by their raw publication timestamp, compared as
/// strings. Records with identical timestamps fall back to insertion order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct AgeKey {
    published_at_raw: String,
    seq: u64,
}

#[derive(Debug)]
pub(crate) struct CacheState {
    pub(crate) capacity: usize,
    by_age: BTreeMap<AgeKey, Arc<EventRecord>>,
    /// Content-keyed: `EventRecord`'s `Eq`/`Hash` ignore name and identity.
    index: HashMap<Arc<EventRecord>, AgeKey>,
    next_seq: u64,
}

impl CacheState {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            by_age: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.by_age.len()
    }

    pub(crate) fn over_capacity(&self) -> bool {
        self.len() > self.capacity
    }

    /// Add a record unless a content-equal one is present.
    /// Returns true if the set grew.
    pub(crate) fn insert(&mut self, record: EventRecord) -> bool {
        if self.index.contains_key(&record) {
            return false;
        }

        let key = AgeKey {
            published_at_raw: record.published_at_raw().to_string(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let record = Arc::new(record);
        self.index.insert(record.clone(), key.clone());
        self.by_age.insert(key, record);
        true
    }

    /// The record with the smallest raw timestamp
    pub(crate) fn oldest(&self) -> Option<(AgeKey, Arc<EventRecord>)> {
        self.by_age
            .first_key_value()
            .map(|(key, record)| (key.clone(), record.clone()))
    }

    pub(crate) fn remove(&mut self, key: &AgeKey) -> Option<Arc<EventRecord>> {
        let record = self.by_age.remove(key)?;
        self.index.remove(&record);
        Some(record)
    }

    pub(crate) fn clear(&mut self) {
        self.by_age.clear();
        self.index.clear();
    }

    /// Records grouped by name, newest first within each group
    pub(crate) fn grouped(&self) -> BTreeMap<String, Vec<EventRecord>> {
        let mut groups: BTreeMap<String, Vec<EventRecord>> = BTreeMap::new();
        for record in self.by_age.values().rev() {
            groups
                .entry(record.name().to_string())
                .or_default()
                .push(EventRecord::clone(record));
        }
        groups
    }

    pub(crate) fn named(&self, name: &str) -> Vec<EventRecord> {
        self.by_age
            .values()
            .rev()
            .filter(|record| record.name() == name)
            .map(|record| EventRecord::clone(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(name: &str, value: &str, published_at: &str) -> EventRecord {
        EventRecord::new(name, value, published_at, "core-1", 60)
    }

    #[test]
    fn test_insert_deduplicates_by_content() {
        let mut state = CacheState::new(10);

        assert!(state.insert(make_record("a", "1", "2015-07-18T00:00:01.000Z")));
        assert!(!state.insert(make_record("b", "1", "2015-07-18T00:00:01.000Z")));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_oldest_uses_raw_timestamp() {
        let mut state = CacheState::new(10);
        state.insert(make_record("a", "2", "2015-07-18T00:00:02.000Z"));
        state.insert(make_record("a", "1", "2015-07-18T00:00:01.000Z"));
        state.insert(make_record("a", "3", "2015-07-18T00:00:03.000Z"));

        let (_, oldest) = state.oldest().unwrap();
        assert_eq!(oldest.value(), "1");
    }

    #[test]
    fn test_oldest_ties_break_by_insertion() {
        let mut state = CacheState::new(10);
        state.insert(make_record("a", "first", "2015-07-18T00:00:01.000Z"));
        state.insert(make_record("a", "second", "2015-07-18T00:00:01.000Z"));

        let (_, oldest) = state.oldest().unwrap();
        assert_eq!(oldest.value(), "first");
    }

    #[test]
    fn test_remove_frees_content_key() {
        let mut state = CacheState::new(10);
        state.insert(make_record("a", "1", "2015-07-18T00:00:01.000Z"));

        let (key, _) = state.oldest().unwrap();
        assert!(state.remove(&key).is_some());
        assert!(state.remove(&key).is_none());
        assert_eq!(state.len(), 0);

        // The same content may be inserted again once evicted
        assert!(state.insert(make_record("a", "1", "2015-07-18T00:00:01.000Z")));
    }

    #[test]
    fn test_grouped_orders_newest_first() {
        let mut state = CacheState::new(10);
        state.insert(make_record("temp", "1", "2015-07-18T00:00:01.000Z"));
        state.insert(make_record("humidity", "2", "2015-07-18T00:00:02.000Z"));
        state.insert(make_record("temp", "3", "2015-07-18T00:00:03.000Z"));
        state.insert(make_record("temp", "0", "2015-07-18T00:00:00.000Z"));

        let groups = state.grouped();
        assert_eq!(groups.len(), 2);

        let temps: Vec<&str> = groups["temp"].iter().map(|r| r.value()).collect();
        assert_eq!(temps, vec!["3", "1", "0"]);
        assert_eq!(groups["humidity"].len(), 1);

        let named: Vec<String> = state.named("temp").iter().map(|r| r.value().to_string()).collect();
        assert_eq!(named, vec!["3", "1", "0"]);
    }
}
