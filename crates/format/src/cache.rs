//! Run-scoped citation cache.
//!
//! Bounded map keyed by (paper id, style). Insertions past the bound are
//! dropped rather than evicting; a run touches far fewer unique papers than
//! the default capacity, so eviction machinery would never earn its keep.

use citescout_common::metrics::CACHE_HITS_TOTAL;
use citescout_common::model::CitationStyle;
use metrics::counter;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct CitationCache {
    entries: Mutex<HashMap<(String, CitationStyle), String>>,
    capacity: usize,
}

impl CitationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    pub fn get(&self, paper_id: &str, style: CitationStyle) -> Option<String> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        let hit = entries.get(&(paper_id.to_string(), style)).cloned();
        if hit.is_some() {
            counter!(CACHE_HITS_TOTAL).increment(1);
        }
        hit
    }

    pub fn insert(&self, paper_id: &str, style: CitationStyle, text: String) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        if entries.len() >= self.capacity {
            return;
        }
        entries.insert((paper_id.to_string(), style), text);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_round_trip() {
        let cache = CitationCache::new(4);
        assert!(cache.get("p1", CitationStyle::Apa).is_none());
        cache.insert("p1", CitationStyle::Apa, "Smith, J. (2021).".into());
        assert_eq!(
            cache.get("p1", CitationStyle::Apa).as_deref(),
            Some("Smith, J. (2021).")
        );
        // Same paper, different style is a distinct entry.
        assert!(cache.get("p1", CitationStyle::Mla).is_none());
    }

    #[test]
    fn test_cache_stops_inserting_at_bound() {
        let cache = CitationCache::new(2);
        cache.insert("p1", CitationStyle::Apa, "a".into());
        cache.insert("p2", CitationStyle::Apa, "b".into());
        cache.insert("p3", CitationStyle::Apa, "c".into());
        assert_eq!(cache.len(), 2);
        assert!(cache.get("p3", CitationStyle::Apa).is_none());
        // Earlier entries survive.
        assert_eq!(cache.get("p1", CitationStyle::Apa).as_deref(), Some("a"));
    }
}
