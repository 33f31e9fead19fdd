use std::sync::{Arc, Mutex};

use super::entry::CacheEntry;

/// Process-lifetime holder for the newest entry of one resource cache.
///
/// No TTL logic of its own. The lock is never held across an await.
pub struct MemorySlot<T> {
    entry: Mutex<Option<CacheEntry<Arc<T>>>>,
}

impl<T> Default for MemorySlot<T> {
    fn default() -> Self {
        Self {
            entry: Mutex::new(None),
        }
    }
}

impl<T> MemorySlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<CacheEntry<Arc<T>>> {
        self.entry.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace whatever is held. Never merges.
    pub fn set(&self, entry: CacheEntry<Arc<T>>) {
        *self.entry.lock().unwrap_or_else(|e| e.into_inner()) = Some(entry);
    }

    pub fn clear(&self) {
        *self.entry.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_slot_set_replaces_and_clear_empties() {
        let slot = MemorySlot::new();
        assert!(slot.get().is_none());

        slot.set(CacheEntry::new(Arc::new(vec![1]), DateTime::UNIX_EPOCH));
        slot.set(CacheEntry::new(
            Arc::new(vec![2, 3]),
            DateTime::from_timestamp_millis(10).unwrap(),
        ));
        let held = slot.get().unwrap();
        assert_eq!(*held.data, vec![2, 3]);
        assert_eq!(held.fetched_at.timestamp_millis(), 10);

        slot.clear();
        assert!(slot.get().is_none());
    }
}
