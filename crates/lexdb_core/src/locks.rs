//! Striped per-record locks.

use parking_lot::{Mutex, MutexGuard};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A fixed table of mutexes; a record maps to one stripe by hash.
///
/// Two records may share a stripe, which only costs concurrency.
#[derive(Debug)]
pub(crate) struct LockStripes {
    stripes: Vec<Mutex<()>>,
}

impl LockStripes {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            stripes: (0..count.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    pub(crate) fn lock(&self, entity: &str, id: i64) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_of(entity, id)].lock()
    }

    /// Locks every stripe, in index order.
    pub(crate) fn lock_all(&self) -> Vec<MutexGuard<'_, ()>> {
        self.stripes.iter().map(Mutex::lock).collect()
    }

    fn stripe_of(&self, entity: &str, id: i64) -> usize {
        let mut hasher = DefaultHasher::new();
        entity.hash(&mut hasher);
        id.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stripes_still_locks() {
        let locks = LockStripes::new(0);
        let _guard = locks.lock("E", 1);
        assert_eq!(locks.stripes.len(), 1);
    }

    #[test]
    fn same_record_same_stripe() {
        let locks = LockStripes::new(16);
        assert_eq!(locks.stripe_of("E", 42), locks.stripe_of("E", 42));
        let guard = locks.lock("E", 42);
        assert!(locks.stripes[locks.stripe_of("E", 42)].try_lock().is_none());
        drop(guard);
        assert!(locks.stripes[locks.stripe_of("E", 42)].try_lock().is_some());
    }
}
