//! Identifier allocation.

use crate::config::IdStrategy;
use crate::error::{CoreError, CoreResult};
use crate::keys;
use lexdb_codec::{lex_decode_exact, LexEncode};
use lexdb_storage::{OrderedStore, WriteBatch};
use rand::Rng;

/// Picks identifiers for new records.
///
/// Callers must hold the entity's create lock from [`IdAllocator::allocate`]
/// until the batch it extended has been written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdAllocator {
    strategy: IdStrategy,
    max_attempts: u32,
}

impl IdAllocator {
    pub(crate) fn new(strategy: IdStrategy, max_attempts: u32) -> Self {
        Self {
            strategy,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Chooses an identifier not used by any record of `entity`. For
    /// sequential allocation the advanced counter is added to `batch`.
    pub(crate) fn allocate(
        &self,
        store: &dyn OrderedStore,
        entity: &str,
        batch: &mut WriteBatch,
    ) -> CoreResult<i64> {
        match self.strategy {
            IdStrategy::Sequential => self.next_sequential(store, entity, batch),
            IdStrategy::Random => self.draw_random(store, entity),
        }
    }

    fn next_sequential(
        &self,
        store: &dyn OrderedStore,
        entity: &str,
        batch: &mut WriteBatch,
    ) -> CoreResult<i64> {
        let seq_key = keys::sequence_key(entity);
        let mut candidate = match store.get(&seq_key)? {
            Some(bytes) => lex_decode_exact::<i64>(&bytes)?,
            None => 1,
        };

        // Skip identifiers taken by records written under another strategy.
        // Once i64::MAX is handed out the counter stays there, and the next
        // allocation finds it taken with nowhere further to go.
        for _ in 0..self.max_attempts {
            if store.get(&keys::primary_key(entity, candidate))?.is_none() {
                batch.put(seq_key, candidate.saturating_add(1).lex_encode());
                return Ok(candidate);
            }
            match candidate.checked_add(1) {
                Some(next) => candidate = next,
                None => break,
            }
        }
        Err(self.exhausted(entity))
    }

    fn draw_random(&self, store: &dyn OrderedStore, entity: &str) -> CoreResult<i64> {
        let mut rng = rand::thread_rng();
        for _ in 0..self.max_attempts {
            let candidate = rng.gen_range(0..=i64::MAX);
            if store.get(&keys::primary_key(entity, candidate))?.is_none() {
                return Ok(candidate);
            }
        }
        Err(self.exhausted(entity))
    }

    fn exhausted(&self, entity: &str) -> CoreError {
        CoreError::IdSpaceExhausted {
            entity: entity.to_string(),
            attempts: self.max_attempts,
        }
    }
}
