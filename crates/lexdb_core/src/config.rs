//! Database configuration.

/// How identifiers are chosen for new records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// Per-entity counter stored alongside the data, starting at 1.
    #[default]
    Sequential,
    /// Uniformly random non-negative identifiers, redrawn on collision.
    Random,
}

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the database directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to fsync the data log after every batch.
    pub sync_on_write: bool,

    /// Identifier allocation strategy.
    pub id_strategy: IdStrategy,

    /// Maximum draws for [`IdStrategy::Random`] before giving up.
    pub max_id_attempts: u32,

    /// Number of lock stripes serializing updates of one identifier.
    pub lock_stripes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_write: true,
            id_strategy: IdStrategy::Sequential,
            max_id_attempts: 16,
            lock_stripes: 64,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the database if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync the log on every write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the identifier allocation strategy.
    #[must_use]
    pub const fn id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// Sets the maximum number of random identifier draws.
    #[must_use]
    pub const fn max_id_attempts(mut self, attempts: u32) -> Self {
        self.max_id_attempts = attempts;
        self
    }

    /// Sets the number of update lock stripes.
    #[must_use]
    pub const fn lock_stripes(mut self, stripes: usize) -> Self {
        self.lock_stripes = stripes;
        self
    }
}
