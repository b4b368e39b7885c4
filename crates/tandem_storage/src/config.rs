//! Configuration for a relationship graph.

/// Configuration for a [`Graph`](crate::Graph).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphConfig {
    /// Capacity of the default [`ChangeLog`](crate::ChangeLog) sink.
    pub change_log_capacity: usize,

    /// Check the invariants of every record touched by a write before the
    /// write returns.
    pub verify_records: bool,

    /// Memoise inverse resolution per `(type, field)`.
    pub cache_inverses: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            change_log_capacity: 10_000,
            verify_records: cfg!(debug_assertions),
            cache_inverses: true,
        }
    }
}

impl GraphConfig {
    /// Configuration that verifies every write.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            verify_records: true,
            ..Self::default()
        }
    }

    /// Configuration with no verification and a small change log.
    #[must_use]
    pub fn lean() -> Self {
        Self {
            change_log_capacity: 256,
            verify_records: false,
            cache_inverses: true,
        }
    }

    /// Builder method to set the change log capacity.
    #[must_use]
    pub fn with_change_log_capacity(mut self, capacity: usize) -> Self {
        self.change_log_capacity = capacity;
        self
    }

    /// Builder method to enable/disable record verification.
    #[must_use]
    pub fn with_verify_records(mut self, verify: bool) -> Self {
        self.verify_records = verify;
        self
    }

    /// Builder method to enable/disable the inverse cache.
    #[must_use]
    pub fn with_cache_inverses(mut self, cache: bool) -> Self {
        self.cache_inverses = cache;
        self
    }
}
