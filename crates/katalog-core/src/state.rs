//! Shared cache state types.

/// Lifecycle of the book synchronizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing loaded or restored yet.
    Empty,
    /// At least one `load` is in flight.
    Loading,
    /// Collection available, nothing in flight.
    Ready,
    /// A create/update/delete is waiting on the server.
    Mutating,
}

/// Where the collection currently on display came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Unloaded,
    /// Answered by the service during this session.
    Live,
    /// Restored from the durable session store after the service failed
    /// or before it answered. Front ends should say "showing cached data".
    Cached,
}

impl DataSource {
    #[must_use]
    pub const fn is_cached(self) -> bool {
        matches!(self, Self::Cached)
    }
}
