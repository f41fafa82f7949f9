//! Identifier allocation.
//!
//! Ids are handed out from a monotonic 64-bit counter. Loading annotations
//! from a container reports every id seen through
//! [`IdService::invalidate`], so later allocations never collide with
//! stored ids.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// A source of fresh annotation ids.
///
/// Each method is atomic on its own; implementations must be shareable
/// across threads.
pub trait IdService: Send + Sync {
    /// Marks `id` as taken: later allocations return ids greater than it.
    fn invalidate(&self, id: u64);

    /// Allocates one id.
    fn next(&self) -> u64;

    /// Allocates `n` consecutive ids.
    fn next_n(&self, n: u64) -> Range<u64>;
}

/// Process-local counter.
#[derive(Debug, Default)]
pub struct LocalIdService {
    next: AtomicU64,
}

impl LocalIdService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service whose first allocation is `next`.
    pub fn starting_at(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
        }
    }

    /// Resets the counter, even below ids already handed out.
    pub fn set_next(&self, next: u64) {
        self.next.store(next, Ordering::SeqCst);
    }

    /// The id the next allocation would return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl IdService for LocalIdService {
    fn invalidate(&self, id: u64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    fn next_n(&self, n: u64) -> Range<u64> {
        let start = self.next.fetch_add(n, Ordering::SeqCst);
        start..start.saturating_add(n)
    }
}

/// The process-wide id service used by stores that were not given one.
pub fn global() -> Arc<dyn IdService> {
    static GLOBAL: OnceLock<Arc<LocalIdService>> = OnceLock::new();
    let service = GLOBAL.get_or_init(|| Arc::new(LocalIdService::new()));
    Arc::clone(service) as Arc<dyn IdService>
}
