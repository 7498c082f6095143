use std::sync::atomic::{AtomicU32, Ordering};

/// Cap on new (uncached) calls to a metered provider within one pipeline run.
///
/// Shared by every concurrent lookup of the run; call [`LookupBudget::reset`]
/// before the next run.
#[derive(Debug)]
pub struct LookupBudget {
    limit: u32,
    used: AtomicU32,
}

impl LookupBudget {
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: AtomicU32::new(0),
        }
    }

    /// Reserves one call. Returns `false` once the limit is reached.
    pub fn try_acquire(&self) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .is_ok()
    }

    #[must_use]
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used())
    }

    pub fn reset(&self) {
        self.used.store(0, Ordering::SeqCst);
    }
}
