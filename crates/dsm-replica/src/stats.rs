use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of broadcast delivery counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Mutations sent to the peer set.
    pub broadcasts: u64,
    /// Individual peer deliveries that succeeded.
    pub delivered: u64,
    /// Individual peer deliveries that failed. Each one is a peer whose copy
    /// may now differ from ours.
    pub failed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct DeliveryCounters {
    broadcasts: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryCounters {
    pub(crate) fn broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
