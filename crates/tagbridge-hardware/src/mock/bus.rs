//! Shared-bus tracking for mock readers.
//!
//! Real readers hang off one SPI bus, so only one transaction may be on the
//! wire at a time. Attaching several [`MockReader`](super::MockReader)s to
//! the same [`MockBus`] records how many of their calls overlap.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts reader transactions in flight on a simulated shared bus.
///
/// # Examples
///
/// ```
/// use tagbridge_hardware::mock::MockBus;
///
/// let bus = MockBus::new();
/// {
///     let _first = bus.begin();
///     assert_eq!(bus.in_flight(), 1);
/// }
/// assert_eq!(bus.in_flight(), 0);
/// assert_eq!(bus.peak(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    inner: Arc<BusCounters>,
}

#[derive(Debug, Default)]
struct BusCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    transactions: AtomicUsize,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transaction; it ends when the returned guard is dropped,
    /// including when the caller's future is cancelled.
    pub fn begin(&self) -> BusTransaction {
        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
        self.inner.transactions.fetch_add(1, Ordering::SeqCst);
        BusTransaction {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Most transactions ever in flight at once.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    pub fn transactions(&self) -> usize {
        self.inner.transactions.load(Ordering::SeqCst)
    }
}

/// One transaction on a [`MockBus`].
#[derive(Debug)]
pub struct BusTransaction {
    inner: Arc<BusCounters>,
}

impl Drop for BusTransaction {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
