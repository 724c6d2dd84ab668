//! Reservation handles and the counter they draw from.
//!
//! A `Reservation` is issued by `CapacityReservingWriter::reserve` and returns its count to
//! the writer when released or dropped. Committing consumes it without touching the counter.
//! `AggregatedReservation` groups handles from several writers so a failed batch can give
//! all of them back in one call.

mod aggregate;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use aggregate::AggregatedReservation;

use crate::error::Result;

/// Something that can give reserved capacity back.
///
/// Implemented by `Reservation`; other writer kinds can supply their own handles.
pub trait Withdraw: Send {
    /// Return the reserved capacity to its issuer.
    fn withdraw(self: Box<Self>) -> Result<()>;

    /// The reserved documents were written; give nothing back.
    fn commit(self: Box<Self>) {}
}

/// Documents reserved against one writer but not yet visible through `max_doc`.
#[derive(Debug, Default)]
pub(crate) struct ReservedDocs {
    value: AtomicU64,
}

impl ReservedDocs {
    pub(crate) fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    pub(crate) fn add(&self, count: u64) {
        self.value.fetch_add(count, Ordering::AcqRel);
    }

    /// Subtract `count`, clamping at zero.
    pub(crate) fn release(&self, count: u64) {
        if count == 0 {
            return;
        }
        let result = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(count))
            });
        if let Ok(previous) = result {
            if previous < count {
                tracing::warn!(
                    reserved = previous,
                    released = count,
                    "released more documents than were reserved; clamping counter at zero"
                );
            }
        }
    }
}

/// Capacity for `count` forthcoming document additions on one writer.
///
/// Dropping an unreleased, uncommitted handle releases it.
#[must_use = "dropping a reservation releases it immediately"]
#[derive(Debug)]
pub struct Reservation {
    count: u64,
    counter: Option<Arc<ReservedDocs>>,
}

impl Reservation {
    pub(crate) fn new(count: u64, counter: Arc<ReservedDocs>) -> Self {
        Self {
            count,
            counter: Some(counter),
        }
    }

    /// A reservation for zero documents. Releasing or committing it does nothing.
    pub fn empty() -> Self {
        Self {
            count: 0,
            counter: None,
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counter.is_none() || self.count == 0
    }

    /// Give the reserved capacity back to the issuing writer.
    pub fn release(mut self) {
        self.settle_release();
    }

    /// Mark the reserved documents as written. The counter is left untouched.
    pub fn commit(mut self) {
        self.counter = None;
    }

    pub(crate) fn issued_by(&self, counter: &Arc<ReservedDocs>) -> bool {
        self.counter
            .as_ref()
            .is_none_or(|own| Arc::ptr_eq(own, counter))
    }

    fn settle_release(&mut self) {
        if let Some(counter) = self.counter.take() {
            counter.release(self.count);
            tracing::debug!(count = self.count, "reservation released");
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.settle_release();
    }
}

impl Withdraw for Reservation {
    fn withdraw(self: Box<Self>) -> Result<()> {
        (*self).release();
        Ok(())
    }

    fn commit(self: Box<Self>) {
        (*self).commit();
    }
}
