use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{LexcapError, Result};
use crate::reservation::{Reservation, ReservedDocs};
use crate::types::{ReservationOptions, ReservationStats};

use super::SegmentWriter;

#[derive(Debug, Default)]
struct RecoveryCounters {
    merge_deletes_runs: AtomicU64,
    full_merge_runs: AtomicU64,
    capacity_failures: AtomicU64,
}

/// Wraps a `SegmentWriter` and refuses reservations that would push it past its ceiling.
///
/// `reserve` runs under the writer's mutex so two callers can never both claim the same
/// headroom. Releases only touch the atomic counter and may race in freely.
#[derive(Debug)]
pub struct CapacityReservingWriter<W> {
    writer: Mutex<W>,
    reserved: Arc<ReservedDocs>,
    ceiling: u64,
    options: ReservationOptions,
    counters: RecoveryCounters,
}

impl<W: SegmentWriter> CapacityReservingWriter<W> {
    /// Wrap `writer` with the default escalation and the backend's own ceiling.
    #[must_use]
    pub fn new(writer: W) -> Self {
        let ceiling = writer.max_doc_limit();
        Self {
            writer: Mutex::new(writer),
            reserved: Arc::new(ReservedDocs::default()),
            ceiling,
            options: ReservationOptions::default(),
            counters: RecoveryCounters::default(),
        }
    }

    pub fn with_options(writer: W, options: ReservationOptions) -> Result<Self> {
        options.validate()?;
        let ceiling = options.effective_ceiling(writer.max_doc_limit());
        Ok(Self {
            writer: Mutex::new(writer),
            reserved: Arc::new(ReservedDocs::default()),
            ceiling,
            options,
            counters: RecoveryCounters::default(),
        })
    }

    /// Reserve room for `additions` documents.
    ///
    /// When the projected total (`reserved + max_doc + additions`) exceeds the ceiling, the
    /// backend first merges away deletions, then merges everything down to
    /// `full_merge_segments` segments. Only if both fail is `CapacityExceeded` returned.
    /// The counter is untouched on every error path.
    pub fn reserve(&self, additions: u64) -> Result<Reservation> {
        if additions == 0 {
            return Ok(Reservation::empty());
        }

        let mut writer = self.lock()?;
        let max_doc = writer.max_doc()?;
        if self.over_ceiling(max_doc, additions) {
            self.recover(&mut writer, additions, max_doc)?;
        }

        self.reserved.add(additions);
        tracing::debug!(
            additions,
            reserved = self.reserved.get(),
            ceiling = self.ceiling,
            "reserved document additions"
        );
        Ok(Reservation::new(additions, Arc::clone(&self.reserved)))
    }

    /// Give back `count` previously reserved documents. Zero is a no-op.
    pub fn release_reservation(&self, count: u64) {
        self.reserved.release(count);
    }

    #[must_use]
    pub fn reserved(&self) -> u64 {
        self.reserved.get()
    }

    #[must_use]
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    #[must_use]
    pub fn options(&self) -> &ReservationOptions {
        &self.options
    }

    pub fn stats(&self) -> Result<ReservationStats> {
        let max_doc = self.lock()?.max_doc()?;
        let reserved = self.reserved.get();
        Ok(ReservationStats {
            reserved,
            max_doc,
            ceiling: self.ceiling,
            headroom: self
                .ceiling
                .saturating_sub(reserved.saturating_add(max_doc)),
            merge_deletes_runs: self.counters.merge_deletes_runs.load(Ordering::Relaxed),
            full_merge_runs: self.counters.full_merge_runs.load(Ordering::Relaxed),
            capacity_failures: self.counters.capacity_failures.load(Ordering::Relaxed),
        })
    }

    /// Run `f` with exclusive access to the backend, serialized with `reserve`.
    pub fn with_writer<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut W) -> Result<T>,
    {
        let mut writer = self.lock()?;
        f(&mut *writer)
    }

    /// Write the documents a reservation was taken for.
    ///
    /// Once `f` returns, the documents it wrote count through `max_doc`, so the reservation
    /// is released before the lock is dropped. It is released on failure too.
    pub fn apply_reserved<T, F>(&self, reservation: Reservation, f: F) -> Result<T>
    where
        F: FnOnce(&mut W) -> Result<T>,
    {
        if !reservation.issued_by(&self.reserved) {
            return Err(LexcapError::ForeignReservation);
        }
        let mut writer = self.lock()?;
        let outcome = f(&mut *writer);
        reservation.release();
        outcome
    }

    /// Close the wrapper and hand back the backend. Outstanding reservations become inert.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| LexcapError::Lock("segment writer mutex poisoned".into()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, W>> {
        self.writer
            .lock()
            .map_err(|_| LexcapError::Lock("segment writer mutex poisoned".into()))
    }

    fn over_ceiling(&self, max_doc: u64, additions: u64) -> bool {
        self.reserved
            .get()
            .saturating_add(max_doc)
            .saturating_add(additions)
            > self.ceiling
    }

    fn recover(&self, writer: &mut W, additions: u64, mut max_doc: u64) -> Result<()> {
        if self.options.merge_deletes {
            tracing::info!(
                additions,
                max_doc,
                reserved = self.reserved.get(),
                ceiling = self.ceiling,
                "max_doc about to exceed ceiling; merging deletes"
            );
            writer.force_merge_deletes()?;
            self.counters
                .merge_deletes_runs
                .fetch_add(1, Ordering::Relaxed);
            let before = max_doc;
            max_doc = writer.max_doc()?;
            tracing::info!(before, after = max_doc, "merge deletes finished");
            if !self.over_ceiling(max_doc, additions) {
                return Ok(());
            }
        }

        if self.options.full_merge {
            let segments = self.options.full_merge_segments;
            tracing::info!(
                additions,
                max_doc,
                segments,
                "merging deletes was not enough; forcing full merge"
            );
            writer.force_merge(segments)?;
            self.counters.full_merge_runs.fetch_add(1, Ordering::Relaxed);
            let before = max_doc;
            max_doc = writer.max_doc()?;
            tracing::info!(before, after = max_doc, "full merge finished");
            if !self.over_ceiling(max_doc, additions) {
                return Ok(());
            }
        }

        self.counters
            .capacity_failures
            .fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            additions,
            max_doc,
            reserved = self.reserved.get(),
            ceiling = self.ceiling,
            "unable to reserve document additions"
        );
        Err(LexcapError::CapacityExceeded {
            requested: additions,
            ceiling: self.ceiling,
            observed_max_doc: max_doc,
        })
    }
}
