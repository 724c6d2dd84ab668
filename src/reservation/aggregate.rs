use std::fmt;

use crate::error::{LexcapError, Result};

use super::{Reservation, Withdraw};

/// One logical reservation built from up to `capacity` child reservations.
///
/// Slots keep their insertion order, and a slot may be empty when a participant had
/// nothing to reserve. Withdrawing visits every present child even when earlier ones fail.
pub struct AggregatedReservation {
    capacity: usize,
    children: Vec<Option<Box<dyn Withdraw>>>,
}

impl AggregatedReservation {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(LexcapError::InvalidConfig {
                reason: "aggregated reservation capacity must be positive".into(),
            });
        }
        Ok(Self {
            capacity,
            children: Vec::with_capacity(capacity),
        })
    }

    /// Append a child, or an empty slot when `child` is `None`.
    pub fn add(&mut self, child: Option<Box<dyn Withdraw>>) -> Result<()> {
        if self.children.len() >= self.capacity {
            return Err(LexcapError::OutOfBounds {
                capacity: self.capacity,
            });
        }
        self.children.push(child);
        Ok(())
    }

    pub fn add_reservation(&mut self, reservation: Reservation) -> Result<()> {
        self.add(Some(Box::new(reservation)))
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots filled so far, empty slots included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Withdraw every child in insertion order.
    ///
    /// A failing child does not stop the loop. The first failure is returned wrapped in
    /// `AggregateWithdrawalFailed`; later ones are logged and dropped.
    pub fn withdraw(self) -> Result<()> {
        let mut first_error: Option<LexcapError> = None;
        for (slot, child) in self.children.into_iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            if let Err(err) = child.withdraw() {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::warn!(
                        slot,
                        error = %err,
                        "suppressed reservation withdrawal failure"
                    );
                }
            }
        }
        match first_error {
            Some(source) => Err(LexcapError::AggregateWithdrawalFailed {
                source: Box::new(source),
            }),
            None => Ok(()),
        }
    }

    /// The batch went through: commit every child instead of giving capacity back.
    pub fn commit(self) {
        for child in self.children.into_iter().flatten() {
            child.commit();
        }
    }
}

impl fmt::Debug for AggregatedReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatedReservation")
            .field("capacity", &self.capacity)
            .field("len", &self.children.len())
            .field(
                "present",
                &self.children.iter().filter(|child| child.is_some()).count(),
            )
            .finish()
    }
}
