//! Builder-style options controlling how a writer reserves document capacity.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FULL_MERGE_SEGMENTS;
use crate::error::{LexcapError, Result};

fn default_true() -> bool {
    true
}

fn default_full_merge_segments() -> usize {
    DEFAULT_FULL_MERGE_SEGMENTS
}

/// Tunable options for a `CapacityReservingWriter`.
///
/// Defaults reproduce the full escalation: merge deletes, then merge everything into a
/// single segment, then fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationOptions {
    /// Lowers the ceiling below the backend's own limit. Never raises it.
    #[serde(default)]
    pub doc_limit: Option<u64>,
    /// Run `force_merge_deletes` when a reservation would overflow.
    #[serde(default = "default_true")]
    pub merge_deletes: bool,
    /// Fall back to `force_merge` when reclaiming deletes was not enough.
    /// This can take minutes on a large index.
    #[serde(default = "default_true")]
    pub full_merge: bool,
    /// Segment target passed to `force_merge`.
    #[serde(default = "default_full_merge_segments")]
    pub full_merge_segments: usize,
}

impl Default for ReservationOptions {
    fn default() -> Self {
        Self {
            doc_limit: None,
            merge_deletes: true,
            full_merge: true,
            full_merge_segments: default_full_merge_segments(),
        }
    }
}

impl ReservationOptions {
    /// Start a fluent builder for `ReservationOptions`.
    #[must_use]
    pub fn builder() -> ReservationOptionsBuilder {
        ReservationOptionsBuilder::default()
    }

    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.full_merge_segments == 0 {
            return Err(LexcapError::InvalidConfig {
                reason: "full_merge_segments must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Effective ceiling given the backend's own limit.
    #[must_use]
    pub fn effective_ceiling(&self, backend_limit: u64) -> u64 {
        self.doc_limit
            .map_or(backend_limit, |limit| limit.min(backend_limit))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReservationOptionsBuilder {
    inner: ReservationOptions,
}

impl ReservationOptionsBuilder {
    #[must_use]
    pub fn doc_limit(mut self, limit: u64) -> Self {
        self.inner.doc_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn merge_deletes(mut self, enabled: bool) -> Self {
        self.inner.merge_deletes = enabled;
        self
    }

    #[must_use]
    pub fn full_merge(mut self, enabled: bool) -> Self {
        self.inner.full_merge = enabled;
        self
    }

    #[must_use]
    pub fn full_merge_segments(mut self, segments: usize) -> Self {
        self.inner.full_merge_segments = segments;
        self
    }

    #[must_use]
    pub fn build(self) -> ReservationOptions {
        self.inner
    }
}
