use serde::Serialize;

/// Point-in-time view of a writer's reservation accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReservationStats {
    /// Documents reserved but not yet written.
    pub reserved: u64,
    /// Backend document slots, deleted documents included.
    pub max_doc: u64,
    pub ceiling: u64,
    /// `ceiling - (reserved + max_doc)`, saturating at zero.
    pub headroom: u64,
    pub merge_deletes_runs: u64,
    pub full_merge_runs: u64,
    pub capacity_failures: u64,
}
