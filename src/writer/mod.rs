//! Index writers that account for reserved document additions.

mod capacity;
#[cfg(feature = "lex")]
mod tantivy_writer;

pub use capacity::CapacityReservingWriter;
#[cfg(feature = "lex")]
pub use tantivy_writer::TantivySegmentWriter;

use crate::error::Result;

/// The narrow slice of an inverted-index writer needed for capacity checks.
pub trait SegmentWriter {
    /// Document slots in use, deleted-but-unreclaimed documents included.
    fn max_doc(&self) -> Result<u64>;

    /// Rewrite segments carrying deletions so their tombstones stop counting.
    fn force_merge_deletes(&mut self) -> Result<()>;

    /// Merge until at most `max_segments` segments remain. Potentially very slow.
    fn force_merge(&mut self, max_segments: usize) -> Result<()>;

    /// Hard ceiling on `max_doc` imposed by the index format.
    fn max_doc_limit(&self) -> u64;
}
