//! Shared constants for reservation accounting and the Tantivy backend.

/// Largest document count a single Tantivy index can address.
///
/// `DocId` is a `u32`, but `TERMINATED` (`i32::MAX`) is reserved as the end-of-postings
/// sentinel, so the last usable slot sits one below it.
pub const DEFAULT_MAX_DOC_LIMIT: u64 = i32::MAX as u64 - 1;

/// Segment count requested from the backend during the last-resort merge.
pub const DEFAULT_FULL_MERGE_SEGMENTS: usize = 1;

/// Heap budget handed to a Tantivy `IndexWriter` (50 MB).
pub const DEFAULT_WRITER_HEAP_BYTES: usize = 50_000_000;

/// Indexing threads used by `TantivySegmentWriter`.
pub const DEFAULT_WRITER_THREADS: usize = 1;
