//! Shared fixtures for integration tests.

#![allow(dead_code)]

use lexcap_core::{Result, SegmentWriter};

/// In-memory backend: `max_doc` slots of which `live_docs` survive a full merge.
#[derive(Debug, Default)]
pub struct FakeSegmentWriter {
    pub max_doc: u64,
    pub live_docs: u64,
    pub limit: u64,
    /// Value `force_merge_deletes` shrinks `max_doc` to, if any.
    pub after_merge_deletes: Option<u64>,
    pub merge_deletes_calls: usize,
    pub force_merge_calls: Vec<usize>,
}

impl FakeSegmentWriter {
    pub fn new(limit: u64, max_doc: u64) -> Self {
        Self {
            max_doc,
            live_docs: max_doc,
            limit,
            ..Self::default()
        }
    }
}

impl SegmentWriter for FakeSegmentWriter {
    fn max_doc(&self) -> Result<u64> {
        Ok(self.max_doc)
    }

    fn force_merge_deletes(&mut self) -> Result<()> {
        self.merge_deletes_calls += 1;
        if let Some(after) = self.after_merge_deletes {
            self.max_doc = after;
        }
        Ok(())
    }

    fn force_merge(&mut self, max_segments: usize) -> Result<()> {
        self.force_merge_calls.push(max_segments);
        self.max_doc = self.live_docs;
        Ok(())
    }

    fn max_doc_limit(&self) -> u64 {
        self.limit
    }
}
