//! Tantivy implementation of `SegmentWriter`.
//!
//! `max_doc` is read from the committed segment metas, so only documents that went through
//! `commit` count. Deleted documents keep counting until a merge rewrites their segment.

use std::path::Path;

use tantivy::index::SegmentId;
use tantivy::merge_policy::NoMergePolicy;
use tantivy::schema::Schema;
use tantivy::{Index, IndexWriter, SegmentMeta, TantivyDocument, Term};

use crate::constants::{DEFAULT_MAX_DOC_LIMIT, DEFAULT_WRITER_HEAP_BYTES, DEFAULT_WRITER_THREADS};
use crate::error::Result;

use super::SegmentWriter;

pub struct TantivySegmentWriter {
    index: Index,
    writer: IndexWriter,
}

impl TantivySegmentWriter {
    pub fn create_in_ram(schema: Schema) -> Result<Self> {
        Self::from_index(Index::create_in_ram(schema))
    }

    pub fn create_in_dir<P: AsRef<Path>>(dir: P, schema: Schema) -> Result<Self> {
        Self::from_index(Index::create_in_dir(dir, schema)?)
    }

    pub fn open_in_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::from_index(Index::open_in_dir(dir)?)
    }

    /// Open a writer with `NoMergePolicy`: segments only merge when recovery asks for it.
    pub fn from_index(index: Index) -> Result<Self> {
        let writer: IndexWriter =
            index.writer_with_num_threads(DEFAULT_WRITER_THREADS, DEFAULT_WRITER_HEAP_BYTES)?;
        writer.set_merge_policy(Box::new(NoMergePolicy));
        Ok(Self::from_parts(index, writer))
    }

    /// Use a writer configured elsewhere (custom heap, merge policy).
    ///
    /// With a background merge policy installed, a recovery merge can name a segment that is
    /// already being merged; tantivy rejects that and `reserve` returns `LexcapError::Tantivy`.
    #[must_use]
    pub fn from_parts(index: Index, writer: IndexWriter) -> Self {
        Self { index, writer }
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn add_document(&mut self, document: TantivyDocument) -> Result<()> {
        self.writer.add_document(document)?;
        Ok(())
    }

    pub fn delete_term(&mut self, term: Term) {
        self.writer.delete_term(term);
    }

    pub fn commit(&mut self) -> Result<()> {
        self.writer.commit()?;
        Ok(())
    }

    pub fn segment_count(&self) -> Result<usize> {
        Ok(self.index.searchable_segment_ids()?.len())
    }

    fn merge_segments(&mut self, segment_ids: &[SegmentId]) -> Result<()> {
        if segment_ids.is_empty() {
            return Ok(());
        }
        self.writer.merge(segment_ids).wait()?;
        Ok(())
    }
}

impl SegmentWriter for TantivySegmentWriter {
    fn max_doc(&self) -> Result<u64> {
        Ok(self
            .index
            .searchable_segment_metas()?
            .iter()
            .map(|meta| u64::from(meta.max_doc()))
            .sum())
    }

    fn force_merge_deletes(&mut self) -> Result<()> {
        let with_deletes: Vec<SegmentId> = self
            .index
            .searchable_segment_metas()?
            .iter()
            .filter(|meta| meta.num_deleted_docs() > 0)
            .map(SegmentMeta::id)
            .collect();
        tracing::debug!(
            segments = with_deletes.len(),
            "merging tantivy segments with deletes"
        );
        // One merge per segment: reclaims tombstones without rewriting clean segments.
        for segment_id in with_deletes {
            self.merge_segments(&[segment_id])?;
        }
        Ok(())
    }

    fn force_merge(&mut self, max_segments: usize) -> Result<()> {
        let mut metas = self.index.searchable_segment_metas()?;
        let target = max_segments.max(1);
        if metas.len() <= target {
            return Ok(());
        }
        metas.sort_by_key(SegmentMeta::max_doc);
        let take = metas.len() - target + 1;
        let segment_ids: Vec<SegmentId> = metas.iter().take(take).map(SegmentMeta::id).collect();
        tracing::info!(
            merging = segment_ids.len(),
            target,
            "forcing tantivy segment merge"
        );
        self.merge_segments(&segment_ids)
    }

    fn max_doc_limit(&self) -> u64 {
        DEFAULT_MAX_DOC_LIMIT
    }
}
