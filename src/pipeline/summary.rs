//! Run summary returned by the pipeline driver.

use crate::descriptor::DescriptorKind;
use crate::error::PipelineError;
use serde::Serialize;
use std::path::PathBuf;

/// A descriptor left pending (or a malformed record) and why.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDescriptor {
    pub kind: DescriptorKind,
    /// Position of the record in its collection.
    pub index: usize,
    pub descriptor: String,
    pub category: &'static str,
    pub reason: String,
}

/// A collection that could not be loaded or persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionFailure {
    pub kind: DescriptorKind,
    pub path: PathBuf,
    pub reason: String,
}

/// Primary artifact written, diagram not attached.
#[derive(Debug, Clone, Serialize)]
pub struct DiagramFailure {
    pub kind: DescriptorKind,
    pub descriptor: String,
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub already_completed: usize,
    pub keys_allocated: usize,
    pub skipped: Vec<SkippedDescriptor>,
    pub collection_failures: Vec<CollectionFailure>,
    pub diagram_failures: Vec<DiagramFailure>,
    /// Collection files rewritten during the run.
    pub collections_written: Vec<PathBuf>,
}

impl RunSummary {
    pub(crate) fn skip(
        &mut self,
        kind: DescriptorKind,
        index: usize,
        descriptor: String,
        error: &PipelineError,
    ) {
        self.skipped.push(SkippedDescriptor {
            kind,
            index,
            descriptor,
            category: error.category(),
            reason: error.to_string(),
        });
    }

    /// True when every reachable descriptor is completed and nothing failed.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.collection_failures.is_empty()
            && self.diagram_failures.is_empty()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}
