//! Pipeline driver: the generate-once loop over descriptor collections.

use super::prompt::{markdown_prompt, script_prompt};
use super::summary::{CollectionFailure, DiagramFailure, RunSummary};
use crate::artifact::{comment_prefix, ArtifactWriter, DiagramOutcome, DiagramRequest};
use crate::backend::GenerationBackend;
use crate::descriptor::{
    Descriptor, DescriptorKind, DescriptorStore, Record, DIAGRAM_KEY_FIELD, TARGET_DIR_FIELD,
    TARGET_FILENAME_FIELD,
};
use crate::error::{GenerationError, PipelineError};
use crate::keypool::KeyPool;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const DIAGRAM_TEXT_FIELD: &str = "text";
const LANGUAGE_FIELD: &str = "language";

/// Drives descriptor collections through the generation backend.
///
/// Descriptors are processed one at a time in stored order, collections in
/// the fixed kind order. A failing descriptor is recorded and left pending;
/// only a descriptor store failure stops a collection.
pub struct PipelineDriver {
    store: DescriptorStore,
    keys: Option<KeyPool>,
    backend: Arc<dyn GenerationBackend>,
    writer: ArtifactWriter,
}

impl PipelineDriver {
    pub fn new(
        store: DescriptorStore,
        keys: Option<KeyPool>,
        backend: Arc<dyn GenerationBackend>,
        writer: ArtifactWriter,
    ) -> Self {
        Self {
            store,
            keys,
            backend,
            writer,
        }
    }

    pub fn key_pool(&self) -> Option<&KeyPool> {
        self.keys.as_ref()
    }

    /// Process the requested kinds (all kinds when `kinds` is empty).
    pub async fn run(&mut self, kinds: &[DescriptorKind]) -> RunSummary {
        let mut summary = RunSummary::default();
        for kind in DescriptorKind::ALL {
            if !kinds.is_empty() && !kinds.contains(&kind) {
                continue;
            }
            self.run_collection(kind, &mut summary).await;
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped.len(),
            already_completed = summary.already_completed,
            collection_failures = summary.collection_failures.len(),
            diagram_failures = summary.diagram_failures.len(),
            "Generation run finished"
        );
        summary
    }

    async fn run_collection(&mut self, kind: DescriptorKind, summary: &mut RunSummary) {
        let mut collection = match self.store.load(kind) {
            Ok(collection) => collection,
            Err(e) => {
                error!(kind = %kind, error = %e, "Failed to load collection");
                summary.collection_failures.push(CollectionFailure {
                    kind,
                    path: self.store.path_for(kind),
                    reason: e.to_string(),
                });
                return;
            }
        };
        info!(
            kind = %kind,
            records = collection.len(),
            pending = collection.pending_count(),
            "Processing collection"
        );

        let mut changed = false;
        for (index, record) in collection.records.iter_mut().enumerate() {
            let descriptor = match record {
                Record::Descriptor(descriptor) => descriptor,
                Record::Malformed { reason, .. } => {
                    let err = PipelineError::MalformedDescriptor(reason.clone());
                    warn!(kind = %kind, index, reason = %reason, "Skipping malformed record");
                    summary.skip(kind, index, format!("record #{}", index + 1), &err);
                    continue;
                }
            };
            if descriptor.is_completed() {
                summary.already_completed += 1;
                continue;
            }

            let had_key = descriptor.diagram_key().is_some();
            let result = self.process(descriptor).await;
            if !had_key && descriptor.diagram_key().is_some() {
                changed = true;
                summary.keys_allocated += 1;
            }

            let name = descriptor.display_name();
            match result {
                Ok(outcome) => {
                    descriptor.mark_completed();
                    changed = true;
                    summary.processed += 1;
                    info!(kind = %kind, descriptor = %name, "Descriptor completed");
                    if let DiagramOutcome::Failed { key, reason } = outcome {
                        summary.diagram_failures.push(DiagramFailure {
                            kind,
                            descriptor: name,
                            key,
                            reason,
                        });
                    }
                }
                Err(e) => {
                    warn!(kind = %kind, descriptor = %name, error = %e, "Descriptor skipped");
                    summary.skip(kind, index, name, &e);
                }
            }
        }

        if !changed {
            debug!(kind = %kind, "Collection unchanged, not rewritten");
            return;
        }
        match self.store.save(&collection) {
            Ok(()) => summary.collections_written.push(collection.path().to_path_buf()),
            Err(e) => {
                error!(kind = %kind, error = %e, "Failed to persist collection");
                summary.collection_failures.push(CollectionFailure {
                    kind,
                    path: collection.path().to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn process(&mut self, descriptor: &mut Descriptor) -> Result<DiagramOutcome, PipelineError> {
        match descriptor.kind() {
            DescriptorKind::Markdown => self.generate_markdown(descriptor).await,
            DescriptorKind::Script => self.generate_script(descriptor).await,
            DescriptorKind::Diagram => self.generate_diagram(descriptor).await,
        }
    }

    async fn generate_markdown(
        &mut self,
        descriptor: &mut Descriptor,
    ) -> Result<DiagramOutcome, PipelineError> {
        let target = require_target(descriptor)?;
        let diagram = self.diagram_request(descriptor)?;
        let previous = self.read_previous(descriptor).await;
        let prompt = markdown_prompt(descriptor, previous.as_deref());
        self.write_document(descriptor, target, &prompt, diagram).await
    }

    async fn generate_script(
        &mut self,
        descriptor: &mut Descriptor,
    ) -> Result<DiagramOutcome, PipelineError> {
        let target = require_target(descriptor)?;
        let diagram = self.diagram_request(descriptor)?;
        let previous = self.read_previous(descriptor).await;
        let prompt = script_prompt(descriptor, previous.as_deref());
        self.write_document(descriptor, target, &prompt, diagram).await
    }

    async fn generate_diagram(&self, descriptor: &Descriptor) -> Result<DiagramOutcome, PipelineError> {
        let target = require_target(descriptor)?;
        let text = descriptor.param_text(DIAGRAM_TEXT_FIELD).ok_or_else(|| {
            PipelineError::MalformedDescriptor(format!("missing '{}'", DIAGRAM_TEXT_FIELD))
        })?;

        let bytes = self.backend.generate_diagram(&text).await?;
        if bytes.is_empty() {
            return Err(GenerationError::EmptyResponse("diagram backend returned no bytes".to_string()).into());
        }
        self.writer.write_bytes(&target, &bytes).await?;
        Ok(DiagramOutcome::NotRequested)
    }

    async fn write_document(
        &self,
        descriptor: &Descriptor,
        target: PathBuf,
        prompt: &str,
        diagram: Option<DiagramRequest>,
    ) -> Result<DiagramOutcome, PipelineError> {
        debug!(descriptor = %descriptor.display_name(), prompt_chars = prompt.len(), "Prompt built");
        let content = self.backend.generate_text(prompt).await?;
        let prefix = comment_prefix(descriptor.kind(), descriptor.param(LANGUAGE_FIELD).as_deref());
        let outcome = self
            .writer
            .write_with_diagram(&target, &content, diagram.as_ref(), prefix, self.backend.as_ref())
            .await?;
        Ok(outcome)
    }

    /// Diagram wanted by a markdown/script descriptor. A missing key is
    /// allocated now and recorded on the descriptor, so a failed generation
    /// keeps it for the retry.
    fn diagram_request(
        &mut self,
        descriptor: &mut Descriptor,
    ) -> Result<Option<DiagramRequest>, PipelineError> {
        let Some(prompt) = descriptor.diagram_prompt() else {
            return Ok(None);
        };
        let key = match descriptor.diagram_key() {
            Some(key) => key,
            None => {
                let pool = self.keys.as_mut().ok_or_else(|| {
                    PipelineError::Config(
                        "descriptor requests a diagram but no key pool is configured".to_string(),
                    )
                })?;
                let key = pool.allocate_next()?;
                descriptor.set_param(DIAGRAM_KEY_FIELD, key.clone());
                key
            }
        };
        Ok(Some(DiagramRequest { key, prompt }))
    }

    async fn read_previous(&self, descriptor: &Descriptor) -> Option<String> {
        let path = self.writer.resolve(&descriptor.source_reference()?);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Some(content),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No previous version available");
                None
            }
        }
    }
}

fn require_target(descriptor: &Descriptor) -> Result<PathBuf, PipelineError> {
    for field in [TARGET_FILENAME_FIELD, TARGET_DIR_FIELD] {
        if descriptor.param(field).is_none() {
            return Err(PipelineError::MalformedDescriptor(format!("missing '{}'", field)));
        }
    }
    descriptor
        .target_path()
        .ok_or_else(|| PipelineError::MalformedDescriptor("missing target path".to_string()))
}
