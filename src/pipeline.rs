//! Generation pipeline
//!
//! Reads descriptor collections, generates each pending descriptor through the
//! injected backend, writes artifacts, and flips completion flags so a re-run
//! only picks up what is still pending.

mod driver;
mod prompt;
pub mod summary;

pub use driver::PipelineDriver;
pub use prompt::{markdown_prompt, script_prompt};
pub use summary::{CollectionFailure, DiagramFailure, RunSummary, SkippedDescriptor};
