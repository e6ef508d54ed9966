//! Shared presentation helpers.

use crate::error::PipelineError;
use owo_colors::OwoColorize;
use serde::Serialize;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Config(format!("Failed to render JSON output: {}", e)))
}

/// Count rendered green when zero problems, red otherwise.
pub(crate) fn problem_count(count: usize) -> String {
    if count == 0 {
        format!("{}", count.green())
    } else {
        format!("{}", count.red())
    }
}
