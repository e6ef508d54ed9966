//! CLI output: error mapping from pipeline errors to the stderr line.

use crate::error::PipelineError;

/// Map a pipeline error to the single line printed before exiting non-zero.
pub fn map_error(e: &PipelineError) -> String {
    format!("error[{}]: {}", e.category(), e)
}
